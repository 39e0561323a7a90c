//! Billing settings actions
//!
//! `POST|PUT|DELETE /billing/settings` with `{"action": "...", ...}`.

use super::model::{
    TaxRate, TaxRateForm, TaxRateStatus, TaxRateUpdate, WebhookEndpoint, WebhookForm,
    WebhookStatus, WebhookUpdate,
};
use super::service::BillingService;
use super::tax_report::TaxReportRequest;
use crate::core::action::ActionResponse;
use crate::core::error::{DashError, DashResult};
use crate::core::mutation::Mutation;
use crate::core::service::require;
use crate::core::validation::validate_form;
use crate::core::Entity;
use crate::export::{ExportFile, ExportFormat, dated_filename};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

/// Integrations `connect_integration` accepts
pub const INTEGRATIONS: &[&str] = &[
    "stripe",
    "paypal",
    "quickbooks",
    "xero",
    "salesforce",
    "hubspot",
    "slack",
    "zapier",
];

/// Body of a billing settings request
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SettingsAction {
    RetryPayment {
        #[serde(alias = "invoiceId")]
        invoice_id: Uuid,
    },
    RotateApiKeys,
    CreateWebhook(WebhookForm),
    UpdateWebhook(WebhookUpdate),
    DeleteWebhook {
        #[serde(alias = "webhookId")]
        webhook_id: Uuid,
    },
    CreateTaxRate(TaxRateForm),
    UpdateTaxRate(TaxRateUpdate),
    DeleteTaxRate {
        #[serde(alias = "taxRateId")]
        tax_rate_id: Uuid,
    },
    ConnectIntegration {
        integration: String,
    },
    GenerateTaxReport(TaxReportRequest),
    CancelAllSubscriptions,
}

impl SettingsAction {
    pub const NAMES: &'static [&'static str] = &[
        "retry_payment",
        "rotate_api_keys",
        "create_webhook",
        "update_webhook",
        "delete_webhook",
        "create_tax_rate",
        "update_tax_rate",
        "delete_tax_rate",
        "connect_integration",
        "generate_tax_report",
        "cancel_all_subscriptions",
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SettingsAction::RetryPayment { .. } => "retry_payment",
            SettingsAction::RotateApiKeys => "rotate_api_keys",
            SettingsAction::CreateWebhook(_) => "create_webhook",
            SettingsAction::UpdateWebhook(_) => "update_webhook",
            SettingsAction::DeleteWebhook { .. } => "delete_webhook",
            SettingsAction::CreateTaxRate(_) => "create_tax_rate",
            SettingsAction::UpdateTaxRate(_) => "update_tax_rate",
            SettingsAction::DeleteTaxRate { .. } => "delete_tax_rate",
            SettingsAction::ConnectIntegration { .. } => "connect_integration",
            SettingsAction::GenerateTaxReport(_) => "generate_tax_report",
            SettingsAction::CancelAllSubscriptions => "cancel_all_subscriptions",
        }
    }
}

/// Current API key pair. The secret is only ever shown once, on rotation.
#[derive(Debug, Clone)]
pub struct ApiKeys {
    pub publishable: String,
    secret: String,
    pub rotated_at: DateTime<Utc>,
}

impl ApiKeys {
    pub fn generate() -> Self {
        Self {
            publishable: format!("pk_live_{}", Uuid::new_v4().simple()),
            secret: format!("sk_live_{}", Uuid::new_v4().simple()),
            rotated_at: Utc::now(),
        }
    }

    /// `sk_live_…abcd`
    pub fn masked_secret(&self) -> String {
        let tail = &self.secret[self.secret.len().saturating_sub(4)..];
        format!("sk_live_…{}", tail)
    }
}

#[derive(Debug, Serialize)]
struct RotatedKeys {
    publishable_key: String,
    secret_key: String,
    rotated_at: DateTime<Utc>,
}

impl BillingService {
    /// Run one settings action through the uniform mutation pattern
    pub async fn apply_settings(
        &self,
        action: SettingsAction,
        actor: Option<Uuid>,
    ) -> DashResult<ActionResponse> {
        let name = action.name();
        self.mutator
            .run(
                Mutation::action("billing_settings", name, None).by(actor),
                self.dispatch(action),
            )
            .await
    }

    async fn dispatch(&self, action: SettingsAction) -> DashResult<ActionResponse> {
        match action {
            SettingsAction::RetryPayment { invoice_id } => {
                let invoice = self.collect_payment(invoice_id).await?;
                ActionResponse::ok(format!("{} has been paid", invoice.number)).with_data(&invoice)
            }
            SettingsAction::RotateApiKeys => {
                let keys = ApiKeys::generate();
                let shown = RotatedKeys {
                    publishable_key: keys.publishable.clone(),
                    secret_key: keys.secret.clone(),
                    rotated_at: keys.rotated_at,
                };
                *self
                    .api_keys
                    .write()
                    .map_err(|e| DashError::Internal(format!("api key lock poisoned: {}", e)))? = keys;
                ActionResponse::ok("API keys rotated").with_data(&shown)
            }
            SettingsAction::CreateWebhook(form) => {
                validate_form(&form)?;
                let endpoint = WebhookEndpoint::new(
                    form.description.clone().unwrap_or_else(|| form.url.clone()),
                    WebhookStatus::Enabled,
                    None,
                    form.url,
                    form.events,
                    format!("whsec_{}", Uuid::new_v4().simple()),
                    form.description,
                    None,
                    100.0,
                );
                let endpoint = self.tables.webhooks.create(endpoint).await?;
                ActionResponse::ok("Webhook endpoint created").with_data(&endpoint)
            }
            SettingsAction::UpdateWebhook(update) => {
                validate_form(&update)?;
                let id = update.webhook_id;
                let mut endpoint = require(self.tables.webhooks.as_ref(), id).await?;
                if let Some(url) = update.url {
                    endpoint.url = url;
                }
                if let Some(events) = update.events {
                    endpoint.events = events;
                }
                if update.description.is_some() {
                    endpoint.description = update.description;
                }
                if let Some(status) = update.status {
                    endpoint.status = status;
                }
                endpoint.touch();
                let endpoint = self.tables.webhooks.update(&id, endpoint).await?;
                ActionResponse::ok("Webhook endpoint updated").with_data(&endpoint)
            }
            SettingsAction::DeleteWebhook { webhook_id } => {
                require(self.tables.webhooks.as_ref(), webhook_id).await?;
                self.tables.webhooks.soft_delete(&webhook_id).await?;
                Ok(ActionResponse::ok("Webhook endpoint deleted"))
            }
            SettingsAction::CreateTaxRate(form) => {
                validate_form(&form)?;
                let rate = TaxRate::new(
                    form.name.trim().to_string(),
                    TaxRateStatus::Active,
                    None,
                    form.percentage,
                    form.jurisdiction,
                    form.country,
                    form.state,
                    form.inclusive,
                );
                let rate = self.tables.tax_rates.create(rate).await?;
                ActionResponse::ok("Tax rate created").with_data(&rate)
            }
            SettingsAction::UpdateTaxRate(update) => {
                validate_form(&update)?;
                let id = update.tax_rate_id;
                let mut rate = require(self.tables.tax_rates.as_ref(), id).await?;
                if let Some(name) = update.name {
                    rate.name = name.trim().to_string();
                }
                if let Some(percentage) = update.percentage {
                    rate.percentage = percentage;
                }
                if let Some(jurisdiction) = update.jurisdiction {
                    rate.jurisdiction = jurisdiction;
                }
                if let Some(country) = update.country {
                    rate.country = country;
                }
                if update.state.is_some() {
                    rate.state = update.state;
                }
                if let Some(inclusive) = update.inclusive {
                    rate.inclusive = inclusive;
                }
                if let Some(active) = update.active {
                    rate.status = if active {
                        TaxRateStatus::Active
                    } else {
                        TaxRateStatus::Inactive
                    };
                }
                rate.touch();
                let rate = self.tables.tax_rates.update(&id, rate).await?;
                ActionResponse::ok("Tax rate updated").with_data(&rate)
            }
            SettingsAction::DeleteTaxRate { tax_rate_id } => {
                require(self.tables.tax_rates.as_ref(), tax_rate_id).await?;
                self.tables.tax_rates.soft_delete(&tax_rate_id).await?;
                Ok(ActionResponse::ok("Tax rate deleted"))
            }
            SettingsAction::ConnectIntegration { integration } => {
                let key = integration.trim().to_lowercase();
                if !INTEGRATIONS.contains(&key.as_str()) {
                    return Err(DashError::field(
                        "integration",
                        format!("unknown integration '{}'", integration),
                    ));
                }
                let connected: Vec<String> = {
                    let mut set = self
                        .integrations
                        .write()
                        .map_err(|e| DashError::Internal(format!("integration lock poisoned: {}", e)))?;
                    set.insert(key.clone());
                    set.iter().cloned().collect()
                };
                ActionResponse::ok(format!("{} connected", key))
                    .with_data(&json!({ "integration": key, "connected": connected }))
            }
            SettingsAction::GenerateTaxReport(request) => {
                let format = request.format()?;
                let report = self.tax_report(&request).await?;
                let data = match format {
                    ExportFormat::Json => serde_json::to_value(&report)?,
                    ExportFormat::Csv => {
                        let file = report.to_file(format)?;
                        json!({ "filename": file.filename, "csv": file.body, "period": report.period })
                    }
                };
                ActionResponse::ok(format!("Tax report covers {} invoices", report.invoice_count))
                    .with_data(&data)
            }
            SettingsAction::CancelAllSubscriptions => {
                let canceled = self.cancel_all().await?;
                ActionResponse::ok(format!("{} subscriptions canceled", canceled))
                    .with_data(&json!({ "canceled": canceled }))
            }
        }
    }

    /// Publishable key and masked secret of the current pair
    pub fn api_key_summary(&self) -> DashResult<serde_json::Value> {
        let keys = self
            .api_keys
            .read()
            .map_err(|e| DashError::Internal(format!("api key lock poisoned: {}", e)))?;
        Ok(json!({
            "publishable_key": keys.publishable,
            "secret_key": keys.masked_secret(),
            "rotated_at": keys.rotated_at,
        }))
    }

    pub fn connected_integrations(&self) -> DashResult<Vec<String>> {
        let set = self
            .integrations
            .read()
            .map_err(|e| DashError::Internal(format!("integration lock poisoned: {}", e)))?;
        Ok(set.iter().cloned().collect())
    }

    /// `GET /billing/settings?action=export_audit_log`
    pub fn export_audit_log(&self) -> DashResult<ExportFile> {
        let body = self.mutator.audit().to_csv()?;
        Ok(ExportFile::new(
            dated_filename("audit-log", ExportFormat::Csv),
            ExportFormat::Csv.content_type(),
            body,
        ))
    }
}
