//! Billing HTTP handlers

use super::model::{
    Coupon, CouponForm, Invoice, InvoiceForm, Refund, RefundForm, Subscription, SubscriptionForm,
    TaxRate, WebhookEndpoint,
};
use super::service::BillingService;
use super::settings::SettingsAction;
use super::stats::BillingStats;
use super::tax_report::TaxReportRequest;
use crate::core::action::{ActionResponse, parse_action};
use crate::core::error::{ActionError, DashResult};
use crate::core::extractors::{Actor, parse_id};
use crate::core::query::QueryParams;
use crate::core::validation::Validated;
use crate::export::ExportFile;
use crate::server::crud::CrudState;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{FromRef, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

/// Billing-specific AppState
#[derive(Clone, FromRef)]
pub struct BillingState {
    pub subscriptions: CrudState<Subscription>,
    pub invoices: CrudState<Invoice>,
    pub coupons: CrudState<Coupon>,
    pub refunds: CrudState<Refund>,
    pub tax_rates: CrudState<TaxRate>,
    pub webhooks: CrudState<WebhookEndpoint>,
    pub service: Arc<BillingService>,
}

// Subscriptions

pub async fn create_subscription(
    State(billing): State<Arc<BillingService>>,
    actor: Actor,
    Validated(form): Validated<SubscriptionForm>,
) -> DashResult<(StatusCode, Json<Subscription>)> {
    let subscription = billing.create_subscription(form, actor.id()).await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

pub async fn cancel_subscription(
    State(billing): State<Arc<BillingService>>,
    actor: Actor,
    Path(id): Path<String>,
) -> DashResult<Json<Subscription>> {
    let id = parse_id(&id)?;
    Ok(Json(billing.cancel_subscription(id, actor.id()).await?))
}

pub async fn pause_subscription(
    State(billing): State<Arc<BillingService>>,
    actor: Actor,
    Path(id): Path<String>,
) -> DashResult<Json<Subscription>> {
    let id = parse_id(&id)?;
    Ok(Json(billing.pause_subscription(id, actor.id()).await?))
}

pub async fn resume_subscription(
    State(billing): State<Arc<BillingService>>,
    actor: Actor,
    Path(id): Path<String>,
) -> DashResult<Json<Subscription>> {
    let id = parse_id(&id)?;
    Ok(Json(billing.resume_subscription(id, actor.id()).await?))
}

// Coupons

pub async fn create_coupon(
    State(billing): State<Arc<BillingService>>,
    actor: Actor,
    Validated(form): Validated<CouponForm>,
) -> DashResult<(StatusCode, Json<Coupon>)> {
    let coupon = billing.create_coupon(form, actor.id()).await?;
    Ok((StatusCode::CREATED, Json(coupon)))
}

// Invoices

pub async fn create_invoice(
    State(billing): State<Arc<BillingService>>,
    actor: Actor,
    Validated(form): Validated<InvoiceForm>,
) -> DashResult<(StatusCode, Json<Invoice>)> {
    let invoice = billing.create_invoice(form, actor.id()).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

pub async fn send_invoice(
    State(billing): State<Arc<BillingService>>,
    actor: Actor,
    Path(id): Path<String>,
) -> DashResult<Json<Invoice>> {
    let id = parse_id(&id)?;
    Ok(Json(billing.send_invoice(id, actor.id()).await?))
}

pub async fn remind_invoice(
    State(billing): State<Arc<BillingService>>,
    actor: Actor,
    Path(id): Path<String>,
) -> DashResult<Json<Invoice>> {
    let id = parse_id(&id)?;
    Ok(Json(billing.send_reminder(id, actor.id()).await?))
}

pub async fn retry_invoice(
    State(billing): State<Arc<BillingService>>,
    actor: Actor,
    Path(id): Path<String>,
) -> DashResult<Json<Invoice>> {
    let id = parse_id(&id)?;
    Ok(Json(billing.retry_payment(id, actor.id()).await?))
}

pub async fn void_invoice(
    State(billing): State<Arc<BillingService>>,
    actor: Actor,
    Path(id): Path<String>,
) -> DashResult<Json<Invoice>> {
    let id = parse_id(&id)?;
    Ok(Json(billing.void_invoice(id, actor.id()).await?))
}

/// Printable invoice page
pub async fn invoice_document(
    State(invoices): State<CrudState<Invoice>>,
    State(billing): State<Arc<BillingService>>,
    actor: Actor,
    Path(id): Path<String>,
) -> DashResult<Html<String>> {
    let id = parse_id(&id)?;
    invoices.load(id, actor).await?;
    Ok(Html(billing.invoice_document(id).await?))
}

// Refunds

pub async fn create_refund(
    State(billing): State<Arc<BillingService>>,
    actor: Actor,
    Validated(form): Validated<RefundForm>,
) -> DashResult<(StatusCode, Json<Refund>)> {
    let refund = billing.refund(form, actor.id()).await?;
    Ok((StatusCode::CREATED, Json(refund)))
}

// Dashboard

pub async fn billing_stats(
    State(billing): State<Arc<BillingService>>,
    actor: Actor,
    Query(params): Query<QueryParams>,
) -> DashResult<Json<BillingStats>> {
    let query = params.to_list_query(actor.id())?;
    Ok(Json(billing.stats(&query).await?))
}

/// `GET /billing/tax-report?start_date=..&end_date=..&format=csv`
pub async fn tax_report(
    State(billing): State<Arc<BillingService>>,
    Query(request): Query<TaxReportRequest>,
) -> DashResult<ExportFile> {
    let format = request.format()?;
    billing.tax_report(&request).await?.to_file(format)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SettingsQuery {
    pub action: Option<String>,
}

/// Current keys and integrations, or the audit log with
/// `?action=export_audit_log`
pub async fn read_settings(
    State(billing): State<Arc<BillingService>>,
    Query(query): Query<SettingsQuery>,
) -> DashResult<Response> {
    match query.action.as_deref() {
        None => Ok(Json(json!({
            "api_keys": billing.api_key_summary()?,
            "integrations": billing.connected_integrations()?,
        }))
        .into_response()),
        Some("export_audit_log") => Ok(billing.export_audit_log()?.into_response()),
        Some(other) => Err(ActionError::Unknown {
            action: other.to_string(),
        }
        .into()),
    }
}

/// `POST|PUT|DELETE /billing/settings` with `{"action": "...", ...}`
pub async fn apply_settings(
    State(billing): State<Arc<BillingService>>,
    actor: Actor,
    body: Bytes,
) -> DashResult<Json<ActionResponse>> {
    let body: Value = serde_json::from_slice(&body)?;
    let action: SettingsAction = parse_action(body, SettingsAction::NAMES)?;
    Ok(Json(billing.apply_settings(action, actor.id()).await?))
}
