//! Billing: subscriptions, invoices, coupons, refunds and settings

pub mod descriptor;
pub mod document;
pub mod gateway;
pub mod handlers;
pub mod model;
pub mod seed;
pub mod service;
pub mod settings;
pub mod stats;
pub mod tax_report;

pub use descriptor::{
    CouponDescriptor, InvoiceDescriptor, RefundDescriptor, SubscriptionDescriptor,
    TaxRateDescriptor, WebhookEndpointDescriptor,
};
pub use gateway::{PaymentGateway, SimulatedGateway};
pub use handlers::BillingState;
pub use model::{Coupon, Invoice, InvoiceStatus, Refund, Subscription, SubscriptionStatus, TaxRate, WebhookEndpoint};
pub use service::{BillingService, BillingTables};
pub use settings::SettingsAction;
pub use stats::BillingStats;

use crate::core::module::Module;
use crate::server::context::AppContext;
use crate::server::entity_registry::EntityRegistry;
use crate::storage::InMemoryDataService;
use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use axum::routing::get;
use std::sync::Arc;

pub struct BillingModule {
    state: BillingState,
}

impl BillingModule {
    /// Billing module backed by in-memory tables and the simulated gateway
    /// configured under `billing.gateway`
    pub fn new(context: &AppContext) -> Self {
        let tables = BillingTables {
            subscriptions: Arc::new(InMemoryDataService::<Subscription>::new()),
            invoices: Arc::new(InMemoryDataService::<Invoice>::new()),
            coupons: Arc::new(InMemoryDataService::<Coupon>::new()),
            refunds: Arc::new(InMemoryDataService::<Refund>::new()),
            tax_rates: Arc::new(InMemoryDataService::<TaxRate>::new()),
            webhooks: Arc::new(InMemoryDataService::<WebhookEndpoint>::new()),
        };
        let gateway = Arc::new(SimulatedGateway::new(context.config.billing.gateway));
        Self::with_services(context, tables, gateway)
    }

    pub fn with_services(
        context: &AppContext,
        tables: BillingTables,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let billing = &context.config.billing;
        let service = BillingService::new(
            tables.clone(),
            gateway,
            context.mutator.clone(),
            billing.currency.clone(),
            billing.company.clone(),
        );
        Self {
            state: BillingState {
                subscriptions: context.crud(tables.subscriptions),
                invoices: context.crud(tables.invoices),
                coupons: context.crud(tables.coupons),
                refunds: context.crud(tables.refunds),
                tax_rates: context.crud(tables.tax_rates),
                webhooks: context.crud(tables.webhooks),
                service: Arc::new(service),
            },
        }
    }

    pub fn service(&self) -> Arc<BillingService> {
        self.state.service.clone()
    }
}

#[async_trait]
impl Module for BillingModule {
    fn name(&self) -> &str {
        "billing"
    }

    fn entity_types(&self) -> Vec<&str> {
        vec![
            "subscription",
            "invoice",
            "coupon",
            "refund",
            "tax_rate",
            "webhook_endpoint",
        ]
    }

    fn register_entities(&self, registry: &mut EntityRegistry) {
        registry.register(Box::new(SubscriptionDescriptor {
            state: self.state.clone(),
        }));
        registry.register(Box::new(InvoiceDescriptor {
            state: self.state.clone(),
        }));
        registry.register(Box::new(CouponDescriptor {
            state: self.state.clone(),
        }));
        registry.register(Box::new(RefundDescriptor {
            state: self.state.clone(),
        }));
        registry.register(Box::new(TaxRateDescriptor {
            state: self.state.clone(),
        }));
        registry.register(Box::new(WebhookEndpointDescriptor {
            state: self.state.clone(),
        }));

        registry.register_routes(
            Router::new()
                .route(
                    "/billing/settings",
                    get(handlers::read_settings)
                        .post(handlers::apply_settings)
                        .put(handlers::apply_settings)
                        .delete(handlers::apply_settings),
                )
                .route("/billing/stats", get(handlers::billing_stats))
                .route("/billing/tax-report", get(handlers::tax_report))
                .with_state(self.state.clone()),
        );
    }

    async fn seed_demo(&self) -> Result<()> {
        seed::seed(self.state.service.tables()).await?;
        Ok(())
    }
}
