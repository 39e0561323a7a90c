//! Entity descriptors for the billing tables

use super::handlers::{
    BillingState, cancel_subscription, create_coupon, create_invoice, create_refund,
    create_subscription, invoice_document, pause_subscription, remind_invoice,
    resume_subscription, retry_invoice, send_invoice, void_invoice,
};
use super::model::{Coupon, Invoice, Refund, Subscription, TaxRate, WebhookEndpoint};
use crate::server::crud;
use crate::server::entity_registry::EntityDescriptor;
use axum::Router;
use axum::routing::{get, post};

/// Descriptor for the Subscription table
pub struct SubscriptionDescriptor {
    pub state: BillingState,
}

impl EntityDescriptor for SubscriptionDescriptor {
    fn entity_type(&self) -> &str {
        "subscription"
    }

    fn plural(&self) -> &str {
        "subscriptions"
    }

    fn build_routes(&self) -> Router {
        Router::new()
            .route(
                "/subscriptions",
                get(crud::list::<Subscription>).post(create_subscription),
            )
            .route("/subscriptions/export", get(crud::export::<Subscription>))
            .route(
                "/subscriptions/{id}",
                get(crud::fetch::<Subscription>).delete(crud::remove::<Subscription>),
            )
            .route(
                "/subscriptions/{id}/restore",
                post(crud::restore::<Subscription>),
            )
            .route("/subscriptions/{id}/cancel", post(cancel_subscription))
            .route("/subscriptions/{id}/pause", post(pause_subscription))
            .route("/subscriptions/{id}/resume", post(resume_subscription))
            .with_state(self.state.clone())
    }
}

/// Descriptor for the Invoice table
pub struct InvoiceDescriptor {
    pub state: BillingState,
}

impl EntityDescriptor for InvoiceDescriptor {
    fn entity_type(&self) -> &str {
        "invoice"
    }

    fn plural(&self) -> &str {
        "invoices"
    }

    fn build_routes(&self) -> Router {
        Router::new()
            .route("/invoices", get(crud::list::<Invoice>).post(create_invoice))
            .route("/invoices/export", get(crud::export::<Invoice>))
            .route(
                "/invoices/{id}",
                get(crud::fetch::<Invoice>).delete(crud::remove::<Invoice>),
            )
            .route("/invoices/{id}/restore", post(crud::restore::<Invoice>))
            .route("/invoices/{id}/send", post(send_invoice))
            .route("/invoices/{id}/remind", post(remind_invoice))
            .route("/invoices/{id}/retry", post(retry_invoice))
            .route("/invoices/{id}/void", post(void_invoice))
            .route("/invoices/{id}/document", get(invoice_document))
            .with_state(self.state.clone())
    }
}

/// Descriptor for the Coupon table
pub struct CouponDescriptor {
    pub state: BillingState,
}

impl EntityDescriptor for CouponDescriptor {
    fn entity_type(&self) -> &str {
        "coupon"
    }

    fn plural(&self) -> &str {
        "coupons"
    }

    fn build_routes(&self) -> Router {
        Router::new()
            .route("/coupons", get(crud::list::<Coupon>).post(create_coupon))
            .route("/coupons/export", get(crud::export::<Coupon>))
            .route(
                "/coupons/{id}",
                get(crud::fetch::<Coupon>).delete(crud::remove::<Coupon>),
            )
            .route("/coupons/{id}/restore", post(crud::restore::<Coupon>))
            .with_state(self.state.clone())
    }
}

/// Descriptor for the Refund table. Refunds are never deleted.
pub struct RefundDescriptor {
    pub state: BillingState,
}

impl EntityDescriptor for RefundDescriptor {
    fn entity_type(&self) -> &str {
        "refund"
    }

    fn plural(&self) -> &str {
        "refunds"
    }

    fn build_routes(&self) -> Router {
        Router::new()
            .route("/refunds", get(crud::list::<Refund>).post(create_refund))
            .route("/refunds/export", get(crud::export::<Refund>))
            .route("/refunds/{id}", get(crud::fetch::<Refund>))
            .route("/payments/refund", post(create_refund))
            .with_state(self.state.clone())
    }
}

/// Descriptor for the TaxRate table; writes go through `/billing/settings`
pub struct TaxRateDescriptor {
    pub state: BillingState,
}

impl EntityDescriptor for TaxRateDescriptor {
    fn entity_type(&self) -> &str {
        "tax_rate"
    }

    fn plural(&self) -> &str {
        "tax_rates"
    }

    fn build_routes(&self) -> Router {
        Router::new()
            .route("/tax_rates", get(crud::list::<TaxRate>))
            .route("/tax_rates/export", get(crud::export::<TaxRate>))
            .route(
                "/tax_rates/{id}",
                get(crud::fetch::<TaxRate>).delete(crud::remove::<TaxRate>),
            )
            .route("/tax_rates/{id}/restore", post(crud::restore::<TaxRate>))
            .with_state(self.state.clone())
    }
}

/// Descriptor for the WebhookEndpoint table; writes go through `/billing/settings`
pub struct WebhookEndpointDescriptor {
    pub state: BillingState,
}

impl EntityDescriptor for WebhookEndpointDescriptor {
    fn entity_type(&self) -> &str {
        "webhook_endpoint"
    }

    fn plural(&self) -> &str {
        "webhook_endpoints"
    }

    fn build_routes(&self) -> Router {
        Router::new()
            .route("/webhook_endpoints", get(crud::list::<WebhookEndpoint>))
            .route(
                "/webhook_endpoints/{id}",
                get(crud::fetch::<WebhookEndpoint>).delete(crud::remove::<WebhookEndpoint>),
            )
            .with_state(self.state.clone())
    }
}
