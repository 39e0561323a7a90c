//! Billing dashboard statistics

use super::model::{
    Coupon, CouponStatus, Invoice, InvoiceStatus, Refund, RefundStatus, Subscription,
    SubscriptionStatus,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillingStats {
    /// Monthly recurring revenue of active subscriptions
    pub mrr: f64,
    pub arr: f64,
    pub active_subscriptions: usize,
    pub past_due: usize,
    pub trialing: usize,
    pub canceled: usize,
    pub open_invoices: usize,
    pub open_amount: f64,
    /// Amount paid on paid invoices
    pub total_revenue: f64,
    pub total_refunds: f64,
    pub active_coupons: usize,
}

impl BillingStats {
    pub fn compute(
        subscriptions: &[Subscription],
        invoices: &[Invoice],
        refunds: &[Refund],
        coupons: &[Coupon],
    ) -> Self {
        let subs = |status: SubscriptionStatus| subscriptions.iter().filter(move |s| s.status == status);
        let invoices_in = |status: InvoiceStatus| invoices.iter().filter(move |i| i.status == status);

        let mrr: f64 = subs(SubscriptionStatus::Active).map(Subscription::monthly_amount).sum();

        Self {
            mrr,
            arr: mrr * 12.0,
            active_subscriptions: subs(SubscriptionStatus::Active).count(),
            past_due: subs(SubscriptionStatus::PastDue).count(),
            trialing: subs(SubscriptionStatus::Trialing).count(),
            canceled: subs(SubscriptionStatus::Canceled).count(),
            open_invoices: invoices_in(InvoiceStatus::Open).count(),
            open_amount: invoices_in(InvoiceStatus::Open).map(|i| i.amount_remaining).sum(),
            total_revenue: invoices_in(InvoiceStatus::Paid).map(|i| i.amount_paid).sum(),
            total_refunds: refunds
                .iter()
                .filter(|r| r.status == RefundStatus::Succeeded)
                .map(|r| r.amount)
                .sum(),
            active_coupons: coupons.iter().filter(|c| c.status == CouponStatus::Valid).count(),
        }
    }
}
