//! Demo billing data

use super::model::{
    BillingInterval, Coupon, CouponDuration, CouponStatus, DiscountType, Invoice, InvoiceStatus,
    LineItem, Subscription, SubscriptionStatus, TaxRate, TaxRateStatus,
};
use super::service::{BillingTables, PERIOD_DAYS, invoice_number};
use anyhow::Result;
use chrono::{Duration, Utc};

struct DemoCustomer {
    name: &'static str,
    email: &'static str,
    plan: &'static str,
    amount: f64,
    interval: BillingInterval,
    status: SubscriptionStatus,
}

const CUSTOMERS: &[DemoCustomer] = &[
    DemoCustomer {
        name: "Northwind Traders",
        email: "billing@northwind.test",
        plan: "Enterprise",
        amount: 499.0,
        interval: BillingInterval::Month,
        status: SubscriptionStatus::Active,
    },
    DemoCustomer {
        name: "Contoso Ltd",
        email: "ap@contoso.test",
        plan: "Business",
        amount: 1_188.0,
        interval: BillingInterval::Year,
        status: SubscriptionStatus::Active,
    },
    DemoCustomer {
        name: "Fabrikam",
        email: "finance@fabrikam.test",
        plan: "Starter",
        amount: 49.0,
        interval: BillingInterval::Month,
        status: SubscriptionStatus::PastDue,
    },
    DemoCustomer {
        name: "Tailspin Toys",
        email: "ops@tailspin.test",
        plan: "Business",
        amount: 99.0,
        interval: BillingInterval::Month,
        status: SubscriptionStatus::Trialing,
    },
];

const TAX_PERCENT: f64 = 8.25;

/// Subscriptions with one invoice each, a welcome coupon and a sales tax
/// rate. Returns the number of subscriptions created.
pub async fn seed(tables: &BillingTables) -> Result<usize> {
    let now = Utc::now();

    for (index, customer) in CUSTOMERS.iter().enumerate() {
        let started = now - Duration::days(PERIOD_DAYS * (index as i64 + 1));
        let trialing = customer.status == SubscriptionStatus::Trialing;
        let subscription = tables
            .subscriptions
            .create(Subscription::new(
                format!("{} - {}", customer.name, customer.plan),
                customer.status,
                None,
                None,
                customer.name.to_string(),
                customer.email.to_string(),
                customer.plan.to_string(),
                customer.amount,
                "USD".to_string(),
                customer.interval,
                started,
                started + Duration::days(PERIOD_DAYS),
                false,
                trialing.then(|| now + Duration::days(14)),
                None,
                None,
                None,
            ))
            .await?;

        if trialing {
            continue;
        }

        let subtotal = customer.amount;
        let tax = (subtotal * TAX_PERCENT).round() / 100.0;
        let number = format!("{}-{}", invoice_number(started), index + 1);
        let mut invoice = Invoice::new(
            number.clone(),
            InvoiceStatus::Open,
            None,
            number,
            customer.name.to_string(),
            customer.email.to_string(),
            Some(subscription.id),
            "USD".to_string(),
            subtotal,
            tax,
            subtotal + tax,
            0.0,
            subtotal + tax,
            started + Duration::days(PERIOD_DAYS),
            None,
            Some(format!("{} plan", customer.plan)),
            vec![LineItem::new(format!("{} plan", customer.plan), 1, subtotal)],
            0,
            None,
            None,
        );
        if customer.status == SubscriptionStatus::Active {
            invoice.mark_paid(started + Duration::days(1));
        }
        tables.invoices.create(invoice).await?;
    }

    tables
        .coupons
        .create(Coupon::new(
            "Welcome offer".to_string(),
            CouponStatus::Valid,
            None,
            "WELCOME10".to_string(),
            DiscountType::PercentOff,
            10.0,
            None,
            CouponDuration::Once,
            None,
            Some(100),
            0,
            Some(now + Duration::days(90)),
        ))
        .await?;

    tables
        .tax_rates
        .create(TaxRate::new(
            "California sales tax".to_string(),
            TaxRateStatus::Active,
            None,
            TAX_PERCENT,
            "California".to_string(),
            "US".to_string(),
            Some("CA".to_string()),
            false,
        ))
        .await?;

    Ok(CUSTOMERS.len())
}
