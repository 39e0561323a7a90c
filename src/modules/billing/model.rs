//! Subscriptions, invoices, coupons, refunds, tax rates and webhooks

use crate::{closed_set, impl_data_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

closed_set!(
    SubscriptionStatus {
        Active => "active",
        PastDue => "past_due",
        Canceled => "canceled",
        Trialing => "trialing",
        Paused => "paused",
        Incomplete => "incomplete",
    }
);

closed_set!(
    BillingInterval {
        Week => "week",
        Month => "month",
        Year => "year",
    }
);

closed_set!(
    InvoiceStatus {
        Draft => "draft",
        Open => "open",
        Processing => "processing",
        Paid => "paid",
        Void => "void",
        Uncollectible => "uncollectible",
    }
);

closed_set!(
    DiscountType {
        PercentOff => "percent_off",
        AmountOff => "amount_off",
    }
);

closed_set!(
    CouponDuration {
        Once => "once",
        Repeating => "repeating",
        Forever => "forever",
    }
);

closed_set!(
    CouponStatus {
        Valid => "valid",
        Invalid => "invalid",
    }
);

closed_set!(
    RefundReason {
        Duplicate => "duplicate",
        Fraudulent => "fraudulent",
        RequestedByCustomer => "requested_by_customer",
        ExpiredUncapturedCharge => "expired_uncaptured_charge",
    }
);

closed_set!(
    RefundStatus {
        Pending => "pending",
        Succeeded => "succeeded",
        Failed => "failed",
        Canceled => "canceled",
    }
);

closed_set!(
    TaxRateStatus {
        Active => "active",
        Inactive => "inactive",
    }
);

closed_set!(
    WebhookStatus {
        Enabled => "enabled",
        Disabled => "disabled",
    }
);

impl BillingInterval {
    /// Multiplier turning one charge into a monthly amount
    pub fn monthly_factor(self) -> f64 {
        match self {
            BillingInterval::Week => 4.0,
            BillingInterval::Month => 1.0,
            BillingInterval::Year => 1.0 / 12.0,
        }
    }
}

impl SubscriptionStatus {
    /// Statuses a bulk cancellation applies to
    pub fn is_cancellable(self) -> bool {
        !matches!(self, SubscriptionStatus::Canceled | SubscriptionStatus::Incomplete)
    }
}

impl_data_entity!(
    Subscription,
    "subscription",
    "subscriptions",
    SubscriptionStatus,
    ["name", "customer_name", "customer_email", "plan"],
    {
        customer_id: Option<Uuid>,
        customer_name: String,
        customer_email: String,
        plan: String,
        amount: f64,
        currency: String,
        interval: BillingInterval,
        current_period_start: DateTime<Utc>,
        current_period_end: DateTime<Utc>,
        cancel_at_period_end: bool,
        trial_end: Option<DateTime<Utc>>,
        canceled_at: Option<DateTime<Utc>>,
        paused_at: Option<DateTime<Utc>>,
        coupon_code: Option<String>,
    }
);

impl Subscription {
    /// Amount normalised to one month
    pub fn monthly_amount(&self) -> f64 {
        self.amount * self.interval.monthly_factor()
    }
}

/// One billed line of an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: u32,
    pub unit_amount: f64,
    pub amount: f64,
}

impl LineItem {
    pub fn new(description: impl Into<String>, quantity: u32, unit_amount: f64) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_amount,
            amount: unit_amount * f64::from(quantity),
        }
    }
}

impl_data_entity!(
    Invoice,
    "invoice",
    "invoices",
    InvoiceStatus,
    ["name", "number", "customer_name", "customer_email"],
    {
        number: String,
        customer_name: String,
        customer_email: String,
        subscription_id: Option<Uuid>,
        currency: String,
        subtotal: f64,
        tax: f64,
        total: f64,
        amount_paid: f64,
        amount_remaining: f64,
        due_date: DateTime<Utc>,
        paid_at: Option<DateTime<Utc>>,
        description: Option<String>,
        line_items: Vec<LineItem>,
        reminder_count: u32,
        last_reminder_at: Option<DateTime<Utc>>,
        last_retry_at: Option<DateTime<Utc>>,
    }
);

impl Invoice {
    pub fn mark_paid(&mut self, at: DateTime<Utc>) {
        self.status = InvoiceStatus::Paid;
        self.paid_at = Some(at);
        self.amount_paid = self.total;
        self.amount_remaining = 0.0;
    }
}

impl_data_entity!(
    Coupon,
    "coupon",
    "coupons",
    CouponStatus,
    ["name", "code"],
    {
        code: String,
        discount_type: DiscountType,
        value: f64,
        currency: Option<String>,
        duration: CouponDuration,
        duration_in_months: Option<u32>,
        max_redemptions: Option<u32>,
        times_redeemed: u32,
        expires_at: Option<DateTime<Utc>>,
    }
);

impl_data_entity!(
    Refund,
    "refund",
    "refunds",
    RefundStatus,
    ["name", "notes"],
    {
        invoice_id: Uuid,
        amount: f64,
        currency: String,
        reason: RefundReason,
        notes: Option<String>,
        gateway_reference: Option<String>,
        failure_message: Option<String>,
    }
);

impl Refund {
    /// Pending and succeeded refunds count against the refundable remainder
    pub fn holds_funds(&self) -> bool {
        matches!(self.status, RefundStatus::Pending | RefundStatus::Succeeded)
    }
}

impl_data_entity!(
    TaxRate,
    "tax_rate",
    "tax_rates",
    TaxRateStatus,
    ["name", "jurisdiction", "country"],
    {
        percentage: f64,
        jurisdiction: String,
        country: String,
        state: Option<String>,
        inclusive: bool,
    }
);

impl_data_entity!(
    WebhookEndpoint,
    "webhook_endpoint",
    "webhook_endpoints",
    WebhookStatus,
    ["name", "url", "description"],
    {
        url: String,
        events: Vec<String>,
        secret: String,
        description: Option<String>,
        last_delivery_at: Option<DateTime<Utc>>,
        success_rate: f64,
    }
);

/// Payload for `POST /subscriptions`
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SubscriptionForm {
    #[validate(email(message = "must be a valid email address"))]
    #[serde(alias = "customerEmail")]
    pub customer_email: String,
    #[serde(default, alias = "customerName")]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_id: Option<Uuid>,
    #[validate(custom(function = "crate::core::validation::validators::not_blank"))]
    #[serde(alias = "plan_id", alias = "planId")]
    pub plan: String,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default = "default_interval")]
    pub interval: BillingInterval,
    #[serde(default, alias = "trialDays")]
    pub trial_days: u32,
    #[serde(default, alias = "couponCode")]
    pub coupon_code: Option<String>,
}

fn default_interval() -> BillingInterval {
    BillingInterval::Month
}

/// Payload for `POST /coupons`
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CouponForm {
    #[validate(custom(function = "crate::core::validation::validators::not_blank"))]
    pub name: String,
    #[validate(custom(function = "crate::core::validation::validators::not_blank"))]
    pub code: String,
    #[serde(default = "default_discount_type", alias = "type")]
    pub discount_type: DiscountType,
    #[validate(custom(function = "crate::core::validation::validators::positive_amount"))]
    #[serde(alias = "discount_value")]
    pub value: f64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default = "default_duration")]
    pub duration: CouponDuration,
    #[serde(default)]
    pub duration_in_months: Option<u32>,
    #[validate(range(min = 1, message = "must be at least 1"))]
    #[serde(default)]
    pub max_redemptions: Option<u32>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

fn default_discount_type() -> DiscountType {
    DiscountType::PercentOff
}

fn default_duration() -> CouponDuration {
    CouponDuration::Once
}

/// A line of an [`InvoiceForm`]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LineItemForm {
    pub description: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub unit_amount: f64,
}

fn default_quantity() -> u32 {
    1
}

/// Payload for `POST /invoices`
///
/// The subtotal is `amount` when no line items are given, otherwise the sum
/// of the lines.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct InvoiceForm {
    #[validate(email(message = "must be a valid email address"))]
    #[serde(alias = "customerEmail")]
    pub customer_email: String,
    #[serde(default, alias = "customerName")]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub line_items: Vec<LineItemForm>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    #[serde(default)]
    pub tax: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub subscription_id: Option<Uuid>,
}

/// Payload for `POST /refunds`
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct RefundForm {
    #[serde(
        alias = "payment_id",
        alias = "transaction_id",
        alias = "transactionId",
        alias = "invoiceId"
    )]
    pub invoice_id: Uuid,
    #[validate(custom(function = "crate::core::validation::validators::positive_amount"))]
    pub amount: f64,
    #[serde(default = "default_refund_reason")]
    pub reason: RefundReason,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_refund_reason() -> RefundReason {
    RefundReason::RequestedByCustomer
}

/// Webhook fields of a `create_webhook` settings action
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate)]
pub struct WebhookForm {
    #[validate(custom(function = "crate::core::validation::validators::http_url"))]
    pub url: String,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Webhook fields of an `update_webhook` settings action
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate)]
pub struct WebhookUpdate {
    #[serde(alias = "webhookId")]
    pub webhook_id: Uuid,
    #[validate(custom(function = "crate::core::validation::validators::http_url"))]
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub events: Option<Vec<String>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<WebhookStatus>,
}

/// Tax rate fields of a `create_tax_rate` settings action
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate)]
pub struct TaxRateForm {
    #[validate(custom(function = "crate::core::validation::validators::not_blank"))]
    pub name: String,
    #[validate(custom(function = "crate::core::validation::validators::percentage"))]
    pub percentage: f64,
    #[serde(default)]
    pub jurisdiction: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub inclusive: bool,
}

/// Tax rate fields of an `update_tax_rate` settings action
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate)]
pub struct TaxRateUpdate {
    #[serde(alias = "taxRateId")]
    pub tax_rate_id: Uuid,
    #[validate(custom(function = "crate::core::validation::validators::not_blank"))]
    #[serde(default)]
    pub name: Option<String>,
    #[validate(custom(function = "crate::core::validation::validators::percentage"))]
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub jurisdiction: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub inclusive: Option<bool>,
    #[serde(default)]
    pub active: Option<bool>,
}
