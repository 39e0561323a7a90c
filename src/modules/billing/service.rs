//! Billing operations: subscriptions, coupons, invoices and refunds

use super::document::render_invoice;
use super::gateway::PaymentGateway;
use super::model::{
    Coupon, CouponForm, CouponStatus, DiscountType, Invoice, InvoiceForm, InvoiceStatus, LineItem,
    Refund, RefundForm, RefundStatus, Subscription, SubscriptionForm, SubscriptionStatus, TaxRate,
    WebhookEndpoint,
};
use super::settings::ApiKeys;
use super::stats::BillingStats;
use super::tax_report::{TaxReport, TaxReportRequest};
use crate::config::CompanyProfile;
use crate::core::error::{DashError, DashResult};
use crate::core::mutation::{Mutation, Mutator};
use crate::core::query::ListQuery;
use crate::core::service::{live_rows, require};
use crate::core::validation::validate_form;
use crate::core::{DataService, Entity};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Length of a billing period and default payment term
pub const PERIOD_DAYS: i64 = 30;

/// Tables the billing service reads and writes
#[derive(Clone)]
pub struct BillingTables {
    pub subscriptions: Arc<dyn DataService<Subscription>>,
    pub invoices: Arc<dyn DataService<Invoice>>,
    pub coupons: Arc<dyn DataService<Coupon>>,
    pub refunds: Arc<dyn DataService<Refund>>,
    pub tax_rates: Arc<dyn DataService<TaxRate>>,
    pub webhooks: Arc<dyn DataService<WebhookEndpoint>>,
}

pub struct BillingService {
    pub(super) tables: BillingTables,
    pub(super) gateway: Arc<dyn PaymentGateway>,
    pub(super) mutator: Mutator,
    pub(super) api_keys: RwLock<ApiKeys>,
    pub(super) integrations: RwLock<BTreeSet<String>>,
    currency: String,
    company: CompanyProfile,
}

impl BillingService {
    pub fn new(
        tables: BillingTables,
        gateway: Arc<dyn PaymentGateway>,
        mutator: Mutator,
        currency: String,
        company: CompanyProfile,
    ) -> Self {
        Self {
            tables,
            gateway,
            mutator,
            api_keys: RwLock::new(ApiKeys::generate()),
            integrations: RwLock::new(BTreeSet::new()),
            currency,
            company,
        }
    }

    pub fn tables(&self) -> &BillingTables {
        &self.tables
    }

    pub fn mutator(&self) -> &Mutator {
        &self.mutator
    }

    // Subscriptions

    /// `trialing` when trial days are given, `active` otherwise; the first
    /// period lasts thirty days
    pub async fn create_subscription(
        &self,
        form: SubscriptionForm,
        actor: Option<Uuid>,
    ) -> DashResult<Subscription> {
        self.mutator
            .run(Mutation::create("subscription").by(actor), async move {
                validate_form(&form)?;
                let coupon_code = match form.coupon_code.as_deref().map(str::trim) {
                    Some(code) if !code.is_empty() => Some(self.redeem_coupon(code).await?),
                    _ => None,
                };

                let now = Utc::now();
                let (status, trial_end) = if form.trial_days > 0 {
                    (
                        SubscriptionStatus::Trialing,
                        Some(now + Duration::days(i64::from(form.trial_days))),
                    )
                } else {
                    (SubscriptionStatus::Active, None)
                };
                let customer_name = form
                    .customer_name
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| form.customer_email.clone());

                let subscription = Subscription::new(
                    format!("{} - {}", customer_name, form.plan),
                    status,
                    actor,
                    form.customer_id,
                    customer_name,
                    form.customer_email,
                    form.plan,
                    form.amount,
                    form.currency.unwrap_or_else(|| self.currency.clone()),
                    form.interval,
                    now,
                    now + Duration::days(PERIOD_DAYS),
                    false,
                    trial_end,
                    None,
                    None,
                    coupon_code,
                );
                Ok(self.tables.subscriptions.create(subscription).await?)
            })
            .await
    }

    pub async fn cancel_subscription(&self, id: Uuid, actor: Option<Uuid>) -> DashResult<Subscription> {
        self.subscription_transition(id, "cancel", actor, |sub, now| {
            if sub.status == SubscriptionStatus::Canceled {
                return Err(DashError::invalid_transition("subscription", "canceled", "cancel"));
            }
            cancel(sub, now);
            Ok(())
        })
        .await
    }

    pub async fn pause_subscription(&self, id: Uuid, actor: Option<Uuid>) -> DashResult<Subscription> {
        self.subscription_transition(id, "pause", actor, |sub, now| {
            if matches!(sub.status, SubscriptionStatus::Canceled | SubscriptionStatus::Paused) {
                return Err(DashError::invalid_transition(
                    "subscription",
                    sub.status.to_string(),
                    "pause",
                ));
            }
            sub.status = SubscriptionStatus::Paused;
            sub.paused_at = Some(now);
            Ok(())
        })
        .await
    }

    pub async fn resume_subscription(&self, id: Uuid, actor: Option<Uuid>) -> DashResult<Subscription> {
        self.subscription_transition(id, "resume", actor, |sub, _| {
            if sub.status != SubscriptionStatus::Paused {
                return Err(DashError::invalid_transition(
                    "subscription",
                    sub.status.to_string(),
                    "resume",
                ));
            }
            sub.status = SubscriptionStatus::Active;
            sub.paused_at = None;
            Ok(())
        })
        .await
    }

    async fn subscription_transition<F>(
        &self,
        id: Uuid,
        operation: &str,
        actor: Option<Uuid>,
        apply: F,
    ) -> DashResult<Subscription>
    where
        F: FnOnce(&mut Subscription, DateTime<Utc>) -> DashResult<()>,
    {
        self.mutator
            .run(
                Mutation::action("subscription", operation, Some(id)).by(actor),
                async move {
                    let mut sub = require(self.tables.subscriptions.as_ref(), id).await?;
                    apply(&mut sub, Utc::now())?;
                    sub.touch();
                    Ok(self.tables.subscriptions.update(&id, sub).await?)
                },
            )
            .await
    }

    /// Cancel every subscription that is not already over. Returns the count.
    pub(super) async fn cancel_all(&self) -> DashResult<usize> {
        let now = Utc::now();
        let mut canceled = 0;
        for mut sub in live_rows(self.tables.subscriptions.as_ref()).await? {
            if !sub.status.is_cancellable() {
                continue;
            }
            cancel(&mut sub, now);
            sub.touch();
            let id = sub.id;
            self.tables.subscriptions.update(&id, sub).await?;
            canceled += 1;
        }
        Ok(canceled)
    }

    // Coupons

    /// Codes are stored upper-cased and must be unique among live coupons
    pub async fn create_coupon(&self, form: CouponForm, actor: Option<Uuid>) -> DashResult<Coupon> {
        self.mutator
            .run(Mutation::create("coupon").by(actor), async move {
                validate_form(&form)?;
                if form.discount_type == DiscountType::PercentOff && form.value > 100.0 {
                    return Err(DashError::field("value", "percentage coupons must lie between 0 and 100"));
                }
                let code = form.code.trim().to_uppercase();
                if self.find_coupon(&code).await?.is_some() {
                    return Err(DashError::field("code", format!("coupon code {} already exists", code)));
                }

                let coupon = Coupon::new(
                    form.name.trim().to_string(),
                    CouponStatus::Valid,
                    actor,
                    code,
                    form.discount_type,
                    form.value,
                    form.currency,
                    form.duration,
                    form.duration_in_months,
                    form.max_redemptions,
                    0,
                    form.expires_at,
                );
                Ok(self.tables.coupons.create(coupon).await?)
            })
            .await
    }

    async fn find_coupon(&self, code: &str) -> DashResult<Option<Coupon>> {
        let code = code.to_uppercase();
        Ok(live_rows(self.tables.coupons.as_ref())
            .await?
            .into_iter()
            .find(|c| c.code == code))
    }

    /// Count one redemption; exhausted or expired coupons become `invalid`
    async fn redeem_coupon(&self, code: &str) -> DashResult<String> {
        let mut coupon = self
            .find_coupon(code)
            .await?
            .filter(|c| c.status == CouponStatus::Valid)
            .ok_or_else(|| DashError::field("coupon_code", format!("{} is not a valid coupon", code)))?;

        let now = Utc::now();
        if coupon.expires_at.is_some_and(|at| at <= now) {
            coupon.set_status(CouponStatus::Invalid);
            let id = coupon.id;
            self.tables.coupons.update(&id, coupon).await?;
            return Err(DashError::field("coupon_code", format!("{} has expired", code)));
        }

        coupon.times_redeemed += 1;
        if coupon
            .max_redemptions
            .is_some_and(|max| coupon.times_redeemed >= max)
        {
            coupon.status = CouponStatus::Invalid;
        }
        coupon.touch();
        let code = coupon.code.clone();
        let id = coupon.id;
        self.tables.coupons.update(&id, coupon).await?;
        Ok(code)
    }

    // Invoices

    /// New `draft` invoice numbered `INV-<base36 millis>`, due in thirty days
    /// unless a due date is given
    pub async fn create_invoice(&self, form: InvoiceForm, actor: Option<Uuid>) -> DashResult<Invoice> {
        self.mutator
            .run(Mutation::create("invoice").by(actor), async move {
                validate_form(&form)?;
                let line_items: Vec<LineItem> = form
                    .line_items
                    .iter()
                    .map(|l| LineItem::new(l.description.clone(), l.quantity, l.unit_amount))
                    .collect();
                let subtotal = if line_items.is_empty() {
                    form.amount.unwrap_or(0.0)
                } else {
                    line_items.iter().map(|l| l.amount).sum()
                };
                if !(subtotal > 0.0 && subtotal.is_finite()) {
                    return Err(DashError::field("amount", "must be greater than 0"));
                }

                let now = Utc::now();
                let total = subtotal + form.tax;
                let number = invoice_number(now);
                let customer_name = form
                    .customer_name
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| form.customer_email.clone());

                let invoice = Invoice::new(
                    number.clone(),
                    InvoiceStatus::Draft,
                    actor,
                    number,
                    customer_name,
                    form.customer_email,
                    form.subscription_id,
                    form.currency.unwrap_or_else(|| self.currency.clone()),
                    subtotal,
                    form.tax,
                    total,
                    0.0,
                    total,
                    form.due_date.unwrap_or(now + Duration::days(PERIOD_DAYS)),
                    None,
                    form.description,
                    line_items,
                    0,
                    None,
                    None,
                );
                Ok(self.tables.invoices.create(invoice).await?)
            })
            .await
    }

    /// `draft` -> `open`
    pub async fn send_invoice(&self, id: Uuid, actor: Option<Uuid>) -> DashResult<Invoice> {
        self.invoice_transition(id, "send", actor, |invoice| {
            if invoice.status != InvoiceStatus::Draft {
                return Err(DashError::invalid_transition("invoice", invoice.status.to_string(), "send"));
            }
            invoice.status = InvoiceStatus::Open;
            Ok(())
        })
        .await
    }

    pub async fn send_reminder(&self, id: Uuid, actor: Option<Uuid>) -> DashResult<Invoice> {
        self.invoice_transition(id, "send_reminder", actor, |invoice| {
            if !matches!(invoice.status, InvoiceStatus::Open | InvoiceStatus::Uncollectible) {
                return Err(DashError::invalid_transition(
                    "invoice",
                    invoice.status.to_string(),
                    "send_reminder",
                ));
            }
            invoice.reminder_count += 1;
            invoice.last_reminder_at = Some(Utc::now());
            Ok(())
        })
        .await
    }

    pub async fn void_invoice(&self, id: Uuid, actor: Option<Uuid>) -> DashResult<Invoice> {
        self.invoice_transition(id, "void", actor, |invoice| {
            if matches!(invoice.status, InvoiceStatus::Paid | InvoiceStatus::Void) {
                return Err(DashError::invalid_transition("invoice", invoice.status.to_string(), "void"));
            }
            invoice.status = InvoiceStatus::Void;
            invoice.amount_remaining = 0.0;
            Ok(())
        })
        .await
    }

    async fn invoice_transition<F>(
        &self,
        id: Uuid,
        operation: &str,
        actor: Option<Uuid>,
        apply: F,
    ) -> DashResult<Invoice>
    where
        F: FnOnce(&mut Invoice) -> DashResult<()>,
    {
        self.mutator
            .run(
                Mutation::action("invoice", operation, Some(id)).by(actor),
                async move {
                    let mut invoice = require(self.tables.invoices.as_ref(), id).await?;
                    apply(&mut invoice)?;
                    invoice.touch();
                    Ok(self.tables.invoices.update(&id, invoice).await?)
                },
            )
            .await
    }

    /// Charge the invoice through the gateway
    pub async fn retry_payment(&self, id: Uuid, actor: Option<Uuid>) -> DashResult<Invoice> {
        self.mutator
            .run(
                Mutation::action("invoice", "retry_payment", Some(id))
                    .by(actor)
                    .titled("Payment successful", "Payment failed"),
                self.collect_payment(id),
            )
            .await
    }

    /// `processing` while the gateway call runs, then `paid` on success or
    /// back to `open` on failure
    pub(super) async fn collect_payment(&self, id: Uuid) -> DashResult<Invoice> {
        let mut invoice = require(self.tables.invoices.as_ref(), id).await?;
        if matches!(invoice.status, InvoiceStatus::Paid | InvoiceStatus::Void) {
            return Err(DashError::invalid_transition(
                "invoice",
                invoice.status.to_string(),
                "retry_payment",
            ));
        }

        invoice.status = InvoiceStatus::Processing;
        invoice.last_retry_at = Some(Utc::now());
        invoice.touch();
        let mut invoice = self.tables.invoices.update(&id, invoice).await?;

        match self.gateway.charge(&invoice).await {
            Ok(receipt) => {
                tracing::info!(invoice = %invoice.number, reference = %receipt.reference, "payment collected");
                invoice.mark_paid(receipt.processed_at);
                invoice.touch();
                Ok(self.tables.invoices.update(&id, invoice).await?)
            }
            Err(err) => {
                invoice.status = InvoiceStatus::Open;
                invoice.paid_at = None;
                invoice.touch();
                self.tables.invoices.update(&id, invoice).await?;
                Err(err.into())
            }
        }
    }

    pub async fn invoice_document(&self, id: Uuid) -> DashResult<String> {
        let invoice = require(self.tables.invoices.as_ref(), id).await?;
        render_invoice(&invoice, &self.company)
    }

    // Refunds

    /// Paid amount not yet claimed by pending or succeeded refunds
    pub async fn refundable_amount(&self, invoice: &Invoice) -> DashResult<f64> {
        let claimed: f64 = live_rows(self.tables.refunds.as_ref())
            .await?
            .iter()
            .filter(|r| r.invoice_id == invoice.id && r.holds_funds())
            .map(|r| r.amount)
            .sum();
        Ok((invoice.amount_paid - claimed).max(0.0))
    }

    /// Creates a `pending` refund, then settles it through the gateway
    pub async fn refund(&self, form: RefundForm, actor: Option<Uuid>) -> DashResult<Refund> {
        self.mutator
            .run(
                Mutation::action("refund", "refund", None)
                    .by(actor)
                    .titled("Refund processed", "Failed to process refund"),
                async move {
                    validate_form(&form)?;
                    let invoice = require(self.tables.invoices.as_ref(), form.invoice_id).await?;
                    if invoice.status != InvoiceStatus::Paid {
                        return Err(DashError::invalid_transition(
                            "invoice",
                            invoice.status.to_string(),
                            "refund",
                        ));
                    }
                    let refundable = self.refundable_amount(&invoice).await?;
                    if form.amount > refundable + f64::EPSILON {
                        return Err(DashError::field(
                            "amount",
                            format!("exceeds the refundable amount of {:.2}", refundable),
                        ));
                    }

                    let refund = self
                        .tables
                        .refunds
                        .create(Refund::new(
                            format!("Refund for {}", invoice.number),
                            RefundStatus::Pending,
                            actor,
                            invoice.id,
                            form.amount,
                            invoice.currency.clone(),
                            form.reason,
                            form.notes,
                            None,
                            None,
                        ))
                        .await?;
                    let refund_id = refund.id;
                    let mut refund = refund;

                    match self.gateway.refund(&invoice, form.amount).await {
                        Ok(receipt) => {
                            refund.set_status(RefundStatus::Succeeded);
                            refund.gateway_reference = Some(receipt.reference);
                            Ok(self.tables.refunds.update(&refund_id, refund).await?)
                        }
                        Err(err) => {
                            refund.set_status(RefundStatus::Failed);
                            refund.failure_message = Some(err.to_string());
                            self.tables.refunds.update(&refund_id, refund).await?;
                            Err(err.into())
                        }
                    }
                },
            )
            .await
    }

    // Reports

    pub async fn stats(&self, query: &ListQuery) -> DashResult<BillingStats> {
        let subscriptions = self.tables.subscriptions.query(query).await?;
        let invoices = self.tables.invoices.query(query).await?;
        let refunds = self.tables.refunds.query(query).await?;
        let coupons = self.tables.coupons.query(query).await?;
        Ok(BillingStats::compute(&subscriptions, &invoices, &refunds, &coupons))
    }

    pub async fn tax_report(&self, request: &TaxReportRequest) -> DashResult<TaxReport> {
        let invoices = live_rows(self.tables.invoices.as_ref()).await?;
        TaxReport::build(request, &invoices)
    }
}

fn cancel(sub: &mut Subscription, now: DateTime<Utc>) {
    sub.status = SubscriptionStatus::Canceled;
    sub.cancel_at_period_end = true;
    sub.canceled_at = Some(now);
}

/// `INV-` followed by the upper-cased base-36 millisecond timestamp
pub fn invoice_number(at: DateTime<Utc>) -> String {
    const DIGITS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut n = at.timestamp_millis().max(0) as u64;
    let mut digits = Vec::new();
    loop {
        digits.push(DIGITS[(n % 36) as usize]);
        n /= 36;
        if n == 0 {
            break;
        }
    }
    digits.reverse();
    format!("INV-{}", String::from_utf8_lossy(&digits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayMode;
    use crate::modules::billing::gateway::SimulatedGateway;
    use crate::modules::billing::model::BillingInterval;
    use crate::storage::InMemoryDataService;
    use chrono::TimeZone;
    use serde_json::json;

    fn tables() -> BillingTables {
        BillingTables {
            subscriptions: Arc::new(InMemoryDataService::<Subscription>::new()),
            invoices: Arc::new(InMemoryDataService::<Invoice>::new()),
            coupons: Arc::new(InMemoryDataService::<Coupon>::new()),
            refunds: Arc::new(InMemoryDataService::<Refund>::new()),
            tax_rates: Arc::new(InMemoryDataService::<TaxRate>::new()),
            webhooks: Arc::new(InMemoryDataService::<WebhookEndpoint>::new()),
        }
    }

    fn service(mode: GatewayMode) -> BillingService {
        BillingService::new(
            tables(),
            Arc::new(SimulatedGateway::new(mode)),
            Mutator::default(),
            "USD".to_string(),
            CompanyProfile::default(),
        )
    }

    fn subscription_form(trial_days: u32) -> SubscriptionForm {
        serde_json::from_value(json!({
            "customer_email": "ops@acme.test",
            "customer_name": "Acme",
            "plan": "pro",
            "amount": 99.0,
            "trial_days": trial_days
        }))
        .unwrap()
    }

    fn invoice_form(amount: f64) -> InvoiceForm {
        serde_json::from_value(json!({
            "customer_email": "ap@acme.test",
            "amount": amount,
            "tax": 10.0
        }))
        .unwrap()
    }

    async fn paid_invoice(billing: &BillingService) -> Invoice {
        let invoice = billing.create_invoice(invoice_form(100.0), None).await.unwrap();
        billing.send_invoice(invoice.id, None).await.unwrap();
        billing.retry_payment(invoice.id, None).await.unwrap()
    }

    #[test]
    fn test_invoice_number_is_base36_millis() {
        let at = Utc.timestamp_millis_opt(36 * 36 + 35).unwrap();
        assert_eq!(invoice_number(at), "INV-10Z");
        let at = Utc.timestamp_millis_opt(0).unwrap();
        assert_eq!(invoice_number(at), "INV-0");
    }

    #[tokio::test]
    async fn test_subscription_trial_and_period() {
        let billing = service(GatewayMode::Approve);

        let trial = billing.create_subscription(subscription_form(14), None).await.unwrap();
        assert_eq!(trial.status, SubscriptionStatus::Trialing);
        let trial_days = (trial.trial_end.unwrap() - trial.current_period_start).num_days();
        assert_eq!(trial_days, 14);
        assert_eq!(
            (trial.current_period_end - trial.current_period_start).num_days(),
            PERIOD_DAYS
        );

        let active = billing.create_subscription(subscription_form(0), None).await.unwrap();
        assert_eq!(active.status, SubscriptionStatus::Active);
        assert!(active.trial_end.is_none());
        assert_eq!(active.interval, BillingInterval::Month);
    }

    #[tokio::test]
    async fn test_pause_resume_cancel() {
        let billing = service(GatewayMode::Approve);
        let sub = billing.create_subscription(subscription_form(0), None).await.unwrap();

        let paused = billing.pause_subscription(sub.id, None).await.unwrap();
        assert_eq!(paused.status, SubscriptionStatus::Paused);
        assert!(paused.paused_at.is_some());

        let resumed = billing.resume_subscription(sub.id, None).await.unwrap();
        assert_eq!(resumed.status, SubscriptionStatus::Active);
        assert!(resumed.paused_at.is_none());

        let err = billing.resume_subscription(sub.id, None).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_TRANSITION");

        let canceled = billing.cancel_subscription(sub.id, None).await.unwrap();
        assert_eq!(canceled.status, SubscriptionStatus::Canceled);
        assert!(canceled.cancel_at_period_end);
        assert!(canceled.canceled_at.is_some());
    }

    #[tokio::test]
    async fn test_coupon_code_uppercased_and_unique() {
        let billing = service(GatewayMode::Approve);
        let form: CouponForm = serde_json::from_value(
            json!({"name": "Welcome", "code": "welcome10", "value": 10.0}),
        )
        .unwrap();

        let coupon = billing.create_coupon(form.clone(), None).await.unwrap();
        assert_eq!(coupon.code, "WELCOME10");
        assert_eq!(coupon.status, CouponStatus::Valid);

        let err = billing.create_coupon(form, None).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_percent_coupon_over_100_rejected() {
        let billing = service(GatewayMode::Approve);
        let form: CouponForm = serde_json::from_value(
            json!({"name": "Too much", "code": "HUGE", "value": 150.0}),
        )
        .unwrap();
        assert!(billing.create_coupon(form, None).await.unwrap_err().is_validation());

        let amount_off: CouponForm = serde_json::from_value(
            json!({"name": "Big", "code": "BIG", "value": 150.0, "discount_type": "amount_off"}),
        )
        .unwrap();
        assert!(billing.create_coupon(amount_off, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_coupon_redemption_limit() {
        let billing = service(GatewayMode::Approve);
        let form: CouponForm = serde_json::from_value(
            json!({"name": "One", "code": "ONCE", "value": 5.0, "max_redemptions": 1}),
        )
        .unwrap();
        billing.create_coupon(form, None).await.unwrap();

        let mut sub = subscription_form(0);
        sub.coupon_code = Some("once".to_string());
        let created = billing.create_subscription(sub.clone(), None).await.unwrap();
        assert_eq!(created.coupon_code.as_deref(), Some("ONCE"));

        let err = billing.create_subscription(sub, None).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_invoice_defaults() {
        let billing = service(GatewayMode::Approve);
        let invoice = billing.create_invoice(invoice_form(100.0), None).await.unwrap();

        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert!(invoice.number.starts_with("INV-"));
        assert_eq!(invoice.total, 110.0);
        assert_eq!(invoice.amount_remaining, 110.0);
        let term = invoice.due_date - Utc::now() - Duration::days(PERIOD_DAYS);
        assert!(term.num_seconds().abs() < 5);
        assert_eq!(invoice.customer_name, "ap@acme.test");
    }

    #[tokio::test]
    async fn test_invoice_requires_positive_amount() {
        let billing = service(GatewayMode::Approve);
        let err = billing.create_invoice(invoice_form(0.0), None).await.unwrap_err();
        assert!(err.is_validation());
        assert!(live_rows(billing.tables.invoices.as_ref()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reminders_count() {
        let billing = service(GatewayMode::Approve);
        let invoice = billing.create_invoice(invoice_form(50.0), None).await.unwrap();

        let err = billing.send_reminder(invoice.id, None).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_TRANSITION");

        billing.send_invoice(invoice.id, None).await.unwrap();
        billing.send_reminder(invoice.id, None).await.unwrap();
        let reminded = billing.send_reminder(invoice.id, None).await.unwrap();
        assert_eq!(reminded.reminder_count, 2);
        assert!(reminded.last_reminder_at.is_some());
    }

    #[tokio::test]
    async fn test_retry_payment_success() {
        let billing = service(GatewayMode::Approve);
        let paid = paid_invoice(&billing).await;

        assert_eq!(paid.status, InvoiceStatus::Paid);
        assert!(paid.paid_at.is_some());
        assert_eq!(paid.amount_paid, paid.total);
        assert_eq!(paid.amount_remaining, 0.0);
        assert!(paid.last_retry_at.is_some());
    }

    #[tokio::test]
    async fn test_retry_payment_failure_leaves_invoice_open() {
        let billing = service(GatewayMode::Decline);
        let invoice = billing.create_invoice(invoice_form(100.0), None).await.unwrap();
        billing.send_invoice(invoice.id, None).await.unwrap();

        let mut events = billing.mutator.events().subscribe();
        let err = billing.retry_payment(invoice.id, None).await.unwrap_err();
        assert_eq!(err.error_code(), "GATEWAY_ERROR");

        let stored = require(billing.tables.invoices.as_ref(), invoice.id).await.unwrap();
        assert_eq!(stored.status, InvoiceStatus::Open);
        assert!(stored.paid_at.is_none());

        let envelope = events.recv().await.unwrap();
        let notification = envelope.event.as_notification().unwrap();
        assert!(notification.is_error());
        assert_eq!(notification.title, "Payment failed");
    }

    #[tokio::test]
    async fn test_refund_within_remainder() {
        let billing = service(GatewayMode::Approve);
        let invoice = paid_invoice(&billing).await;

        let form = |amount: f64| RefundForm {
            invoice_id: invoice.id,
            amount,
            reason: crate::modules::billing::model::RefundReason::Duplicate,
            notes: None,
        };

        let refund = billing.refund(form(60.0), None).await.unwrap();
        assert_eq!(refund.status, RefundStatus::Succeeded);
        assert!(refund.gateway_reference.is_some());
        assert_eq!(billing.refundable_amount(&invoice).await.unwrap(), 50.0);

        let err = billing.refund(form(60.0), None).await.unwrap_err();
        assert!(err.is_validation());

        assert!(billing.refund(form(50.0), None).await.is_ok());
        let stats = billing.stats(&ListQuery::new()).await.unwrap();
        assert_eq!(stats.total_refunds, 110.0);
    }

    #[tokio::test]
    async fn test_refund_event_names_the_refund() {
        let billing = service(GatewayMode::Approve);
        let invoice = paid_invoice(&billing).await;
        let mut events = billing.mutator.events().subscribe();

        let refund = billing
            .refund(
                RefundForm {
                    invoice_id: invoice.id,
                    amount: 25.0,
                    reason: crate::modules::billing::model::RefundReason::Duplicate,
                    notes: None,
                },
                None,
            )
            .await
            .unwrap();

        let envelope = events.recv().await.unwrap();
        assert_eq!(envelope.event.entity_type(), Some("refund"));
        assert_eq!(envelope.event.entity_id(), Some(refund.id));
        assert_ne!(envelope.event.entity_id(), Some(invoice.id));
    }

    #[tokio::test]
    async fn test_refund_requires_paid_invoice() {
        let billing = service(GatewayMode::Approve);
        let invoice = billing.create_invoice(invoice_form(100.0), None).await.unwrap();
        let form = RefundForm {
            invoice_id: invoice.id,
            amount: 10.0,
            reason: crate::modules::billing::model::RefundReason::RequestedByCustomer,
            notes: None,
        };
        let err = billing.refund(form, None).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
    }

    #[tokio::test]
    async fn test_declined_refund_is_marked_failed() {
        let approve = service(GatewayMode::Approve);
        let invoice = paid_invoice(&approve).await;

        let declining = BillingService::new(
            approve.tables.clone(),
            Arc::new(SimulatedGateway::new(GatewayMode::Decline)),
            Mutator::default(),
            "USD".to_string(),
            CompanyProfile::default(),
        );
        let form = RefundForm {
            invoice_id: invoice.id,
            amount: 10.0,
            reason: crate::modules::billing::model::RefundReason::Fraudulent,
            notes: None,
        };
        let err = declining.refund(form, None).await.unwrap_err();
        assert_eq!(err.error_code(), "GATEWAY_ERROR");

        let refunds = live_rows(approve.tables.refunds.as_ref()).await.unwrap();
        assert_eq!(refunds.len(), 1);
        assert_eq!(refunds[0].status, RefundStatus::Failed);
        assert!(refunds[0].failure_message.is_some());
        assert_eq!(approve.refundable_amount(&invoice).await.unwrap(), 110.0);
    }

    #[tokio::test]
    async fn test_stats_over_service_rows() {
        let billing = service(GatewayMode::Approve);
        billing.create_subscription(subscription_form(0), None).await.unwrap();
        billing.create_subscription(subscription_form(7), None).await.unwrap();
        paid_invoice(&billing).await;

        let stats = billing.stats(&ListQuery::new()).await.unwrap();
        assert_eq!(stats.active_subscriptions, 1);
        assert_eq!(stats.trialing, 1);
        assert_eq!(stats.mrr, 99.0);
        assert_eq!(stats.total_revenue, 110.0);
    }
}
