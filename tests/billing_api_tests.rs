//! HTTP scenarios for billing: subscriptions, invoices, refunds and settings

mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::Utc;
use common::*;
use opsboard::config::{BillingConfig, DashboardConfig, GatewayMode};
use serde_json::{Value, json};

async fn open_invoice(server: &TestServer) -> Value {
    let created = server
        .post("/invoices")
        .json(&json!({
            "customer_email": "ap@acme.test",
            "customer_name": "Acme",
            "line_items": [{"description": "Pro seat", "quantity": 2, "unit_amount": 50.0}],
            "tax": 10.0
        }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let invoice: Value = created.json();
    assert_eq!(invoice["status"], "draft");
    assert_eq!(invoice["subtotal"], 100.0);
    assert_eq!(invoice["total"], 110.0);

    let sent: Value = server
        .post(&format!("/invoices/{}/send", invoice["id"].as_str().unwrap()))
        .await
        .json();
    assert_eq!(sent["status"], "open");
    sent
}

// =============================================================================
// Subscriptions and coupons
// =============================================================================

mod subscription_tests {
    use super::*;

    #[tokio::test]
    async fn test_coupon_redemption_on_subscribe() {
        let (server, _) = create_test_server();

        let coupon: Value = server
            .post("/coupons")
            .json(&json!({"name": "Launch", "code": "launch20", "value": 20.0, "max_redemptions": 1}))
            .await
            .json();
        assert_eq!(coupon["code"], "LAUNCH20");

        let response = server
            .post("/subscriptions")
            .json(&json!({
                "customerEmail": "ops@acme.test",
                "planId": "pro",
                "amount": 99.0,
                "couponCode": "launch20"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let subscription: Value = response.json();
        assert_eq!(subscription["status"], "active");
        assert_eq!(subscription["coupon_code"], "LAUNCH20");

        let coupon: Value = server
            .get(&format!("/coupons/{}", coupon["id"].as_str().unwrap()))
            .await
            .json();
        assert_eq!(coupon["times_redeemed"], 1);
        assert_eq!(coupon["status"], "invalid");

        let rejected = server
            .post("/subscriptions")
            .json(&json!({"customer_email": "ops@acme.test", "plan": "pro", "coupon_code": "LAUNCH20"}))
            .expect_failure()
            .await;
        rejected.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_pause_resume_cancel() {
        let (server, _) = create_test_server();
        let subscription: Value = server
            .post("/subscriptions")
            .json(&json!({"customer_email": "ops@acme.test", "plan": "team", "amount": 49.0}))
            .await
            .json();
        let base = format!("/subscriptions/{}", subscription["id"].as_str().unwrap());

        let paused: Value = server.post(&format!("{}/pause", base)).await.json();
        assert_eq!(paused["status"], "paused");

        let resumed: Value = server.post(&format!("{}/resume", base)).await.json();
        assert_eq!(resumed["status"], "active");

        let canceled: Value = server.post(&format!("{}/cancel", base)).await.json();
        assert_eq!(canceled["status"], "canceled");
        assert!(canceled["canceled_at"].is_string());

        let again = server.post(&format!("{}/cancel", base)).expect_failure().await;
        again.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_stats_report_mrr() {
        let (server, _) = create_test_server();
        server
            .post("/subscriptions")
            .json(&json!({"customer_email": "a@acme.test", "plan": "pro", "amount": 100.0}))
            .await;
        server
            .post("/subscriptions")
            .json(&json!({"customer_email": "b@acme.test", "plan": "pro", "amount": 1200.0, "interval": "year"}))
            .await;

        let stats: Value = server.get("/billing/stats").await.json();
        assert_eq!(stats["active_subscriptions"], 2);
        assert_eq!(stats["mrr"], 200.0);
        assert_eq!(stats["arr"], 2400.0);
    }
}

// =============================================================================
// Invoices and refunds
// =============================================================================

mod invoice_tests {
    use super::*;

    #[tokio::test]
    async fn test_collect_then_refund() {
        let (server, _) = create_test_server();
        let invoice = open_invoice(&server).await;
        let id = invoice["id"].as_str().unwrap();

        let paid: Value = server.post(&format!("/invoices/{}/retry", id)).await.json();
        assert_eq!(paid["status"], "paid");
        assert_eq!(paid["amount_remaining"], 0.0);

        let refund = server
            .post("/refunds")
            .json(&json!({"invoice_id": id, "amount": 50.0, "reason": "duplicate"}))
            .await;
        refund.assert_status(StatusCode::CREATED);
        let refund: Value = refund.json();
        assert_eq!(refund["status"], "succeeded");
        assert!(refund["gateway_reference"].is_string());

        let too_much = server
            .post("/payments/refund")
            .json(&json!({"transaction_id": id, "amount": 100.0}))
            .expect_failure()
            .await;
        too_much.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let stats: Value = server.get("/billing/stats").await.json();
        assert_eq!(stats["total_revenue"], 110.0);
        assert_eq!(stats["total_refunds"], 50.0);
    }

    #[tokio::test]
    async fn test_refund_requires_paid_invoice() {
        let (server, _) = create_test_server();
        let invoice = open_invoice(&server).await;

        let response = server
            .post("/refunds")
            .json(&json!({"invoice_id": invoice["id"], "amount": 10.0}))
            .expect_failure()
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_declined_payment_reopens_invoice() {
        let (server, context) = create_test_server_with(DashboardConfig {
            billing: BillingConfig {
                gateway: GatewayMode::Decline,
                ..BillingConfig::default()
            },
            ..DashboardConfig::default()
        });
        let invoice = open_invoice(&server).await;
        let id = invoice["id"].as_str().unwrap();
        let mut events = context.events().subscribe();

        let response = server.post(&format!("/invoices/{}/retry", id)).expect_failure().await;
        response.assert_status(StatusCode::BAD_GATEWAY);
        assert_eq!(response.json::<Value>()["code"], "GATEWAY_ERROR");

        let stored: Value = server.get(&format!("/invoices/{}", id)).await.json();
        assert_eq!(stored["status"], "open");
        assert!(stored["last_retry_at"].is_string());

        let envelope = events.try_recv().unwrap();
        let notification = envelope.event.as_notification().unwrap();
        assert!(notification.is_error());
        assert_eq!(notification.title, "Payment failed");
    }

    #[tokio::test]
    async fn test_reminders_and_void() {
        let (server, _) = create_test_server();
        let invoice = open_invoice(&server).await;
        let base = format!("/invoices/{}", invoice["id"].as_str().unwrap());

        let reminded: Value = server.post(&format!("{}/remind", base)).await.json();
        assert_eq!(reminded["reminder_count"], 1);

        let voided: Value = server.post(&format!("{}/void", base)).await.json();
        assert_eq!(voided["status"], "void");

        server
            .post(&format!("{}/remind", base))
            .expect_failure()
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_printable_document() {
        let (server, _) = create_test_server();
        let invoice = open_invoice(&server).await;

        let response = server
            .get(&format!("/invoices/{}/document", invoice["id"].as_str().unwrap()))
            .await;
        response.assert_status_ok();
        assert!(
            response
                .header("content-type")
                .to_str()
                .unwrap()
                .starts_with("text/html")
        );
        let html = response.text();
        assert!(html.contains(invoice["number"].as_str().unwrap()));
        assert!(html.contains("Pro seat"));
        assert!(html.contains("$110.00"));
    }
}

// =============================================================================
// Settings endpoint
// =============================================================================

mod settings_tests {
    use super::*;

    #[tokio::test]
    async fn test_rotate_keys_and_export_audit_log() {
        let (server, _) = create_test_server();

        let before: Value = server.get("/billing/settings").await.json();
        assert!(
            before["api_keys"]["publishable_key"]
                .as_str()
                .unwrap()
                .starts_with("pk_live_")
        );

        let rotated: Value = server
            .post("/billing/settings")
            .json(&json!({"action": "rotate_api_keys"}))
            .await
            .json();
        assert_eq!(rotated["success"], true);
        assert_eq!(
            rotated["data"]["publishable_key"],
            server.get("/billing/settings").await.json::<Value>()["api_keys"]["publishable_key"]
        );

        let log = server
            .get("/billing/settings")
            .add_query_param("action", "export_audit_log")
            .await;
        log.assert_status_ok();
        assert!(log.text().contains("billing_settings.rotate_api_keys"));
    }

    #[tokio::test]
    async fn test_tax_rate_lifecycle_across_methods() {
        let (server, _) = create_test_server();

        let created: Value = server
            .post("/billing/settings")
            .json(&json!({"action": "create_tax_rate", "name": "VAT", "percentage": 20.0, "country": "FR"}))
            .await
            .json();
        let id = created["data"]["id"].clone();

        let updated: Value = server
            .put("/billing/settings")
            .json(&json!({"action": "update_tax_rate", "taxRateId": id, "percentage": 5.5}))
            .await
            .json();
        assert_eq!(updated["data"]["percentage"], 5.5);

        server
            .delete("/billing/settings")
            .json(&json!({"action": "delete_tax_rate", "taxRateId": id}))
            .await
            .assert_status_ok();

        let rates: Value = server.get("/tax_rates").await.json();
        assert_eq!(rates["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn test_unknown_action() {
        let (server, _) = create_test_server();

        let response = server
            .post("/billing/settings")
            .json(&json!({"action": "print_money"}))
            .expect_failure()
            .await;
        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["code"], "UNKNOWN_ACTION");
        assert_eq!(body["details"]["action"], "print_money");
    }

    #[tokio::test]
    async fn test_tax_report_download() {
        let (server, _) = create_test_server();
        let invoice = open_invoice(&server).await;
        server
            .post(&format!("/invoices/{}/retry", invoice["id"].as_str().unwrap()))
            .await
            .assert_status_ok();

        let today = Utc::now().date_naive().to_string();
        let response = server
            .get("/billing/tax-report")
            .add_query_param("startDate", &today)
            .add_query_param("endDate", &today)
            .add_query_param("format", "csv")
            .await;
        response.assert_status_ok();
        let csv = response.text();
        assert!(csv.starts_with("Invoice,Customer,Paid At,Subtotal,Tax,Total"));
        assert!(csv.contains("TOTAL,,,100,10,110"));
    }
}
