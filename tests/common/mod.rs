//! Test server wiring shared by the HTTP scenario tests

#![allow(dead_code)]

use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use opsboard::prelude::*;

pub const USER_HEADER: HeaderName = HeaderName::from_static("x-user-id");

/// Every module mounted on an empty store, no demo data
pub fn create_test_server() -> (TestServer, AppContext) {
    create_test_server_with(DashboardConfig::default())
}

pub fn create_test_server_with(config: DashboardConfig) -> (TestServer, AppContext) {
    let context = AppContext::new(config);
    let app = ServerBuilder::new(context.clone())
        .register_module(BackupsModule::new(&context))
        .register_module(BillingModule::new(&context))
        .register_module(SalesModule::new(&context))
        .build();
    let server = TestServer::new(app);
    (server, context)
}

pub fn user_header(id: Uuid) -> HeaderValue {
    HeaderValue::from_str(&id.to_string()).expect("uuid is a valid header value")
}
