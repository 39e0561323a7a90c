//! opsboard server
//!
//! Reads `OPSBOARD_CONFIG` (a YAML file) when set, otherwise runs with the
//! built-in defaults. Log filtering follows `RUST_LOG`.

use opsboard::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("opsboard=info,tower_http=info")),
        )
        .init();

    let config = match std::env::var("OPSBOARD_CONFIG") {
        Ok(path) => {
            tracing::info!(path = %path, "loading configuration");
            DashboardConfig::from_yaml_file(&path)?
        }
        Err(_) => DashboardConfig::default(),
    };
    let bind = config.server.bind.clone();

    let context = AppContext::new(config);
    ServerBuilder::new(context.clone())
        .register_module(BackupsModule::new(&context))
        .register_module(BillingModule::new(&context))
        .register_module(SalesModule::new(&context))
        .seed_demo_data()
        .await?
        .serve(&bind)
        .await
}
