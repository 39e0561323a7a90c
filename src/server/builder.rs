//! ServerBuilder for fluent API to build HTTP servers

use super::context::AppContext;
use super::entity_registry::EntityRegistry;
use super::host::ServerHost;
use super::router::build_router;
use crate::core::module::Module;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builder for creating HTTP servers with auto-registered routes
///
/// # Example
///
/// ```ignore
/// let context = AppContext::new(config);
/// let app = ServerBuilder::new(context.clone())
///     .register_module(SalesModule::new(&context))
///     .build();
/// ```
pub struct ServerBuilder {
    context: AppContext,
    entity_registry: EntityRegistry,
    modules: Vec<Arc<dyn Module>>,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder around a shared context
    pub fn new(context: AppContext) -> Self {
        Self {
            context,
            entity_registry: EntityRegistry::new(),
            modules: Vec::new(),
            custom_routes: Vec::new(),
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// Add routes that belong to no module
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Register a module and its tables
    pub fn register_module(mut self, module: impl Module + 'static) -> Self {
        let module = Arc::new(module);
        module.register_entities(&mut self.entity_registry);
        tracing::debug!(
            module = module.name(),
            version = module.version(),
            entities = ?module.entity_types(),
            "module registered"
        );
        self.modules.push(module);
        self
    }

    /// Fill every registered module with demo rows when the config asks for it
    pub async fn seed_demo_data(self) -> Result<Self> {
        if !self.context.config.seed_demo_data {
            return Ok(self);
        }
        for module in &self.modules {
            module.seed_demo().await?;
            tracing::info!(module = module.name(), "demo data seeded");
        }
        Ok(self)
    }

    /// Build the transport host
    pub fn build_host(self) -> (ServerHost, Vec<Router>) {
        let modules = self.modules.iter().map(|m| m.name().to_string()).collect();
        let host = ServerHost::new(self.context, self.entity_registry, modules);
        (host, self.custom_routes)
    }

    /// Build the final router
    pub fn build(self) -> Router {
        let (host, custom_routes) = self.build_host();
        build_router(Arc::new(host), custom_routes)
    }

    /// Serve the application with graceful shutdown
    ///
    /// Handles SIGTERM and SIGINT (Ctrl+C).
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build();
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new(AppContext::default())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A minimal Module implementation for builder tests
    struct StubModule {
        seeded: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Module for StubModule {
        fn name(&self) -> &str {
            "stub"
        }

        fn entity_types(&self) -> Vec<&str> {
            vec![]
        }

        fn register_entities(&self, registry: &mut EntityRegistry) {
            registry.register_routes(Router::new().route(
                "/stub",
                axum::routing::get(|| async { "stub" }),
            ));
        }

        async fn seed_demo(&self) -> Result<()> {
            self.seeded.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_seeding_follows_config() {
        let seeded = Arc::new(AtomicUsize::new(0));
        ServerBuilder::default()
            .register_module(StubModule { seeded: seeded.clone() })
            .seed_demo_data()
            .await
            .unwrap();
        assert_eq!(seeded.load(Ordering::SeqCst), 0);

        let context = AppContext::new(DashboardConfig {
            seed_demo_data: true,
            ..DashboardConfig::default()
        });
        ServerBuilder::new(context)
            .register_module(StubModule { seeded: seeded.clone() })
            .seed_demo_data()
            .await
            .unwrap();
        assert_eq!(seeded.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_build_mounts_module_routes() {
        let app = ServerBuilder::default()
            .register_module(StubModule {
                seeded: Arc::new(AtomicUsize::new(0)),
            })
            .build();
        let server = axum_test::TestServer::new(app);
        server.get("/stub").await.assert_text("stub");
        server.get("/health").await.assert_status_ok();
    }
}
