//! Server host holding everything the router needs
//!
//! The host is built once by [`ServerBuilder`](super::ServerBuilder) and
//! consumed by [`build_router`](super::router::build_router).

use crate::config::DashboardConfig;
use crate::core::events::EventBus;
use crate::server::context::AppContext;
use crate::server::entity_registry::EntityRegistry;
use std::sync::Arc;

pub struct ServerHost {
    /// Shared configuration and mutation reporting
    pub context: AppContext,

    /// Table descriptors and module routes
    pub entity_registry: EntityRegistry,

    /// Names of the registered modules, in registration order
    pub modules: Vec<String>,
}

impl ServerHost {
    pub fn new(context: AppContext, entity_registry: EntityRegistry, modules: Vec<String>) -> Self {
        Self {
            context,
            entity_registry,
            modules,
        }
    }

    pub fn config(&self) -> &Arc<DashboardConfig> {
        &self.context.config
    }

    pub fn event_bus(&self) -> &EventBus {
        self.context.events()
    }

    /// Get entity types registered in the host
    pub fn entity_types(&self) -> Vec<&str> {
        self.entity_registry.entity_types()
    }

    pub fn is_ready(&self) -> bool {
        !self.modules.is_empty()
    }
}
