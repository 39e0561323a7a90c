//! Shared application context handed to every module

use crate::config::DashboardConfig;
use crate::core::audit::AuditLog;
use crate::core::events::EventBus;
use crate::core::mutation::Mutator;
use crate::core::{Data, DataService};
use crate::server::crud::CrudState;
use std::sync::Arc;

/// Configuration plus the event bus and audit log every mutation reports to
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<DashboardConfig>,
    pub mutator: Mutator,
}

impl AppContext {
    pub fn new(config: DashboardConfig) -> Self {
        let mutator = Mutator::new(
            EventBus::new(config.event_capacity),
            AuditLog::new(config.audit_capacity),
        );
        Self {
            config: Arc::new(config),
            mutator,
        }
    }

    pub fn events(&self) -> &EventBus {
        self.mutator.events()
    }

    pub fn audit(&self) -> &AuditLog {
        self.mutator.audit()
    }

    /// State for the generic table routes of `T`
    pub fn crud<T: Data>(&self, service: Arc<dyn DataService<T>>) -> CrudState<T> {
        CrudState::new(service, self.mutator.clone(), self.config.pagination)
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}
