//! Backups: jobs, recovery points, vaults and restores

pub mod descriptor;
pub mod handlers;
pub mod model;
pub mod seed;
pub mod service;
pub mod stats;

pub use descriptor::{
    BackupJobDescriptor, BackupVaultDescriptor, RecoveryPointDescriptor, RestoreRequestDescriptor,
};
pub use handlers::BackupsState;
pub use model::{BackupAction, BackupJob, BackupStatus, BackupVault, RecoveryPoint, RestoreRequest};
pub use service::BackupService;
pub use stats::BackupStats;

use crate::core::DataService;
use crate::core::module::Module;
use crate::server::context::AppContext;
use crate::server::entity_registry::EntityRegistry;
use crate::storage::InMemoryDataService;
use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;

pub struct BackupsModule {
    state: BackupsState,
}

impl BackupsModule {
    /// Backups module backed by in-memory tables
    pub fn new(context: &AppContext) -> Self {
        Self::with_services(
            context,
            Arc::new(InMemoryDataService::<BackupJob>::new()),
            Arc::new(InMemoryDataService::<RecoveryPoint>::new()),
            Arc::new(InMemoryDataService::<BackupVault>::new()),
            Arc::new(InMemoryDataService::<RestoreRequest>::new()),
        )
    }

    pub fn with_services(
        context: &AppContext,
        jobs: Arc<dyn DataService<BackupJob>>,
        points: Arc<dyn DataService<RecoveryPoint>>,
        vaults: Arc<dyn DataService<BackupVault>>,
        restores: Arc<dyn DataService<RestoreRequest>>,
    ) -> Self {
        let service = BackupService::new(
            jobs.clone(),
            points.clone(),
            vaults.clone(),
            restores.clone(),
            context.mutator.clone(),
        );
        Self {
            state: BackupsState {
                jobs: context.crud(jobs),
                points: context.crud(points),
                vaults: context.crud(vaults),
                restores: context.crud(restores),
                service: Arc::new(service),
            },
        }
    }

    pub fn service(&self) -> Arc<BackupService> {
        self.state.service.clone()
    }
}

#[async_trait]
impl Module for BackupsModule {
    fn name(&self) -> &str {
        "backups"
    }

    fn entity_types(&self) -> Vec<&str> {
        vec!["backup_job", "recovery_point", "backup_vault", "restore_request"]
    }

    fn register_entities(&self, registry: &mut EntityRegistry) {
        registry.register(Box::new(BackupJobDescriptor {
            state: self.state.clone(),
        }));
        registry.register(Box::new(RecoveryPointDescriptor {
            state: self.state.clone(),
        }));
        registry.register(Box::new(BackupVaultDescriptor {
            state: self.state.clone(),
        }));
        registry.register(Box::new(RestoreRequestDescriptor {
            state: self.state.clone(),
        }));

        registry.register_routes(
            Router::new()
                .route("/backups/actions", post(handlers::perform_action))
                .route("/backups/stats", get(handlers::backup_stats))
                .route("/backups/config", get(handlers::export_config))
                .with_state(self.state.clone()),
        );
    }

    async fn seed_demo(&self) -> Result<()> {
        seed::seed(
            self.state.jobs.service.as_ref(),
            self.state.points.service.as_ref(),
            self.state.vaults.service.as_ref(),
        )
        .await?;
        Ok(())
    }
}
