//! Entity descriptors for the backup tables

use super::handlers::{
    BackupsState, cancel_job, create_job, create_vault, delete_job, export_job_config,
    restore_from_job, run_job, schedule_job, update_job, verify_job,
};
use super::model::{BackupJob, BackupVault, RecoveryPoint, RestoreRequest};
use crate::server::crud;
use crate::server::entity_registry::EntityDescriptor;
use axum::Router;
use axum::routing::{get, post};

/// Descriptor for the BackupJob table
pub struct BackupJobDescriptor {
    pub state: BackupsState,
}

impl EntityDescriptor for BackupJobDescriptor {
    fn entity_type(&self) -> &str {
        "backup_job"
    }

    fn plural(&self) -> &str {
        "backup_jobs"
    }

    fn build_routes(&self) -> Router {
        Router::new()
            .route("/backup_jobs", get(crud::list::<BackupJob>).post(create_job))
            .route("/backup_jobs/export", get(crud::export::<BackupJob>))
            .route(
                "/backup_jobs/{id}",
                get(crud::fetch::<BackupJob>)
                    .put(update_job)
                    .patch(update_job)
                    .delete(delete_job),
            )
            .route("/backup_jobs/{id}/restore", post(crud::restore::<BackupJob>))
            .route("/backup_jobs/{id}/run", post(run_job))
            .route("/backup_jobs/{id}/verify", post(verify_job))
            .route("/backup_jobs/{id}/cancel", post(cancel_job))
            .route("/backup_jobs/{id}/schedule", post(schedule_job))
            .route("/backup_jobs/{id}/restore-from", post(restore_from_job))
            .route("/backup_jobs/{id}/config", get(export_job_config))
            .with_state(self.state.clone())
    }
}

/// Descriptor for the RecoveryPoint table
pub struct RecoveryPointDescriptor {
    pub state: BackupsState,
}

impl EntityDescriptor for RecoveryPointDescriptor {
    fn entity_type(&self) -> &str {
        "recovery_point"
    }

    fn plural(&self) -> &str {
        "recovery_points"
    }

    fn build_routes(&self) -> Router {
        Router::new()
            .route("/recovery_points", get(crud::list::<RecoveryPoint>))
            .route("/recovery_points/export", get(crud::export::<RecoveryPoint>))
            .route(
                "/recovery_points/{id}",
                get(crud::fetch::<RecoveryPoint>).delete(crud::remove::<RecoveryPoint>),
            )
            .route(
                "/recovery_points/{id}/restore",
                post(crud::restore::<RecoveryPoint>),
            )
            .with_state(self.state.clone())
    }
}

/// Descriptor for the BackupVault table
pub struct BackupVaultDescriptor {
    pub state: BackupsState,
}

impl EntityDescriptor for BackupVaultDescriptor {
    fn entity_type(&self) -> &str {
        "backup_vault"
    }

    fn plural(&self) -> &str {
        "backup_vaults"
    }

    fn build_routes(&self) -> Router {
        Router::new()
            .route("/backup_vaults", get(crud::list::<BackupVault>).post(create_vault))
            .route("/backup_vaults/export", get(crud::export::<BackupVault>))
            .route(
                "/backup_vaults/{id}",
                get(crud::fetch::<BackupVault>).delete(crud::remove::<BackupVault>),
            )
            .route("/backup_vaults/{id}/restore", post(crud::restore::<BackupVault>))
            .with_state(self.state.clone())
    }
}

/// Descriptor for the RestoreRequest table
pub struct RestoreRequestDescriptor {
    pub state: BackupsState,
}

impl EntityDescriptor for RestoreRequestDescriptor {
    fn entity_type(&self) -> &str {
        "restore_request"
    }

    fn plural(&self) -> &str {
        "restore_requests"
    }

    fn build_routes(&self) -> Router {
        Router::new()
            .route("/restore_requests", get(crud::list::<RestoreRequest>))
            .route("/restore_requests/export", get(crud::export::<RestoreRequest>))
            .route("/restore_requests/{id}", get(crud::fetch::<RestoreRequest>))
            .with_state(self.state.clone())
    }
}
