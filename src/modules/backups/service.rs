//! Backup operations: job lifecycle, restores, vaults and actions

use super::model::{
    BackupAction, BackupFrequency, BackupJob, BackupJobForm, BackupJobPatch, BackupStatus,
    BackupType, BackupVault, RecoveryPoint, RecoveryPointStatus, RestoreForm, RestoreRequest,
    RestoreStatus, ScheduleForm, StorageType, VaultForm, VaultStatus,
};
use super::stats::BackupStats;
use crate::core::action::ActionResponse;
use crate::core::error::{DashError, DashResult};
use crate::core::mutation::{Mutation, Mutator};
use crate::core::query::ListQuery;
use crate::core::service::{live_rows, require};
use crate::core::validation::validate_form;
use crate::core::{DataService, Entity};
use crate::export::ExportFile;
use crate::export::json::ExportDocument;
use crate::export::{ExportFormat, dated_filename};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

pub struct BackupService {
    jobs: Arc<dyn DataService<BackupJob>>,
    points: Arc<dyn DataService<RecoveryPoint>>,
    vaults: Arc<dyn DataService<BackupVault>>,
    restores: Arc<dyn DataService<RestoreRequest>>,
    mutator: Mutator,
}

impl BackupService {
    pub fn new(
        jobs: Arc<dyn DataService<BackupJob>>,
        points: Arc<dyn DataService<RecoveryPoint>>,
        vaults: Arc<dyn DataService<BackupVault>>,
        restores: Arc<dyn DataService<RestoreRequest>>,
        mutator: Mutator,
    ) -> Self {
        Self {
            jobs,
            points,
            vaults,
            restores,
            mutator,
        }
    }

    pub async fn create_job(&self, form: BackupJobForm, actor: Option<Uuid>) -> DashResult<BackupJob> {
        self.mutator
            .run(Mutation::create("backup_job").by(actor), async move {
                validate_form(&form)?;
                let frequency = form.frequency.unwrap_or(BackupFrequency::Daily);
                if frequency == BackupFrequency::Custom && form.schedule_cron.is_none() {
                    return Err(DashError::field("schedule_cron", "required for a custom frequency"));
                }
                if let Some(vault_id) = form.vault_id {
                    require(self.vaults.as_ref(), vault_id).await?;
                }

                let job = BackupJob::new(
                    form.name.trim().to_string(),
                    BackupStatus::Scheduled,
                    actor,
                    form.description,
                    form.backup_type.unwrap_or(BackupType::Full),
                    form.source,
                    form.destination,
                    form.storage_type.unwrap_or(StorageType::Local),
                    frequency,
                    form.schedule_cron,
                    None,
                    frequency.next_run_after(Utc::now()),
                    0,
                    0,
                    0,
                    0,
                    form.retention_days.unwrap_or(30),
                    form.encrypted.unwrap_or(true),
                    form.compressed.unwrap_or(true),
                    false,
                    100.0,
                    0,
                    form.vault_id,
                    false,
                    false,
                );
                Ok(self.jobs.create(job).await?)
            })
            .await
    }

    pub async fn update_job(
        &self,
        id: Uuid,
        patch: BackupJobPatch,
        actor: Option<Uuid>,
    ) -> DashResult<BackupJob> {
        self.mutator
            .run(Mutation::update("backup_job", id).by(actor), async move {
                validate_form(&patch)?;
                let mut job = require(self.jobs.as_ref(), id).await?;

                if let Some(name) = patch.name {
                    job.name = name.trim().to_string();
                }
                if patch.description.is_some() {
                    job.description = patch.description;
                }
                if let Some(backup_type) = patch.backup_type {
                    job.backup_type = backup_type;
                }
                if let Some(source) = patch.source {
                    job.source = source;
                }
                if let Some(destination) = patch.destination {
                    job.destination = destination;
                }
                if let Some(storage_type) = patch.storage_type {
                    job.storage_type = storage_type;
                }
                if let Some(retention_days) = patch.retention_days {
                    job.retention_days = retention_days;
                }
                if let Some(encrypted) = patch.encrypted {
                    job.encrypted = encrypted;
                }
                if let Some(compressed) = patch.compressed {
                    job.compressed = compressed;
                }
                if let Some(vault_id) = patch.vault_id {
                    require(self.vaults.as_ref(), vault_id).await?;
                    job.vault_id = Some(vault_id);
                }

                job.touch();
                Ok(self.jobs.update(&id, job).await?)
            })
            .await
    }

    /// Soft delete unless the job is under legal hold
    pub async fn delete_job(&self, id: Uuid, hard: bool, actor: Option<Uuid>) -> DashResult<()> {
        self.mutator
            .run(Mutation::delete("backup_job", id, !hard).by(actor), async move {
                let job = require(self.jobs.as_ref(), id).await?;
                if job.legal_hold {
                    return Err(DashError::invalid_transition("backup_job", "legal_hold", "delete"));
                }
                if hard {
                    self.jobs.delete(&id).await?;
                } else {
                    self.jobs.soft_delete(&id).await?;
                }
                Ok(())
            })
            .await
    }

    /// `running`, progress 0, `last_run_at = now`
    pub async fn run_now(&self, id: Uuid, actor: Option<Uuid>) -> DashResult<BackupJob> {
        self.transition(id, "run", actor, |job| {
            if job.status == BackupStatus::Running {
                return Err(DashError::invalid_transition("backup_job", job.status.to_string(), "run"));
            }
            let now = Utc::now();
            job.status = BackupStatus::Running;
            job.progress = 0;
            job.last_run_at = Some(now);
            job.next_run_at = job.frequency.next_run_after(now);
            Ok(())
        })
        .await
    }

    pub async fn verify(&self, id: Uuid, actor: Option<Uuid>) -> DashResult<BackupJob> {
        self.transition(id, "verify", actor, |job| {
            job.verified = true;
            Ok(())
        })
        .await
    }

    pub async fn cancel(&self, id: Uuid, actor: Option<Uuid>) -> DashResult<BackupJob> {
        self.transition(id, "cancel", actor, |job| {
            if matches!(job.status, BackupStatus::Cancelled | BackupStatus::Completed) {
                return Err(DashError::invalid_transition(
                    "backup_job",
                    job.status.to_string(),
                    "cancel",
                ));
            }
            job.status = BackupStatus::Cancelled;
            job.next_run_at = None;
            Ok(())
        })
        .await
    }

    /// Set frequency and optional cron; the next run follows the frequency
    pub async fn schedule(
        &self,
        id: Uuid,
        form: ScheduleForm,
        actor: Option<Uuid>,
    ) -> DashResult<BackupJob> {
        self.transition(id, "schedule", actor, move |job| {
            validate_form(&form)?;
            if form.frequency == BackupFrequency::Custom && form.schedule_cron.is_none() {
                return Err(DashError::field("schedule_cron", "required for a custom frequency"));
            }
            job.frequency = form.frequency;
            job.schedule_cron = form.schedule_cron;
            job.next_run_at = form.frequency.next_run_after(Utc::now());
            if job.status != BackupStatus::Running {
                job.status = BackupStatus::Scheduled;
            }
            Ok(())
        })
        .await
    }

    /// Record a restore request. The job must have run at least once or be
    /// `completed`; a named recovery point must belong to the job and be
    /// restorable.
    pub async fn restore_from_job(
        &self,
        id: Uuid,
        form: RestoreForm,
        actor: Option<Uuid>,
    ) -> DashResult<RestoreRequest> {
        self.mutator
            .run(
                Mutation::action("backup_job", "restore", Some(id))
                    .by(actor)
                    .titled("Restore requested", "Failed to start restore"),
                async move {
                    let job = require(self.jobs.as_ref(), id).await?;
                    if !job.has_run() {
                        return Err(DashError::invalid_transition(
                            "backup_job",
                            job.status.to_string(),
                            "restore",
                        ));
                    }
                    if let Some(point_id) = form.recovery_point_id {
                        let point = require(self.points.as_ref(), point_id).await?;
                        if point.job_id != job.id {
                            return Err(DashError::field(
                                "recovery_point_id",
                                "does not belong to this job",
                            ));
                        }
                        if matches!(
                            point.status,
                            RecoveryPointStatus::Expired | RecoveryPointStatus::Corrupted
                        ) {
                            return Err(DashError::field(
                                "recovery_point_id",
                                format!("recovery point is {}", point.status),
                            ));
                        }
                    }

                    let request = RestoreRequest::new(
                        format!("Restore {}", job.name),
                        RestoreStatus::Queued,
                        actor,
                        job.id,
                        form.recovery_point_id,
                        form.target_location,
                    );
                    Ok(self.restores.create(request).await?)
                },
            )
            .await
    }

    pub async fn create_vault(&self, form: VaultForm, actor: Option<Uuid>) -> DashResult<BackupVault> {
        self.mutator
            .run(Mutation::create("backup_vault").by(actor), async move {
                validate_form(&form)?;
                if form.min_retention_days > form.max_retention_days {
                    return Err(DashError::field(
                        "min_retention_days",
                        "must not exceed max_retention_days",
                    ));
                }

                let vault = BackupVault::new(
                    form.name.trim().to_string(),
                    VaultStatus::Active,
                    actor,
                    form.description,
                    form.region,
                    0,
                    0,
                    form.encryption_key,
                    false,
                    None,
                    form.min_retention_days,
                    form.max_retention_days,
                    form.access_policy,
                );
                Ok(self.vaults.create(vault).await?)
            })
            .await
    }

    /// `POST /backups/actions`
    pub async fn perform(&self, action: BackupAction, actor: Option<Uuid>) -> DashResult<ActionResponse> {
        let name = action.name();
        self.mutator
            .run(Mutation::action("backup", name, None).by(actor), async move {
                match action {
                    BackupAction::LegalHold { backup_id } => self.legal_hold(backup_id).await,
                    BackupAction::LockVault { vault_id, backup_id } => {
                        let vault_id = self.resolve_vault(vault_id, backup_id).await?;
                        self.lock_vault(vault_id).await
                    }
                    BackupAction::Replicate { backup_id } => {
                        let mut job = require(self.jobs.as_ref(), backup_id).await?;
                        job.cross_region = true;
                        job.touch();
                        let job = self.jobs.update(&backup_id, job).await?;
                        ActionResponse::ok("Cross-region replication enabled").with_data(&job)
                    }
                    BackupAction::Archive { vault_id, backup_id } => {
                        self.archive(vault_id, backup_id).await
                    }
                }
            })
            .await
    }

    async fn legal_hold(&self, backup_id: Uuid) -> DashResult<ActionResponse> {
        // A recovery point id holds that point only
        if let Some(mut point) = self.points.get(&backup_id).await?
            && !point.is_deleted()
        {
            point.legal_hold = true;
            point.touch();
            let point = self.points.update(&backup_id, point).await?;
            return ActionResponse::ok("Legal hold applied").with_data(&point);
        }

        let mut job = require(self.jobs.as_ref(), backup_id).await?;
        job.legal_hold = true;
        job.touch();
        let job = self.jobs.update(&backup_id, job).await?;

        let mut held = 0;
        for mut point in live_rows(self.points.as_ref()).await? {
            if point.job_id == job.id && !point.legal_hold {
                point.legal_hold = true;
                point.touch();
                let point_id = point.id;
                self.points.update(&point_id, point).await?;
                held += 1;
            }
        }

        ActionResponse::ok("Legal hold applied")
            .with_data(&json!({ "job": job, "recovery_points_held": held }))
    }

    async fn resolve_vault(&self, vault_id: Option<Uuid>, backup_id: Option<Uuid>) -> DashResult<Uuid> {
        match (vault_id, backup_id) {
            (Some(vault_id), _) => Ok(vault_id),
            (None, Some(backup_id)) => require(self.jobs.as_ref(), backup_id)
                .await?
                .vault_id
                .ok_or_else(|| DashError::field("backup_id", "job is not stored in a vault")),
            (None, None) => Err(DashError::field("vault_id", "vault_id or backup_id is required")),
        }
    }

    async fn lock_vault(&self, vault_id: Uuid) -> DashResult<ActionResponse> {
        let mut vault = require(self.vaults.as_ref(), vault_id).await?;
        if vault.locked {
            return Err(DashError::invalid_transition("backup_vault", "locked", "lock_vault"));
        }
        vault.locked = true;
        vault.lock_date = Some(Utc::now());
        vault.set_status(VaultStatus::Locked);
        let vault = self.vaults.update(&vault_id, vault).await?;
        ActionResponse::ok("Vault locked").with_data(&vault)
    }

    async fn archive(&self, vault_id: Option<Uuid>, backup_id: Option<Uuid>) -> DashResult<ActionResponse> {
        match (vault_id, backup_id) {
            (Some(vault_id), _) => {
                let mut vault = require(self.vaults.as_ref(), vault_id).await?;
                vault.set_status(VaultStatus::Archived);
                let vault = self.vaults.update(&vault_id, vault).await?;
                ActionResponse::ok("Vault archived").with_data(&vault)
            }
            (None, Some(backup_id)) => {
                let mut job = require(self.jobs.as_ref(), backup_id).await?;
                job.storage_type = StorageType::Glacier;
                job.touch();
                let job = self.jobs.update(&backup_id, job).await?;
                ActionResponse::ok("Backup moved to archive storage").with_data(&job)
            }
            (None, None) => Err(DashError::field("backup_id", "vault_id or backup_id is required")),
        }
    }

    pub async fn stats(&self, query: &ListQuery) -> DashResult<BackupStats> {
        let jobs = self.jobs.query(query).await?;
        let points = live_rows(self.points.as_ref()).await?;
        let vaults = live_rows(self.vaults.as_ref()).await?;
        Ok(BackupStats::compute(&jobs, &points, &vaults))
    }

    /// Jobs matching the search text AND the status (`all` = any)
    pub async fn filter_jobs(&self, query: &ListQuery) -> DashResult<Vec<BackupJob>> {
        Ok(self.jobs.query(query).await?)
    }

    /// `{name, exportedAt, type: "backup-config", data: [jobs]}`
    pub async fn export_config(&self, query: &ListQuery) -> DashResult<ExportFile> {
        config_file(self.jobs.query(query).await?)
    }

    async fn transition<F>(
        &self,
        id: Uuid,
        operation: &str,
        actor: Option<Uuid>,
        apply: F,
    ) -> DashResult<BackupJob>
    where
        F: FnOnce(&mut BackupJob) -> DashResult<()>,
    {
        self.mutator
            .run(
                Mutation::action("backup_job", operation, Some(id)).by(actor),
                async move {
                    let mut job = require(self.jobs.as_ref(), id).await?;
                    apply(&mut job)?;
                    job.touch();
                    Ok(self.jobs.update(&id, job).await?)
                },
            )
            .await
    }
}

/// Job configurations as a `backup-config` JSON document
pub fn config_file(jobs: Vec<BackupJob>) -> DashResult<ExportFile> {
    let document = ExportDocument::new("Backup configuration", "backup-config", jobs);
    Ok(ExportFile::new(
        dated_filename("backup-config", ExportFormat::Json),
        ExportFormat::Json.content_type(),
        document.to_pretty_json()?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryDataService;

    struct Fixture {
        service: BackupService,
        points: Arc<InMemoryDataService<RecoveryPoint>>,
        restores: Arc<InMemoryDataService<RestoreRequest>>,
    }

    fn fixture() -> Fixture {
        let points = Arc::new(InMemoryDataService::new());
        let restores = Arc::new(InMemoryDataService::new());
        let service = BackupService::new(
            Arc::new(InMemoryDataService::<BackupJob>::new()),
            points.clone(),
            Arc::new(InMemoryDataService::<BackupVault>::new()),
            restores.clone(),
            Mutator::default(),
        );
        Fixture {
            service,
            points,
            restores,
        }
    }

    fn job_form(name: &str) -> BackupJobForm {
        serde_json::from_value(json!({ "name": name, "source": "/var/lib/db" })).unwrap()
    }

    fn vault_form(name: &str) -> VaultForm {
        serde_json::from_value(json!({ "name": name })).unwrap()
    }

    fn point_for(job: &BackupJob, status: RecoveryPointStatus) -> RecoveryPoint {
        RecoveryPoint::new(
            format!("{} point", job.name),
            status,
            None,
            job.id,
            job.name.clone(),
            job.backup_type,
            1024,
            true,
            None,
            job.vault_id,
            false,
            false,
        )
    }

    #[tokio::test]
    async fn test_create_job_defaults() {
        let f = fixture();
        let job = f.service.create_job(job_form("Nightly DB"), None).await.unwrap();

        assert_eq!(job.status, BackupStatus::Scheduled);
        assert_eq!(job.frequency, BackupFrequency::Daily);
        assert!(job.encrypted && job.compressed);
        assert_eq!(job.retention_days, 30);
        assert!(job.next_run_at.is_some());
    }

    #[tokio::test]
    async fn test_custom_frequency_needs_cron() {
        let f = fixture();
        let form: BackupJobForm =
            serde_json::from_value(json!({ "name": "Odd", "frequency": "custom" })).unwrap();
        let err = f.service.create_job(form, None).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_run_verify_cancel() {
        let f = fixture();
        let job = f.service.create_job(job_form("Files"), None).await.unwrap();

        let running = f.service.run_now(job.id, None).await.unwrap();
        assert_eq!(running.status, BackupStatus::Running);
        assert_eq!(running.progress, 0);
        assert!(running.last_run_at.is_some());

        let err = f.service.run_now(job.id, None).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_TRANSITION");

        assert!(f.service.verify(job.id, None).await.unwrap().verified);

        let cancelled = f.service.cancel(job.id, None).await.unwrap();
        assert_eq!(cancelled.status, BackupStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_restore_requires_a_previous_run() {
        let f = fixture();
        let job = f.service.create_job(job_form("Mail"), None).await.unwrap();

        let err = f
            .service
            .restore_from_job(job.id, RestoreForm::default(), None)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
        assert!(f.restores.is_empty());

        f.service.run_now(job.id, None).await.unwrap();
        let request = f
            .service
            .restore_from_job(job.id, RestoreForm::default(), None)
            .await
            .unwrap();
        assert_eq!(request.status, RestoreStatus::Queued);
        assert_eq!(request.job_id, job.id);
    }

    #[tokio::test]
    async fn test_restore_rejects_expired_point() {
        let f = fixture();
        let job = f.service.create_job(job_form("Web"), None).await.unwrap();
        f.service.run_now(job.id, None).await.unwrap();
        let expired = f
            .points
            .create(point_for(&job, RecoveryPointStatus::Expired))
            .await
            .unwrap();

        let form = RestoreForm {
            recovery_point_id: Some(expired.id),
            target_location: None,
        };
        let err = f.service.restore_from_job(job.id, form, None).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_schedule_updates_frequency() {
        let f = fixture();
        let job = f.service.create_job(job_form("Logs"), None).await.unwrap();

        let form: ScheduleForm = serde_json::from_value(
            json!({ "frequency": "custom", "schedule_cron": "0 2 * * 0" }),
        )
        .unwrap();
        let scheduled = f.service.schedule(job.id, form, None).await.unwrap();
        assert_eq!(scheduled.frequency, BackupFrequency::Custom);
        assert_eq!(scheduled.schedule_cron.as_deref(), Some("0 2 * * 0"));
        assert_eq!(scheduled.next_run_at, None);

        let missing_cron: ScheduleForm =
            serde_json::from_value(json!({ "frequency": "custom" })).unwrap();
        assert!(f.service.schedule(job.id, missing_cron, None).await.is_err());
    }

    #[tokio::test]
    async fn test_legal_hold_covers_job_points_and_blocks_delete() {
        let f = fixture();
        let job = f.service.create_job(job_form("Ledger"), None).await.unwrap();
        f.points.create(point_for(&job, RecoveryPointStatus::Available)).await.unwrap();
        f.points.create(point_for(&job, RecoveryPointStatus::Available)).await.unwrap();

        let response = f
            .service
            .perform(BackupAction::LegalHold { backup_id: job.id }, None)
            .await
            .unwrap();
        assert!(response.success);
        assert_eq!(response.data.unwrap()["recovery_points_held"], 2);

        let stats = f.service.stats(&ListQuery::new()).await.unwrap();
        assert_eq!(stats.legal_hold_count, 2);

        let err = f.service.delete_job(job.id, false, None).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
    }

    #[tokio::test]
    async fn test_lock_vault_through_job() {
        let f = fixture();
        let vault = f.service.create_vault(vault_form("Compliance"), None).await.unwrap();
        let form: BackupJobForm =
            serde_json::from_value(json!({ "name": "Audit logs", "vault_id": vault.id })).unwrap();
        let job = f.service.create_job(form, None).await.unwrap();

        let action = BackupAction::LockVault {
            vault_id: None,
            backup_id: Some(job.id),
        };
        let response = f.service.perform(action.clone(), None).await.unwrap();
        let data = response.data.unwrap();
        assert_eq!(data["status"], "locked");
        assert_eq!(data["locked"], true);

        let err = f.service.perform(action, None).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
    }

    #[tokio::test]
    async fn test_vault_retention_bounds() {
        let f = fixture();
        let form: VaultForm = serde_json::from_value(
            json!({ "name": "Odd", "min_retention_days": 90, "max_retention_days": 30 }),
        )
        .unwrap();
        assert!(f.service.create_vault(form, None).await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_filter_is_search_and_status() {
        let f = fixture();
        let a = f.service.create_job(job_form("Prod database"), None).await.unwrap();
        f.service.create_job(job_form("Prod files"), None).await.unwrap();
        f.service.create_job(job_form("Staging database"), None).await.unwrap();
        f.service.run_now(a.id, None).await.unwrap();

        let query = ListQuery::new().search("database").status("running");
        let jobs = f.service.filter_jobs(&query).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, a.id);

        let all_db = f.service.filter_jobs(&ListQuery::new().search("database")).await.unwrap();
        assert_eq!(all_db.len(), 2);
    }

    #[tokio::test]
    async fn test_config_export_document() {
        let f = fixture();
        f.service.create_job(job_form("A"), None).await.unwrap();
        f.service.create_job(job_form("B"), None).await.unwrap();

        let file = f.service.export_config(&ListQuery::new()).await.unwrap();
        let document: serde_json::Value = serde_json::from_str(&file.body).unwrap();
        assert_eq!(document["type"], "backup-config");
        assert!(document["exportedAt"].is_string());
        assert_eq!(document["data"].as_array().unwrap().len(), 2);
        assert!(file.filename.starts_with("backup-config-"));
    }
}
