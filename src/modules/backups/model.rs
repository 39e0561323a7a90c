//! Backup jobs, recovery points, vaults and restore requests

use crate::{closed_set, impl_data_entity};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

closed_set!(
    BackupType {
        Full => "full",
        Incremental => "incremental",
        Differential => "differential",
        Snapshot => "snapshot",
        Synthetic => "synthetic",
        Archive => "archive",
        Continuous => "continuous",
    }
);

closed_set!(
    BackupStatus {
        Completed => "completed",
        Running => "running",
        Failed => "failed",
        Scheduled => "scheduled",
        Cancelled => "cancelled",
        Warning => "warning",
        Pending => "pending",
    }
);

closed_set!(
    StorageType {
        Local => "local",
        AwsS3 => "aws-s3",
        AzureBlob => "azure-blob",
        GoogleCloud => "google-cloud",
        Wasabi => "wasabi",
        Nfs => "nfs",
        Glacier => "glacier",
    }
);

closed_set!(
    BackupFrequency {
        Hourly => "hourly",
        Daily => "daily",
        Weekly => "weekly",
        Monthly => "monthly",
        Continuous => "continuous",
        Custom => "custom",
    }
);

closed_set!(
    RecoveryPointStatus {
        Available => "available",
        Expired => "expired",
        Locked => "locked",
        Partial => "partial",
        Corrupted => "corrupted",
    }
);

closed_set!(
    VaultStatus {
        Active => "active",
        Locked => "locked",
        PendingDeletion => "pending_deletion",
        Archived => "archived",
    }
);

closed_set!(
    RestoreStatus {
        Queued => "queued",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
    }
);

impl BackupFrequency {
    /// Time between two runs; `None` when no fixed interval applies
    /// (continuous jobs, cron-driven jobs)
    pub fn interval(self) -> Option<Duration> {
        match self {
            BackupFrequency::Hourly => Some(Duration::hours(1)),
            BackupFrequency::Daily => Some(Duration::days(1)),
            BackupFrequency::Weekly => Some(Duration::weeks(1)),
            BackupFrequency::Monthly => Some(Duration::days(30)),
            BackupFrequency::Continuous | BackupFrequency::Custom => None,
        }
    }

    pub fn next_run_after(self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.interval().map(|interval| from + interval)
    }
}

impl_data_entity!(
    BackupJob,
    "backup_job",
    "backup_jobs",
    BackupStatus,
    ["name", "description"],
    {
        description: Option<String>,
        backup_type: BackupType,
        source: String,
        destination: String,
        storage_type: StorageType,
        frequency: BackupFrequency,
        schedule_cron: Option<String>,
        last_run_at: Option<DateTime<Utc>>,
        next_run_at: Option<DateTime<Utc>>,
        duration_seconds: u64,
        size_bytes: u64,
        files_count: u64,
        progress: u8,
        retention_days: u32,
        encrypted: bool,
        compressed: bool,
        verified: bool,
        success_rate: f64,
        restore_points: u32,
        vault_id: Option<Uuid>,
        cross_region: bool,
        legal_hold: bool,
    }
);

impl BackupJob {
    /// Whether a restore can be taken from this job
    pub fn has_run(&self) -> bool {
        self.last_run_at.is_some() || self.status == BackupStatus::Completed
    }
}

impl_data_entity!(
    RecoveryPoint,
    "recovery_point",
    "recovery_points",
    RecoveryPointStatus,
    ["name", "job_name"],
    {
        job_id: Uuid,
        job_name: String,
        backup_type: BackupType,
        size_bytes: u64,
        verified: bool,
        retention_until: Option<DateTime<Utc>>,
        vault_id: Option<Uuid>,
        legal_hold: bool,
        recovery_tested: bool,
    }
);

impl_data_entity!(
    BackupVault,
    "backup_vault",
    "backup_vaults",
    VaultStatus,
    ["name", "description", "region"],
    {
        description: Option<String>,
        region: String,
        recovery_points: u32,
        total_size_bytes: u64,
        encryption_key: Option<String>,
        locked: bool,
        lock_date: Option<DateTime<Utc>>,
        min_retention_days: u32,
        max_retention_days: u32,
        access_policy: Option<String>,
    }
);

impl_data_entity!(
    RestoreRequest,
    "restore_request",
    "restore_requests",
    RestoreStatus,
    ["name", "target_location"],
    {
        job_id: Uuid,
        recovery_point_id: Option<Uuid>,
        target_location: Option<String>,
    }
);

/// Payload for `POST /backup_jobs`
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct BackupJobForm {
    #[validate(custom(function = "crate::core::validation::validators::not_blank"))]
    pub name: String,
    pub description: Option<String>,
    pub backup_type: Option<BackupType>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub destination: String,
    pub storage_type: Option<StorageType>,
    pub frequency: Option<BackupFrequency>,
    #[validate(custom(function = "crate::core::validation::validators::cron_expression"))]
    pub schedule_cron: Option<String>,
    #[validate(range(min = 1, message = "must be at least one day"))]
    pub retention_days: Option<u32>,
    pub encrypted: Option<bool>,
    pub compressed: Option<bool>,
    pub vault_id: Option<Uuid>,
}

/// Payload for `PUT /backup_jobs/{id}`
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct BackupJobPatch {
    #[validate(custom(function = "crate::core::validation::validators::not_blank"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub backup_type: Option<BackupType>,
    pub source: Option<String>,
    pub destination: Option<String>,
    pub storage_type: Option<StorageType>,
    #[validate(range(min = 1, message = "must be at least one day"))]
    pub retention_days: Option<u32>,
    pub encrypted: Option<bool>,
    pub compressed: Option<bool>,
    pub vault_id: Option<Uuid>,
}

/// Payload for `POST /backup_jobs/{id}/schedule`
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ScheduleForm {
    pub frequency: BackupFrequency,
    #[validate(custom(function = "crate::core::validation::validators::cron_expression"))]
    pub schedule_cron: Option<String>,
}

/// Payload for `POST /backup_jobs/{id}/restore-from`
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct RestoreForm {
    pub recovery_point_id: Option<Uuid>,
    pub target_location: Option<String>,
}

/// Payload for `POST /backup_vaults`
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct VaultForm {
    #[validate(custom(function = "crate::core::validation::validators::not_blank"))]
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    pub encryption_key: Option<String>,
    #[serde(default = "default_min_retention")]
    pub min_retention_days: u32,
    #[serde(default = "default_max_retention")]
    pub max_retention_days: u32,
    pub access_policy: Option<String>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_min_retention() -> u32 {
    1
}

fn default_max_retention() -> u32 {
    365
}

/// Body of `POST /backups/actions`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BackupAction {
    /// Protect a recovery point, or a job with all its recovery points
    LegalHold {
        #[serde(alias = "backupId")]
        backup_id: Uuid,
    },
    /// WORM-lock a vault, given directly or through one of its jobs
    LockVault {
        #[serde(default, alias = "vaultId")]
        vault_id: Option<Uuid>,
        #[serde(default, alias = "backupId")]
        backup_id: Option<Uuid>,
    },
    /// Turn on cross-region copies for a job
    Replicate {
        #[serde(alias = "backupId")]
        backup_id: Uuid,
    },
    /// Move a job to cold storage, or archive a vault
    Archive {
        #[serde(default, alias = "vaultId")]
        vault_id: Option<Uuid>,
        #[serde(default, alias = "backupId")]
        backup_id: Option<Uuid>,
    },
}

impl BackupAction {
    pub const NAMES: &'static [&'static str] = &["legal_hold", "lock_vault", "replicate", "archive"];

    pub fn name(&self) -> &'static str {
        match self {
            BackupAction::LegalHold { .. } => "legal_hold",
            BackupAction::LockVault { .. } => "lock_vault",
            BackupAction::Replicate { .. } => "replicate",
            BackupAction::Archive { .. } => "archive",
        }
    }
}
