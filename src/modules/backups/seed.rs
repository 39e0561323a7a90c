//! Demo backup estate

use super::model::{
    BackupFrequency, BackupJob, BackupStatus, BackupType, BackupVault, RecoveryPoint,
    RecoveryPointStatus, StorageType, VaultStatus,
};
use crate::core::DataService;
use anyhow::Result;
use chrono::{Duration, Utc};

struct DemoJob {
    name: &'static str,
    source: &'static str,
    backup_type: BackupType,
    storage_type: StorageType,
    frequency: BackupFrequency,
    status: BackupStatus,
    size_gb: u64,
    success_rate: f64,
}

const JOBS: &[DemoJob] = &[
    DemoJob {
        name: "Production database",
        source: "postgres://prod-db-01/app",
        backup_type: BackupType::Incremental,
        storage_type: StorageType::AwsS3,
        frequency: BackupFrequency::Hourly,
        status: BackupStatus::Completed,
        size_gb: 240,
        success_rate: 99.5,
    },
    DemoJob {
        name: "File server",
        source: "/srv/shares",
        backup_type: BackupType::Full,
        storage_type: StorageType::AzureBlob,
        frequency: BackupFrequency::Daily,
        status: BackupStatus::Running,
        size_gb: 1_200,
        success_rate: 97.0,
    },
    DemoJob {
        name: "Mail archive",
        source: "imap://mail.internal",
        backup_type: BackupType::Differential,
        storage_type: StorageType::Wasabi,
        frequency: BackupFrequency::Weekly,
        status: BackupStatus::Failed,
        size_gb: 80,
        success_rate: 82.5,
    },
    DemoJob {
        name: "Kubernetes volumes",
        source: "k8s://prod/pvc",
        backup_type: BackupType::Snapshot,
        storage_type: StorageType::GoogleCloud,
        frequency: BackupFrequency::Daily,
        status: BackupStatus::Scheduled,
        size_gb: 320,
        success_rate: 100.0,
    },
];

const GB: u64 = 1024 * 1024 * 1024;

pub async fn seed(
    jobs: &dyn DataService<BackupJob>,
    points: &dyn DataService<RecoveryPoint>,
    vaults: &dyn DataService<BackupVault>,
) -> Result<usize> {
    let now = Utc::now();

    let vault = vaults
        .create(BackupVault::new(
            "Primary vault".to_string(),
            VaultStatus::Active,
            None,
            Some("Default destination for production backups".to_string()),
            "us-east-1".to_string(),
            0,
            0,
            Some("kms-primary".to_string()),
            false,
            None,
            7,
            365,
            None,
        ))
        .await?;

    let mut point_count = 0u32;
    let mut vault_bytes = 0u64;
    for demo in JOBS {
        let has_run = demo.status != BackupStatus::Scheduled;
        let restore_points = if has_run { 2 } else { 0 };
        let job = jobs
            .create(BackupJob::new(
                demo.name.to_string(),
                demo.status,
                None,
                None,
                demo.backup_type,
                demo.source.to_string(),
                format!("{}://backups/{}", demo.storage_type, demo.name.replace(' ', "-").to_lowercase()),
                demo.storage_type,
                demo.frequency,
                None,
                has_run.then(|| now - Duration::hours(3)),
                demo.frequency.next_run_after(now),
                if has_run { 1_800 } else { 0 },
                demo.size_gb * GB,
                if has_run { 125_000 } else { 0 },
                if demo.status == BackupStatus::Running { 45 } else if has_run { 100 } else { 0 },
                30,
                true,
                true,
                demo.status == BackupStatus::Completed,
                demo.success_rate,
                restore_points,
                Some(vault.id),
                false,
                false,
            ))
            .await?;

        for age in 0..restore_points {
            points
                .create(RecoveryPoint::new(
                    format!("{} #{}", job.name, age + 1),
                    RecoveryPointStatus::Available,
                    None,
                    job.id,
                    job.name.clone(),
                    job.backup_type,
                    job.size_bytes,
                    job.verified,
                    Some(now + Duration::days(30 - i64::from(age))),
                    Some(vault.id),
                    false,
                    age == 0,
                ))
                .await?;
            point_count += 1;
            vault_bytes += job.size_bytes;
        }
    }

    let mut vault = vault;
    vault.recovery_points = point_count;
    vault.total_size_bytes = vault_bytes;
    let vault_id = vault.id;
    vaults.update(&vault_id, vault).await?;

    Ok(JOBS.len())
}
