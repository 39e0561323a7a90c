//! Backup dashboard statistics

use super::model::{BackupJob, BackupStatus, BackupVault, RecoveryPoint};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackupStats {
    pub total_jobs: usize,
    pub completed: usize,
    pub running: usize,
    pub failed: usize,
    pub total_size_bytes: u64,
    /// Mean of the jobs' success rates, 0 with no jobs
    pub avg_success_rate: f64,
    pub total_restore_points: u64,
    pub vault_count: usize,
    /// Recovery points under legal hold
    pub legal_hold_count: usize,
}

impl BackupStats {
    pub fn compute(jobs: &[BackupJob], points: &[RecoveryPoint], vaults: &[BackupVault]) -> Self {
        let count = |status: BackupStatus| jobs.iter().filter(|j| j.status == status).count();

        Self {
            total_jobs: jobs.len(),
            completed: count(BackupStatus::Completed),
            running: count(BackupStatus::Running),
            failed: count(BackupStatus::Failed),
            total_size_bytes: jobs.iter().map(|j| j.size_bytes).sum(),
            avg_success_rate: if jobs.is_empty() {
                0.0
            } else {
                jobs.iter().map(|j| j.success_rate).sum::<f64>() / jobs.len() as f64
            },
            total_restore_points: jobs.iter().map(|j| u64::from(j.restore_points)).sum(),
            vault_count: vaults.len(),
            legal_hold_count: points.iter().filter(|p| p.legal_hold).count(),
        }
    }
}
