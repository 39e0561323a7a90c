//! Bounded in-memory audit log
//!
//! Every mutation and action appends one entry; the oldest entries are
//! evicted once the capacity is reached.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Result of an audited operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    /// Rejected by validation before any backend call
    Rejected,
    Failure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub actor: Option<Uuid>,
    pub target: Option<String>,
    pub outcome: AuditOutcome,
    pub message: Option<String>,
}

/// Shared audit log; clones share the same entries
#[derive(Debug, Clone)]
pub struct AuditLog {
    entries: Arc<RwLock<VecDeque<AuditEntry>>>,
    capacity: usize,
}

impl AuditLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(capacity.min(1024)))),
            capacity,
        }
    }

    pub fn record(
        &self,
        action: impl Into<String>,
        actor: Option<Uuid>,
        target: Option<String>,
        outcome: AuditOutcome,
        message: Option<String>,
    ) {
        let entry = AuditEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            action: action.into(),
            actor,
            target,
            outcome,
            message,
        };

        match self.entries.write() {
            Ok(mut entries) => {
                while entries.len() >= self.capacity {
                    entries.pop_front();
                }
                entries.push_back(entry);
            }
            Err(e) => tracing::error!("Failed to acquire audit log lock: {}", e),
        }
    }

    /// Entries, oldest first
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .read()
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_csv(&self) -> anyhow::Result<String> {
        crate::export::to_csv(&self.entries())
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_evicts_oldest() {
        let log = AuditLog::new(2);
        log.record("a", None, None, AuditOutcome::Success, None);
        log.record("b", None, None, AuditOutcome::Failure, None);
        log.record("c", None, None, AuditOutcome::Rejected, None);

        let actions: Vec<_> = log.entries().into_iter().map(|e| e.action).collect();
        assert_eq!(actions, vec!["b", "c"]);
    }

    #[test]
    fn test_csv_has_one_line_per_entry() {
        let log = AuditLog::default();
        log.record(
            "invoice.send_reminder",
            Some(Uuid::new_v4()),
            Some("invoice:42".to_string()),
            AuditOutcome::Success,
            Some("Reminder sent".to_string()),
        );
        log.record("rotate_api_keys", None, None, AuditOutcome::Success, None);

        let csv = log.to_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("action"));
        assert!(lines[0].contains("outcome"));
        assert!(lines[1].contains("invoice.send_reminder"));
    }
}
