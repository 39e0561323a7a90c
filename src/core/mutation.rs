//! The uniform mutation pattern
//!
//! Every create, update, delete, status transition and action goes through
//! [`Mutator::run`]:
//!
//! - validation failure: no backend call was made, a warning is logged, an
//!   error notification is emitted and the entry is audited as `rejected`;
//! - backend failure: logged with `tracing::error!`, an error notification
//!   is emitted, stored rows stay unchanged;
//! - success: an entity event and a success notification are published.
//!
//! Callers that hold a snapshot (see [`crate::view::Collection`]) re-fetch
//! after a success and keep their snapshot after a failure.

use crate::core::audit::{AuditLog, AuditOutcome};
use crate::core::error::DashResult;
use crate::core::events::{DashboardEvent, EntityEvent, EventBus, Notification};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use uuid::Uuid;

/// What a mutation does to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete { soft: bool },
    Restore,
    /// Side effect outside plain CRUD (refund, rotate keys, run backup...)
    Action,
}

/// Description of one mutation, used for events, notifications and audit
#[derive(Debug, Clone)]
pub struct Mutation {
    pub entity_type: String,
    pub operation: String,
    pub kind: MutationKind,
    pub target: Option<Uuid>,
    pub actor: Option<Uuid>,
    pub success: String,
    pub failure: String,
}

impl Mutation {
    fn new(entity_type: &str, operation: &str, kind: MutationKind, target: Option<Uuid>) -> Self {
        let label = display_name(entity_type);
        let (success, failure) = match kind {
            MutationKind::Create => (
                format!("{} created", label),
                format!("Failed to create {}", label.to_lowercase()),
            ),
            MutationKind::Update => (
                format!("{} updated", label),
                format!("Failed to update {}", label.to_lowercase()),
            ),
            MutationKind::Delete { .. } => (
                format!("{} deleted", label),
                format!("Failed to delete {}", label.to_lowercase()),
            ),
            MutationKind::Restore => (
                format!("{} restored", label),
                format!("Failed to restore {}", label.to_lowercase()),
            ),
            MutationKind::Action => (
                format!("{}: {} done", label, operation.replace('_', " ")),
                format!("Failed to {} {}", operation.replace('_', " "), label.to_lowercase()),
            ),
        };

        Self {
            entity_type: entity_type.to_string(),
            operation: operation.to_string(),
            kind,
            target,
            actor: None,
            success,
            failure,
        }
    }

    pub fn create(entity_type: &str) -> Self {
        Self::new(entity_type, "create", MutationKind::Create, None)
    }

    pub fn update(entity_type: &str, id: Uuid) -> Self {
        Self::new(entity_type, "update", MutationKind::Update, Some(id))
    }

    pub fn delete(entity_type: &str, id: Uuid, soft: bool) -> Self {
        Self::new(entity_type, "delete", MutationKind::Delete { soft }, Some(id))
    }

    pub fn restore(entity_type: &str, id: Uuid) -> Self {
        Self::new(entity_type, "restore", MutationKind::Restore, Some(id))
    }

    pub fn action(entity_type: &str, operation: &str, target: Option<Uuid>) -> Self {
        Self::new(entity_type, operation, MutationKind::Action, target)
    }

    pub fn by(mut self, actor: Option<Uuid>) -> Self {
        self.actor = actor;
        self
    }

    /// Override the notification titles
    pub fn titled(mut self, success: impl Into<String>, failure: impl Into<String>) -> Self {
        self.success = success.into();
        self.failure = failure.into();
        self
    }

    /// Audit action name, e.g. `deal.advance_stage`
    pub fn audit_action(&self) -> String {
        format!("{}.{}", self.entity_type, self.operation)
    }
}

/// `backup_job` -> `Backup job`
pub fn display_name(entity_type: &str) -> String {
    let spaced = entity_type.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Runs mutations and reports their outcome
#[derive(Debug, Clone, Default)]
pub struct Mutator {
    events: EventBus,
    audit: AuditLog,
}

impl Mutator {
    pub fn new(events: EventBus, audit: AuditLog) -> Self {
        Self { events, audit }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Run one mutation through the uniform pattern
    pub async fn run<T, Fut>(&self, mutation: Mutation, operation: Fut) -> DashResult<T>
    where
        T: Serialize,
        Fut: Future<Output = DashResult<T>>,
    {
        match operation.await {
            Ok(value) => {
                self.succeeded(&mutation, &value);
                Ok(value)
            }
            Err(err) => {
                let outcome = if err.is_validation() {
                    tracing::warn!(
                        action = %mutation.audit_action(),
                        "{} rejected: {}",
                        mutation.entity_type,
                        err
                    );
                    AuditOutcome::Rejected
                } else {
                    tracing::error!(
                        action = %mutation.audit_action(),
                        target = ?mutation.target,
                        "{}: {}",
                        mutation.failure,
                        err
                    );
                    AuditOutcome::Failure
                };

                self.events
                    .notify(Notification::error(&mutation.failure).with_description(err.to_string()));
                self.audit.record(
                    mutation.audit_action(),
                    mutation.actor,
                    mutation.target.map(|id| format!("{}:{}", mutation.entity_type, id)),
                    outcome,
                    Some(err.to_string()),
                );
                Err(err)
            }
        }
    }

    fn succeeded<T: Serialize>(&self, mutation: &Mutation, value: &T) {
        let data = serde_json::to_value(value).unwrap_or(Value::Null);
        let entity_id = mutation.target.or_else(|| {
            data.get("id")
                .and_then(Value::as_str)
                .and_then(|s| Uuid::parse_str(s).ok())
        });
        let entity_type = mutation.entity_type.clone();

        let event = match (mutation.kind, entity_id) {
            (MutationKind::Create, Some(entity_id)) => Some(EntityEvent::Created {
                entity_type,
                entity_id,
                data,
            }),
            (MutationKind::Update | MutationKind::Action, Some(entity_id)) => {
                Some(EntityEvent::Updated {
                    entity_type,
                    entity_id,
                    data,
                })
            }
            (MutationKind::Delete { soft }, Some(entity_id)) => Some(EntityEvent::Deleted {
                entity_type,
                entity_id,
                soft,
            }),
            (MutationKind::Restore, Some(entity_id)) => Some(EntityEvent::Restored {
                entity_type,
                entity_id,
            }),
            _ => None,
        };

        tracing::debug!(action = %mutation.audit_action(), id = ?entity_id, "mutation applied");

        if let Some(event) = event {
            self.events.publish(DashboardEvent::Entity(event));
        }
        self.events.notify(Notification::success(&mutation.success));
        self.audit.record(
            mutation.audit_action(),
            mutation.actor,
            entity_id.map(|id| format!("{}:{}", mutation.entity_type, id)),
            AuditOutcome::Success,
            None,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::DashError;
    use serde_json::json;

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("backup_job"), "Backup job");
        assert_eq!(display_name("deal"), "Deal");
        assert_eq!(display_name(""), "");
    }

    #[test]
    fn test_default_titles() {
        let m = Mutation::create("coupon");
        assert_eq!(m.success, "Coupon created");
        assert_eq!(m.failure, "Failed to create coupon");

        let m = Mutation::action("invoice", "send_reminder", None);
        assert_eq!(m.failure, "Failed to send reminder invoice");
        assert_eq!(m.audit_action(), "invoice.send_reminder");
    }

    #[tokio::test]
    async fn test_success_publishes_event_and_notification() {
        let mutator = Mutator::default();
        let mut rx = mutator.events().subscribe();
        let id = Uuid::new_v4();

        let value = mutator
            .run(Mutation::create("deal"), async {
                Ok(json!({"id": id.to_string(), "name": "Acme"}))
            })
            .await
            .unwrap();
        assert_eq!(value["name"], "Acme");

        let first = rx.recv().await.unwrap();
        assert_eq!(first.event.action(), "created");
        assert_eq!(first.event.entity_id(), Some(id));

        let second = rx.recv().await.unwrap();
        let note = second.event.as_notification().unwrap();
        assert_eq!(note.title, "Deal created");
        assert!(!note.is_error());

        let entries = mutator.audit().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].outcome, AuditOutcome::Success);
    }

    #[tokio::test]
    async fn test_failure_emits_error_notification_only() {
        let mutator = Mutator::default();
        let mut rx = mutator.events().subscribe();

        let result: DashResult<Value> = mutator
            .run(Mutation::update("deal", Uuid::new_v4()), async {
                Err(DashError::Internal("backend down".to_string()))
            })
            .await;
        assert!(result.is_err());

        let event = rx.recv().await.unwrap();
        let note = event.event.as_notification().unwrap();
        assert!(note.is_error());
        assert_eq!(note.title, "Failed to update deal");
        assert!(rx.try_recv().is_err());

        assert_eq!(mutator.audit().entries()[0].outcome, AuditOutcome::Failure);
    }

    #[tokio::test]
    async fn test_validation_failure_is_rejected() {
        let mutator = Mutator::default();
        let result: DashResult<Value> = mutator
            .run(Mutation::create("coupon"), async {
                Err(DashError::field("code", "required"))
            })
            .await;
        assert!(result.unwrap_err().is_validation());
        assert_eq!(mutator.audit().entries()[0].outcome, AuditOutcome::Rejected);
    }
}
