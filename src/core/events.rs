//! Internal event system for notifications
//!
//! The EventBus uses `tokio::sync::broadcast` to decouple mutations from the
//! consumers that render them (the `/events` SSE stream, tests, collections).
//!
//! # Architecture
//!
//! ```text
//! domain service ──┐
//!                  ├──▶ EventBus::publish() ──▶ broadcast channel ──▶ SSE subscribers
//! action endpoint ─┘
//! ```
//!
//! Every mutation produces an entity event and a [`Notification`], the
//! transient success/error message a dashboard shows after a button press.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Events related to record mutations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EntityEvent {
    /// A record was created
    Created {
        entity_type: String,
        entity_id: Uuid,
        data: serde_json::Value,
    },
    /// A record was updated (including status transitions)
    Updated {
        entity_type: String,
        entity_id: Uuid,
        data: serde_json::Value,
    },
    /// A record was deleted (soft or hard)
    Deleted {
        entity_type: String,
        entity_id: Uuid,
        soft: bool,
    },
    /// A soft-deleted record was brought back
    Restored {
        entity_type: String,
        entity_id: Uuid,
    },
}

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
}

/// Transient user-facing message emitted after a mutation or action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Notification {
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            title: title.into(),
            description: None,
        }
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: title.into(),
            description: None,
        }
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

/// Top-level dashboard event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DashboardEvent {
    /// A record event
    Entity(EntityEvent),
    /// A notification
    Notification(Notification),
}

impl DashboardEvent {
    pub fn event_kind(&self) -> &str {
        match self {
            DashboardEvent::Entity(_) => "entity",
            DashboardEvent::Notification(_) => "notification",
        }
    }

    /// Get the entity type this event relates to
    pub fn entity_type(&self) -> Option<&str> {
        match self {
            DashboardEvent::Entity(
                EntityEvent::Created { entity_type, .. }
                | EntityEvent::Updated { entity_type, .. }
                | EntityEvent::Deleted { entity_type, .. }
                | EntityEvent::Restored { entity_type, .. },
            ) => Some(entity_type),
            DashboardEvent::Notification(_) => None,
        }
    }

    /// Get the record ID this event relates to (if applicable)
    pub fn entity_id(&self) -> Option<Uuid> {
        match self {
            DashboardEvent::Entity(
                EntityEvent::Created { entity_id, .. }
                | EntityEvent::Updated { entity_id, .. }
                | EntityEvent::Deleted { entity_id, .. }
                | EntityEvent::Restored { entity_id, .. },
            ) => Some(*entity_id),
            DashboardEvent::Notification(_) => None,
        }
    }

    /// Get the action name (created, updated, deleted, restored, notify)
    pub fn action(&self) -> &str {
        match self {
            DashboardEvent::Entity(e) => match e {
                EntityEvent::Created { .. } => "created",
                EntityEvent::Updated { .. } => "updated",
                EntityEvent::Deleted { .. } => "deleted",
                EntityEvent::Restored { .. } => "restored",
            },
            DashboardEvent::Notification(_) => "notify",
        }
    }

    pub fn as_notification(&self) -> Option<&Notification> {
        match self {
            DashboardEvent::Notification(n) => Some(n),
            DashboardEvent::Entity(_) => None,
        }
    }
}

/// Envelope wrapping a dashboard event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: DashboardEvent,
}

impl EventEnvelope {
    pub fn new(event: DashboardEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Broadcast-based event bus
///
/// The bus is cheap to clone (Arc internally) and can be shared across threads.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    ///
    /// The capacity determines how many events can be buffered before
    /// slow receivers start losing events (lagged).
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event to all subscribers
    ///
    /// Never fails. Returns the number of receivers that will get the event.
    pub fn publish(&self, event: DashboardEvent) -> usize {
        let envelope = EventEnvelope::new(event);
        // send() returns Err only if there are no receivers
        self.sender.send(envelope).unwrap_or(0)
    }

    pub fn notify(&self, notification: Notification) -> usize {
        self.publish(DashboardEvent::Notification(notification))
    }

    /// Subscribe to future events
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_event_created() {
        let event = EntityEvent::Created {
            entity_type: "deal".to_string(),
            entity_id: Uuid::new_v4(),
            data: json!({"name": "Acme renewal"}),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["action"], "created");
        assert_eq!(json["entity_type"], "deal");
    }

    #[test]
    fn test_notification_serialization() {
        let event = DashboardEvent::Notification(
            Notification::error("Failed to cancel subscription").with_description("timeout"),
        );

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "notification");
        assert_eq!(json["level"], "error");
        assert_eq!(json["description"], "timeout");
        assert_eq!(event.action(), "notify");
        assert!(event.as_notification().unwrap().is_error());
    }

    #[test]
    fn test_dashboard_event_accessors() {
        let id = Uuid::new_v4();
        let event = DashboardEvent::Entity(EntityEvent::Deleted {
            entity_type: "invoice".to_string(),
            entity_id: id,
            soft: true,
        });

        assert_eq!(event.entity_type(), Some("invoice"));
        assert_eq!(event.entity_id(), Some(id));
        assert_eq!(event.action(), "deleted");
        assert_eq!(event.event_kind(), "entity");
    }

    #[tokio::test]
    async fn test_event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        let entity_id = Uuid::new_v4();
        let receivers = bus.publish(DashboardEvent::Entity(EntityEvent::Restored {
            entity_type: "backup_job".to_string(),
            entity_id,
        }));
        assert_eq!(receivers, 1);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event.entity_id(), Some(entity_id));
        assert_eq!(received.event.action(), "restored");
    }

    #[tokio::test]
    async fn test_event_bus_multiple_subscribers() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.receiver_count(), 2);

        assert_eq!(bus.notify(Notification::success("Coupon created")), 2);

        let e1 = rx1.recv().await.unwrap();
        let e2 = rx2.recv().await.unwrap();
        assert_eq!(e1.id, e2.id);
    }

    #[test]
    fn test_event_bus_publish_without_subscribers() {
        let bus = EventBus::new(16);
        assert_eq!(bus.notify(Notification::info("nobody listening")), 0);
    }
}
