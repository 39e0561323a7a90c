//! Entity traits defining the record abstraction shared by every dashboard table

use crate::core::field::FieldValue;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// A closed set of string-labelled values (statuses, stages, kinds).
///
/// Every enumerated column of a backend row implements this trait, usually
/// through the [`closed_set!`](crate::closed_set) macro. The label is the
/// exact string stored in the backend and used in query strings.
pub trait ClosedSet: Copy + Eq + Send + Sync + 'static {
    /// Backend label of this value
    fn as_str(&self) -> &'static str;

    /// Every member of the set, in declaration order
    fn variants() -> &'static [Self];

    /// Parse a backend label
    fn parse(label: &str) -> Option<Self> {
        Self::variants()
            .iter()
            .copied()
            .find(|variant| variant.as_str() == label)
    }
}

/// Base trait for all records in the system.
///
/// Every record mirrors one backend row and carries:
/// - id: Unique identifier
/// - type: Entity type name (e.g., "deal", "invoice")
/// - created_at / updated_at: Timestamps
/// - deleted_at: Soft deletion timestamp (optional)
/// - status: A typed member of a closed set
/// - owner_id: The user the row belongs to (optional)
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Typed status column
    type Status: ClosedSet;

    /// The plural resource name used in URLs (e.g., "deals", "backup_jobs")
    fn resource_name() -> &'static str;

    /// The singular resource name (e.g., "deal", "backup_job")
    fn resource_name_singular() -> &'static str;

    // === Core Entity Fields ===

    fn id(&self) -> Uuid;

    fn entity_type(&self) -> &str;

    fn created_at(&self) -> DateTime<Utc>;

    fn updated_at(&self) -> DateTime<Utc>;

    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    fn status(&self) -> Self::Status;

    /// The user owning this row, `None` for shared rows
    fn owner_id(&self) -> Option<Uuid>;

    // === Lifecycle ===

    /// Stamp `deleted_at` without removing the row
    fn soft_delete(&mut self);

    /// Clear `deleted_at`
    fn restore(&mut self);

    /// Update the `updated_at` timestamp to now
    fn touch(&mut self);

    // === Utility Methods ===

    /// Check if the entity has been soft-deleted
    fn is_deleted(&self) -> bool {
        self.deleted_at().is_some()
    }

    /// Label of the current status
    fn status_label(&self) -> &'static str {
        self.status().as_str()
    }
}

/// Records with a display name, searchable columns and dynamic field access.
pub trait Data: Entity {
    /// Human-readable name (deal title, job name, invoice number...)
    fn name(&self) -> &str;

    /// Fields matched by free-text search
    fn indexed_fields() -> &'static [&'static str];

    /// Get the value of a specific field by name
    fn field_value(&self, field: &str) -> Option<FieldValue>;

    /// Case-insensitive substring match over the indexed fields.
    ///
    /// An empty needle matches every record.
    fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        Self::indexed_fields().iter().any(|field| {
            self.field_value(field)
                .and_then(|value| value.as_string().map(str::to_lowercase))
                .is_some_and(|text| text.contains(&needle))
        })
    }
}
