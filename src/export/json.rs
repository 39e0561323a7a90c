//! JSON export documents

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Downloadable configuration document
///
/// Serialized as `{name, exportedAt, type, data}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument<T: Serialize> {
    pub name: String,
    pub exported_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: T,
}

impl<T: Serialize> ExportDocument<T> {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, data: T) -> Self {
        Self {
            name: name.into(),
            exported_at: Utc::now(),
            kind: kind.into(),
            data,
        }
    }

    pub fn to_pretty_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Render rows as a pretty JSON array, one element per row
pub fn to_json<T: Serialize>(rows: &[T]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(rows)?)
}
