//! `action`-discriminated request bodies
//!
//! Action endpoints accept `{"action": "<name>", ...}` and answer with an
//! [`ActionResponse`]. Requests are parsed in two steps so that an unknown
//! action name and a malformed payload for a known one produce different
//! errors.

use crate::core::error::{ActionError, DashError, DashResult, RequestError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// `{success, message, data?}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ActionResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data<T: Serialize>(mut self, data: &T) -> DashResult<Self> {
        self.data = Some(serde_json::to_value(data)?);
        Ok(self)
    }
}

/// The `action` field of a body
pub fn action_name(body: &Value) -> DashResult<&str> {
    body.get("action").and_then(Value::as_str).ok_or_else(|| {
        RequestError::InvalidBody {
            message: "missing string field 'action'".to_string(),
        }
        .into()
    })
}

/// Parse a body into a serde-tagged action enum.
///
/// Names outside `known` yield [`ActionError::Unknown`]; a known name with
/// missing or mistyped fields yields [`RequestError::InvalidBody`].
pub fn parse_action<A: DeserializeOwned>(body: Value, known: &[&str]) -> DashResult<A> {
    let name = action_name(&body)?;
    if !known.contains(&name) {
        return Err(ActionError::Unknown {
            action: name.to_string(),
        }
        .into());
    }

    serde_json::from_value(body).map_err(|e| {
        DashError::from(RequestError::InvalidBody {
            message: e.to_string(),
        })
    })
}
