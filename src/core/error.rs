//! Typed error handling for the dashboard backend
//!
//! Services and stores return `anyhow::Result`; HTTP handlers convert into
//! [`DashError`], which knows its status code, machine code and JSON body.
//!
//! # Error Categories
//!
//! - [`EntityError`]: record lookups and CRUD
//! - [`ValidationError`]: rejected input, raised before any backend call
//! - [`StorageError`]: backend failures
//! - [`RequestError`]: malformed requests
//! - [`ActionError`]: action endpoints and the payment gateway
//! - [`ConfigError`]: configuration parsing
//!
//! # Example
//!
//! ```rust,ignore
//! use opsboard::prelude::*;
//!
//! async fn load(service: &impl DataService<Deal>, id: Uuid) -> DashResult<Deal> {
//!     service.get(&id).await?.ok_or_else(|| EntityError::NotFound {
//!         entity_type: "deal".to_string(),
//!         id,
//!     }.into())
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// The main error type of the dashboard backend
#[derive(Debug)]
pub enum DashError {
    /// Record-related errors
    Entity(EntityError),

    /// Input validation errors
    Validation(ValidationError),

    /// Storage backend errors
    Storage(StorageError),

    /// HTTP/Request errors
    Request(RequestError),

    /// Side-effecting action errors
    Action(ActionError),

    /// Configuration errors
    Config(ConfigError),

    /// Internal errors (should not happen in normal operation)
    Internal(String),
}

impl fmt::Display for DashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DashError::Entity(e) => write!(f, "{}", e),
            DashError::Validation(e) => write!(f, "{}", e),
            DashError::Storage(e) => write!(f, "{}", e),
            DashError::Request(e) => write!(f, "{}", e),
            DashError::Action(e) => write!(f, "{}", e),
            DashError::Config(e) => write!(f, "{}", e),
            DashError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DashError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DashError::Entity(e) => Some(e),
            DashError::Validation(e) => Some(e),
            DashError::Storage(e) => Some(e),
            DashError::Request(e) => Some(e),
            DashError::Action(e) => Some(e),
            DashError::Config(e) => Some(e),
            DashError::Internal(_) => None,
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl DashError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            DashError::Entity(e) => e.status_code(),
            DashError::Validation(e) => e.status_code(),
            DashError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DashError::Request(e) => e.status_code(),
            DashError::Action(e) => e.status_code(),
            DashError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DashError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            DashError::Entity(e) => e.error_code(),
            DashError::Validation(e) => e.error_code(),
            DashError::Storage(_) => "STORAGE_ERROR",
            DashError::Request(e) => e.error_code(),
            DashError::Action(e) => e.error_code(),
            DashError::Config(_) => "CONFIG_ERROR",
            DashError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the failure happened before any backend call
    pub fn is_validation(&self) -> bool {
        matches!(self, DashError::Validation(_))
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            DashError::Entity(EntityError::NotFound { entity_type, id }) => {
                Some(serde_json::json!({
                    "entity_type": entity_type,
                    "id": id.to_string()
                }))
            }
            DashError::Validation(ValidationError::FieldErrors(errors)) => {
                Some(serde_json::json!({ "fields": errors }))
            }
            DashError::Action(ActionError::Unknown { action }) => {
                Some(serde_json::json!({ "action": action }))
            }
            _ => None,
        }
    }

    /// Shorthand for a single-field validation failure
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        DashError::Validation(ValidationError::FieldError {
            field: field.into(),
            message: message.into(),
        })
    }

    /// Shorthand for a missing record
    pub fn not_found(entity_type: impl Into<String>, id: Uuid) -> Self {
        DashError::Entity(EntityError::NotFound {
            entity_type: entity_type.into(),
            id,
        })
    }

    /// Shorthand for an operation the current status does not allow
    pub fn invalid_transition(
        entity_type: impl Into<String>,
        from: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        DashError::Entity(EntityError::InvalidTransition {
            entity_type: entity_type.into(),
            from: from.into(),
            operation: operation.into(),
        })
    }
}

impl IntoResponse for DashError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Entity Errors
// =============================================================================

/// Errors related to record operations
#[derive(Debug)]
pub enum EntityError {
    /// Record was not found
    NotFound { entity_type: String, id: Uuid },

    /// Record already exists (conflict)
    AlreadyExists { entity_type: String, id: Uuid },

    /// The requested transition is not allowed from the current status
    InvalidTransition {
        entity_type: String,
        from: String,
        operation: String,
    },

    /// Record operation failed
    OperationFailed {
        entity_type: String,
        operation: String,
        message: String,
    },
}

impl fmt::Display for EntityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityError::NotFound { entity_type, id } => {
                write!(f, "{} with id '{}' not found", entity_type, id)
            }
            EntityError::AlreadyExists { entity_type, id } => {
                write!(f, "{} with id '{}' already exists", entity_type, id)
            }
            EntityError::InvalidTransition {
                entity_type,
                from,
                operation,
            } => {
                write!(f, "Cannot {} a {} that is {}", operation, entity_type, from)
            }
            EntityError::OperationFailed {
                entity_type,
                operation,
                message,
            } => {
                write!(f, "Failed to {} {}: {}", operation, entity_type, message)
            }
        }
    }
}

impl std::error::Error for EntityError {}

impl EntityError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EntityError::NotFound { .. } => StatusCode::NOT_FOUND,
            EntityError::AlreadyExists { .. } => StatusCode::CONFLICT,
            EntityError::InvalidTransition { .. } => StatusCode::CONFLICT,
            EntityError::OperationFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            EntityError::NotFound { .. } => "ENTITY_NOT_FOUND",
            EntityError::AlreadyExists { .. } => "ENTITY_ALREADY_EXISTS",
            EntityError::InvalidTransition { .. } => "INVALID_TRANSITION",
            EntityError::OperationFailed { .. } => "ENTITY_OPERATION_FAILED",
        }
    }
}

impl From<EntityError> for DashError {
    fn from(err: EntityError) -> Self {
        DashError::Entity(err)
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to input validation
#[derive(Debug)]
pub enum ValidationError {
    /// Single field validation error
    FieldError { field: String, message: String },

    /// Multiple field validation errors
    FieldErrors(Vec<FieldValidationError>),

    /// Invalid JSON format
    InvalidJson { message: String },

    /// Invalid UUID format
    InvalidUuid { value: String },
}

/// A single field validation error
#[derive(Debug, Clone, Serialize)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::FieldError { field, message } => {
                write!(f, "Validation error for field '{}': {}", field, message)
            }
            ValidationError::FieldErrors(errors) => {
                let msgs: Vec<String> = errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect();
                write!(f, "Validation errors: {}", msgs.join(", "))
            }
            ValidationError::InvalidJson { message } => {
                write!(f, "Invalid JSON: {}", message)
            }
            ValidationError::InvalidUuid { value } => {
                write!(f, "Invalid UUID format: {}", value)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ValidationError::FieldError { .. } | ValidationError::FieldErrors(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ValidationError::InvalidJson { .. } | ValidationError::InvalidUuid { .. } => {
                StatusCode::BAD_REQUEST
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::InvalidJson { .. } => "INVALID_JSON",
            ValidationError::InvalidUuid { .. } => "INVALID_UUID",
            _ => "VALIDATION_ERROR",
        }
    }
}

impl From<ValidationError> for DashError {
    fn from(err: ValidationError) -> Self {
        DashError::Validation(err)
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors related to storage backends
#[derive(Debug)]
pub enum StorageError {
    /// Query execution error
    QueryError { backend: String, message: String },

    /// Lock poisoned or backend otherwise unavailable
    Unavailable { backend: String },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::QueryError { backend, message } => {
                write!(f, "{} query error: {}", backend, message)
            }
            StorageError::Unavailable { backend } => {
                write!(f, "Storage backend '{}' is unavailable", backend)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for DashError {
    fn from(err: StorageError) -> Self {
        DashError::Storage(err)
    }
}

// =============================================================================
// Request Errors
// =============================================================================

/// Errors related to HTTP requests
#[derive(Debug)]
pub enum RequestError {
    /// Invalid record ID format
    InvalidEntityId { id: String },

    /// Invalid query string
    InvalidQuery { message: String },

    /// Invalid request body
    InvalidBody { message: String },

    /// Invalid header value
    InvalidHeader { header: String },

    /// Requested export format is not supported
    UnsupportedFormat { format: String },
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::InvalidEntityId { id } => {
                write!(f, "Invalid entity ID format: '{}'", id)
            }
            RequestError::InvalidQuery { message } => {
                write!(f, "Invalid query: {}", message)
            }
            RequestError::InvalidBody { message } => {
                write!(f, "Invalid request body: {}", message)
            }
            RequestError::InvalidHeader { header } => {
                write!(f, "Invalid value for header: {}", header)
            }
            RequestError::UnsupportedFormat { format } => {
                write!(f, "Unsupported export format: {}", format)
            }
        }
    }
}

impl std::error::Error for RequestError {}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RequestError::InvalidEntityId { .. } => "INVALID_ENTITY_ID",
            RequestError::InvalidQuery { .. } => "INVALID_QUERY",
            RequestError::InvalidBody { .. } => "INVALID_BODY",
            RequestError::InvalidHeader { .. } => "INVALID_HEADER",
            RequestError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
        }
    }
}

impl From<RequestError> for DashError {
    fn from(err: RequestError) -> Self {
        DashError::Request(err)
    }
}

// =============================================================================
// Action Errors
// =============================================================================

/// Errors raised by `action`-discriminated endpoints and external collaborators
#[derive(Debug)]
pub enum ActionError {
    /// The action discriminator is not known
    Unknown { action: String },

    /// The payment gateway rejected or failed the call
    Gateway { message: String },

    /// Template rendering for a generated document failed
    Render { message: String },
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::Unknown { action } => write!(f, "Unknown action: {}", action),
            ActionError::Gateway { message } => write!(f, "Payment gateway error: {}", message),
            ActionError::Render { message } => write!(f, "Failed to render document: {}", message),
        }
    }
}

impl std::error::Error for ActionError {}

impl ActionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ActionError::Unknown { .. } => StatusCode::BAD_REQUEST,
            ActionError::Gateway { .. } => StatusCode::BAD_GATEWAY,
            ActionError::Render { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ActionError::Unknown { .. } => "UNKNOWN_ACTION",
            ActionError::Gateway { .. } => "GATEWAY_ERROR",
            ActionError::Render { .. } => "RENDER_ERROR",
        }
    }
}

impl From<ActionError> for DashError {
    fn from(err: ActionError) -> Self {
        DashError::Action(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Invalid value in configuration
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// IO error while reading configuration
    IoError { message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError { file, message } => {
                if let Some(file) = file {
                    write!(f, "Failed to parse config file '{}': {}", file, message)
                } else {
                    write!(f, "Failed to parse config: {}", message)
                }
            }
            ConfigError::InvalidValue {
                field,
                value,
                message,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for field '{}': {}",
                    value, field, message
                )
            }
            ConfigError::IoError { message } => {
                write!(f, "IO error: {}", message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for DashError {
    fn from(err: ConfigError) -> Self {
        DashError::Config(err)
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<serde_json::Error> for DashError {
    fn from(err: serde_json::Error) -> Self {
        DashError::Validation(ValidationError::InvalidJson {
            message: err.to_string(),
        })
    }
}

impl From<uuid::Error> for DashError {
    fn from(err: uuid::Error) -> Self {
        DashError::Validation(ValidationError::InvalidUuid {
            value: err.to_string(),
        })
    }
}

/// Backend failures surface as storage errors unless they wrap a `DashError`
impl From<anyhow::Error> for DashError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<DashError>() {
            Ok(dash) => dash,
            Err(err) => DashError::Storage(StorageError::QueryError {
                backend: "data service".to_string(),
                message: err.to_string(),
            }),
        }
    }
}

/// A specialized Result type for handler-level operations
pub type DashResult<T> = Result<T, DashError>;
