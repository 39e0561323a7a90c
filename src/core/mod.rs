//! Core module containing the record abstraction and the shared plumbing

pub mod action;
pub mod audit;
pub mod entity;
pub mod error;
pub mod events;
pub mod extractors;
pub mod field;
pub mod module;
pub mod mutation;
pub mod query;
pub mod service;
pub mod store;
pub mod validation;

pub use action::ActionResponse;
pub use audit::{AuditEntry, AuditLog, AuditOutcome};
pub use entity::{ClosedSet, Data, Entity};
pub use error::{DashError, DashResult};
pub use events::{DashboardEvent, EntityEvent, EventBus, Notification, NotificationLevel};
pub use extractors::Actor;
pub use field::{FieldFormat, FieldValue};
pub use module::Module;
pub use mutation::{Mutation, MutationKind, Mutator};
pub use query::{ListQuery, PaginatedResponse, QueryParams, SortSpec};
pub use service::DataService;
pub use validation::Validated;
