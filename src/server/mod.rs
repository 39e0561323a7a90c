//! Server module for building the HTTP API
//!
//! This module provides a `ServerBuilder` that registers:
//! - generic CRUD routes for every table declared in modules
//! - the modules' domain and action routes
//! - health checks and the `/events` stream

pub mod builder;
pub mod context;
pub mod crud;
pub mod entity_registry;
pub mod host;
pub mod router;

pub use builder::ServerBuilder;
pub use context::AppContext;
pub use crud::CrudState;
pub use entity_registry::{EntityDescriptor, EntityRegistry};
pub use host::ServerHost;
