//! # opsboard
//!
//! Backend for three operations dashboards: backups, billing and a sales
//! CRM pipeline.
//!
//! ## Features
//!
//! - **Typed records**: every table is a struct generated by
//!   [`impl_data_entity!`] with a closed status set from [`closed_set!`]
//! - **Table queries**: owner scoping, soft delete, search, status filter,
//!   ordering and pagination over any [`DataService`](core::DataService)
//! - **Uniform mutations**: every write is audited and reported as a
//!   notification on the `/events` stream
//! - **Action endpoints**: `{"action": "..."}` bodies for billing settings
//!   and backup operations
//! - **Exports**: CSV and JSON downloads, printable HTML invoices
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use opsboard::prelude::*;
//!
//! let context = AppContext::new(DashboardConfig::from_yaml_file("opsboard.yaml")?);
//! ServerBuilder::new(context.clone())
//!     .register_module(BackupsModule::new(&context))
//!     .register_module(BillingModule::new(&context))
//!     .register_module(SalesModule::new(&context))
//!     .seed_demo_data()
//!     .await?
//!     .serve(&context.config.server.bind)
//!     .await?;
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod export;
pub mod modules;
pub mod server;
pub mod storage;
pub mod view;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Traits ===
    pub use crate::core::{
        ActionResponse, ClosedSet, DashError, DashResult, Data, DataService, Entity, ListQuery,
        Module, Mutation, Mutator, Notification, QueryParams, Validated,
        field::{FieldFormat, FieldValue},
    };

    // === Macros ===
    pub use crate::{closed_set, impl_data_entity};

    // === Modules ===
    pub use crate::modules::{BackupsModule, BillingModule, SalesModule};

    // === Storage ===
    pub use crate::storage::InMemoryDataService;

    // === Export ===
    pub use crate::export::{ExportFile, ExportFormat};

    // === Config ===
    pub use crate::config::DashboardConfig;

    // === Server ===
    pub use crate::server::{AppContext, EntityDescriptor, EntityRegistry, ServerBuilder};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;
}
