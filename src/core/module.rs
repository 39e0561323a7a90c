//! Module system
//!
//! A module groups the tables of one dashboard area (backups, billing,
//! sales) and registers their routes.

use crate::server::entity_registry::EntityRegistry;
use anyhow::Result;
use async_trait::async_trait;

/// Trait for a dashboard module
#[async_trait]
pub trait Module: Send + Sync {
    /// Unique module name
    fn name(&self) -> &str;

    /// Module version
    fn version(&self) -> &str {
        "1.0.0"
    }

    /// Entity types managed by this module
    fn entity_types(&self) -> Vec<&str>;

    /// Register one descriptor per table plus the module's own routes
    fn register_entities(&self, registry: &mut EntityRegistry);

    /// Fill the module's tables with demo rows
    async fn seed_demo(&self) -> Result<()> {
        Ok(())
    }
}
