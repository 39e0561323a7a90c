//! Service trait for data access

use crate::core::Data;
use crate::core::error::{DashError, DashResult};
use crate::core::query::ListQuery;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use uuid::Uuid;

/// Service trait for managing records of one table
///
/// Implementations provide CRUD operations for a specific record type.
/// Callers are agnostic to the underlying storage mechanism.
#[async_trait]
pub trait DataService<T: Data>: Send + Sync {
    /// Insert a new record
    async fn create(&self, entity: T) -> Result<T>;

    /// Get a record by ID (soft-deleted rows included)
    async fn get(&self, id: &Uuid) -> Result<Option<T>>;

    /// List every stored row, soft-deleted rows included
    async fn list(&self) -> Result<Vec<T>>;

    /// Replace an existing record
    async fn update(&self, id: &Uuid, entity: T) -> Result<T>;

    /// Permanently delete a record
    async fn delete(&self, id: &Uuid) -> Result<()>;

    /// Search records by one field value (exact, case-insensitive)
    async fn search(&self, field: &str, value: &str) -> Result<Vec<T>>;

    /// Run a table-scoped list query
    async fn query(&self, query: &ListQuery) -> Result<Vec<T>> {
        Ok(query.apply(self.list().await?))
    }

    /// Stamp `deleted_at` on a record
    async fn soft_delete(&self, id: &Uuid) -> Result<T> {
        let mut entity = self
            .get(id)
            .await?
            .ok_or_else(|| anyhow!("{} {} not found", T::resource_name_singular(), id))?;
        entity.soft_delete();
        self.update(id, entity).await
    }

    /// Clear `deleted_at` on a record
    async fn restore(&self, id: &Uuid) -> Result<T> {
        let mut entity = self
            .get(id)
            .await?
            .ok_or_else(|| anyhow!("{} {} not found", T::resource_name_singular(), id))?;
        entity.restore();
        self.update(id, entity).await
    }
}

/// Load a live (not soft-deleted) row or fail with `NotFound`
pub async fn require<T: Data>(service: &dyn DataService<T>, id: Uuid) -> DashResult<T> {
    match service.get(&id).await? {
        Some(row) if !row.is_deleted() => Ok(row),
        _ => Err(DashError::not_found(T::resource_name_singular(), id)),
    }
}

/// Every live row of a table
pub async fn live_rows<T: Data>(service: &dyn DataService<T>) -> DashResult<Vec<T>> {
    Ok(service.query(&ListQuery::new()).await?)
}
