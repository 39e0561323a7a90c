//! Generic table routes shared by every record type
//!
//! Each handler is generic over the record type and reads a [`CrudState<T>`]
//! out of the module state through `FromRef`, so a descriptor can mount the
//! generic handlers and its domain handlers on the same paths:
//!
//! ```rust,ignore
//! Router::new()
//!     .route("/deals", get(crud::list::<Deal>).post(handlers::create_deal))
//!     .route("/deals/export", get(crud::export::<Deal>))
//!     .route("/deals/{id}", get(crud::fetch::<Deal>).delete(crud::remove::<Deal>))
//!     .route("/deals/{id}/restore", post(crud::restore::<Deal>))
//!     .with_state(sales_state)
//! ```

use crate::config::PaginationConfig;
use crate::core::error::{DashError, DashResult, RequestError};
use crate::core::extractors::{Actor, parse_id};
use crate::core::mutation::{Mutation, Mutator};
use crate::core::query::{PaginatedResponse, QueryParams};
use crate::core::{Data, DataService};
use crate::export::{ExportFile, ExportFormat, export_rows};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Per-table state used by the generic handlers
pub struct CrudState<T: Data> {
    pub service: Arc<dyn DataService<T>>,
    pub mutator: Mutator,
    pub pagination: PaginationConfig,
}

impl<T: Data> Clone for CrudState<T> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            mutator: self.mutator.clone(),
            pagination: self.pagination,
        }
    }
}

impl<T: Data> CrudState<T> {
    pub fn new(
        service: Arc<dyn DataService<T>>,
        mutator: Mutator,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            service,
            mutator,
            pagination,
        }
    }

    /// Load one row visible to the actor, soft-deleted rows included
    pub async fn load(&self, id: Uuid, actor: Actor) -> DashResult<T> {
        let row = self
            .service
            .get(&id)
            .await?
            .ok_or_else(|| DashError::not_found(T::resource_name_singular(), id))?;

        if let (Some(actor), Some(owner)) = (actor.id(), row.owner_id())
            && actor != owner
        {
            return Err(DashError::not_found(T::resource_name_singular(), id));
        }
        Ok(row)
    }
}

/// `GET /{plural}`
pub async fn list<T: Data>(
    State(state): State<CrudState<T>>,
    actor: Actor,
    Query(params): Query<QueryParams>,
) -> DashResult<Json<PaginatedResponse<T>>> {
    let query = params.to_list_query(actor.id())?;
    let rows = state.service.query(&query).await?;
    let limit = params.limit(state.pagination.default_limit, state.pagination.max_limit);

    Ok(Json(PaginatedResponse::paginate(rows, params.page(), limit)))
}

/// `GET /{plural}/{id}`
pub async fn fetch<T: Data>(
    State(state): State<CrudState<T>>,
    actor: Actor,
    Path(id): Path<String>,
) -> DashResult<Json<T>> {
    let id = parse_id(&id)?;
    Ok(Json(state.load(id, actor).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeleteParams {
    /// Remove the row instead of stamping `deleted_at`
    pub hard: bool,
}

/// `DELETE /{plural}/{id}[?hard=true]`
pub async fn remove<T: Data>(
    State(state): State<CrudState<T>>,
    actor: Actor,
    Path(id): Path<String>,
    Query(params): Query<DeleteParams>,
) -> DashResult<StatusCode> {
    let id = parse_id(&id)?;
    state.load(id, actor).await?;

    let service = state.service.clone();
    let mutation = Mutation::delete(T::resource_name_singular(), id, !params.hard).by(actor.id());
    if params.hard {
        state
            .mutator
            .run(mutation, async move { Ok(service.delete(&id).await?) })
            .await?;
    } else {
        state
            .mutator
            .run(mutation, async move { Ok(service.soft_delete(&id).await?) })
            .await?;
    }

    Ok(StatusCode::NO_CONTENT)
}

/// `POST /{plural}/{id}/restore`
pub async fn restore<T: Data>(
    State(state): State<CrudState<T>>,
    actor: Actor,
    Path(id): Path<String>,
) -> DashResult<Json<T>> {
    let id = parse_id(&id)?;
    state.load(id, actor).await?;

    let service = state.service.clone();
    let row = state
        .mutator
        .run(
            Mutation::restore(T::resource_name_singular(), id).by(actor.id()),
            async move { Ok(service.restore(&id).await?) },
        )
        .await?;
    Ok(Json(row))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExportParams {
    pub format: Option<String>,
    pub q: Option<String>,
    pub status: Option<String>,
    pub include_deleted: bool,
    pub sort: Option<String>,
}

/// `GET /{plural}/export?format=csv|json`
///
/// One row per record, every serialized field a column.
pub async fn export<T: Data>(
    State(state): State<CrudState<T>>,
    actor: Actor,
    Query(params): Query<ExportParams>,
) -> DashResult<ExportFile> {
    let format = match params.format.as_deref() {
        None => ExportFormat::Csv,
        Some(raw) => raw
            .parse::<ExportFormat>()
            .map_err(|format| RequestError::UnsupportedFormat { format })?,
    };

    let query = QueryParams {
        q: params.q,
        status: params.status,
        include_deleted: params.include_deleted,
        sort: params.sort,
        ..QueryParams::default()
    }
    .to_list_query(actor.id())?;

    let rows = state.service.query(&query).await?;
    tracing::debug!(table = T::resource_name(), rows = rows.len(), "export");

    Ok(export_rows(T::resource_name(), &rows, format)?)
}
