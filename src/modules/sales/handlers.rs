//! Sales HTTP handlers

use super::model::{ActivityForm, Deal, DealForm, DealPatch, LoseForm, SalesActivity};
use super::service::SalesService;
use super::stats::{FunnelStage, SalesStats};
use crate::core::error::DashResult;
use crate::core::extractors::{Actor, parse_id};
use crate::core::query::QueryParams;
use crate::core::validation::Validated;
use crate::export::ExportFile;
use crate::server::crud::CrudState;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{FromRef, Path, Query, State};
use axum::http::StatusCode;
use std::sync::Arc;

/// Sales-specific AppState
#[derive(Clone, FromRef)]
pub struct SalesState {
    pub deals: CrudState<Deal>,
    pub activities: CrudState<SalesActivity>,
    pub service: Arc<SalesService>,
}

pub async fn create_deal(
    State(sales): State<Arc<SalesService>>,
    actor: Actor,
    Validated(form): Validated<DealForm>,
) -> DashResult<(StatusCode, Json<Deal>)> {
    let deal = sales.create_deal(form, actor.id()).await?;
    Ok((StatusCode::CREATED, Json(deal)))
}

pub async fn update_deal(
    State(sales): State<Arc<SalesService>>,
    actor: Actor,
    Path(id): Path<String>,
    Validated(patch): Validated<DealPatch>,
) -> DashResult<Json<Deal>> {
    let id = parse_id(&id)?;
    Ok(Json(sales.update_deal(id, patch, actor.id()).await?))
}

pub async fn advance_deal(
    State(sales): State<Arc<SalesService>>,
    actor: Actor,
    Path(id): Path<String>,
) -> DashResult<Json<Deal>> {
    let id = parse_id(&id)?;
    Ok(Json(sales.advance_stage(id, actor.id()).await?))
}

pub async fn win_deal(
    State(sales): State<Arc<SalesService>>,
    actor: Actor,
    Path(id): Path<String>,
) -> DashResult<Json<Deal>> {
    let id = parse_id(&id)?;
    Ok(Json(sales.win(id, actor.id()).await?))
}

/// The body is optional: `{reason?, competitor?}`
pub async fn lose_deal(
    State(sales): State<Arc<SalesService>>,
    actor: Actor,
    Path(id): Path<String>,
    body: Bytes,
) -> DashResult<Json<Deal>> {
    let id = parse_id(&id)?;
    let form: LoseForm = if body.iter().all(u8::is_ascii_whitespace) {
        LoseForm::default()
    } else {
        serde_json::from_slice(&body)?
    };
    Ok(Json(sales.lose(id, form, actor.id()).await?))
}

pub async fn log_activity(
    State(sales): State<Arc<SalesService>>,
    actor: Actor,
    Path(id): Path<String>,
    Validated(form): Validated<ActivityForm>,
) -> DashResult<(StatusCode, Json<SalesActivity>)> {
    let id = parse_id(&id)?;
    let activity = sales.log_activity(id, form, actor.id()).await?;
    Ok((StatusCode::CREATED, Json(activity)))
}

pub async fn list_deal_activities(
    State(sales): State<Arc<SalesService>>,
    Path(id): Path<String>,
) -> DashResult<Json<Vec<SalesActivity>>> {
    let id = parse_id(&id)?;
    Ok(Json(sales.activities_for(id).await?))
}

pub async fn deal_stats(
    State(sales): State<Arc<SalesService>>,
    actor: Actor,
    Query(params): Query<QueryParams>,
) -> DashResult<Json<SalesStats>> {
    let query = params.to_list_query(actor.id())?;
    Ok(Json(sales.stats(&query).await?))
}

pub async fn deal_funnel(
    State(sales): State<Arc<SalesService>>,
    actor: Actor,
    Query(params): Query<QueryParams>,
) -> DashResult<Json<Vec<FunnelStage>>> {
    let query = params.to_list_query(actor.id())?;
    Ok(Json(sales.funnel(&query).await?))
}

/// Fixed-column pipeline report
pub async fn export_pipeline(
    State(sales): State<Arc<SalesService>>,
    actor: Actor,
    Query(params): Query<QueryParams>,
) -> DashResult<ExportFile> {
    let query = params.to_list_query(actor.id())?;
    sales.pipeline_csv(&query).await
}
