//! Backup HTTP handlers

use super::model::{
    BackupAction, BackupJob, BackupJobForm, BackupJobPatch, BackupVault, RecoveryPoint,
    RestoreForm, RestoreRequest, ScheduleForm, VaultForm,
};
use super::service::{BackupService, config_file};
use super::stats::BackupStats;
use crate::core::action::{ActionResponse, parse_action};
use crate::core::error::DashResult;
use crate::core::extractors::{Actor, parse_id};
use crate::core::query::QueryParams;
use crate::core::validation::Validated;
use crate::export::ExportFile;
use crate::server::crud::{CrudState, DeleteParams};
use axum::Json;
use axum::body::Bytes;
use axum::extract::{FromRef, Path, Query, State};
use axum::http::StatusCode;
use serde_json::Value;
use std::sync::Arc;

/// Backup-specific AppState
#[derive(Clone, FromRef)]
pub struct BackupsState {
    pub jobs: CrudState<BackupJob>,
    pub points: CrudState<RecoveryPoint>,
    pub vaults: CrudState<BackupVault>,
    pub restores: CrudState<RestoreRequest>,
    pub service: Arc<BackupService>,
}

pub async fn create_job(
    State(backups): State<Arc<BackupService>>,
    actor: Actor,
    Validated(form): Validated<BackupJobForm>,
) -> DashResult<(StatusCode, Json<BackupJob>)> {
    let job = backups.create_job(form, actor.id()).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn update_job(
    State(backups): State<Arc<BackupService>>,
    actor: Actor,
    Path(id): Path<String>,
    Validated(patch): Validated<BackupJobPatch>,
) -> DashResult<Json<BackupJob>> {
    let id = parse_id(&id)?;
    Ok(Json(backups.update_job(id, patch, actor.id()).await?))
}

/// Like the generic delete, but jobs under legal hold are refused
pub async fn delete_job(
    State(jobs): State<CrudState<BackupJob>>,
    State(backups): State<Arc<BackupService>>,
    actor: Actor,
    Path(id): Path<String>,
    Query(params): Query<DeleteParams>,
) -> DashResult<StatusCode> {
    let id = parse_id(&id)?;
    jobs.load(id, actor).await?;
    backups.delete_job(id, params.hard, actor.id()).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn run_job(
    State(backups): State<Arc<BackupService>>,
    actor: Actor,
    Path(id): Path<String>,
) -> DashResult<Json<BackupJob>> {
    let id = parse_id(&id)?;
    Ok(Json(backups.run_now(id, actor.id()).await?))
}

pub async fn verify_job(
    State(backups): State<Arc<BackupService>>,
    actor: Actor,
    Path(id): Path<String>,
) -> DashResult<Json<BackupJob>> {
    let id = parse_id(&id)?;
    Ok(Json(backups.verify(id, actor.id()).await?))
}

pub async fn cancel_job(
    State(backups): State<Arc<BackupService>>,
    actor: Actor,
    Path(id): Path<String>,
) -> DashResult<Json<BackupJob>> {
    let id = parse_id(&id)?;
    Ok(Json(backups.cancel(id, actor.id()).await?))
}

pub async fn schedule_job(
    State(backups): State<Arc<BackupService>>,
    actor: Actor,
    Path(id): Path<String>,
    Validated(form): Validated<ScheduleForm>,
) -> DashResult<Json<BackupJob>> {
    let id = parse_id(&id)?;
    Ok(Json(backups.schedule(id, form, actor.id()).await?))
}

/// The body is optional: `{recovery_point_id?, target_location?}`
pub async fn restore_from_job(
    State(backups): State<Arc<BackupService>>,
    actor: Actor,
    Path(id): Path<String>,
    body: Bytes,
) -> DashResult<(StatusCode, Json<RestoreRequest>)> {
    let id = parse_id(&id)?;
    let form: RestoreForm = if body.iter().all(u8::is_ascii_whitespace) {
        RestoreForm::default()
    } else {
        serde_json::from_slice(&body)?
    };
    let request = backups.restore_from_job(id, form, actor.id()).await?;
    Ok((StatusCode::ACCEPTED, Json(request)))
}

/// Configuration of a single job as a JSON download
pub async fn export_job_config(
    State(jobs): State<CrudState<BackupJob>>,
    actor: Actor,
    Path(id): Path<String>,
) -> DashResult<ExportFile> {
    let id = parse_id(&id)?;
    let job = jobs.load(id, actor).await?;
    config_file(vec![job])
}

pub async fn export_config(
    State(backups): State<Arc<BackupService>>,
    actor: Actor,
    Query(params): Query<QueryParams>,
) -> DashResult<ExportFile> {
    let query = params.to_list_query(actor.id())?;
    backups.export_config(&query).await
}

pub async fn backup_stats(
    State(backups): State<Arc<BackupService>>,
    actor: Actor,
    Query(params): Query<QueryParams>,
) -> DashResult<Json<BackupStats>> {
    let query = params.to_list_query(actor.id())?;
    Ok(Json(backups.stats(&query).await?))
}

/// `POST /backups/actions` with `{"action": "...", ...}`
pub async fn perform_action(
    State(backups): State<Arc<BackupService>>,
    actor: Actor,
    body: Bytes,
) -> DashResult<Json<ActionResponse>> {
    let body: Value = serde_json::from_slice(&body)?;
    let action: BackupAction = parse_action(body, BackupAction::NAMES)?;
    Ok(Json(backups.perform(action, actor.id()).await?))
}

pub async fn create_vault(
    State(backups): State<Arc<BackupService>>,
    actor: Actor,
    Validated(form): Validated<VaultForm>,
) -> DashResult<(StatusCode, Json<BackupVault>)> {
    let vault = backups.create_vault(form, actor.id()).await?;
    Ok((StatusCode::CREATED, Json(vault)))
}
