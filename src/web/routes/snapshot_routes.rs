use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::services::{machine_service, snapshot_service};
use crate::web::models::SnapshotResponse;
use crate::web::{AppError, AppState};

const DEFAULT_HISTORY_LIMIT: u64 = 100;
const MAX_HISTORY_LIMIT: u64 = 1000;

#[derive(Deserialize)]
pub struct SnapshotHistoryQuery {
    pub limit: Option<u64>,
}

#[derive(Deserialize)]
pub struct SnapshotTimerangeQuery {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

async fn require_machine(app_state: &AppState, machine_id: i32) -> Result<(), AppError> {
    machine_service::get_machine(&app_state.db, machine_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Machine not found".to_string()))?;
    Ok(())
}

async fn into_responses(
    app_state: &AppState,
    snapshots: Vec<crate::db::entities::snapshot::Model>,
) -> Result<Vec<SnapshotResponse>, AppError> {
    let mut responses = Vec::with_capacity(snapshots.len());
    for snapshot in snapshots {
        let sub_records = snapshot_service::load_sub_records(&app_state.db, snapshot.id).await?;
        responses.push(SnapshotResponse::from_parts(snapshot, sub_records));
    }
    Ok(responses)
}

async fn get_machine_snapshots_handler(
    State(app_state): State<Arc<AppState>>,
    Path(machine_id): Path<i32>,
    Query(params): Query<SnapshotHistoryQuery>,
) -> Result<Json<Vec<SnapshotResponse>>, AppError> {
    require_machine(&app_state, machine_id).await?;

    let limit = params
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .min(MAX_HISTORY_LIMIT);
    let snapshots = snapshot_service::get_machine_snapshots(&app_state.db, machine_id, limit).await?;
    Ok(Json(into_responses(&app_state, snapshots).await?))
}

async fn get_latest_snapshot_handler(
    State(app_state): State<Arc<AppState>>,
    Path(machine_id): Path<i32>,
) -> Result<Json<Option<SnapshotResponse>>, AppError> {
    require_machine(&app_state, machine_id).await?;

    match snapshot_service::get_latest_snapshot(&app_state.db, machine_id).await? {
        Some(snapshot) => {
            let sub_records = snapshot_service::load_sub_records(&app_state.db, snapshot.id).await?;
            Ok(Json(Some(SnapshotResponse::from_parts(snapshot, sub_records))))
        }
        None => Ok(Json(None)),
    }
}

async fn get_snapshots_timerange_handler(
    State(app_state): State<Arc<AppState>>,
    Path(machine_id): Path<i32>,
    Query(params): Query<SnapshotTimerangeQuery>,
) -> Result<Json<Vec<SnapshotResponse>>, AppError> {
    if params.start_time >= params.end_time {
        return Err(AppError::InvalidInput(
            "start_time must be before end_time".to_string(),
        ));
    }
    require_machine(&app_state, machine_id).await?;

    let snapshots = snapshot_service::get_snapshots_in_timerange(
        &app_state.db,
        machine_id,
        params.start_time,
        params.end_time,
    )
    .await?;
    Ok(Json(into_responses(&app_state, snapshots).await?))
}

pub fn snapshot_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/machines/{machine_id}/snapshots",
            get(get_machine_snapshots_handler),
        )
        .route(
            "/api/machines/{machine_id}/snapshots/latest",
            get(get_latest_snapshot_handler),
        )
        .route(
            "/api/machines/{machine_id}/snapshots/timerange",
            get(get_snapshots_timerange_handler),
        )
}
