use axum::{
    Json, Router,
    body::Bytes,
    extract::{ConnectInfo, Query, State},
    http::HeaderMap,
    routing::post,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

use crate::db::enums::SnapshotSource;
use crate::db::services::snapshot_service;
use crate::ingest::{gateway, normalizer};
use crate::web::{AppError, AppState};

/// Header carrying the deployment's shared webhook secret.
pub const SECRET_HEADER: &str = "x-webhook-secret";

const DEFAULT_DAYS_TO_KEEP: u32 = 30;
const DEFAULT_MAX_RECORDS_PER_MACHINE: u64 = 10_000;

#[derive(Deserialize)]
pub struct TelemetryQuery {
    pub machine_id: Option<i32>,
}

#[derive(Deserialize)]
pub struct CleanupByAgeQuery {
    pub days_to_keep: Option<u32>,
}

#[derive(Deserialize)]
pub struct CleanupByCountQuery {
    pub max_records_per_machine: Option<u64>,
}

fn presented_secret(headers: &HeaderMap) -> Option<&str> {
    headers.get(SECRET_HEADER).and_then(|value| value.to_str().ok())
}

async fn receive_telemetry_handler(
    State(app_state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Query(params): Query<TelemetryQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    gateway::verify_secret(
        app_state.config.webhook_secret.as_deref(),
        presented_secret(&headers),
    )?;

    let document = gateway::parse_document(&body)?;

    let machine = match params.machine_id {
        Some(machine_id) => gateway::resolve_by_id(&app_state.db, machine_id).await?,
        None => gateway::resolve_by_source_ip(&app_state.db, &peer.ip().to_string()).await?,
    };

    let record = normalizer::normalize(&document, SnapshotSource::Webhook, Utc::now());
    let snapshot = snapshot_service::record_snapshot(&app_state.db, &machine, &record)
        .await
        .map_err(|e| {
            error!(machine_id = machine.id, error = %e, "Failed to store webhook snapshot.");
            AppError::DatabaseError(e.to_string())
        })?;

    info!(
        machine_id = machine.id,
        machine_name = %machine.name,
        snapshot_id = snapshot.id,
        cpu_percent = ?record.cpu_percent,
        memory_percent = ?record.memory_percent,
        "Webhook telemetry stored."
    );

    Ok(Json(json!({
        "success": true,
        "message": "Data received and stored successfully",
        "machineId": machine.id,
        "machineName": machine.name,
        "snapshotId": snapshot.id,
    })))
}

async fn cleanup_snapshots_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<CleanupByAgeQuery>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    gateway::verify_secret(
        app_state.config.webhook_secret.as_deref(),
        presented_secret(&headers),
    )?;

    let days_to_keep = params.days_to_keep.unwrap_or(DEFAULT_DAYS_TO_KEEP);
    let deleted_count = snapshot_service::cleanup_old_snapshots(&app_state.db, days_to_keep).await?;

    info!(deleted_count, days_to_keep, "Snapshot cleanup by age completed.");
    Ok(Json(json!({
        "success": true,
        "deletedCount": deleted_count,
        "daysKept": days_to_keep,
        "cleanupMethod": "by_age",
    })))
}

async fn cleanup_snapshots_by_count_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<CleanupByCountQuery>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    gateway::verify_secret(
        app_state.config.webhook_secret.as_deref(),
        presented_secret(&headers),
    )?;

    let max_records = params
        .max_records_per_machine
        .unwrap_or(DEFAULT_MAX_RECORDS_PER_MACHINE);
    let deleted_count =
        snapshot_service::cleanup_snapshots_by_count(&app_state.db, max_records).await?;

    info!(
        deleted_count,
        max_records_per_machine = max_records,
        "Snapshot cleanup by count completed."
    );
    Ok(Json(json!({
        "success": true,
        "deletedCount": deleted_count,
        "maxRecordsPerMachine": max_records,
        "cleanupMethod": "by_count",
    })))
}

pub fn webhook_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/telemetry", post(receive_telemetry_handler))
        .route("/cleanup-snapshots", post(cleanup_snapshots_handler))
        .route(
            "/cleanup-snapshots-by-count",
            post(cleanup_snapshots_by_count_handler),
        )
}
