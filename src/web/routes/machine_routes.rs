use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::services::machine_service::{self, MachineUpdate, NewMachine};
use crate::db::services::snapshot_service;
use crate::liveness;
use crate::web::models::{MachineResponse, MachineWithSnapshotResponse, SnapshotResponse};
use crate::web::{AppError, AppState};

const DEFAULT_PAGE_SIZE: u64 = 100;

#[derive(Deserialize)]
pub struct ListMachinesQuery {
    #[serde(default)]
    pub skip: u64,
    pub limit: Option<u64>,
    pub active_only: Option<bool>,
}

#[derive(Deserialize)]
pub struct CreateMachineRequest {
    pub name: String,
    pub hostname: Option<String>,
    pub ip_address: String,
    pub mac_address: Option<String>,
    pub ha_entity_id: Option<String>,
    pub description: Option<String>,
    pub os_name: Option<String>,
    pub os_version: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateMachineRequest {
    pub name: Option<String>,
    pub hostname: Option<String>,
    pub ip_address: Option<String>,
    pub mac_address: Option<String>,
    pub ha_entity_id: Option<String>,
    pub description: Option<String>,
    pub os_name: Option<String>,
    pub os_version: Option<String>,
    pub is_active: Option<bool>,
}

async fn list_machines_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<ListMachinesQuery>,
) -> Result<Json<Vec<MachineResponse>>, AppError> {
    let machines = machine_service::list_machines(
        &app_state.db,
        params.skip,
        params.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        params.active_only.unwrap_or(true),
    )
    .await?;
    Ok(Json(machines.into_iter().map(Into::into).collect()))
}

async fn list_machines_with_snapshots_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<ListMachinesQuery>,
) -> Result<Json<Vec<MachineWithSnapshotResponse>>, AppError> {
    let rows = machine_service::list_machines_with_latest_snapshot(
        &app_state.db,
        params.skip,
        params.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        params.active_only.unwrap_or(true),
    )
    .await?;

    let now = Utc::now();
    let mut response = Vec::with_capacity(rows.len());
    for (machine, latest) in rows {
        let status = liveness::classify(machine.last_seen, now);
        let latest_snapshot = match latest {
            Some(snapshot) => {
                let sub_records =
                    snapshot_service::load_sub_records(&app_state.db, snapshot.id).await?;
                Some(SnapshotResponse::from_parts(snapshot, sub_records))
            }
            None => None,
        };
        response.push(MachineWithSnapshotResponse {
            machine: machine.into(),
            status,
            latest_snapshot,
        });
    }

    Ok(Json(response))
}

async fn get_machine_handler(
    State(app_state): State<Arc<AppState>>,
    Path(machine_id): Path<i32>,
) -> Result<Json<MachineResponse>, AppError> {
    let machine = machine_service::get_machine(&app_state.db, machine_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Machine not found".to_string()))?;
    Ok(Json(machine.into()))
}

async fn create_machine_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateMachineRequest>,
) -> Result<(StatusCode, Json<MachineResponse>), AppError> {
    if let Some(hostname) = &payload.hostname {
        if machine_service::get_machine_by_hostname(&app_state.db, hostname)
            .await?
            .is_some()
        {
            warn!(hostname = %hostname, "Machine registration rejected: hostname already exists.");
            return Err(AppError::Conflict(
                "Machine with this hostname already exists".to_string(),
            ));
        }
    }

    if !machine_service::get_machines_by_ip(&app_state.db, &payload.ip_address)
        .await?
        .is_empty()
    {
        warn!(ip_address = %payload.ip_address, "Machine registration rejected: IP already exists.");
        return Err(AppError::Conflict(
            "Machine with this IP address already exists".to_string(),
        ));
    }

    let machine = machine_service::create_machine(
        &app_state.db,
        NewMachine {
            name: payload.name,
            hostname: payload.hostname,
            ip_address: payload.ip_address,
            mac_address: payload.mac_address,
            ha_entity_id: payload.ha_entity_id,
            description: payload.description,
            os_name: payload.os_name,
            os_version: payload.os_version,
        },
    )
    .await?;

    info!(
        machine_id = machine.id,
        machine_name = %machine.name,
        ip_address = %machine.ip_address,
        "Machine registered."
    );
    Ok((StatusCode::CREATED, Json(machine.into())))
}

async fn update_machine_handler(
    State(app_state): State<Arc<AppState>>,
    Path(machine_id): Path<i32>,
    Json(payload): Json<UpdateMachineRequest>,
) -> Result<Json<MachineResponse>, AppError> {
    let machine = machine_service::update_machine(
        &app_state.db,
        machine_id,
        MachineUpdate {
            name: payload.name,
            hostname: payload.hostname,
            ip_address: payload.ip_address,
            mac_address: payload.mac_address,
            ha_entity_id: payload.ha_entity_id,
            description: payload.description,
            os_name: payload.os_name,
            os_version: payload.os_version,
            is_active: payload.is_active,
        },
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Machine not found".to_string()))?;
    Ok(Json(machine.into()))
}

async fn delete_machine_handler(
    State(app_state): State<Arc<AppState>>,
    Path(machine_id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    let deleted = machine_service::delete_machine(&app_state.db, machine_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Machine not found".to_string()));
    }
    info!(machine_id = machine_id, "Machine deleted.");
    Ok(Json(
        serde_json::json!({ "message": "Machine deleted successfully" }),
    ))
}

pub fn machine_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_machines_handler))
        .route("/", post(create_machine_handler))
        .route("/with-snapshots", get(list_machines_with_snapshots_handler))
        .route("/{machine_id}", get(get_machine_handler))
        .route("/{machine_id}", put(update_machine_handler))
        .route("/{machine_id}", delete(delete_machine_handler))
}
