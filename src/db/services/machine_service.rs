use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QuerySelect, Set,
};

use crate::db::entities::{machine, snapshot};
use crate::db::services::snapshot_service;

/// Fields supplied at registration time.
#[derive(Debug, Clone, Default)]
pub struct NewMachine {
    pub name: String,
    pub hostname: Option<String>,
    pub ip_address: String,
    pub mac_address: Option<String>,
    pub ha_entity_id: Option<String>,
    pub description: Option<String>,
    pub os_name: Option<String>,
    pub os_version: Option<String>,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct MachineUpdate {
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

/// Retrieves a machine by id.
pub async fn get_machine(
    db: &DatabaseConnection,
    machine_id: i32,
) -> Result<Option<machine::Model>, DbErr> {
    machine::Entity::find_by_id(machine_id).one(db).await
}

/// Retrieves a machine by hostname.
pub async fn get_machine_by_hostname(
    db: &DatabaseConnection,
    hostname: &str,
) -> Result<Option<machine::Model>, DbErr> {
    machine::Entity::find()
        .filter(machine::Column::Hostname.eq(hostname))
        .one(db)
        .await
}

/// Retrieves every machine registered with the given address. More than
/// one row is a configuration error the ingestion gateway surfaces.
pub async fn get_machines_by_ip(
    db: &DatabaseConnection,
    ip_address: &str,
) -> Result<Vec<machine::Model>, DbErr> {
    machine::Entity::find()
        .filter(machine::Column::IpAddress.eq(ip_address))
        .all(db)
        .await
}

/// Lists machines with paging; `active_only` hides deactivated entries.
pub async fn list_machines(
    db: &DatabaseConnection,
    skip: u64,
    limit: u64,
    active_only: bool,
) -> Result<Vec<machine::Model>, DbErr> {
    let mut query = machine::Entity::find();
    if active_only {
        query = query.filter(machine::Column::IsActive.eq(true));
    }
    query.offset(skip).limit(limit).all(db).await
}

/// All active machines, for the poller.
pub async fn get_active_machines(db: &DatabaseConnection) -> Result<Vec<machine::Model>, DbErr> {
    machine::Entity::find()
        .filter(machine::Column::IsActive.eq(true))
        .all(db)
        .await
}

/// Registers a new machine.
pub async fn create_machine(
    db: &DatabaseConnection,
    new: NewMachine,
) -> Result<machine::Model, DbErr> {
    let active_model = machine::ActiveModel {
        name: Set(new.name),
        hostname: Set(new.hostname),
        ip_address: Set(new.ip_address),
        mac_address: Set(new.mac_address),
        ha_entity_id: Set(new.ha_entity_id),
        description: Set(new.description),
        os_name: Set(new.os_name),
        os_version: Set(new.os_version),
        is_active: Set(true),
        last_seen: Set(None),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
        ..Default::default()
    };
    active_model.insert(db).await
}

/// Applies a partial update. Returns `None` when the machine does not
/// exist.
pub async fn update_machine(
    db: &DatabaseConnection,
    machine_id: i32,
    update: MachineUpdate,
) -> Result<Option<machine::Model>, DbErr> {
    let Some(existing) = get_machine(db, machine_id).await? else {
        return Ok(None);
    };

    let mut active_model = existing.into_active_model();
    if let Some(name) = update.name {
        active_model.name = Set(name);
    }
    if let Some(hostname) = update.hostname {
        active_model.hostname = Set(Some(hostname));
    }
    if let Some(ip_address) = update.ip_address {
        active_model.ip_address = Set(ip_address);
    }
    if let Some(mac_address) = update.mac_address {
        active_model.mac_address = Set(Some(mac_address));
    }
    if let Some(ha_entity_id) = update.ha_entity_id {
        active_model.ha_entity_id = Set(Some(ha_entity_id));
    }
    if let Some(description) = update.description {
        active_model.description = Set(Some(description));
    }
    if let Some(os_name) = update.os_name {
        active_model.os_name = Set(Some(os_name));
    }
    if let Some(os_version) = update.os_version {
        active_model.os_version = Set(Some(os_version));
    }
    if let Some(is_active) = update.is_active {
        active_model.is_active = Set(is_active);
    }
    active_model.updated_at = Set(Some(Utc::now()));

    active_model.update(db).await.map(Some)
}

/// Deletes a machine; its snapshots cascade away with it. Returns whether
/// a row was removed.
pub async fn delete_machine(db: &DatabaseConnection, machine_id: i32) -> Result<bool, DbErr> {
    let result = machine::Entity::delete_by_id(machine_id).exec(db).await?;
    Ok(result.rows_affected > 0)
}

/// Lists machines paired with their most recent snapshot, the shape the
/// dashboard listing consumes.
pub async fn list_machines_with_latest_snapshot(
    db: &DatabaseConnection,
    skip: u64,
    limit: u64,
    active_only: bool,
) -> Result<Vec<(machine::Model, Option<snapshot::Model>)>, DbErr> {
    let machines = list_machines(db, skip, limit, active_only).await?;
    let mut result = Vec::with_capacity(machines.len());
    for machine in machines {
        let latest = snapshot_service::get_latest_snapshot(db, machine.id).await?;
        result.push((machine, latest));
    }
    Ok(result)
}
