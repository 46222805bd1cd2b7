use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::db::entities::{
    machine, snapshot, snapshot_alert, snapshot_filesystem, snapshot_network_interface,
    snapshot_sensor,
};
use crate::ingest::normalizer::{MachineFacts, NewSnapshot};

/// The variable-shape sub-records belonging to one snapshot.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSubRecords {
    pub filesystems: Vec<snapshot_filesystem::Model>,
    pub network_interfaces: Vec<snapshot_network_interface::Model>,
    pub sensors: Vec<snapshot_sensor::Model>,
    pub alerts: Vec<snapshot_alert::Model>,
}

/// Persists one normalized snapshot atomically: the snapshot row, its
/// sub-records, the machine's `last_seen` advance and first-write
/// identity fields commit together or not at all.
pub async fn record_snapshot(
    db: &DatabaseConnection,
    machine: &machine::Model,
    new: &NewSnapshot,
) -> Result<snapshot::Model, DbErr> {
    let txn = db.begin().await?;

    let snapshot_model = snapshot::ActiveModel {
        machine_id: Set(machine.id),
        source: Set(new.source.clone()),
        created_at: Set(new.timestamp),
        cpu_percent: Set(new.cpu_percent),
        cpu_user: Set(new.cpu_user),
        cpu_system: Set(new.cpu_system),
        cpu_iowait: Set(new.cpu_iowait),
        cpu_count: Set(new.cpu_count),
        memory_percent: Set(new.memory_percent),
        memory_used_bytes: Set(new.memory_used_bytes),
        memory_total_bytes: Set(new.memory_total_bytes),
        swap_percent: Set(new.swap_percent),
        swap_used_bytes: Set(new.swap_used_bytes),
        swap_total_bytes: Set(new.swap_total_bytes),
        uptime_seconds: Set(new.uptime_seconds),
        load_avg: Set(new.load_avg),
        battery_percent: Set(new.battery_percent),
        battery_status: Set(new.battery_status.clone()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for fs in &new.filesystems {
        snapshot_filesystem::ActiveModel {
            snapshot_id: Set(snapshot_model.id),
            mount_point: Set(fs.mount_point.clone()),
            device_name: Set(fs.device_name.clone()),
            used_bytes: Set(fs.used_bytes),
            size_bytes: Set(fs.size_bytes),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    for iface in &new.network_interfaces {
        snapshot_network_interface::ActiveModel {
            snapshot_id: Set(snapshot_model.id),
            interface_name: Set(iface.interface_name.clone()),
            rx_bytes_cumulative: Set(iface.rx_bytes_cumulative),
            tx_bytes_cumulative: Set(iface.tx_bytes_cumulative),
            rx_bytes_delta: Set(iface.rx_bytes_delta),
            tx_bytes_delta: Set(iface.tx_bytes_delta),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    for sensor in &new.sensors {
        snapshot_sensor::ActiveModel {
            snapshot_id: Set(snapshot_model.id),
            label: Set(sensor.label.clone()),
            value: Set(sensor.value),
            unit: Set(sensor.unit.clone()),
            sensor_type: Set(sensor.sensor_type.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    for alert in &new.alerts {
        snapshot_alert::ActiveModel {
            snapshot_id: Set(snapshot_model.id),
            alert_type: Set(alert.alert_type.clone()),
            state: Set(alert.state.clone()),
            sort_key: Set(alert.sort_key.clone()),
            message: Set(alert.message.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    // last_seen advances by the embedded snapshot timestamp and only
    // forward, so out-of-order delivery never regresses it.
    machine::Entity::update_many()
        .col_expr(machine::Column::LastSeen, Expr::value(new.timestamp))
        .filter(machine::Column::Id.eq(machine.id))
        .filter(
            Condition::any()
                .add(machine::Column::LastSeen.is_null())
                .add(machine::Column::LastSeen.lt(new.timestamp)),
        )
        .exec(&txn)
        .await?;

    apply_machine_facts(&txn, machine, &new.facts).await?;

    txn.commit().await?;
    Ok(snapshot_model)
}

/// Fills machine identity columns from telemetry, first-write-wins: a
/// column set once, at registration or by an earlier snapshot, is never
/// overwritten.
async fn apply_machine_facts<C: ConnectionTrait>(
    conn: &C,
    machine: &machine::Model,
    facts: &MachineFacts,
) -> Result<(), DbErr> {
    if machine.hostname.is_none() {
        if let Some(hostname) = &facts.hostname {
            machine::Entity::update_many()
                .col_expr(machine::Column::Hostname, Expr::value(hostname.clone()))
                .filter(machine::Column::Id.eq(machine.id))
                .filter(machine::Column::Hostname.is_null())
                .exec(conn)
                .await?;
        }
    }
    if machine.os_name.is_none() {
        if let Some(os_name) = &facts.os_name {
            machine::Entity::update_many()
                .col_expr(machine::Column::OsName, Expr::value(os_name.clone()))
                .filter(machine::Column::Id.eq(machine.id))
                .filter(machine::Column::OsName.is_null())
                .exec(conn)
                .await?;
        }
    }
    if machine.os_version.is_none() {
        if let Some(os_version) = &facts.os_version {
            machine::Entity::update_many()
                .col_expr(machine::Column::OsVersion, Expr::value(os_version.clone()))
                .filter(machine::Column::Id.eq(machine.id))
                .filter(machine::Column::OsVersion.is_null())
                .exec(conn)
                .await?;
        }
    }
    Ok(())
}

/// Retrieves the most recent snapshot for a machine.
pub async fn get_latest_snapshot(
    db: &DatabaseConnection,
    machine_id: i32,
) -> Result<Option<snapshot::Model>, DbErr> {
    snapshot::Entity::find()
        .filter(snapshot::Column::MachineId.eq(machine_id))
        .order_by_desc(snapshot::Column::CreatedAt)
        .one(db)
        .await
}

/// Retrieves snapshots for a machine, newest first.
pub async fn get_machine_snapshots(
    db: &DatabaseConnection,
    machine_id: i32,
    limit: u64,
) -> Result<Vec<snapshot::Model>, DbErr> {
    snapshot::Entity::find()
        .filter(snapshot::Column::MachineId.eq(machine_id))
        .order_by_desc(snapshot::Column::CreatedAt)
        .limit(limit)
        .all(db)
        .await
}

/// Retrieves snapshots for a machine within a time range, newest first.
pub async fn get_snapshots_in_timerange(
    db: &DatabaseConnection,
    machine_id: i32,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> Result<Vec<snapshot::Model>, DbErr> {
    snapshot::Entity::find()
        .filter(snapshot::Column::MachineId.eq(machine_id))
        .filter(snapshot::Column::CreatedAt.gte(start_time))
        .filter(snapshot::Column::CreatedAt.lte(end_time))
        .order_by_desc(snapshot::Column::CreatedAt)
        .all(db)
        .await
}

/// Loads the sub-records for one snapshot.
pub async fn load_sub_records(
    db: &DatabaseConnection,
    snapshot_id: i32,
) -> Result<SnapshotSubRecords, DbErr> {
    let filesystems = snapshot_filesystem::Entity::find()
        .filter(snapshot_filesystem::Column::SnapshotId.eq(snapshot_id))
        .all(db)
        .await?;
    let network_interfaces = snapshot_network_interface::Entity::find()
        .filter(snapshot_network_interface::Column::SnapshotId.eq(snapshot_id))
        .all(db)
        .await?;
    let sensors = snapshot_sensor::Entity::find()
        .filter(snapshot_sensor::Column::SnapshotId.eq(snapshot_id))
        .all(db)
        .await?;
    let alerts = snapshot_alert::Entity::find()
        .filter(snapshot_alert::Column::SnapshotId.eq(snapshot_id))
        .all(db)
        .await?;
    Ok(SnapshotSubRecords {
        filesystems,
        network_interfaces,
        sensors,
        alerts,
    })
}

/// Deletes snapshots older than the retention window. Sub-records cascade
/// with their snapshot. Returns the number of snapshot rows removed.
pub async fn cleanup_old_snapshots(
    db: &DatabaseConnection,
    days_to_keep: u32,
) -> Result<u64, DbErr> {
    let cutoff = Utc::now() - Duration::days(i64::from(days_to_keep));
    let result = snapshot::Entity::delete_many()
        .filter(snapshot::Column::CreatedAt.lt(cutoff))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Keeps only the newest N snapshots per machine and deletes the rest.
/// Returns the total number of snapshot rows removed.
pub async fn cleanup_snapshots_by_count(
    db: &DatabaseConnection,
    max_records_per_machine: u64,
) -> Result<u64, DbErr> {
    let machines = machine::Entity::find().all(db).await?;
    let mut total_deleted = 0;

    for machine in machines {
        let stale_ids: Vec<i32> = snapshot::Entity::find()
            .filter(snapshot::Column::MachineId.eq(machine.id))
            .order_by_desc(snapshot::Column::CreatedAt)
            .offset(max_records_per_machine)
            .select_only()
            .column(snapshot::Column::Id)
            .into_tuple()
            .all(db)
            .await?;

        if stale_ids.is_empty() {
            continue;
        }

        let result = snapshot::Entity::delete_many()
            .filter(snapshot::Column::Id.is_in(stale_ids))
            .exec(db)
            .await?;
        total_deleted += result.rows_affected;
    }

    Ok(total_deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::enums::SnapshotSource;
    use chrono::TimeZone;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn stored_snapshot(id: i32, machine_id: i32) -> snapshot::Model {
        snapshot::Model {
            id,
            machine_id,
            source: SnapshotSource::Webhook,
            created_at: Utc.with_ymd_and_hms(2026, 8, 5, 12, 0, 0).unwrap(),
            cpu_percent: Some(42.5),
            cpu_user: None,
            cpu_system: None,
            cpu_iowait: None,
            cpu_count: None,
            memory_percent: Some(61.2),
            memory_used_bytes: Some(1024),
            memory_total_bytes: Some(4096),
            swap_percent: None,
            swap_used_bytes: None,
            swap_total_bytes: None,
            uptime_seconds: Some(86_400),
            load_avg: Some(0.7),
            battery_percent: None,
            battery_status: None,
        }
    }

    #[tokio::test]
    async fn test_get_latest_snapshot_returns_newest_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![stored_snapshot(9, 1)]])
            .into_connection();

        let latest = get_latest_snapshot(&db, 1).await.unwrap().unwrap();
        assert_eq!(latest.id, 9);
        assert_eq!(latest.source, SnapshotSource::Webhook);
    }

    #[tokio::test]
    async fn test_get_latest_snapshot_handles_no_history() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<snapshot::Model>::new()])
            .into_connection();

        assert!(get_latest_snapshot(&db, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cleanup_old_snapshots_reports_deleted_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 42,
            }])
            .into_connection();

        let deleted = cleanup_old_snapshots(&db, 30).await.unwrap();
        assert_eq!(deleted, 42);
    }
}
