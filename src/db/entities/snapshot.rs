use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::db::enums::SnapshotSource;

/// One immutable telemetry record. Rows are insert-only: a machine's
/// current state is the newest row by `created_at`, never an update.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "snapshots")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub machine_id: i32,
    pub source: SnapshotSource,
    pub created_at: ChronoDateTimeUtc,
    pub cpu_percent: Option<f64>,
    pub cpu_user: Option<f64>,
    pub cpu_system: Option<f64>,
    pub cpu_iowait: Option<f64>,
    pub cpu_count: Option<i32>,
    pub memory_percent: Option<f64>,
    pub memory_used_bytes: Option<i64>,
    pub memory_total_bytes: Option<i64>,
    pub swap_percent: Option<f64>,
    pub swap_used_bytes: Option<i64>,
    pub swap_total_bytes: Option<i64>,
    pub uptime_seconds: Option<i64>,
    pub load_avg: Option<f64>,
    pub battery_percent: Option<f64>,
    pub battery_status: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::machine::Entity",
        from = "Column::MachineId",
        to = "super::machine::Column::Id",
        on_delete = "Cascade",
        on_update = "Cascade"
    )]
    Machine,
    #[sea_orm(has_many = "super::snapshot_filesystem::Entity")]
    SnapshotFilesystem,
    #[sea_orm(has_many = "super::snapshot_network_interface::Entity")]
    SnapshotNetworkInterface,
    #[sea_orm(has_many = "super::snapshot_sensor::Entity")]
    SnapshotSensor,
    #[sea_orm(has_many = "super::snapshot_alert::Entity")]
    SnapshotAlert,
}

impl Related<super::machine::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Machine.def()
    }
}

impl Related<super::snapshot_filesystem::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SnapshotFilesystem.def()
    }
}

impl Related<super::snapshot_network_interface::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SnapshotNetworkInterface.def()
    }
}

impl Related<super::snapshot_sensor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SnapshotSensor.def()
    }
}

impl Related<super::snapshot_alert::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SnapshotAlert.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
