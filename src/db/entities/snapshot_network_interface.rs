use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-interface byte counters for one snapshot. A source reports either
/// cumulative counters, interval deltas, or both; whichever was provided
/// is stored under its own column and never reconciled with the other.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "snapshot_network_interfaces")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub snapshot_id: i32,
    pub interface_name: String,
    pub rx_bytes_cumulative: Option<i64>,
    pub tx_bytes_cumulative: Option<i64>,
    pub rx_bytes_delta: Option<i64>,
    pub tx_bytes_delta: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::snapshot::Entity",
        from = "Column::SnapshotId",
        to = "super::snapshot::Column::Id",
        on_delete = "Cascade",
        on_update = "Cascade"
    )]
    Snapshot,
}

impl Related<super::snapshot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Snapshot.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
