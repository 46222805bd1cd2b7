//! SeaORM entities mapping to the database tables.
//!
//! Each entity lives in its own module; the `prelude` re-exports entity,
//! model and column types under stable aliases.

pub mod machine;
pub mod snapshot;
pub mod snapshot_alert;
pub mod snapshot_filesystem;
pub mod snapshot_network_interface;
pub mod snapshot_sensor;

pub mod prelude {
    pub use super::machine::ActiveModel as MachineActiveModel;
    pub use super::machine::Column as MachineColumn;
    pub use super::machine::Entity as Machine;
    pub use super::machine::Model as MachineModel;

    pub use super::snapshot::ActiveModel as SnapshotActiveModel;
    pub use super::snapshot::Column as SnapshotColumn;
    pub use super::snapshot::Entity as Snapshot;
    pub use super::snapshot::Model as SnapshotModel;

    pub use super::snapshot_filesystem::ActiveModel as SnapshotFilesystemActiveModel;
    pub use super::snapshot_filesystem::Column as SnapshotFilesystemColumn;
    pub use super::snapshot_filesystem::Entity as SnapshotFilesystem;
    pub use super::snapshot_filesystem::Model as SnapshotFilesystemModel;

    pub use super::snapshot_network_interface::ActiveModel as SnapshotNetworkInterfaceActiveModel;
    pub use super::snapshot_network_interface::Column as SnapshotNetworkInterfaceColumn;
    pub use super::snapshot_network_interface::Entity as SnapshotNetworkInterface;
    pub use super::snapshot_network_interface::Model as SnapshotNetworkInterfaceModel;

    pub use super::snapshot_sensor::ActiveModel as SnapshotSensorActiveModel;
    pub use super::snapshot_sensor::Column as SnapshotSensorColumn;
    pub use super::snapshot_sensor::Entity as SnapshotSensor;
    pub use super::snapshot_sensor::Model as SnapshotSensorModel;

    pub use super::snapshot_alert::ActiveModel as SnapshotAlertActiveModel;
    pub use super::snapshot_alert::Column as SnapshotAlertColumn;
    pub use super::snapshot_alert::Entity as SnapshotAlert;
    pub use super::snapshot_alert::Model as SnapshotAlertModel;
}
