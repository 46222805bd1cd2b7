//! Serialized response shapes for the REST API. Timestamps go out as
//! RFC 3339 strings; field names are camelCase for the SPA.

use serde::Serialize;

use crate::db::entities::{
    machine, snapshot, snapshot_alert, snapshot_filesystem, snapshot_network_interface,
    snapshot_sensor,
};
use crate::db::enums::SnapshotSource;
use crate::db::services::snapshot_service::SnapshotSubRecords;
use crate::liveness::MachineStatus;

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MachineResponse {
    pub id: i32,
    pub name: String,
    pub hostname: Option<String>,
    pub ip_address: String,
    pub mac_address: Option<String>,
    pub ha_entity_id: Option<String>,
    pub description: Option<String>,
    pub os_name: Option<String>,
    pub os_version: Option<String>,
    pub is_active: bool,
    pub last_seen: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<machine::Model> for MachineResponse {
    fn from(model: machine::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            hostname: model.hostname,
            ip_address: model.ip_address,
            mac_address: model.mac_address,
            ha_entity_id: model.ha_entity_id,
            description: model.description,
            os_name: model.os_name,
            os_version: model.os_version,
            is_active: model.is_active,
            last_seen: model.last_seen.map(|dt| dt.to_rfc3339()),
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FilesystemResponse {
    pub mount_point: String,
    pub device_name: Option<String>,
    pub used_bytes: i64,
    pub size_bytes: i64,
    /// Derived from the stored byte columns at read time, never persisted.
    pub usage_percent: Option<f64>,
}

impl From<snapshot_filesystem::Model> for FilesystemResponse {
    fn from(model: snapshot_filesystem::Model) -> Self {
        let usage_percent = filesystem_usage_percent(model.used_bytes, model.size_bytes);
        Self {
            mount_point: model.mount_point,
            device_name: model.device_name,
            used_bytes: model.used_bytes,
            size_bytes: model.size_bytes,
            usage_percent,
        }
    }
}

/// Percent used for a filesystem entry, or `None` when the stored bytes
/// cannot produce a meaningful value (zero size, or used exceeding size).
pub fn filesystem_usage_percent(used_bytes: i64, size_bytes: i64) -> Option<f64> {
    if size_bytes <= 0 || used_bytes < 0 || used_bytes > size_bytes {
        return None;
    }
    Some(used_bytes as f64 / size_bytes as f64 * 100.0)
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceResponse {
    pub interface_name: String,
    pub rx_bytes_cumulative: Option<i64>,
    pub tx_bytes_cumulative: Option<i64>,
    pub rx_bytes_delta: Option<i64>,
    pub tx_bytes_delta: Option<i64>,
}

impl From<snapshot_network_interface::Model> for NetworkInterfaceResponse {
    fn from(model: snapshot_network_interface::Model) -> Self {
        Self {
            interface_name: model.interface_name,
            rx_bytes_cumulative: model.rx_bytes_cumulative,
            tx_bytes_cumulative: model.tx_bytes_cumulative,
            rx_bytes_delta: model.rx_bytes_delta,
            tx_bytes_delta: model.tx_bytes_delta,
        }
    }
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SensorResponse {
    pub label: String,
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub sensor_type: Option<String>,
}

impl From<snapshot_sensor::Model> for SensorResponse {
    fn from(model: snapshot_sensor::Model) -> Self {
        Self {
            label: model.label,
            value: model.value,
            unit: model.unit,
            sensor_type: model.sensor_type,
        }
    }
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AlertResponse {
    pub alert_type: String,
    pub state: String,
    pub sort_key: Option<String>,
    pub message: String,
}

impl From<snapshot_alert::Model> for AlertResponse {
    fn from(model: snapshot_alert::Model) -> Self {
        Self {
            alert_type: model.alert_type,
            state: model.state,
            sort_key: model.sort_key,
            message: model.message,
        }
    }
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotResponse {
    pub id: i32,
    pub machine_id: i32,
    pub source: SnapshotSource,
    pub created_at: String,
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
    pub filesystems: Vec<FilesystemResponse>,
    pub network_interfaces: Vec<NetworkInterfaceResponse>,
    pub sensors: Vec<SensorResponse>,
    pub alerts: Vec<AlertResponse>,
}

impl SnapshotResponse {
    pub fn from_parts(model: snapshot::Model, sub_records: SnapshotSubRecords) -> Self {
        Self {
            id: model.id,
            machine_id: model.machine_id,
            source: model.source,
            created_at: model.created_at.to_rfc3339(),
            cpu_percent: model.cpu_percent,
            cpu_user: model.cpu_user,
            cpu_system: model.cpu_system,
            cpu_iowait: model.cpu_iowait,
            cpu_count: model.cpu_count,
            memory_percent: model.memory_percent,
            memory_used_bytes: model.memory_used_bytes,
            memory_total_bytes: model.memory_total_bytes,
            swap_percent: model.swap_percent,
            swap_used_bytes: model.swap_used_bytes,
            swap_total_bytes: model.swap_total_bytes,
            uptime_seconds: model.uptime_seconds,
            load_avg: model.load_avg,
            battery_percent: model.battery_percent,
            battery_status: model.battery_status,
            filesystems: sub_records
                .filesystems
                .into_iter()
                .map(Into::into)
                .collect(),
            network_interfaces: sub_records
                .network_interfaces
                .into_iter()
                .map(Into::into)
                .collect(),
            sensors: sub_records.sensors.into_iter().map(Into::into).collect(),
            alerts: sub_records.alerts.into_iter().map(Into::into).collect(),
        }
    }
}

/// The dashboard listing row: machine, derived status, newest snapshot.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MachineWithSnapshotResponse {
    #[serde(flatten)]
    pub machine: MachineResponse,
    pub status: MachineStatus,
    pub latest_snapshot: Option<SnapshotResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_percent_derived_from_bytes() {
        assert_eq!(filesystem_usage_percent(50, 100), Some(50.0));
        assert_eq!(filesystem_usage_percent(0, 100), Some(0.0));
        assert_eq!(filesystem_usage_percent(100, 100), Some(100.0));
    }

    #[test]
    fn test_usage_percent_undefined_for_bad_inputs() {
        assert_eq!(filesystem_usage_percent(50, 0), None);
        assert_eq!(filesystem_usage_percent(101, 100), None);
        assert_eq!(filesystem_usage_percent(-1, 100), None);
    }

    #[test]
    fn test_filesystem_response_carries_derived_percent() {
        let response = FilesystemResponse::from(snapshot_filesystem::Model {
            id: 1,
            snapshot_id: 1,
            mount_point: "/".to_string(),
            device_name: Some("sda1".to_string()),
            used_bytes: 50,
            size_bytes: 100,
        });
        assert_eq!(response.usage_percent, Some(50.0));
    }
}
