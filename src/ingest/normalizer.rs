//! Flattens one accepted telemetry document into the record that will be
//! written. Values are stored as reported: percents are not clamped here,
//! that is a read-side presentation concern.

use chrono::{DateTime, Utc};

use crate::db::enums::SnapshotSource;
use crate::ingest::payload::TelemetryDocument;

/// Machine identity carried by a document. Applied first-write-wins: once
/// a machine row has these populated, later snapshots never overwrite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MachineFacts {
    pub hostname: Option<String>,
    pub os_name: Option<String>,
    pub os_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFilesystem {
    pub mount_point: String,
    pub device_name: Option<String>,
    pub used_bytes: i64,
    pub size_bytes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNetworkInterface {
    pub interface_name: String,
    pub rx_bytes_cumulative: Option<i64>,
    pub tx_bytes_cumulative: Option<i64>,
    pub rx_bytes_delta: Option<i64>,
    pub tx_bytes_delta: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSensor {
    pub label: String,
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub sensor_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlert {
    pub alert_type: String,
    pub state: String,
    pub sort_key: Option<String>,
    pub message: String,
}

/// One normalized snapshot, ready for the atomic write path.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSnapshot {
    pub source: SnapshotSource,
    pub timestamp: DateTime<Utc>,
    pub facts: MachineFacts,
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
    pub filesystems: Vec<NewFilesystem>,
    pub network_interfaces: Vec<NewNetworkInterface>,
    pub sensors: Vec<NewSensor>,
    pub alerts: Vec<NewAlert>,
}

/// Converts an accepted document into a snapshot record. Absent sections
/// normalize to empty sub-records; the embedded timestamp wins over the
/// receive time when present.
pub fn normalize(
    doc: &TelemetryDocument,
    source: SnapshotSource,
    received_at: DateTime<Utc>,
) -> NewSnapshot {
    let system = doc.system.clone().unwrap_or_default();
    let cpu = doc.cpu.clone().unwrap_or_default();
    let memory = doc.memory.clone().unwrap_or_default();
    let swap = doc.swap.clone().unwrap_or_default();
    let battery = doc.battery.clone().unwrap_or_default();

    let facts = MachineFacts {
        // The system section is authoritative for the hostname; the bare
        // top-level field is an agent shorthand.
        hostname: system.hostname.or_else(|| doc.hostname.clone()),
        os_name: system.os_name,
        os_version: system.os_version,
    };

    NewSnapshot {
        source,
        timestamp: doc.timestamp.unwrap_or(received_at),
        facts,
        cpu_percent: cpu.percent,
        cpu_user: cpu.user,
        cpu_system: cpu.system,
        cpu_iowait: cpu.iowait,
        cpu_count: cpu.core_count.map(|n| n as i32),
        memory_percent: memory.percent,
        memory_used_bytes: memory.used_bytes.map(|v| v as i64),
        memory_total_bytes: memory.total_bytes.map(|v| v as i64),
        swap_percent: swap.percent,
        swap_used_bytes: swap.used_bytes.map(|v| v as i64),
        swap_total_bytes: swap.total_bytes.map(|v| v as i64),
        uptime_seconds: doc.uptime_seconds.map(|v| v as i64),
        load_avg: doc.load.as_ref().and_then(|load| load.one),
        battery_percent: battery.percent,
        battery_status: battery.status,
        filesystems: doc
            .filesystems
            .iter()
            .map(|fs| NewFilesystem {
                mount_point: fs.mount_point.clone(),
                device_name: fs.device.clone(),
                used_bytes: fs.used_bytes as i64,
                size_bytes: fs.size_bytes as i64,
            })
            .collect(),
        network_interfaces: doc
            .network
            .iter()
            .map(|iface| NewNetworkInterface {
                interface_name: iface.interface.clone(),
                rx_bytes_cumulative: iface.rx_bytes_cumulative.map(|v| v as i64),
                tx_bytes_cumulative: iface.tx_bytes_cumulative.map(|v| v as i64),
                rx_bytes_delta: iface.rx_bytes_delta.map(|v| v as i64),
                tx_bytes_delta: iface.tx_bytes_delta.map(|v| v as i64),
            })
            .collect(),
        sensors: doc
            .sensors
            .iter()
            .map(|sensor| NewSensor {
                label: sensor.label.clone(),
                value: sensor.value,
                unit: sensor.unit.clone(),
                sensor_type: sensor.sensor_type.clone(),
            })
            .collect(),
        alerts: doc
            .alerts
            .iter()
            .map(|alert| NewAlert {
                alert_type: alert.alert_type.clone(),
                state: alert.state.clone(),
                sort_key: alert.sort_key.clone(),
                message: alert.message.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn received_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 5, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_full_document_round_trips() {
        let raw = r#"{
            "hostname": "fallback",
            "system": {"hostname": "studio", "os_name": "Linux", "os_version": "6.8"},
            "cpu": {"percent": 42.5, "user": 30.0, "system": 10.0, "iowait": 0.5, "core_count": 8},
            "memory": {"percent": 61.2, "used_bytes": 1024, "total_bytes": 4096},
            "swap": {"percent": 1.5, "used_bytes": 10, "total_bytes": 20},
            "uptime_seconds": 86400,
            "load": {"one": 0.7, "five": 0.5, "fifteen": 0.4},
            "battery": {"percent": 88.0, "status": "discharging"},
            "filesystems": [{"mount_point": "/", "device": "sda1", "used_bytes": 50, "size_bytes": 100}],
            "network": [{"interface": "eth0", "rx_bytes_cumulative": 111, "tx_bytes_delta": 222}],
            "sensors": [{"label": "CPU", "value": 54.0, "unit": "C", "sensor_type": "temperature"}],
            "alerts": [{"type": "MEM", "state": "CRITICAL", "sort_key": "memory_percent", "message": "oom soon"}]
        }"#;
        let doc: TelemetryDocument = serde_json::from_str(raw).unwrap();

        let snapshot = normalize(&doc, SnapshotSource::Webhook, received_at());

        assert_eq!(snapshot.source, SnapshotSource::Webhook);
        assert_eq!(snapshot.timestamp, received_at());
        assert_eq!(snapshot.facts.hostname.as_deref(), Some("studio"));
        assert_eq!(snapshot.facts.os_name.as_deref(), Some("Linux"));
        assert_eq!(snapshot.cpu_percent, Some(42.5));
        assert_eq!(snapshot.cpu_count, Some(8));
        assert_eq!(snapshot.memory_used_bytes, Some(1024));
        assert_eq!(snapshot.memory_total_bytes, Some(4096));
        assert_eq!(snapshot.swap_used_bytes, Some(10));
        assert_eq!(snapshot.uptime_seconds, Some(86_400));
        assert_eq!(snapshot.load_avg, Some(0.7));
        assert_eq!(snapshot.battery_status.as_deref(), Some("discharging"));
        assert_eq!(
            snapshot.filesystems,
            vec![NewFilesystem {
                mount_point: "/".to_string(),
                device_name: Some("sda1".to_string()),
                used_bytes: 50,
                size_bytes: 100,
            }]
        );
        assert_eq!(
            snapshot.network_interfaces,
            vec![NewNetworkInterface {
                interface_name: "eth0".to_string(),
                rx_bytes_cumulative: Some(111),
                tx_bytes_cumulative: None,
                rx_bytes_delta: None,
                tx_bytes_delta: Some(222),
            }]
        );
        assert_eq!(snapshot.sensors[0].label, "CPU");
        assert_eq!(snapshot.alerts[0].state, "CRITICAL");
    }

    #[test]
    fn test_empty_document_normalizes_to_empty_sub_records() {
        let doc: TelemetryDocument = serde_json::from_str("{}").unwrap();

        let snapshot = normalize(&doc, SnapshotSource::Api, received_at());

        assert_eq!(snapshot.source, SnapshotSource::Api);
        assert!(snapshot.cpu_percent.is_none());
        assert!(snapshot.memory_used_bytes.is_none());
        assert!(snapshot.filesystems.is_empty());
        assert!(snapshot.network_interfaces.is_empty());
        assert!(snapshot.sensors.is_empty());
        assert!(snapshot.alerts.is_empty());
        assert_eq!(snapshot.facts, MachineFacts::default());
    }

    #[test]
    fn test_out_of_range_percent_is_stored_raw() {
        let doc: TelemetryDocument =
            serde_json::from_str(r#"{"cpu": {"percent": 150.0}, "memory": {"percent": -3.0}}"#)
                .unwrap();

        let snapshot = normalize(&doc, SnapshotSource::Webhook, received_at());

        assert_eq!(snapshot.cpu_percent, Some(150.0));
        assert_eq!(snapshot.memory_percent, Some(-3.0));
    }

    #[test]
    fn test_embedded_timestamp_wins_over_receive_time() {
        let doc: TelemetryDocument =
            serde_json::from_str(r#"{"timestamp": "2026-08-05T11:00:00Z"}"#).unwrap();

        let snapshot = normalize(&doc, SnapshotSource::Webhook, received_at());

        assert_eq!(
            snapshot.timestamp,
            Utc.with_ymd_and_hms(2026, 8, 5, 11, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_top_level_hostname_used_when_system_section_absent() {
        let doc: TelemetryDocument = serde_json::from_str(r#"{"hostname": "attic"}"#).unwrap();

        let snapshot = normalize(&doc, SnapshotSource::Webhook, received_at());

        assert_eq!(snapshot.facts.hostname.as_deref(), Some("attic"));
    }
}
