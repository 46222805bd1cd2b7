//! Canonical telemetry document accepted from agents.
//!
//! The top-level shape is a stable external contract: an unknown
//! top-level key rejects the whole document, while unknown keys inside a
//! section are ignored so agents can ship extra detail without breaking
//! older hubs. Byte counters are `u64` at this boundary, so a negative
//! value fails deserialization instead of reaching storage.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryDocument {
    /// Embedded capture time. Zone-less values are interpreted as UTC.
    #[serde(default, deserialize_with = "deserialize_utc_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    pub hostname: Option<String>,
    pub system: Option<SystemSection>,
    pub cpu: Option<CpuSection>,
    pub memory: Option<MemorySection>,
    pub swap: Option<SwapSection>,
    pub uptime_seconds: Option<u64>,
    pub load: Option<LoadSection>,
    pub battery: Option<BatterySection>,
    #[serde(default)]
    pub filesystems: Vec<FilesystemEntry>,
    #[serde(default)]
    pub network: Vec<NetworkInterfaceEntry>,
    #[serde(default)]
    pub sensors: Vec<SensorEntry>,
    #[serde(default)]
    pub alerts: Vec<AlertEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemSection {
    pub hostname: Option<String>,
    pub os_name: Option<String>,
    pub os_version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CpuSection {
    pub percent: Option<f64>,
    pub user: Option<f64>,
    pub system: Option<f64>,
    pub iowait: Option<f64>,
    pub core_count: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemorySection {
    pub percent: Option<f64>,
    pub used_bytes: Option<u64>,
    pub total_bytes: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SwapSection {
    pub percent: Option<f64>,
    pub used_bytes: Option<u64>,
    pub total_bytes: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoadSection {
    pub one: Option<f64>,
    pub five: Option<f64>,
    pub fifteen: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatterySection {
    pub percent: Option<f64>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilesystemEntry {
    pub mount_point: String,
    pub device: Option<String>,
    pub used_bytes: u64,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkInterfaceEntry {
    pub interface: String,
    pub rx_bytes_cumulative: Option<u64>,
    pub tx_bytes_cumulative: Option<u64>,
    pub rx_bytes_delta: Option<u64>,
    pub tx_bytes_delta: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SensorEntry {
    pub label: String,
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub sensor_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertEntry {
    #[serde(rename = "type")]
    pub alert_type: String,
    pub state: String,
    pub sort_key: Option<String>,
    pub message: String,
}

/// Parses an agent timestamp. Values without zone information are taken
/// as UTC, never local time.
pub fn parse_utc_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>()
        .map(|naive| naive.and_utc())
        .map_err(|_| format!("unrecognized timestamp: {raw}"))
}

fn deserialize_utc_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(value) => parse_utc_timestamp(&value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_full_document_parses() {
        let raw = r#"{
            "timestamp": "2026-08-05T12:00:00Z",
            "hostname": "studio",
            "system": {"hostname": "studio", "os_name": "Linux", "os_version": "6.8"},
            "cpu": {"percent": 42.5, "user": 30.0, "system": 10.0, "iowait": 0.5, "core_count": 8},
            "memory": {"percent": 61.2, "used_bytes": 8589934592, "total_bytes": 17179869184},
            "swap": {"percent": 1.0, "used_bytes": 1048576, "total_bytes": 2147483648},
            "uptime_seconds": 86400,
            "load": {"one": 0.7, "five": 0.5, "fifteen": 0.4},
            "battery": {"percent": 88.0, "status": "discharging"},
            "filesystems": [{"mount_point": "/", "device": "nvme0n1p2", "used_bytes": 50, "size_bytes": 100}],
            "network": [{"interface": "eth0", "rx_bytes_cumulative": 123456, "tx_bytes_cumulative": 654321}],
            "sensors": [{"label": "CPU", "value": 54.0, "unit": "C", "sensor_type": "temperature"}],
            "alerts": [{"type": "CPU", "state": "WARNING", "sort_key": "cpu_percent", "message": "high cpu"}]
        }"#;

        let doc: TelemetryDocument = serde_json::from_str(raw).unwrap();
        assert_eq!(
            doc.timestamp,
            Some(Utc.with_ymd_and_hms(2026, 8, 5, 12, 0, 0).unwrap())
        );
        assert_eq!(doc.cpu.as_ref().unwrap().percent, Some(42.5));
        assert_eq!(
            doc.memory.as_ref().unwrap().used_bytes,
            Some(8_589_934_592)
        );
        assert_eq!(doc.filesystems.len(), 1);
        assert_eq!(doc.network[0].rx_bytes_cumulative, Some(123_456));
        assert_eq!(doc.network[0].rx_bytes_delta, None);
        assert_eq!(doc.alerts[0].alert_type, "CPU");
    }

    #[test]
    fn test_empty_document_is_valid() {
        let doc: TelemetryDocument = serde_json::from_str("{}").unwrap();
        assert!(doc.timestamp.is_none());
        assert!(doc.cpu.is_none());
        assert!(doc.filesystems.is_empty());
        assert!(doc.network.is_empty());
        assert!(doc.sensors.is_empty());
        assert!(doc.alerts.is_empty());
    }

    #[test]
    fn test_unknown_top_level_key_is_rejected() {
        let result = serde_json::from_str::<TelemetryDocument>(r#"{"disks": []}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_key_inside_section_is_tolerated() {
        let doc: TelemetryDocument =
            serde_json::from_str(r#"{"cpu": {"percent": 10.0, "ctx_switches": 9000}}"#).unwrap();
        assert_eq!(doc.cpu.unwrap().percent, Some(10.0));
    }

    #[test]
    fn test_negative_byte_counter_is_rejected() {
        let result = serde_json::from_str::<TelemetryDocument>(
            r#"{"filesystems": [{"mount_point": "/", "used_bytes": -1, "size_bytes": 100}]}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_zoneless_timestamp_assumed_utc() {
        let parsed = parse_utc_timestamp("2026-08-05T12:00:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 8, 5, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_offset_timestamp_converted_to_utc() {
        let parsed = parse_utc_timestamp("2026-08-05T14:00:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 8, 5, 12, 0, 0).unwrap());
    }
}
