//! Machine liveness derived from the time since the last accepted
//! snapshot. The canonical classifier is three-state plus `Unknown`;
//! consumers that want a coarser view apply their own projection on top,
//! the collapse is never baked in here.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Machines seen within this many minutes are online.
pub const ONLINE_WITHIN_MINUTES: i64 = 5;
/// Machines silent past the online window but within this many minutes
/// are a warning rather than offline.
pub const WARNING_WITHIN_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineStatus {
    Online,
    Warning,
    Offline,
    /// The machine has never reported a snapshot.
    Unknown,
}

impl MachineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MachineStatus::Online => "online",
            MachineStatus::Warning => "warning",
            MachineStatus::Offline => "offline",
            MachineStatus::Unknown => "unknown",
        }
    }
}

/// Three-state classification with the default thresholds. All inputs are
/// UTC by convention.
pub fn classify(last_seen: Option<DateTime<Utc>>, now: DateTime<Utc>) -> MachineStatus {
    classify_with(
        last_seen,
        now,
        Duration::minutes(ONLINE_WITHIN_MINUTES),
        Duration::minutes(WARNING_WITHIN_MINUTES),
    )
}

/// Classifier with explicit windows, for consumers carrying their own
/// display policy.
pub fn classify_with(
    last_seen: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    online_within: Duration,
    warning_within: Duration,
) -> MachineStatus {
    let Some(seen) = last_seen else {
        return MachineStatus::Unknown;
    };
    let elapsed = now - seen;
    if elapsed < online_within {
        MachineStatus::Online
    } else if elapsed < warning_within {
        MachineStatus::Warning
    } else {
        MachineStatus::Offline
    }
}

/// Two-state projection: everything past the online window, including
/// never-reported machines, collapses into offline.
pub fn collapse_two_state(status: MachineStatus) -> MachineStatus {
    match status {
        MachineStatus::Online => MachineStatus::Online,
        _ => MachineStatus::Offline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 5, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_never_reported_is_unknown() {
        assert_eq!(classify(None, now()), MachineStatus::Unknown);
    }

    #[test]
    fn test_one_minute_ago_is_online() {
        let seen = now() - Duration::minutes(1);
        assert_eq!(classify(Some(seen), now()), MachineStatus::Online);
    }

    #[test]
    fn test_ten_minutes_ago_is_warning() {
        let seen = now() - Duration::minutes(10);
        assert_eq!(classify(Some(seen), now()), MachineStatus::Warning);
    }

    #[test]
    fn test_thirty_one_minutes_ago_is_offline() {
        let seen = now() - Duration::minutes(31);
        assert_eq!(classify(Some(seen), now()), MachineStatus::Offline);
    }

    #[test]
    fn test_window_boundaries() {
        let at_online_edge = now() - Duration::minutes(ONLINE_WITHIN_MINUTES);
        assert_eq!(classify(Some(at_online_edge), now()), MachineStatus::Warning);

        let at_warning_edge = now() - Duration::minutes(WARNING_WITHIN_MINUTES);
        assert_eq!(classify(Some(at_warning_edge), now()), MachineStatus::Offline);
    }

    #[test]
    fn test_two_state_collapse() {
        assert_eq!(
            collapse_two_state(MachineStatus::Online),
            MachineStatus::Online
        );
        assert_eq!(
            collapse_two_state(MachineStatus::Warning),
            MachineStatus::Offline
        );
        assert_eq!(
            collapse_two_state(MachineStatus::Unknown),
            MachineStatus::Offline
        );
        assert_eq!(
            collapse_two_state(MachineStatus::Offline),
            MachineStatus::Offline
        );
    }

    #[test]
    fn test_custom_windows() {
        let seen = now() - Duration::minutes(2);
        let status = classify_with(
            Some(seen),
            now(),
            Duration::minutes(1),
            Duration::minutes(3),
        );
        assert_eq!(status, MachineStatus::Warning);
    }
}
