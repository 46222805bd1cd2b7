use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    /// Shared secret for webhook submissions. Absent means every
    /// submission passes the secret check.
    pub webhook_secret: Option<String>,
    pub poll_enabled: bool,
    pub poll_interval_secs: u64,
    /// Port the telemetry agent listens on, on every machine.
    pub agent_port: u16,
    pub retention_max_snapshots_per_machine: u64,
    pub retention_interval_hours: u64,
    /// Age-based cleanup is off unless set.
    pub retention_max_age_days: Option<u32>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, String> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let listen_addr = env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8000".to_string())
            .parse()
            .map_err(|_| "LISTEN_ADDR must be a socket address".to_string())?;

        let webhook_secret = env::var("WEBHOOK_SECRET").ok().filter(|s| !s.is_empty());

        Ok(ServerConfig {
            database_url,
            listen_addr,
            webhook_secret,
            poll_enabled: env_or("POLL_ENABLED", true)?,
            poll_interval_secs: env_or("POLL_INTERVAL_SECS", 30)?,
            agent_port: env_or("AGENT_PORT", 61208)?,
            retention_max_snapshots_per_machine: env_or("RETENTION_MAX_SNAPSHOTS_PER_MACHINE", 10_000)?,
            retention_interval_hours: env_or("RETENTION_INTERVAL_HOURS", 6)?,
            retention_max_age_days: env_opt("RETENTION_MAX_AGE_DAYS")?,
        })
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, String> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| format!("{key} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

fn env_opt<T: FromStr>(key: &str) -> Result<Option<T>, String> {
    match env::var(key) {
        Ok(raw) if !raw.is_empty() => raw
            .parse()
            .map(Some)
            .map_err(|_| format!("{key} has an invalid value: {raw}")),
        _ => Ok(None),
    }
}
