use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use sea_orm::DatabaseConnection;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::db::entities::machine;
use crate::db::enums::SnapshotSource;
use crate::db::services::{machine_service, snapshot_service};
use crate::ingest::normalizer;
use crate::ingest::payload::TelemetryDocument;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
enum PollError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("storage error: {0}")]
    Storage(#[from] sea_orm::DbErr),
}

/// Pulls the telemetry document from every active machine's agent on a
/// fixed interval and records it with `api` provenance. A machine that
/// fails to answer is skipped until the next cycle; telemetry for that
/// interval is simply lost.
pub struct TelemetryPoller {
    db: DatabaseConnection,
    client: Client,
    poll_interval: Duration,
    agent_port: u16,
}

impl TelemetryPoller {
    pub fn new(
        db: DatabaseConnection,
        poll_interval_secs: u64,
        agent_port: u16,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            db,
            client,
            poll_interval: Duration::from_secs(poll_interval_secs),
            agent_port,
        })
    }

    pub async fn start_periodic_polling(self: Arc<Self>) {
        info!(
            interval_secs = self.poll_interval.as_secs(),
            agent_port = self.agent_port,
            "Telemetry poller started."
        );
        let mut ticker = interval(self.poll_interval);
        loop {
            ticker.tick().await;
            if let Err(e) = self.poll_all_machines().await {
                warn!(error = %e, "Telemetry poll cycle failed.");
            }
        }
    }

    async fn poll_all_machines(&self) -> Result<(), sea_orm::DbErr> {
        let machines = machine_service::get_active_machines(&self.db).await?;
        if machines.is_empty() {
            debug!("No active machines to poll.");
            return Ok(());
        }

        for machine in machines {
            if let Err(e) = self.poll_machine(&machine).await {
                warn!(
                    machine_id = machine.id,
                    machine_name = %machine.name,
                    error = %e,
                    "Polling machine failed."
                );
            }
        }
        Ok(())
    }

    async fn poll_machine(&self, machine: &machine::Model) -> Result<(), PollError> {
        let url = format!(
            "http://{}:{}/telemetry",
            machine.ip_address, self.agent_port
        );
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let document: TelemetryDocument = response.json().await?;

        let record = normalizer::normalize(&document, SnapshotSource::Api, Utc::now());
        snapshot_service::record_snapshot(&self.db, machine, &record).await?;

        debug!(machine_id = machine.id, "Stored polled snapshot.");
        Ok(())
    }
}
