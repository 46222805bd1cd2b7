use std::sync::Arc;
use std::time::Duration;

use sea_orm::{DatabaseConnection, DbErr};
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::db::services::snapshot_service;

/// Bounds snapshot growth on a fixed schedule: keeps only the newest N
/// rows per machine and, when configured, drops rows past a maximum age.
/// Idempotent; a run that finds nothing to delete is a no-op.
pub struct RetentionService {
    db: DatabaseConnection,
    max_records_per_machine: u64,
    cleanup_interval: Duration,
    max_age_days: Option<u32>,
}

impl RetentionService {
    pub fn new(
        db: DatabaseConnection,
        max_records_per_machine: u64,
        cleanup_interval_hours: u64,
        max_age_days: Option<u32>,
    ) -> Self {
        Self {
            db,
            max_records_per_machine,
            cleanup_interval: Duration::from_secs(cleanup_interval_hours * 3600),
            max_age_days,
        }
    }

    pub async fn start_periodic_cleanup(self: Arc<Self>) {
        info!(
            interval_hours = self.cleanup_interval.as_secs() / 3600,
            max_records_per_machine = self.max_records_per_machine,
            max_age_days = ?self.max_age_days,
            "Snapshot retention service started."
        );
        let mut ticker = interval(self.cleanup_interval);
        loop {
            ticker.tick().await;
            match self.run_cleanup().await {
                Ok(0) => debug!("Retention cleanup found nothing to delete."),
                Ok(deleted) => info!(deleted, "Retention cleanup removed snapshots."),
                Err(e) => warn!(error = %e, "Retention cleanup failed."),
            }
        }
    }

    /// One full cleanup pass. Also used by the admin endpoints indirectly
    /// through the same service functions.
    pub async fn run_cleanup(&self) -> Result<u64, DbErr> {
        let mut total_deleted =
            snapshot_service::cleanup_snapshots_by_count(&self.db, self.max_records_per_machine)
                .await?;

        if let Some(days) = self.max_age_days {
            total_deleted += snapshot_service::cleanup_old_snapshots(&self.db, days).await?;
        }

        Ok(total_deleted)
    }
}
