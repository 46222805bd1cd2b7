use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use machine_hub::config::ServerConfig;
use machine_hub::db;
use machine_hub::services::poller::TelemetryPoller;
use machine_hub::services::retention::RetentionService;
use machine_hub::web;

#[derive(Parser, Debug)]
#[command(name = "machine-hub", about = "Telemetry hub for a small machine fleet")]
struct Cli {
    /// Listen address, overriding the LISTEN_ADDR environment variable.
    #[arg(long)]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ServerConfig::from_env()?;
    if let Some(listen) = cli.listen {
        config.listen_addr = listen;
    }
    let config = Arc::new(config);

    let db = db::connect(&config.database_url).await?;
    db::init_schema(&db).await?;

    if config.poll_enabled {
        let poller = Arc::new(TelemetryPoller::new(
            db.clone(),
            config.poll_interval_secs,
            config.agent_port,
        )?);
        tokio::spawn(poller.start_periodic_polling());
    }

    let retention = Arc::new(RetentionService::new(
        db.clone(),
        config.retention_max_snapshots_per_machine,
        config.retention_interval_hours,
        config.retention_max_age_days,
    ));
    tokio::spawn(retention.start_periodic_cleanup());

    let app = web::create_axum_router(db, config.clone());

    info!(listen_addr = %config.listen_addr, "Machine hub listening.");
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received.");
}
