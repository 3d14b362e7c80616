use chrono::Utc;
use job_specs::{config::ReaperConfig, db, services::reaper::ZombieReaper};
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting zombie job reaper");

    // Load configuration
    let config = ReaperConfig::from_env().expect("Failed to load configuration");

    // Initialize database
    tracing::info!("Connecting to PostgreSQL");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Running database migrations");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    let reaper = ZombieReaper::new(db_pool, config.zombie_threshold());
    let interval = config.reap_interval();

    tracing::info!(
        threshold_secs = config.zombie_threshold_secs,
        interval_secs = config.reap_interval_secs,
        "Reaper ready, starting loop"
    );

    loop {
        match reaper.reap_once(Utc::now()).await {
            Ok(reaped) if reaped.is_empty() => {
                tracing::trace!("No zombie jobs found");
            }
            Ok(reaped) => {
                tracing::info!(count = reaped.len(), "Reaped zombie jobs");
            }
            Err(e) => {
                tracing::error!(error = %e, "Reaper pass failed, will retry");
            }
        }
        sleep(interval).await;
    }
}
