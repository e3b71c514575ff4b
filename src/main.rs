use std::sync::Arc;

use caseta_core::config::CasetaConfig;
use caseta_db::identity::identity_provider_for;
use caseta_db::postgres::PgDocumentStore;
use caseta_db::repositories::reservation::ReservationStore;
use caseta_db::sweeper::Sweeper;
use caseta_db::{create_pool, schema::initialize_database};
use color_eyre::eyre::Result;
use dotenv::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Load environment variables
    dotenv().ok();

    // Load configuration
    let config = CasetaConfig::from_env()?;

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting caseta expiry sweeper for app {}", config.app_id);

    // Create database connection pool
    let db_pool = create_pool(&config.database_url).await?;

    // Initialize database schema
    initialize_database(&db_pool).await?;

    let identity = identity_provider_for(&config).sign_in().await?;
    info!("Sweeper signed in as {}", identity.uid);

    let store = Arc::new(PgDocumentStore::new(db_pool, config.app_id.clone()));
    let feed = ReservationStore::new(store).subscribe().await?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    };

    match Sweeper::new(feed, config.sweep_interval).run_until(shutdown).await {
        Ok(()) => info!("Sweeper shut down gracefully"),
        Err(e) => {
            error!("Sweeper stopped: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
