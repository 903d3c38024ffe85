//! swapi-sync entry point
//!
//! Loads (or bootstraps) the configuration, connects and migrates the
//! local store, runs one synchronization pass, and logs a short
//! inspection report of the resulting database.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use swapi_sync_lib::application::{LogReporter, ProgressReporter};
use swapi_sync_lib::domain::repositories::CharacterRepository;
use swapi_sync_lib::infrastructure::{
    ConfigManager, DatabaseConnection, HttpCatalogClient, HttpClient, HttpClientConfig,
    ReferenceResolver, SqliteCharacterRepository, SyncEngine, logging,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config_manager = ConfigManager::new()?;
    let config = config_manager.initialize_on_first_run().await?;
    logging::init_logging_with_config(&config.logging)?;
    info!("configuration loaded from {:?}", config_manager.config_path());

    // Store connectivity is the only fatal precondition
    let db = DatabaseConnection::new(&config.database_url)
        .await
        .with_context(|| format!("store unreachable at {}", config.database_url))?;
    db.migrate().await.context("store migration failed")?;
    let repository = Arc::new(SqliteCharacterRepository::new(db.pool().clone()));

    let http = HttpClient::with_config(&HttpClientConfig::default())?;
    let client = Arc::new(HttpCatalogClient::new(http, &config));
    let resolver = Arc::new(ReferenceResolver::new(Arc::clone(&client)));
    let reporter: Arc<dyn ProgressReporter> = Arc::new(LogReporter::new());

    let engine = SyncEngine::new(
        client,
        Arc::clone(&repository),
        resolver,
        reporter,
        config.sync.clone(),
    );
    let summary = engine.execute().await?;

    // Post-run inspection of the store
    let total = repository.count().await?;
    info!("store now holds {total} characters");
    if let Some((min_id, max_id)) = repository.id_range().await? {
        info!("id range: {min_id} - {max_id}");
    }
    let with_homeworld = repository.known_homeworld_count().await?;
    info!("characters with a known homeworld: {with_homeworld}");
    info!(
        "run {} loaded {} new characters in {}ms",
        summary.session_id, summary.loaded, summary.duration_ms
    );

    Ok(())
}
