use std::sync::Arc;

use anyhow::{Context, Result};
use castlist_config::Config;
use castlist_core::PersonsService;
use castlist_core::database::{
    InMemoryPersonsRepository, PersonsRepository, PostgresDatabase,
};
use castlist_core::events::{LogPersonEvents, PersonEvents, RedisPersonEvents};
use castlist_core::image::{
    HttpBlobStore, ImageBlobStore, ImagePipeline, LocalImageProcessor,
    MemoryBlobStore,
};
use tracing::{info, warn};

use crate::infra::app_state::AppState;

/// Connect every backend named by `config` and assemble the shared state.
///
/// Backends that are not configured fall back to in-memory adapters; the
/// config guard rails only allow that in dev mode.
pub async fn build_state(config: Arc<Config>) -> Result<AppState> {
    let (repo, postgres) = connect_persons(&config).await?;
    let store = connect_blob_store(&config)?;
    let events = connect_events(&config).await?;

    let pipeline = ImagePipeline::new(
        Arc::new(LocalImageProcessor::new()),
        store,
        config.image_pipeline(),
    );

    Ok(AppState {
        persons: PersonsService::new(repo, pipeline, events),
        postgres,
        config,
    })
}

async fn connect_persons(
    config: &Config,
) -> Result<(Arc<dyn PersonsRepository>, Option<Arc<PostgresDatabase>>)> {
    let Some(url) = config.database.url.as_deref() else {
        if !config.dev_mode {
            anyhow::bail!("DATABASE_URL must be provided outside dev mode");
        }
        warn!("Using in-memory person storage; data is lost on restart");
        return Ok((Arc::new(InMemoryPersonsRepository::new()), None));
    };

    let database = PostgresDatabase::connect(
        url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await
    .context("failed to connect to PostgreSQL")?;
    info!("Successfully connected to PostgreSQL");

    database
        .initialize_schema()
        .await
        .context("database migration failed")?;
    info!("Database schema initialized successfully");

    let database = Arc::new(database);
    Ok((Arc::new(database.persons()), Some(database)))
}

fn connect_blob_store(config: &Config) -> Result<Arc<dyn ImageBlobStore>> {
    match &config.storage.api_url {
        Some(url) => {
            let store =
                HttpBlobStore::new(url.clone(), config.storage.request_timeout)
                    .context("failed to build image storage client")?;
            info!(url = %url, "Image storage client configured");
            Ok(Arc::new(store))
        }
        None => {
            warn!("Using in-memory photo storage; photos are lost on restart");
            Ok(Arc::new(MemoryBlobStore::new()))
        }
    }
}

async fn connect_events(config: &Config) -> Result<Arc<dyn PersonEvents>> {
    match &config.redis {
        Some(redis) => {
            let events =
                RedisPersonEvents::connect(&redis.url, Some(redis.stream.clone()))
                    .await
                    .context("failed to connect to Redis")?;
            info!(stream = events.stream(), "Deletion events go to Redis");
            Ok(Arc::new(events))
        }
        None => Ok(Arc::new(LogPersonEvents)),
    }
}
