//! Store search HTTP server
//!
//! Environment:
//! - `STORE_SEARCH_CONFIG`: YAML configuration file (defaults when unset)
//! - `STORE_SEARCH_ADDR`: listen address (`127.0.0.1:3000`)
//! - `STORE_SEARCH_SNAPSHOT`: JSON marketplace snapshot for the in-memory backend
//! - `DATABASE_URL`: PostgreSQL backend (`postgres` feature only); a snapshot
//!   given alongside it is imported into the database at startup

use anyhow::Result;
use std::sync::Arc;
use store_search::config::SearchConfig;
use store_search::search::{Repositories, StoreSearch};
use store_search::server::ServerBuilder;
use store_search::storage::InMemoryMarketplace;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("store_search=info,tower_http=info")),
        )
        .init();

    let config = match std::env::var("STORE_SEARCH_CONFIG") {
        Ok(path) => {
            tracing::info!("Loading configuration from {}", path);
            SearchConfig::from_yaml_file(&path)?
        }
        Err(_) => SearchConfig::default(),
    };

    let repos = repositories().await?;
    let addr = std::env::var("STORE_SEARCH_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());

    ServerBuilder::new()
        .with_search(StoreSearch::new(repos, config))
        .serve(&addr)
        .await
}

async fn repositories() -> Result<Repositories> {
    #[cfg(feature = "postgres")]
    if let Ok(url) = std::env::var("DATABASE_URL") {
        tracing::info!("Using PostgreSQL backend");
        let backend = store_search::storage::PgMarketplace::connect(&url).await?;
        if let Ok(path) = std::env::var("STORE_SEARCH_SNAPSHOT") {
            tracing::info!("Importing snapshot {} into PostgreSQL", path);
            let snapshot = store_search::storage::MarketplaceSnapshot::from_json_file(&path)?;
            backend.import(&snapshot).await?;
        }
        return Ok(Repositories::from_backend(Arc::new(backend)));
    }

    let backend = match std::env::var("STORE_SEARCH_SNAPSHOT") {
        Ok(path) => {
            tracing::info!("Seeding in-memory marketplace from {}", path);
            InMemoryMarketplace::from_json_file(&path)?
        }
        Err(_) => {
            tracing::warn!("STORE_SEARCH_SNAPSHOT not set, starting with an empty marketplace");
            InMemoryMarketplace::new()
        }
    };
    Ok(Repositories::from_backend(Arc::new(backend)))
}
