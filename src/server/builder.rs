//! ServerBuilder for fluent API to build the search HTTP server

use super::handlers::AppState;
use super::router::build_search_routes;
use crate::search::StoreSearch;
use anyhow::{Result, anyhow};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builder for the search HTTP server
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_search(StoreSearch::new(repos, config))
///     .build()?;
/// ```
pub struct ServerBuilder {
    search: Option<Arc<StoreSearch>>,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            search: None,
            custom_routes: Vec::new(),
        }
    }

    /// Set the search engine (required)
    pub fn with_search(mut self, search: StoreSearch) -> Self {
        self.search = Some(Arc::new(search));
        self
    }

    /// Add routes served next to the search API
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the router
    pub fn build(self) -> Result<Router> {
        let search = self
            .search
            .ok_or_else(|| anyhow!("StoreSearch is required. Call .with_search()"))?;

        let mut app = build_search_routes(AppState { search });
        for routes in self.custom_routes {
            app = app.merge(routes);
        }
        Ok(app)
    }

    /// Serve the application with graceful shutdown
    ///
    /// Handles SIGTERM and SIGINT (Ctrl+C).
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::search::Repositories;
    use crate::storage::InMemoryMarketplace;

    #[test]
    fn test_build_without_search_fails() {
        let err = ServerBuilder::new().build().unwrap_err();
        assert!(err.to_string().contains("with_search"));
    }

    #[test]
    fn test_build_with_search_and_custom_routes() {
        let search = StoreSearch::new(
            Repositories::from_backend(Arc::new(InMemoryMarketplace::new())),
            SearchConfig::default(),
        );
        let custom = Router::new().route("/ping", axum::routing::get(|| async { "pong" }));

        assert!(
            ServerBuilder::new()
                .with_search(search)
                .with_custom_routes(custom)
                .build()
                .is_ok()
        );
    }
}
