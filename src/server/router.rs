//! Router builder for the search routes

use super::handlers::{AppState, health, search_stores};
use axum::Router;
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Build the search routes
///
/// - POST /stores/search - Run a store search
/// - GET /health - Liveness check
pub fn build_search_routes(state: AppState) -> Router {
    Router::new()
        .route("/stores/search", post(search_stores))
        .route("/health", get(health))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
