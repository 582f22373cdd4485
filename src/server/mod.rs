//! HTTP exposure of the search engine
//!
//! This module provides a `ServerBuilder` that registers:
//! - `POST /stores/search` for store searches
//! - `GET /health` for liveness checks

pub mod builder;
pub mod handlers;
pub mod router;

pub use builder::ServerBuilder;
pub use handlers::AppState;
pub use router::build_search_routes;
