//! HTTP handlers for store search

use crate::core::error::{SearchError, ValidationError};
use crate::core::query::SearchPage;
use crate::entities::Store;
use crate::search::{StoreSearch, StoreSearchRequest};
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde_json::{Value, json};
use std::sync::Arc;

/// Shared state of the search routes
#[derive(Clone)]
pub struct AppState {
    pub search: Arc<StoreSearch>,
}

/// POST /stores/search
///
/// Malformed bodies (bad JSON, unknown fields or enum values, invalid dates)
/// are reported with the same error envelope as validation failures.
pub async fn search_stores(
    State(state): State<AppState>,
    payload: Result<Json<StoreSearchRequest>, JsonRejection>,
) -> Result<Json<SearchPage<Store>>, SearchError> {
    let Json(request) = payload.map_err(|rejection| ValidationError::InvalidJson {
        message: rejection.body_text(),
    })?;

    let page = state.search.search_request(request).await?;
    Ok(Json(page))
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
