//! # Store Search
//!
//! Multi-criteria store search engine for marketplace administration.
//!
//! ## Features
//!
//! - **Direct criteria**: predicates on a store and its one-hop relations
//!   (registration detail, payout account, owner) answered by one store query
//! - **Derived criteria**: product counts, sale prices, catalog freshness,
//!   last sale, category, phonetic names, review averages, carry-over stock
//!   and public URLs, each answered by its own resolver
//! - **Concurrent resolution**: resolvers run concurrently under one deadline
//!   and their results are intersected; an empty intersection never reaches
//!   the store query
//! - **Range classification**: every `(from, to)` pair shares the same four
//!   evaluation modes
//! - **Pluggable storage**: in-memory backend, PostgreSQL behind the
//!   `postgres` feature
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use store_search::prelude::*;
//!
//! let marketplace = Arc::new(InMemoryMarketplace::new());
//! let search = StoreSearch::new(
//!     Repositories::from_backend(marketplace),
//!     SearchConfig::default(),
//! );
//!
//! let request: StoreSearchRequest = serde_json::from_value(json!({
//!     "number_product_from": 1,
//!     "eval_score_from": 4.0,
//!     "sort": "follower_count:desc"
//! }))?;
//! let page = search.search_request(request).await?;
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod search;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        entity::{Data, Entity},
        error::{SearchError, SearchResult},
        query::{Pagination, SearchPage, SortDirection, SortField, SortSpec},
        range::{RangeFilter, RangeMode},
        service::{OrderRepository, ProductRepository, ReviewRepository, StoreRepository},
    };

    // === Entities ===
    pub use crate::entities::{
        BusinessForm, Order, Owner, Payback, PaymentMethod, PlanTier, Product, ProductStatus,
        Review, Store, StoreDetail, StoreStatus, Variant,
    };

    // === Search ===
    pub use crate::search::{
        DerivedResolver, Repositories, StoreCriteria, StoreIdSet, StoreSearch, StoreSearchRequest,
    };

    // === Storage ===
    pub use crate::storage::{InMemoryMarketplace, MarketplaceSnapshot};
    #[cfg(feature = "postgres")]
    pub use crate::storage::PgMarketplace;

    // === Config ===
    pub use crate::config::{ResolverMode, SearchConfig};

    // === Server ===
    pub use crate::server::ServerBuilder;

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::json;
    pub use std::sync::Arc;
    pub use uuid::Uuid;
}
