//! Read-only repository traits consumed by the search engine
//!
//! The engine never talks to a database directly. Each collection it reads
//! is reached through one of these traits, and every resolver receives the
//! repositories it needs explicitly. Implementations decide how the filters
//! are executed (in memory, SQL, ...).
//!
//! Projections (`store_ids`, aggregates) may return duplicates or any
//! order; resolvers deduplicate.

use crate::core::entity::Entity;
use crate::core::query::SearchPage;
use crate::core::range::RangeFilter;
use crate::core::store::StoreQuery;
use crate::entities::{Order, Product, ProductStatus, Review, Store};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A per-store aggregate value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreAggregate<T> {
    pub store_id: Uuid,
    pub value: T,
}

impl<T> StoreAggregate<T> {
    pub fn new(store_id: Uuid, value: T) -> Self {
        Self { store_id, value }
    }
}

/// Sum and number of review ratings of one store
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingTotal {
    pub store_id: Uuid,
    pub sum: f64,
    pub count: i64,
}

/// Condition on a product's lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCondition {
    Is(ProductStatus),
    IsNot(ProductStatus),
}

impl StatusCondition {
    pub fn matches(&self, status: ProductStatus) -> bool {
        match self {
            StatusCondition::Is(expected) => status == *expected,
            StatusCondition::IsNot(excluded) => status != *excluded,
        }
    }
}

/// Category path constraint; each present level must match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CategoryPath {
    pub top_type_id: Option<Uuid>,
    pub category1_id: Option<Uuid>,
    pub category2_id: Option<Uuid>,
}

impl CategoryPath {
    pub fn is_empty(&self) -> bool {
        self.top_type_id.is_none() && self.category1_id.is_none() && self.category2_id.is_none()
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.top_type_id.is_none_or(|id| product.top_type_id == id)
            && self
                .category1_id
                .is_none_or(|id| product.category1_id == Some(id))
            && self
                .category2_id
                .is_none_or(|id| product.category2_id == Some(id))
    }
}

/// Filter over the product collection
///
/// Soft-deleted products never match.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductFilter {
    pub status: Option<StatusCondition>,

    /// Only products with a sale price
    pub on_sale_only: bool,

    /// Range on the sale price; products without one never match an
    /// active range
    pub sale_price: RangeFilter<i64>,

    pub category: CategoryPath,
}

impl ProductFilter {
    pub fn with_status(status: StatusCondition) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        if product.is_deleted() {
            return false;
        }
        if self.status.is_some_and(|s| !s.matches(product.status)) {
            return false;
        }
        if self.on_sale_only && !product.is_on_sale() {
            return false;
        }
        if self.sale_price.is_active() {
            match product.sale_price {
                Some(price) if self.sale_price.contains(&price) => {}
                _ => return false,
            }
        }
        self.category.matches(product)
    }
}

/// Filter over the order collection
///
/// Soft-deleted orders never match.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderFilter {
    /// Only orders with a parent reference
    pub sub_orders_only: bool,

    pub created_at: RangeFilter<DateTime<Utc>>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        !order.is_deleted()
            && (!self.sub_orders_only || order.is_sub_order())
            && self.created_at.contains(&order.created_at())
    }
}

/// Filter over the review collection
///
/// Soft-deleted reviews never match.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReviewFilter {
    /// Only reviews without a parent (no replies)
    pub top_level_only: bool,
}

impl ReviewFilter {
    pub fn matches(&self, review: &Review) -> bool {
        !review.is_deleted() && (!self.top_level_only || review.is_top_level())
    }
}

/// Substring search over the concatenated phonetic name of store details
///
/// A detail matches when `given + separator + family` contains the needle
/// (case-insensitive) for at least one of the separators.
#[derive(Debug, Clone, PartialEq)]
pub struct PhoneticQuery {
    pub needle: String,
    pub separators: &'static [&'static str],
}

impl PhoneticQuery {
    pub fn matches(&self, given: &str, family: &str) -> bool {
        let needle = self.needle.to_lowercase();
        self.separators.iter().any(|sep| {
            format!("{}{}{}", given, sep, family)
                .to_lowercase()
                .contains(&needle)
        })
    }
}

/// Access to the store collection and its one-hop relations
#[async_trait]
pub trait StoreRepository: Send + Sync {
    /// Short backend name used in error reports
    fn backend_name(&self) -> &'static str {
        "unknown"
    }

    /// Execute a store query, returning the requested page and the total
    /// number of stores matching its predicates
    async fn find(&self, query: &StoreQuery) -> Result<SearchPage<Store>>;

    /// Ids of all searchable stores (owned and not deleted)
    async fn owned_ids(&self) -> Result<Vec<Uuid>>;

    /// Ids of stores whose detail record matches the phonetic query
    async fn phonetic_matches(&self, query: &PhoneticQuery) -> Result<Vec<Uuid>>;

    /// `(store id, url slug)` of all searchable stores
    async fn url_slugs(&self) -> Result<Vec<(Uuid, String)>>;
}

/// Read access to the product collection
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Owning store id of every matching product (one entry per product)
    async fn store_ids(&self, filter: &ProductFilter) -> Result<Vec<Uuid>>;

    /// Number of matching products per store
    async fn count_per_store(&self, filter: &ProductFilter) -> Result<Vec<StoreAggregate<i64>>>;

    /// Latest `updated_at` of matching products per store
    async fn latest_update_per_store(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<StoreAggregate<DateTime<Utc>>>>;

    /// Total inventory of non-deleted variants of matching products per store
    async fn inventory_per_store(&self, filter: &ProductFilter) -> Result<Vec<StoreAggregate<i64>>>;
}

/// Read access to the order collection
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Store id of every matching order that references a store
    async fn store_ids(&self, filter: &OrderFilter) -> Result<Vec<Uuid>>;
}

/// Read access to the review collection
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Rating sum and count of matching reviews, grouped by the store
    /// owning the reviewed product
    async fn rating_totals(&self, filter: &ReviewFilter) -> Result<Vec<RatingTotal>>;
}
