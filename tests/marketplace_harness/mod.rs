//! Shared test harness for store search testing
//!
//! Provides fixture builders for the marketplace entities, the three-store
//! reference scenario, and repository wrappers that delay, fail or count
//! calls so orchestration behavior can be observed.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! mod marketplace_harness;
//! use marketplace_harness::*;
//! ```

#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

use store_search::config::SearchConfig;
use store_search::core::query::SearchPage;
use store_search::core::service::{
    PhoneticQuery, ProductFilter, ProductRepository, RatingTotal, ReviewFilter, ReviewRepository,
    StoreAggregate, StoreRepository,
};
use store_search::core::store::StoreQuery;
use store_search::entities::{
    BusinessForm, Order, PlanTier, Product, ProductStatus, Review, Store, StoreStatus, Variant,
};
use store_search::search::{Repositories, StoreSearch, StoreSearchRequest};
use store_search::storage::{InMemoryMarketplace, MarketplaceSnapshot};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Fixed reference instant so time-window tests are deterministic
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// An owned, active store
pub fn store(number: i64) -> Store {
    Store {
        id: Uuid::new_v4(),
        number,
        name: format!("Store {}", number),
        status: StoreStatus::Active,
        business_form: BusinessForm::Individual,
        plan: PlanTier::Free,
        margin_rate: 10.0,
        follower_count: 0,
        guarantee: false,
        url_slug: format!("store-{}", number),
        user_id: Some(Uuid::new_v4()),
        created_at: t0() - Duration::days(365),
        updated_at: t0() - Duration::days(365),
        deleted_at: None,
        detail: None,
        payback: None,
        owner: None,
    }
}

/// A published product of `store` with one variant
pub fn product(store: &Store) -> Product {
    Product {
        id: Uuid::new_v4(),
        store_id: store.id,
        name: "Item".to_string(),
        status: ProductStatus::Published,
        price: 3000,
        sale_price: None,
        top_type_id: Uuid::nil(),
        category1_id: None,
        category2_id: None,
        variants: vec![variant(1)],
        created_at: t0() - Duration::days(30),
        updated_at: t0() - Duration::days(30),
        deleted_at: None,
    }
}

pub fn variant(inventory: i64) -> Variant {
    Variant {
        id: Uuid::new_v4(),
        inventory,
        deleted_at: None,
    }
}

/// A top-level review of `product`
pub fn review(product: &Product, rating: i32) -> Review {
    Review {
        id: Uuid::new_v4(),
        product_id: product.id,
        parent_id: None,
        rating,
        created_at: t0(),
        updated_at: t0(),
        deleted_at: None,
    }
}

/// A parent order with one sub-order for `store`; returns both
pub fn checkout(store: &Store, at: DateTime<Utc>) -> (Order, Order) {
    let parent = Order {
        id: Uuid::new_v4(),
        parent_id: None,
        store_id: None,
        created_at: at,
        updated_at: at,
        deleted_at: None,
    };
    let sub = Order {
        id: Uuid::new_v4(),
        parent_id: Some(parent.id),
        store_id: Some(store.id),
        ..parent.clone()
    };
    (parent, sub)
}

// ---------------------------------------------------------------------------
// Reference scenario
// ---------------------------------------------------------------------------

/// Three stores:
/// - `s1`: 2 published products, one with sale price 1500, no reviews
/// - `s2`: no published product
/// - `s3`: 5 published products, average top-level rating 4.5
pub struct Scenario {
    pub market: Arc<InMemoryMarketplace>,
    /// The initial content, for seeding other backends
    pub snapshot: MarketplaceSnapshot,
    pub s1: Store,
    pub s2: Store,
    pub s3: Store,
}

impl Scenario {
    pub fn new() -> Self {
        let s1 = store(1);
        let s2 = store(2);
        let s3 = store(3);
        let mut snapshot = MarketplaceSnapshot {
            stores: vec![s1.clone(), s2.clone(), s3.clone()],
            ..MarketplaceSnapshot::default()
        };

        let mut on_sale = product(&s1);
        on_sale.sale_price = Some(1500);
        snapshot.products.push(on_sale);
        snapshot.products.push(product(&s1));

        let mut draft = product(&s2);
        draft.status = ProductStatus::Draft;
        snapshot.products.push(draft);

        for i in 0..5 {
            let item = product(&s3);
            if i == 0 {
                snapshot.reviews.push(review(&item, 5));
                snapshot.reviews.push(review(&item, 4));
            }
            snapshot.products.push(item);
        }

        let market = Arc::new(InMemoryMarketplace::from_snapshot(snapshot.clone()).unwrap());
        Self {
            market,
            snapshot,
            s1,
            s2,
            s3,
        }
    }

    pub fn search(&self) -> StoreSearch {
        engine(self.market.clone())
    }
}

// ---------------------------------------------------------------------------
// Engine helpers
// ---------------------------------------------------------------------------

pub fn engine(market: Arc<InMemoryMarketplace>) -> StoreSearch {
    engine_with(market, SearchConfig::default())
}

pub fn engine_with(market: Arc<InMemoryMarketplace>, config: SearchConfig) -> StoreSearch {
    StoreSearch::new(Repositories::from_backend(market), config)
}

pub fn request(value: Value) -> StoreSearchRequest {
    serde_json::from_value(value).unwrap()
}

/// Ids of every store matching `value`, ignoring pagination
pub async fn search_ids(search: &StoreSearch, value: Value) -> HashSet<Uuid> {
    let mut req = request(value);
    req.limit = Some(search.config().max_limit);
    let page = search.search_request(req).await.unwrap();
    assert!(page.count <= search.config().max_limit);
    page.items.iter().map(|s| s.id).collect()
}

pub fn ids<'a>(stores: impl IntoIterator<Item = &'a Store>) -> HashSet<Uuid> {
    stores.into_iter().map(|s| s.id).collect()
}

// ---------------------------------------------------------------------------
// Repository wrappers
// ---------------------------------------------------------------------------

/// Store repository counting `find` calls
pub struct CountingStores {
    pub inner: Arc<InMemoryMarketplace>,
    pub finds: AtomicUsize,
}

impl CountingStores {
    pub fn new(inner: Arc<InMemoryMarketplace>) -> Self {
        Self {
            inner,
            finds: AtomicUsize::new(0),
        }
    }

    pub fn find_calls(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoreRepository for CountingStores {
    async fn find(&self, query: &StoreQuery) -> Result<SearchPage<Store>> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.find(query).await
    }

    async fn owned_ids(&self) -> Result<Vec<Uuid>> {
        self.inner.owned_ids().await
    }

    async fn phonetic_matches(&self, query: &PhoneticQuery) -> Result<Vec<Uuid>> {
        self.inner.phonetic_matches(query).await
    }

    async fn url_slugs(&self) -> Result<Vec<(Uuid, String)>> {
        self.inner.url_slugs().await
    }
}

/// Product repository answering after a fixed delay
pub struct SlowProducts {
    pub inner: Arc<InMemoryMarketplace>,
    pub delay: std::time::Duration,
}

#[async_trait]
impl ProductRepository for SlowProducts {
    async fn store_ids(&self, filter: &ProductFilter) -> Result<Vec<Uuid>> {
        tokio::time::sleep(self.delay).await;
        ProductRepository::store_ids(self.inner.as_ref(), filter).await
    }

    async fn count_per_store(&self, filter: &ProductFilter) -> Result<Vec<StoreAggregate<i64>>> {
        tokio::time::sleep(self.delay).await;
        self.inner.count_per_store(filter).await
    }

    async fn latest_update_per_store(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<StoreAggregate<DateTime<Utc>>>> {
        tokio::time::sleep(self.delay).await;
        self.inner.latest_update_per_store(filter).await
    }

    async fn inventory_per_store(&self, filter: &ProductFilter) -> Result<Vec<StoreAggregate<i64>>> {
        tokio::time::sleep(self.delay).await;
        self.inner.inventory_per_store(filter).await
    }
}

/// Review repository whose reads always fail
pub struct FailingReviews;

#[async_trait]
impl ReviewRepository for FailingReviews {
    async fn rating_totals(&self, _filter: &ReviewFilter) -> Result<Vec<RatingTotal>> {
        Err(anyhow!("connection reset by peer"))
    }
}

/// Store repository whose `find` answers after a fixed delay
pub struct SlowStores {
    pub inner: Arc<InMemoryMarketplace>,
    pub delay: std::time::Duration,
}

#[async_trait]
impl StoreRepository for SlowStores {
    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }

    async fn find(&self, query: &StoreQuery) -> Result<SearchPage<Store>> {
        tokio::time::sleep(self.delay).await;
        self.inner.find(query).await
    }

    async fn owned_ids(&self) -> Result<Vec<Uuid>> {
        self.inner.owned_ids().await
    }

    async fn phonetic_matches(&self, query: &PhoneticQuery) -> Result<Vec<Uuid>> {
        self.inner.phonetic_matches(query).await
    }

    async fn url_slugs(&self) -> Result<Vec<(Uuid, String)>> {
        self.inner.url_slugs().await
    }
}

/// Store repository whose `find` always fails; projections still answer
pub struct FailingStores {
    pub inner: Arc<InMemoryMarketplace>,
}

#[async_trait]
impl StoreRepository for FailingStores {
    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }

    async fn find(&self, _query: &StoreQuery) -> Result<SearchPage<Store>> {
        Err(anyhow!("relation \"stores\" does not exist"))
    }

    async fn owned_ids(&self) -> Result<Vec<Uuid>> {
        self.inner.owned_ids().await
    }

    async fn phonetic_matches(&self, query: &PhoneticQuery) -> Result<Vec<Uuid>> {
        self.inner.phonetic_matches(query).await
    }

    async fn url_slugs(&self) -> Result<Vec<(Uuid, String)>> {
        self.inner.url_slugs().await
    }
}
