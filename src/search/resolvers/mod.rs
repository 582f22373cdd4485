//! Derived-criterion resolvers
//!
//! A resolver answers one derived criterion by scanning or aggregating a
//! related collection and projecting the result onto store ids. Resolvers
//! know nothing about each other or about the store query; each one returns
//! an owned, deduplicated [`StoreIdSet`].
//!
//! [`active_resolvers`] builds a resolver only for criteria present in the
//! request, so absent criteria cost nothing and never constrain the result.

pub mod order;
pub mod product;
pub mod review;
pub mod store;

use crate::config::SearchConfig;
use crate::core::service::{OrderRepository, ProductRepository, ReviewRepository, StoreRepository};
use crate::search::combinator::StoreIdSet;
use crate::search::request::DerivedCriteria;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub use order::LastSaleResolver;
pub use product::{
    CarryOverResolver, CategoryResolver, LastUpdateResolver, ProductCountResolver,
    SalePriceResolver,
};
pub use review::AverageRatingResolver;
pub use store::{FuriganaResolver, PublicUrlResolver};

/// Computes the set of stores satisfying one derived criterion
#[async_trait]
pub trait DerivedResolver: Send + Sync {
    /// Stable name used in logs and errors
    fn name(&self) -> &'static str;

    async fn resolve(&self) -> Result<StoreIdSet>;
}

/// The collections a search reads from
#[derive(Clone)]
pub struct Repositories {
    pub stores: Arc<dyn StoreRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
}

impl Repositories {
    /// Use one backend for every collection
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: StoreRepository + ProductRepository + OrderRepository + ReviewRepository + 'static,
    {
        Self {
            stores: backend.clone(),
            products: backend.clone(),
            orders: backend.clone(),
            reviews: backend,
        }
    }
}

/// Build the resolvers for the derived criteria present in the request
pub fn active_resolvers(
    criteria: &DerivedCriteria,
    repos: &Repositories,
    config: &SearchConfig,
) -> Vec<Box<dyn DerivedResolver>> {
    let mut resolvers: Vec<Box<dyn DerivedResolver>> = Vec::new();

    if criteria.product_count.is_active() {
        resolvers.push(Box::new(ProductCountResolver::published(
            repos.products.clone(),
            repos.stores.clone(),
            criteria.product_count,
        )));
    }
    if criteria.on_sale_count.is_active() {
        resolvers.push(Box::new(ProductCountResolver::on_sale(
            repos.products.clone(),
            repos.stores.clone(),
            criteria.on_sale_count,
        )));
    }
    if criteria.sale_price.is_active() {
        resolvers.push(Box::new(SalePriceResolver::new(
            repos.products.clone(),
            criteria.sale_price,
        )));
    }
    if criteria.last_update.is_active() {
        resolvers.push(Box::new(LastUpdateResolver::new(
            repos.products.clone(),
            criteria.last_update,
        )));
    }
    if criteria.last_sale.is_active() {
        resolvers.push(Box::new(LastSaleResolver::new(
            repos.orders.clone(),
            criteria.last_sale,
        )));
    }
    if !criteria.category.is_empty() {
        resolvers.push(Box::new(CategoryResolver::new(
            repos.products.clone(),
            criteria.category,
        )));
    }
    if let Some(furigana) = &criteria.furigana {
        resolvers.push(Box::new(FuriganaResolver::new(
            repos.stores.clone(),
            furigana.clone(),
        )));
    }
    if criteria.eval_score.is_active() {
        resolvers.push(Box::new(AverageRatingResolver::new(
            repos.reviews.clone(),
            criteria.eval_score,
        )));
    }
    if let Some(side) = criteria.carry_over {
        resolvers.push(Box::new(CarryOverResolver::new(
            repos.products.clone(),
            repos.stores.clone(),
            side,
            config.carry_over_threshold,
        )));
    }
    if let Some(url) = &criteria.url {
        resolvers.push(Box::new(PublicUrlResolver::new(
            repos.stores.clone(),
            url.clone(),
            config.public_url_base.clone(),
        )));
    }

    resolvers
}
