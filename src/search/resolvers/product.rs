//! Resolvers over the product collection

use super::DerivedResolver;
use crate::core::range::RangeFilter;
use crate::core::service::{
    CategoryPath, ProductFilter, ProductRepository, StatusCondition, StoreRepository,
};
use crate::entities::ProductStatus;
use crate::search::combinator::StoreIdSet;
use crate::search::request::CarryOver;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

fn published() -> ProductFilter {
    ProductFilter::with_status(StatusCondition::Is(ProductStatus::Published))
}

/// Stores whose number of published products falls in a range
///
/// Stores without any qualifying product have a count of zero, so a range
/// containing zero also selects them. That is why the resolver needs the
/// store repository as well.
pub struct ProductCountResolver {
    products: Arc<dyn ProductRepository>,
    stores: Arc<dyn StoreRepository>,
    range: RangeFilter<i64>,
    on_sale_only: bool,
}

impl ProductCountResolver {
    /// Count every published product
    pub fn published(
        products: Arc<dyn ProductRepository>,
        stores: Arc<dyn StoreRepository>,
        range: RangeFilter<i64>,
    ) -> Self {
        Self {
            products,
            stores,
            range,
            on_sale_only: false,
        }
    }

    /// Count published products that have a sale price
    pub fn on_sale(
        products: Arc<dyn ProductRepository>,
        stores: Arc<dyn StoreRepository>,
        range: RangeFilter<i64>,
    ) -> Self {
        Self {
            products,
            stores,
            range,
            on_sale_only: true,
        }
    }
}

#[async_trait]
impl DerivedResolver for ProductCountResolver {
    fn name(&self) -> &'static str {
        if self.on_sale_only {
            "on_sale_count"
        } else {
            "product_count"
        }
    }

    async fn resolve(&self) -> Result<StoreIdSet> {
        let filter = ProductFilter {
            on_sale_only: self.on_sale_only,
            ..published()
        };

        let mut counts: HashMap<_, i64> = HashMap::new();
        for row in self.products.count_per_store(&filter).await? {
            *counts.entry(row.store_id).or_default() += row.value;
        }

        let mut ids: StoreIdSet = counts
            .iter()
            .filter(|(_, count)| self.range.contains(count))
            .map(|(id, _)| *id)
            .collect();

        if self.range.contains(&0) {
            ids.extend(
                self.stores
                    .owned_ids()
                    .await?
                    .into_iter()
                    .filter(|id| !counts.contains_key(id)),
            );
        }

        Ok(ids)
    }
}

/// Stores with at least one published product whose sale price is in range
pub struct SalePriceResolver {
    products: Arc<dyn ProductRepository>,
    range: RangeFilter<i64>,
}

impl SalePriceResolver {
    pub fn new(products: Arc<dyn ProductRepository>, range: RangeFilter<i64>) -> Self {
        Self { products, range }
    }
}

#[async_trait]
impl DerivedResolver for SalePriceResolver {
    fn name(&self) -> &'static str {
        "sale_price"
    }

    async fn resolve(&self) -> Result<StoreIdSet> {
        let filter = ProductFilter {
            sale_price: self.range,
            ..published()
        };
        Ok(self.products.store_ids(&filter).await?.into_iter().collect())
    }
}

/// Stores whose most recent catalog update falls in a range
///
/// The range applies to the per-store maximum of `updated_at` over every
/// non-draft product, not to individual products.
pub struct LastUpdateResolver {
    products: Arc<dyn ProductRepository>,
    range: RangeFilter<DateTime<Utc>>,
}

impl LastUpdateResolver {
    pub fn new(products: Arc<dyn ProductRepository>, range: RangeFilter<DateTime<Utc>>) -> Self {
        Self { products, range }
    }
}

#[async_trait]
impl DerivedResolver for LastUpdateResolver {
    fn name(&self) -> &'static str {
        "last_update"
    }

    async fn resolve(&self) -> Result<StoreIdSet> {
        let filter = ProductFilter::with_status(StatusCondition::IsNot(ProductStatus::Draft));

        let mut latest: HashMap<_, DateTime<Utc>> = HashMap::new();
        for row in self.products.latest_update_per_store(&filter).await? {
            latest
                .entry(row.store_id)
                .and_modify(|at| *at = (*at).max(row.value))
                .or_insert(row.value);
        }

        Ok(latest
            .into_iter()
            .filter(|(_, at)| self.range.contains(at))
            .map(|(id, _)| id)
            .collect())
    }
}

/// Stores selling a published product in a category path
pub struct CategoryResolver {
    products: Arc<dyn ProductRepository>,
    path: CategoryPath,
}

impl CategoryResolver {
    pub fn new(products: Arc<dyn ProductRepository>, path: CategoryPath) -> Self {
        Self { products, path }
    }
}

#[async_trait]
impl DerivedResolver for CategoryResolver {
    fn name(&self) -> &'static str {
        "category"
    }

    async fn resolve(&self) -> Result<StoreIdSet> {
        let filter = ProductFilter {
            category: self.path,
            ..published()
        };
        Ok(self.products.store_ids(&filter).await?.into_iter().collect())
    }
}

/// Stores on one side of the carry-over inventory threshold
///
/// Inventory is the sum of non-deleted variant stock over published
/// products. A total equal to the threshold counts as "over". Stores with
/// no stock at all have a total of zero.
pub struct CarryOverResolver {
    products: Arc<dyn ProductRepository>,
    stores: Arc<dyn StoreRepository>,
    side: CarryOver,
    threshold: i64,
}

impl CarryOverResolver {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        stores: Arc<dyn StoreRepository>,
        side: CarryOver,
        threshold: i64,
    ) -> Self {
        Self {
            products,
            stores,
            side,
            threshold,
        }
    }
}

#[async_trait]
impl DerivedResolver for CarryOverResolver {
    fn name(&self) -> &'static str {
        "carry_over"
    }

    async fn resolve(&self) -> Result<StoreIdSet> {
        let mut totals: HashMap<_, i64> = HashMap::new();
        for row in self.products.inventory_per_store(&published()).await? {
            *totals.entry(row.store_id).or_default() += row.value;
        }
        for id in self.stores.owned_ids().await? {
            totals.entry(id).or_insert(0);
        }

        Ok(totals
            .into_iter()
            .filter(|(_, total)| self.side.matches(*total, self.threshold))
            .map(|(id, _)| id)
            .collect())
    }
}
