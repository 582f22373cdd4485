//! Resolvers over the order collection

use super::DerivedResolver;
use crate::core::range::RangeFilter;
use crate::core::service::{OrderFilter, OrderRepository};
use crate::search::combinator::StoreIdSet;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Stores that made a sale within a time window
///
/// A sale is a sub-order; parent orders belong to the buyer, not to a
/// store.
pub struct LastSaleResolver {
    orders: Arc<dyn OrderRepository>,
    range: RangeFilter<DateTime<Utc>>,
}

impl LastSaleResolver {
    pub fn new(orders: Arc<dyn OrderRepository>, range: RangeFilter<DateTime<Utc>>) -> Self {
        Self { orders, range }
    }
}

#[async_trait]
impl DerivedResolver for LastSaleResolver {
    fn name(&self) -> &'static str {
        "last_sale"
    }

    async fn resolve(&self) -> Result<StoreIdSet> {
        let filter = OrderFilter {
            sub_orders_only: true,
            created_at: self.range,
        };
        Ok(self.orders.store_ids(&filter).await?.into_iter().collect())
    }
}
