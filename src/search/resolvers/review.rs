//! Resolvers over the review collection

use super::DerivedResolver;
use crate::core::range::RangeFilter;
use crate::core::service::{ReviewFilter, ReviewRepository};
use crate::search::combinator::StoreIdSet;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Stores whose average top-level review rating falls in a range
///
/// A store without any top-level review has no average and never matches,
/// whatever the range.
pub struct AverageRatingResolver {
    reviews: Arc<dyn ReviewRepository>,
    range: RangeFilter<f64>,
}

impl AverageRatingResolver {
    pub fn new(reviews: Arc<dyn ReviewRepository>, range: RangeFilter<f64>) -> Self {
        Self { reviews, range }
    }
}

#[async_trait]
impl DerivedResolver for AverageRatingResolver {
    fn name(&self) -> &'static str {
        "average_rating"
    }

    async fn resolve(&self) -> Result<StoreIdSet> {
        let filter = ReviewFilter {
            top_level_only: true,
        };

        let mut totals: HashMap<_, (f64, i64)> = HashMap::new();
        for row in self.reviews.rating_totals(&filter).await? {
            let entry = totals.entry(row.store_id).or_default();
            entry.0 += row.sum;
            entry.1 += row.count;
        }

        Ok(totals
            .into_iter()
            .filter_map(|(id, (sum, count))| {
                if count == 0 {
                    return None;
                }
                let mean = sum / count as f64;
                self.range.contains(&mean).then_some(id)
            })
            .collect())
    }
}
