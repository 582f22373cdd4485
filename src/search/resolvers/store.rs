//! Resolvers over store-level data that the store query cannot express

use super::DerivedResolver;
use crate::core::service::{PhoneticQuery, StoreRepository};
use crate::search::combinator::StoreIdSet;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Both ways phonetic names are joined before matching
///
/// Registration data is inconsistently segmented: some stores typed the
/// reading with a space between given and family name, some without.
const FURIGANA_SEPARATORS: &[&str] = &[" ", ""];

/// Stores whose representative's phonetic name contains a text
pub struct FuriganaResolver {
    stores: Arc<dyn StoreRepository>,
    needle: String,
}

impl FuriganaResolver {
    pub fn new(stores: Arc<dyn StoreRepository>, needle: String) -> Self {
        Self { stores, needle }
    }
}

#[async_trait]
impl DerivedResolver for FuriganaResolver {
    fn name(&self) -> &'static str {
        "furigana"
    }

    async fn resolve(&self) -> Result<StoreIdSet> {
        let query = PhoneticQuery {
            needle: self.needle.clone(),
            separators: FURIGANA_SEPARATORS,
        };
        let ids: StoreIdSet = self
            .stores
            .phonetic_matches(&query)
            .await?
            .into_iter()
            .collect();

        if ids.is_empty() {
            tracing::debug!(needle = %self.needle, "no phonetic name matched with or without separator");
        }
        Ok(ids)
    }
}

/// Stores whose public URL contains a text
///
/// The URL is not stored; it is the configured base followed by the slug.
pub struct PublicUrlResolver {
    stores: Arc<dyn StoreRepository>,
    needle: String,
    base: String,
}

impl PublicUrlResolver {
    pub fn new(stores: Arc<dyn StoreRepository>, needle: String, base: String) -> Self {
        Self {
            stores,
            needle,
            base,
        }
    }
}

#[async_trait]
impl DerivedResolver for PublicUrlResolver {
    fn name(&self) -> &'static str {
        "public_url"
    }

    async fn resolve(&self) -> Result<StoreIdSet> {
        Ok(self
            .stores
            .url_slugs()
            .await?
            .into_iter()
            .filter(|(_, slug)| format!("{}{}", self.base, slug).contains(&self.needle))
            .map(|(id, _)| id)
            .collect())
    }
}
