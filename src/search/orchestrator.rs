//! Search orchestration
//!
//! One search runs in three phases:
//!
//! 1. direct criteria and the default exclusions become store predicates
//! 2. every active derived resolver runs, under one shared deadline, and
//!    their sets are intersected
//! 3. the store query, restricted to the intersection, is executed with
//!    sort and pagination
//!
//! When the intersection is empty phase 3 is skipped entirely and an empty
//! page is returned. Any resolver failure fails the whole search; partial
//! results are never returned.

use crate::config::{ResolverMode, SearchConfig};
use crate::core::error::{ResolverError, SearchResult, StorageError};
use crate::core::query::{Pagination, SearchPage, SortSpec};
use crate::core::store::StoreQuery;
use crate::entities::Store;
use crate::search::combinator::{StoreIdSet, combine_all};
use crate::search::direct::{append_default_exclusions, append_direct_predicates};
use crate::search::request::{StoreCriteria, StoreSearchRequest};
use crate::search::resolvers::{DerivedResolver, Repositories, active_resolvers};
use futures::future::try_join_all;
use std::sync::Arc;
use tokio::time::{Instant, timeout_at};

/// Store search engine
#[derive(Clone)]
pub struct StoreSearch {
    repos: Repositories,
    config: Arc<SearchConfig>,
}

impl StoreSearch {
    pub fn new(repos: Repositories, config: SearchConfig) -> Self {
        Self {
            repos,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Validate a raw request and run it
    pub async fn search_request(
        &self,
        request: StoreSearchRequest,
    ) -> SearchResult<SearchPage<Store>> {
        let (criteria, pagination, sort) = request.into_parts(&self.config)?;
        self.search(&criteria, pagination, sort).await
    }

    /// Run a search with the configured deadline
    pub async fn search(
        &self,
        criteria: &StoreCriteria,
        pagination: Pagination,
        sort: SortSpec,
    ) -> SearchResult<SearchPage<Store>> {
        let deadline = Instant::now() + self.config.resolver_timeout();
        self.search_with_deadline(criteria, pagination, sort, deadline)
            .await
    }

    /// Run a search that must complete before `deadline`
    pub async fn search_with_deadline(
        &self,
        criteria: &StoreCriteria,
        pagination: Pagination,
        sort: SortSpec,
        deadline: Instant,
    ) -> SearchResult<SearchPage<Store>> {
        let started = Instant::now();
        let mut query = StoreQuery::new();
        append_default_exclusions(&mut query);
        append_direct_predicates(&mut query, &criteria.direct);

        let resolvers = active_resolvers(&criteria.derived, &self.repos, &self.config);
        if !resolvers.is_empty() {
            let sets = self.run_resolvers(&resolvers, deadline).await?;

            if let Some(ids) = combine_all(sets) {
                if ids.is_empty() {
                    tracing::debug!(
                        resolvers = resolvers.len(),
                        "derived criteria matched no store, skipping store lookup"
                    );
                    return Ok(SearchPage::empty());
                }
                query.restrict_ids(ids);
            }
        }

        query.sorted(sort).paginate(pagination);

        let backend = self.repos.stores.backend_name();
        let page = match timeout_at(deadline, self.repos.stores.find(&query)).await {
            Ok(Ok(page)) => page,
            Ok(Err(e)) => {
                tracing::error!(backend, error = %e, "store lookup failed");
                return Err(StorageError::QueryError {
                    backend: backend.to_string(),
                    message: e.to_string(),
                }
                .into());
            }
            Err(_) => {
                tracing::warn!(backend, "store lookup exceeded the search deadline");
                return Err(StorageError::Timeout {
                    operation: "store lookup".to_string(),
                }
                .into());
            }
        };

        tracing::info!(
            predicates = query.predicates.len(),
            derived = resolvers.len(),
            count = page.count,
            returned = page.items.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "store search completed"
        );

        Ok(page)
    }

    async fn run_resolvers(
        &self,
        resolvers: &[Box<dyn DerivedResolver>],
        deadline: Instant,
    ) -> Result<Vec<StoreIdSet>, ResolverError> {
        match self.config.resolver_mode {
            ResolverMode::Concurrent => {
                try_join_all(resolvers.iter().map(|r| run_one(r.as_ref(), deadline))).await
            }
            ResolverMode::Sequential => {
                let mut sets = Vec::with_capacity(resolvers.len());
                for resolver in resolvers {
                    let ids = run_one(resolver.as_ref(), deadline).await?;
                    let exhausted = ids.is_empty();
                    sets.push(ids);
                    if exhausted {
                        break;
                    }
                }
                Ok(sets)
            }
        }
    }
}

async fn run_one(
    resolver: &dyn DerivedResolver,
    deadline: Instant,
) -> Result<StoreIdSet, ResolverError> {
    let name = resolver.name();
    let started = Instant::now();

    match timeout_at(deadline, resolver.resolve()).await {
        Ok(Ok(ids)) => {
            tracing::debug!(
                resolver = name,
                matched = ids.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "derived resolver finished"
            );
            Ok(ids)
        }
        Ok(Err(e)) => {
            tracing::warn!(resolver = name, error = %e, "derived resolver failed");
            Err(ResolverError::Failed {
                resolver: name.to_string(),
                message: e.to_string(),
            })
        }
        Err(_) => {
            tracing::warn!(resolver = name, "derived resolver exceeded the search deadline");
            Err(ResolverError::Timeout {
                resolver: name.to_string(),
            })
        }
    }
}
