//! Composable query over the store collection
//!
//! A [`StoreQuery`] is a backend-neutral description of the final store
//! lookup: a conjunction of [`StorePredicate`]s over the store and its
//! one-hop relations (detail, payback, owner), plus ordering and
//! pagination. Storage backends translate it to their own query language.

use crate::core::query::{Pagination, SortSpec};
use crate::core::range::RangeFilter;
use crate::entities::{BusinessForm, PaymentMethod, PlanTier, StoreStatus};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

/// A single condition on a store or one of its one-hop relations
///
/// Substring predicates are case-insensitive.
#[derive(Debug, Clone, PartialEq)]
pub enum StorePredicate {
    /// Store has an owning user
    OwnerAssigned,
    /// Store is not soft-deleted
    NotDeleted,
    /// Store id belongs to the set
    IdIn(HashSet<Uuid>),

    NumberEquals(i64),
    NameContains(String),
    StatusIn(Vec<StoreStatus>),
    PlanIn(Vec<PlanTier>),
    BusinessFormIn(Vec<BusinessForm>),
    Guarantee(bool),
    MarginRate(RangeFilter<f64>),
    FollowerCount(RangeFilter<i64>),
    CreatedAt(RangeFilter<DateTime<Utc>>),

    /// Detail company name or its kana reading contains the text
    CompanyNameContains(String),
    RepresentativeContains(String),
    RegistrationNumberEquals(String),
    PaymentMethodIn(Vec<PaymentMethod>),

    OwnerDisplayIdEquals(String),
    OwnerNicknameContains(String),
    OwnerEmailContains(String),

    /// Payback account number contains the text
    AccountNumberContains(String),
}

/// Query over the store collection
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoreQuery {
    pub predicates: Vec<StorePredicate>,
    pub sort: SortSpec,
    pub pagination: Pagination,
}

impl StoreQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a predicate (conditions are ANDed)
    pub fn filter(&mut self, predicate: StorePredicate) -> &mut Self {
        self.predicates.push(predicate);
        self
    }

    /// Restrict the query to a set of store ids
    pub fn restrict_ids(&mut self, ids: HashSet<Uuid>) -> &mut Self {
        self.filter(StorePredicate::IdIn(ids))
    }

    pub fn sorted(&mut self, sort: SortSpec) -> &mut Self {
        self.sort = sort;
        self
    }

    pub fn paginate(&mut self, pagination: Pagination) -> &mut Self {
        self.pagination = pagination;
        self
    }
}
