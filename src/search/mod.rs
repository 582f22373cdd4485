//! The store search engine
//!
//! - [`request`]: request shape, validation and the direct/derived split
//! - [`direct`]: predicates evaluated by the store query
//! - [`resolvers`]: one resolver per derived criterion
//! - [`combinator`]: set intersection of resolver results
//! - [`orchestrator`]: runs a search end to end

pub mod combinator;
pub mod direct;
pub mod orchestrator;
pub mod request;
pub mod resolvers;

pub use crate::core::range::{RangeFilter, RangeMode};
pub use combinator::{StoreIdSet, combine, combine_all};
pub use orchestrator::StoreSearch;
pub use request::{CarryOver, DerivedCriteria, DirectCriteria, StoreCriteria, StoreSearchRequest};
pub use resolvers::{DerivedResolver, Repositories};
