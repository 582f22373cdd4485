//! Core module containing the fundamental traits and types of the engine

pub mod entity;
pub mod error;
pub mod field;
pub mod query;
pub mod range;
pub mod service;
pub mod store;

pub use entity::{Data, Entity};
pub use error::{SearchError, SearchResult};
pub use field::FieldValue;
pub use query::{Pagination, SearchPage, SortDirection, SortField, SortSpec};
pub use range::{RangeFilter, RangeMode};
pub use service::{OrderRepository, ProductRepository, ReviewRepository, StoreRepository};
pub use store::{StorePredicate, StoreQuery};
