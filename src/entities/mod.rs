//! Entities read by the search engine

pub mod macros;
pub mod order;
pub mod product;
pub mod review;
pub mod store;

pub use order::Order;
pub use product::{Product, ProductStatus, Variant};
pub use review::Review;
pub use store::{BusinessForm, Owner, Payback, PaymentMethod, PlanTier, Store, StoreDetail, StoreStatus};
