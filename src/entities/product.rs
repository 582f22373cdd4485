//! Product entity and its variants

use crate::core::entity::Entity;
use crate::str_enum;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

str_enum! {
    /// Catalog lifecycle of a product
    pub enum ProductStatus {
        Draft => "draft",
        Published => "published",
        Private => "private",
        SoldOut => "sold_out",
    }
}

/// A product listed by a store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub store_id: Uuid,
    pub name: String,
    pub status: ProductStatus,
    pub price: i64,

    /// Discounted price; `None` when the product is not on sale
    #[serde(default)]
    pub sale_price: Option<i64>,

    /// Category path, up to three levels
    pub top_type_id: Uuid,
    #[serde(default)]
    pub category1_id: Option<Uuid>,
    #[serde(default)]
    pub category2_id: Option<Uuid>,

    #[serde(default)]
    pub variants: Vec<Variant>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A purchasable variant (size, color, ...) holding stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub id: Uuid,
    pub inventory: i64,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Product {
    pub fn is_on_sale(&self) -> bool {
        self.sale_price.is_some()
    }

    /// Stock over all variants that are not soft-deleted
    pub fn inventory(&self) -> i64 {
        self.variants
            .iter()
            .filter(|v| v.deleted_at.is_none())
            .map(|v| v.inventory)
            .sum()
    }
}

impl Entity for Product {
    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}
