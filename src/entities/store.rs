//! Store entity (the searched subject) and its one-hop relations

use crate::core::entity::{Data, Entity};
use crate::core::field::FieldValue;
use crate::str_enum;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

str_enum! {
    /// Lifecycle status of a store
    pub enum StoreStatus {
        Applying => "applying",
        Reviewing => "reviewing",
        Active => "active",
        Suspended => "suspended",
        Closed => "closed",
    }
}

str_enum! {
    /// Legal form of the business running the store
    pub enum BusinessForm {
        Individual => "individual",
        Corporation => "corporation",
    }
}

str_enum! {
    /// Subscription plan of the store
    pub enum PlanTier {
        Free => "free",
        Standard => "standard",
        Premium => "premium",
    }
}

str_enum! {
    /// How the marketplace pays the store
    pub enum PaymentMethod {
        BankTransfer => "bank_transfer",
        CreditCard => "credit_card",
        Invoice => "invoice",
    }
}

/// A marketplace store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: Uuid,

    /// Sequential display number shown in the admin UI
    pub number: i64,

    pub name: String,
    pub status: StoreStatus,
    pub business_form: BusinessForm,
    pub plan: PlanTier,

    /// Commission rate taken by the marketplace, in percent
    pub margin_rate: f64,

    pub follower_count: i64,

    /// Whether the store offers the marketplace purchase guarantee
    pub guarantee: bool,

    /// Path segment of the store's public page
    pub url_slug: String,

    /// Owning user; stores without an owner are admin placeholders
    pub user_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub detail: Option<StoreDetail>,
    #[serde(default)]
    pub payback: Option<Payback>,
    #[serde(default)]
    pub owner: Option<Owner>,
}

/// Registration details of a store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreDetail {
    pub company_name: String,
    #[serde(default)]
    pub company_name_kana: Option<String>,
    #[serde(default)]
    pub representative_name: Option<String>,
    #[serde(default)]
    pub registration_number: Option<String>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,

    /// Phonetic reading of the representative's given name
    #[serde(default)]
    pub furigana_first: Option<String>,

    /// Phonetic reading of the representative's family name
    #[serde(default)]
    pub furigana_last: Option<String>,
}

/// Bank account the marketplace pays sales into
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payback {
    pub bank_name: String,
    #[serde(default)]
    pub branch_name: Option<String>,
    pub account_number: String,
    pub account_holder: String,
}

/// User owning a store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub id: Uuid,

    /// Public handle of the user
    pub display_id: String,

    pub nickname: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl Entity for Store {
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

impl Data for Store {
    fn sortable_fields() -> &'static [&'static str] {
        &[
            "number",
            "name",
            "created_at",
            "follower_count",
            "margin_rate",
        ]
    }

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "id" => Some(FieldValue::Uuid(self.id)),
            "number" => Some(FieldValue::Integer(self.number)),
            "name" => Some(FieldValue::String(self.name.clone())),
            "status" => Some(FieldValue::String(self.status.as_str().to_string())),
            "created_at" => Some(FieldValue::DateTime(self.created_at)),
            "follower_count" => Some(FieldValue::Integer(self.follower_count)),
            "margin_rate" => Some(FieldValue::Float(self.margin_rate)),
            "guarantee" => Some(FieldValue::Boolean(self.guarantee)),
            "user_id" => Some(self.user_id.map_or(FieldValue::Null, FieldValue::Uuid)),
            _ => None,
        }
    }
}

impl StoreDetail {
    /// Phonetic given name and family name, when both are recorded
    pub fn furigana(&self) -> Option<(&str, &str)> {
        match (&self.furigana_first, &self.furigana_last) {
            (Some(first), Some(last)) => Some((first.as_str(), last.as_str())),
            _ => None,
        }
    }
}
