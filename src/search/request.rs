//! Search request and its split into direct and derived criteria
//!
//! Every request field is optional. A missing field means "filter not
//! requested"; a present field is applied literally, even when its value is
//! zero, empty, or an inverted range.

use crate::config::SearchConfig;
use crate::core::error::ValidationError;
use crate::core::query::{Pagination, SortSpec};
use crate::core::range::RangeFilter;
use crate::core::service::CategoryPath;
use crate::entities::{BusinessForm, PaymentMethod, PlanTier, StoreStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Store search request as sent by the admin UI
///
/// Unknown fields, unknown enum values and malformed dates or ids are
/// rejected at deserialization time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct StoreSearchRequest {
    // === Direct criteria ===
    pub number: Option<i64>,
    #[validate(length(max = 255))]
    pub name: Option<String>,
    pub status: Option<Vec<StoreStatus>>,
    pub plan: Option<Vec<PlanTier>>,
    pub business_form: Option<Vec<BusinessForm>>,
    pub guarantee: Option<bool>,
    pub margin_rate_from: Option<f64>,
    pub margin_rate_to: Option<f64>,
    pub follower_from: Option<i64>,
    pub follower_to: Option<i64>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    #[validate(length(max = 255))]
    pub company_name: Option<String>,
    #[validate(length(max = 255))]
    pub representative_name: Option<String>,
    #[validate(length(max = 255))]
    pub registration_number: Option<String>,
    pub payment_method: Option<Vec<PaymentMethod>>,
    #[validate(length(max = 255))]
    pub owner_display_id: Option<String>,
    #[validate(length(max = 255))]
    pub owner_nickname: Option<String>,
    #[validate(length(max = 255))]
    pub owner_email: Option<String>,
    #[validate(length(max = 255))]
    pub account_number: Option<String>,

    // === Derived criteria ===
    pub number_product_from: Option<i64>,
    pub number_product_to: Option<i64>,
    pub number_sale_product_from: Option<i64>,
    pub number_sale_product_to: Option<i64>,
    pub sale_price_from: Option<i64>,
    pub sale_price_to: Option<i64>,
    pub last_update_from: Option<DateTime<Utc>>,
    pub last_update_to: Option<DateTime<Utc>>,
    pub last_sale_from: Option<DateTime<Utc>>,
    pub last_sale_to: Option<DateTime<Utc>>,
    pub top_type_id: Option<Uuid>,
    pub category1_id: Option<Uuid>,
    pub category2_id: Option<Uuid>,
    #[validate(length(max = 255))]
    pub furigana: Option<String>,
    #[validate(range(min = 0.0, max = 5.0))]
    pub eval_score_from: Option<f64>,
    #[validate(range(min = 0.0, max = 5.0))]
    pub eval_score_to: Option<f64>,
    /// `["true"]` or `["false"]`; any other shape leaves the criterion off
    #[validate(length(max = 2))]
    pub carry_over: Option<Vec<String>>,
    #[validate(length(max = 255))]
    pub url: Option<String>,

    // === Paging ===
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    /// `field[:asc|desc]`
    pub sort: Option<String>,
}

/// Criteria evaluated directly on the store and its one-hop relations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectCriteria {
    pub number: Option<i64>,
    pub name: Option<String>,
    pub status: Option<Vec<StoreStatus>>,
    pub plan: Option<Vec<PlanTier>>,
    pub business_form: Option<Vec<BusinessForm>>,
    pub guarantee: Option<bool>,
    pub margin_rate: RangeFilter<f64>,
    pub follower_count: RangeFilter<i64>,
    pub created_at: RangeFilter<DateTime<Utc>>,
    pub company_name: Option<String>,
    pub representative_name: Option<String>,
    pub registration_number: Option<String>,
    pub payment_method: Option<Vec<PaymentMethod>>,
    pub owner_display_id: Option<String>,
    pub owner_nickname: Option<String>,
    pub owner_email: Option<String>,
    pub account_number: Option<String>,
}

/// Requested side of the carry-over classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarryOver {
    /// Inventory total at or above the threshold
    Over,
    /// Inventory total below the threshold
    Under,
}

impl CarryOver {
    /// Read the request flag list
    ///
    /// Only a single `"true"` or `"false"` entry selects a side. Both
    /// values together, no value, or anything else means the caller is not
    /// filtering on carry-over.
    pub fn from_flags(flags: &[String]) -> Option<Self> {
        match flags {
            [flag] => match flag.as_str() {
                "true" => Some(CarryOver::Over),
                "false" => Some(CarryOver::Under),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn matches(&self, total: i64, threshold: i64) -> bool {
        match self {
            CarryOver::Over => total >= threshold,
            CarryOver::Under => total < threshold,
        }
    }
}

/// Criteria that each need their own scan of a related collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedCriteria {
    pub product_count: RangeFilter<i64>,
    pub on_sale_count: RangeFilter<i64>,
    pub sale_price: RangeFilter<i64>,
    pub last_update: RangeFilter<DateTime<Utc>>,
    pub last_sale: RangeFilter<DateTime<Utc>>,
    pub category: CategoryPath,
    pub furigana: Option<String>,
    pub eval_score: RangeFilter<f64>,
    pub carry_over: Option<CarryOver>,
    pub url: Option<String>,
}

/// All filter criteria of one search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreCriteria {
    pub direct: DirectCriteria,
    pub derived: DerivedCriteria,
}

impl StoreSearchRequest {
    /// Validate the request and split it into criteria, pagination and sort
    ///
    /// The page size defaults to `config.default_limit` and is capped at
    /// `config.max_limit`.
    pub fn into_parts(
        self,
        config: &SearchConfig,
    ) -> Result<(StoreCriteria, Pagination, SortSpec), ValidationError> {
        self.validate()?;

        let sort = match self.sort.as_deref() {
            Some(expr) => SortSpec::parse(expr)?,
            None => SortSpec::default(),
        };

        let pagination = Pagination::new(
            self.limit
                .unwrap_or(config.default_limit)
                .min(config.max_limit),
            self.offset.unwrap_or(0),
        );

        let direct = DirectCriteria {
            number: self.number,
            name: self.name,
            status: self.status,
            plan: self.plan,
            business_form: self.business_form,
            guarantee: self.guarantee,
            margin_rate: RangeFilter::classify(self.margin_rate_from, self.margin_rate_to),
            follower_count: RangeFilter::classify(self.follower_from, self.follower_to),
            created_at: RangeFilter::classify(self.created_from, self.created_to),
            company_name: self.company_name,
            representative_name: self.representative_name,
            registration_number: self.registration_number,
            payment_method: self.payment_method,
            owner_display_id: self.owner_display_id,
            owner_nickname: self.owner_nickname,
            owner_email: self.owner_email,
            account_number: self.account_number,
        };

        let derived = DerivedCriteria {
            product_count: RangeFilter::classify(
                self.number_product_from,
                self.number_product_to,
            ),
            on_sale_count: RangeFilter::classify(
                self.number_sale_product_from,
                self.number_sale_product_to,
            ),
            sale_price: RangeFilter::classify(self.sale_price_from, self.sale_price_to),
            last_update: RangeFilter::classify(self.last_update_from, self.last_update_to),
            last_sale: RangeFilter::classify(self.last_sale_from, self.last_sale_to),
            category: CategoryPath {
                top_type_id: self.top_type_id,
                category1_id: self.category1_id,
                category2_id: self.category2_id,
            },
            furigana: self.furigana,
            eval_score: RangeFilter::classify(self.eval_score_from, self.eval_score_to),
            carry_over: self.carry_over.as_deref().and_then(CarryOver::from_flags),
            url: self.url,
        };

        Ok((StoreCriteria { direct, derived }, pagination, sort))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::query::{SortDirection, SortField};
    use crate::core::range::RangeMode;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<StoreSearchRequest, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn test_empty_request_has_no_criteria() {
        let (criteria, pagination, sort) = parse(json!({}))
            .unwrap()
            .into_parts(&SearchConfig::default())
            .unwrap();

        assert_eq!(criteria, StoreCriteria::default());
        assert_eq!(pagination, Pagination::new(20, 0));
        assert_eq!(sort, SortSpec::default());
    }

    #[test]
    fn test_ranges_are_classified() {
        let request = parse(json!({
            "number_product_from": 0,
            "number_product_to": 0,
            "eval_score_from": 4.0,
            "follower_to": 100
        }))
        .unwrap();
        let (criteria, _, _) = request.into_parts(&SearchConfig::default()).unwrap();

        assert_eq!(criteria.derived.product_count, RangeFilter::Both(0, 0));
        assert_eq!(criteria.derived.eval_score.mode(), RangeMode::FromOnly);
        assert_eq!(criteria.derived.sale_price.mode(), RangeMode::None);
        assert_eq!(criteria.direct.follower_count, RangeFilter::ToOnly(100));
    }

    #[test]
    fn test_unknown_enum_value_rejected() {
        assert!(parse(json!({ "status": ["active", "hibernating"] })).is_err());
        assert!(parse(json!({ "plan": ["premium"] })).is_ok());
    }

    #[test]
    fn test_malformed_date_rejected() {
        assert!(parse(json!({ "last_sale_from": "yesterday" })).is_err());
        assert!(parse(json!({ "last_sale_from": "2024-05-01T00:00:00Z" })).is_ok());
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(parse(json!({ "number_products_from": 1 })).is_err());
    }

    #[test]
    fn test_carry_over_flags() {
        assert_eq!(
            CarryOver::from_flags(&["true".to_string()]),
            Some(CarryOver::Over)
        );
        assert_eq!(
            CarryOver::from_flags(&["false".to_string()]),
            Some(CarryOver::Under)
        );
        assert_eq!(
            CarryOver::from_flags(&["true".to_string(), "false".to_string()]),
            None
        );
        assert_eq!(CarryOver::from_flags(&["yes".to_string()]), None);
        assert_eq!(CarryOver::from_flags(&[]), None);
    }

    #[test]
    fn test_carry_over_boundary_is_over() {
        assert!(CarryOver::Over.matches(10, 10));
        assert!(!CarryOver::Under.matches(10, 10));
        assert!(CarryOver::Under.matches(9, 10));
    }

    #[test]
    fn test_validation_rejects_out_of_range_score() {
        let request = parse(json!({ "eval_score_from": 7.5 })).unwrap();
        let err = request.into_parts(&SearchConfig::default()).unwrap_err();
        match err {
            ValidationError::FieldErrors(fields) => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].field, "eval_score_from");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_limit_capped_and_sort_parsed() {
        let request = parse(json!({
            "limit": 1000,
            "offset": 40,
            "sort": "follower_count:desc"
        }))
        .unwrap();
        let (_, pagination, sort) = request.into_parts(&SearchConfig::default()).unwrap();

        assert_eq!(pagination, Pagination::new(100, 40));
        assert_eq!(
            sort,
            SortSpec::new(SortField::FollowerCount, SortDirection::Desc)
        );
    }

    #[test]
    fn test_unknown_sort_field_rejected() {
        let request = parse(json!({ "sort": "user_id" })).unwrap();
        assert!(matches!(
            request.into_parts(&SearchConfig::default()),
            Err(ValidationError::UnknownSortField { .. })
        ));
    }
}
