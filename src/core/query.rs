//! Pagination, sorting and result page types

use crate::core::entity::Data;
use crate::core::error::ValidationError;
use crate::entities::Store;
use serde::{Deserialize, Serialize};

/// Offset pagination of a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum number of items on the page
    pub limit: usize,

    /// Number of matching items skipped before the page starts
    pub offset: usize,
}

impl Pagination {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }

    /// Apply the window to an already ordered list
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset)
            .take(self.limit)
            .collect()
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Store fields accepted as sort keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Number,
    Name,
    CreatedAt,
    FollowerCount,
    MarginRate,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Number => "number",
            SortField::Name => "name",
            SortField::CreatedAt => "created_at",
            SortField::FollowerCount => "follower_count",
            SortField::MarginRate => "margin_rate",
        }
    }

    fn parse(field: &str) -> Option<Self> {
        if !Store::sortable_fields().contains(&field) {
            return None;
        }
        match field {
            "number" => Some(SortField::Number),
            "name" => Some(SortField::Name),
            "created_at" => Some(SortField::CreatedAt),
            "follower_count" => Some(SortField::FollowerCount),
            "margin_rate" => Some(SortField::MarginRate),
            _ => None,
        }
    }
}

/// Sort specification
///
/// Ties are always broken by store id so that pagination is deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Parse a sort expression
    ///
    /// # Format
    /// - `field:asc` or `field` (ascending)
    /// - `field:desc` (descending)
    ///
    /// # Example
    /// ```
    /// use store_search::core::query::{SortDirection, SortField, SortSpec};
    ///
    /// let sort = SortSpec::parse("follower_count:desc").unwrap();
    /// assert_eq!(sort.field, SortField::FollowerCount);
    /// assert_eq!(sort.direction, SortDirection::Desc);
    /// ```
    pub fn parse(expr: &str) -> Result<Self, ValidationError> {
        let (field, direction) = match expr.trim().split_once(':') {
            Some((field, direction)) => (field, direction),
            None => (expr.trim(), "asc"),
        };

        let field = SortField::parse(field).ok_or_else(|| ValidationError::UnknownSortField {
            field: field.to_string(),
        })?;

        let direction = match direction.to_ascii_lowercase().as_str() {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            other => {
                return Err(ValidationError::FieldError {
                    field: "sort".to_string(),
                    message: format!("unknown sort direction '{}'", other),
                });
            }
        };

        Ok(Self { field, direction })
    }
}

impl Default for SortSpec {
    /// Newest stores first, by display number
    fn default() -> Self {
        Self {
            field: SortField::Number,
            direction: SortDirection::Desc,
        }
    }
}

/// One page of search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage<T> {
    /// The paginated items
    pub items: Vec<T>,

    /// Total number of items matching the filters (before pagination)
    pub count: usize,
}

impl<T> SearchPage<T> {
    pub fn new(items: Vec<T>, count: usize) -> Self {
        Self { items, count }
    }

    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            count: 0,
        }
    }
}
