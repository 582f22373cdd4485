//! Field value types used for dynamic field access and ordering

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// A polymorphic field value that can hold different types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Uuid(Uuid),
    DateTime(DateTime<Utc>),
    Null,
}

impl FieldValue {
    /// Compare two values of the same kind
    ///
    /// Integers and floats compare numerically with each other. `Null`
    /// sorts before everything else. Mismatched kinds return `None`.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Null, FieldValue::Null) => Some(Ordering::Equal),
            (FieldValue::Null, _) => Some(Ordering::Less),
            (_, FieldValue::Null) => Some(Ordering::Greater),
            (FieldValue::String(a), FieldValue::String(b)) => Some(a.cmp(b)),
            (FieldValue::Integer(a), FieldValue::Integer(b)) => Some(a.cmp(b)),
            (FieldValue::Float(a), FieldValue::Float(b)) => a.partial_cmp(b),
            (FieldValue::Integer(a), FieldValue::Float(b)) => (*a as f64).partial_cmp(b),
            (FieldValue::Float(a), FieldValue::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => Some(a.cmp(b)),
            (FieldValue::Uuid(a), FieldValue::Uuid(b)) => Some(a.cmp(b)),
            (FieldValue::DateTime(a), FieldValue::DateTime(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_same_kind() {
        assert_eq!(
            FieldValue::Integer(1).compare(&FieldValue::Integer(2)),
            Some(Ordering::Less)
        );
        assert_eq!(
            FieldValue::String("b".into()).compare(&FieldValue::String("a".into())),
            Some(Ordering::Greater)
        );
        assert_eq!(
            FieldValue::Float(1.5).compare(&FieldValue::Integer(1)),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_compare_null_and_mismatch() {
        assert_eq!(
            FieldValue::Null.compare(&FieldValue::Integer(0)),
            Some(Ordering::Less)
        );
        assert_eq!(
            FieldValue::Boolean(true).compare(&FieldValue::Integer(1)),
            None
        );
    }
}
