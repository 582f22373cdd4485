//! Typed error handling for the store search engine
//!
//! Repository implementations report failures as `anyhow::Error`; the
//! orchestrator converts them into this hierarchy so that callers (and
//! the HTTP layer) can react to specific failure kinds.
//!
//! # Error Categories
//!
//! - [`ValidationError`]: Caller input rejected before any query runs
//! - [`ResolverError`]: A derived-criterion resolver failed or timed out
//! - [`StorageError`]: The final store query failed
//! - [`ConfigError`]: Configuration parsing and validation, raised at startup
//!
//! Empty result sets are never errors.
//!
//! # Example
//!
//! ```rust,ignore
//! match search.search(&criteria, pagination, sort).await {
//!     Ok(page) => println!("{} stores", page.count),
//!     Err(SearchError::Resolver(ResolverError::Timeout { resolver })) => {
//!         eprintln!("{} did not answer in time", resolver);
//!     }
//!     Err(e) => eprintln!("search failed: {}", e),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// The main error type for store searches
#[derive(Debug)]
pub enum SearchError {
    /// Caller input errors
    Validation(ValidationError),

    /// Derived-criterion resolver errors
    Resolver(ResolverError),

    /// Final store query errors
    Storage(StorageError),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::Validation(e) => write!(f, "{}", e),
            SearchError::Resolver(e) => write!(f, "{}", e),
            SearchError::Storage(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SearchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SearchError::Validation(e) => Some(e),
            SearchError::Resolver(e) => Some(e),
            SearchError::Storage(e) => Some(e),
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl SearchError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            SearchError::Validation(_) => StatusCode::BAD_REQUEST,
            SearchError::Resolver(e) => e.status_code(),
            SearchError::Storage(e) => e.status_code(),
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            SearchError::Validation(e) => e.error_code(),
            SearchError::Resolver(e) => e.error_code(),
            SearchError::Storage(e) => e.error_code(),
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    /// Get additional details for the error
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            SearchError::Validation(ValidationError::FieldErrors(errors)) => {
                Some(serde_json::json!({ "fields": errors }))
            }
            SearchError::Validation(ValidationError::FieldError { field, .. }) => {
                Some(serde_json::json!({ "field": field }))
            }
            SearchError::Resolver(ResolverError::Failed { resolver, .. })
            | SearchError::Resolver(ResolverError::Timeout { resolver }) => {
                Some(serde_json::json!({ "resolver": resolver }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to caller input
#[derive(Debug)]
pub enum ValidationError {
    /// Validation failed for a specific field
    FieldError { field: String, message: String },

    /// Multiple field validation errors
    FieldErrors(Vec<FieldValidationError>),

    /// Request body is not valid JSON or does not match the request shape
    InvalidJson { message: String },

    /// Sort specification names a field that cannot be sorted on
    UnknownSortField { field: String },
}

/// A single field validation error
#[derive(Debug, Clone, Serialize)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::FieldError { field, message } => {
                write!(f, "Validation error for field '{}': {}", field, message)
            }
            ValidationError::FieldErrors(errors) => {
                let msgs: Vec<String> = errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect();
                write!(f, "Validation errors: {}", msgs.join(", "))
            }
            ValidationError::InvalidJson { message } => {
                write!(f, "Invalid JSON: {}", message)
            }
            ValidationError::UnknownSortField { field } => {
                write!(f, "Cannot sort on unknown field '{}'", field)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::FieldError { .. } | ValidationError::FieldErrors(_) => {
                "VALIDATION_ERROR"
            }
            ValidationError::InvalidJson { .. } => "INVALID_JSON",
            ValidationError::UnknownSortField { .. } => "UNKNOWN_SORT_FIELD",
        }
    }
}

impl From<ValidationError> for SearchError {
    fn from(err: ValidationError) -> Self {
        SearchError::Validation(err)
    }
}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldValidationError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldValidationError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        ValidationError::FieldErrors(fields)
    }
}

// =============================================================================
// Resolver Errors
// =============================================================================

/// Errors raised while computing a derived criterion
///
/// Any resolver error aborts the whole search: partial derived results are
/// never combined.
#[derive(Debug)]
pub enum ResolverError {
    /// The underlying read failed
    Failed { resolver: String, message: String },

    /// The resolver did not finish before the request deadline
    Timeout { resolver: String },
}

impl fmt::Display for ResolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolverError::Failed { resolver, message } => {
                write!(f, "Resolver '{}' failed: {}", resolver, message)
            }
            ResolverError::Timeout { resolver } => {
                write!(f, "Resolver '{}' timed out", resolver)
            }
        }
    }
}

impl std::error::Error for ResolverError {}

impl ResolverError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ResolverError::Failed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ResolverError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ResolverError::Failed { .. } => "RESOLVER_FAILED",
            ResolverError::Timeout { .. } => "RESOLVER_TIMEOUT",
        }
    }
}

impl From<ResolverError> for SearchError {
    fn from(err: ResolverError) -> Self {
        SearchError::Resolver(err)
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors related to storage backends
#[derive(Debug)]
pub enum StorageError {
    /// Connection error
    ConnectionError { backend: String, message: String },

    /// Query execution error
    QueryError { backend: String, message: String },

    /// Query did not finish before the request deadline
    Timeout { operation: String },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ConnectionError { backend, message } => {
                write!(f, "Failed to connect to {}: {}", backend, message)
            }
            StorageError::QueryError { backend, message } => {
                write!(f, "{} query error: {}", backend, message)
            }
            StorageError::Timeout { operation } => {
                write!(f, "Storage operation '{}' timed out", operation)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl StorageError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            StorageError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            StorageError::ConnectionError { .. } => "STORAGE_CONNECTION_ERROR",
            StorageError::QueryError { .. } => "STORAGE_ERROR",
            StorageError::Timeout { .. } => "STORAGE_TIMEOUT",
        }
    }
}

impl From<StorageError> for SearchError {
    fn from(err: StorageError) -> Self {
        SearchError::Storage(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Invalid value in configuration
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// Configuration file not found
    FileNotFound { path: String },

    /// IO error while reading configuration
    IoError { message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError { file, message } => {
                if let Some(file) = file {
                    write!(f, "Failed to parse config file '{}': {}", file, message)
                } else {
                    write!(f, "Failed to parse config: {}", message)
                }
            }
            ConfigError::InvalidValue {
                field,
                value,
                message,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for field '{}': {}",
                    value, field, message
                )
            }
            ConfigError::FileNotFound { path } => {
                write!(f, "Configuration file not found: {}", path)
            }
            ConfigError::IoError { message } => {
                write!(f, "IO error: {}", message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_multiple_fields() {
        let err = ValidationError::FieldErrors(vec![
            FieldValidationError {
                field: "name".to_string(),
                message: "too long".to_string(),
            },
            FieldValidationError {
                field: "eval_score_from".to_string(),
                message: "out of range".to_string(),
            },
        ]);
        let display = err.to_string();
        assert!(display.contains("name"));
        assert!(display.contains("eval_score_from"));
    }

    #[test]
    fn test_search_error_conversion() {
        let err: SearchError = ResolverError::Timeout {
            resolver: "average_rating".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(err.error_code(), "RESOLVER_TIMEOUT");
    }

    #[test]
    fn test_error_response_serialization() {
        let err = SearchError::Resolver(ResolverError::Failed {
            resolver: "product_count".to_string(),
            message: "connection reset".to_string(),
        });
        let response = err.to_response();
        assert_eq!(response.code, "RESOLVER_FAILED");
        assert_eq!(
            response.details,
            Some(serde_json::json!({ "resolver": "product_count" }))
        );
    }

    #[test]
    fn test_validation_status_codes() {
        let err = SearchError::Validation(ValidationError::UnknownSortField {
            field: "password".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "UNKNOWN_SORT_FIELD");
    }

    #[test]
    fn test_storage_error() {
        let err = StorageError::ConnectionError {
            backend: "PostgreSQL".to_string(),
            message: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("PostgreSQL"));
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_config_error() {
        let err = ConfigError::FileNotFound {
            path: "/etc/store-search.yaml".to_string(),
        };
        assert!(err.to_string().contains("/etc/store-search.yaml"));
    }

    #[test]
    fn test_from_validator_errors_sorted_by_field() {
        let mut errors = validator::ValidationErrors::new();
        errors.add("name", validator::ValidationError::new("length"));
        errors.add("eval_score_to", validator::ValidationError::new("range"));

        let err: SearchError = ValidationError::from(errors).into();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        match err {
            SearchError::Validation(ValidationError::FieldErrors(fields)) => {
                let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["eval_score_to", "name"]);
                assert_eq!(fields[1].message, "length");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
