//! Error handling for the RBAC engine
//!
//! Business-rule violations (duplicate codes, referential-integrity blocks,
//! unknown ids) surface as specific variants; infrastructure failures are
//! wrapped in [`RbacError::Store`] without leaking backend diagnostics.

use thiserror::Error;

/// Result type alias for the RBAC engine
pub type Result<T> = std::result::Result<T, RbacError>;

/// Main error type for the RBAC engine
#[derive(Error, Debug)]
pub enum RbacError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed or missing required fields
    #[error("Validation error: {0}")]
    Validation(String),

    /// Duplicate code on create, or delete blocked by a live reference
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Operation targets an id that does not resolve
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed request, e.g. a parent reference that does not resolve
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Document store unreachable or failed; not a business rule violation
    #[error("Storage error: {0}")]
    Store(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RbacError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a conflict error
    pub fn conflict<S: Into<String>>(message: S) -> Self {
        Self::Conflict(message.into())
    }

    /// Create a not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a bad-request error
    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create a storage error
    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store(message.into())
    }

    /// Whether this error is a business rule violation rather than an
    /// infrastructure failure
    pub fn is_business_rule(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Conflict(_) | Self::NotFound(_) | Self::BadRequest(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RbacError::conflict("role code admin already exists");
        assert_eq!(err.to_string(), "Conflict: role code admin already exists");
    }

    #[test]
    fn test_business_rule_classification() {
        assert!(RbacError::not_found("x").is_business_rule());
        assert!(RbacError::conflict("x").is_business_rule());
        assert!(!RbacError::store("connection refused").is_business_rule());
    }
}
