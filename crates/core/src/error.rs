//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// These are local precondition failures: they are detected before any
/// network call is issued and never reach the transport layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. empty required field).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A stock delta would leave the product with a negative quantity.
    #[error("stock of {product_id} cannot go negative (current {current}, delta {delta})")]
    NegativeStock {
        product_id: String,
        current: u64,
        delta: i64,
    },

    /// An identifier was invalid (e.g. empty after trimming).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A second product with the same id would break collection uniqueness.
    #[error("duplicate product id: {0}")]
    DuplicateId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn duplicate_id(id: impl Into<String>) -> Self {
        Self::DuplicateId(id.into())
    }

    /// Whether this error is a negative-stock rejection.
    pub fn is_negative_stock(&self) -> bool {
        matches!(self, Self::NegativeStock { .. })
    }
}
