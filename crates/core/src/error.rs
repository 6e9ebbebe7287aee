//! Closed error model for the order-fulfillment core.

use thiserror::Error;

use crate::id::ProductId;

/// Result type used across the service and store layers.
pub type StoreResult<T> = Result<T, StoreError>;

/// Every failure the core can surface, tagged by kind.
///
/// The boundary layer maps each variant to a response category
/// deterministically; nothing here carries an HTTP status.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Malformed or missing required input (empty items, bad status value).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced order or product does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Requested quantity exceeds the product's available stock.
    #[error("insufficient stock for product {product_id} (requested {requested})")]
    InsufficientStock {
        product_id: ProductId,
        requested: i64,
    },

    /// Any other failure (storage fault, connection loss).
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl StoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::Unexpected(msg.into())
    }
}
