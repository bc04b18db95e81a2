//! # Error Types
//!
//! Domain-specific error types for resham-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  resham-core errors (this file)                                        │
//! │  ├── CoreError        - Cart/checkout rule violations                  │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  ├── CatalogError     - What a Catalog port may report                 │
//! │  └── StoreError       - What a ClientStore port may report             │
//! │                                                                         │
//! │  resham-db        └── DbError       (converted into CatalogError)      │
//! │  resham-payments  └── GatewayError                                     │
//! │  storefront app   └── ApiError      - What the front end sees          │
//! │                                                                         │
//! │  Flow: CoreError / CatalogError / GatewayError → ApiError → Frontend   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Catalog reports zero (or negative) stock.
    ///
    /// ## User Workflow
    /// ```text
    /// Add to Cart
    ///      │
    ///      ▼
    /// check_stock → { in_stock: false, stock: 0 }
    ///      │
    ///      ▼
    /// StockUnavailable, "out of stock" notice, cart untouched
    /// ```
    #[error("{name} is out of stock")]
    StockUnavailable { product_id: String, name: String },

    /// Incrementing the existing line would exceed what is on hand.
    #[error("Only {stock} of {name} in stock, cannot add {requested}")]
    StockLimitExceeded {
        product_id: String,
        name: String,
        stock: i64,
        requested: i64,
    },

    /// Checkout needs at least one line.
    #[error("Cart is empty")]
    EmptyCart,

    /// A checkout event arrived in a phase that does not accept it.
    #[error("Cannot apply {event} to a checkout in phase {from}")]
    InvalidTransition { from: String, event: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Port Errors
// =============================================================================

/// Errors a catalog implementation may return.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Product not found: {0}")]
    NotFound(String),

    /// Backend could not answer (database down, network, ...).
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

/// Errors a client store implementation may return.
///
/// Callers treat these as log-and-continue; they never reach the shopper.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;
pub type CatalogResult<T> = Result<T, CatalogError>;
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::StockLimitExceeded {
            product_id: "p1".to_string(),
            name: "Paithani".to_string(),
            stock: 3,
            requested: 4,
        };
        assert_eq!(err.to_string(), "Only 3 of Paithani in stock, cannot add 4");

        let err = CoreError::StockUnavailable {
            product_id: "p2".to_string(),
            name: "Patola".to_string(),
        };
        assert_eq!(err.to_string(), "Patola is out of stock");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "email".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
