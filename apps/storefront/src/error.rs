//! # API Error Type
//!
//! Unified error type for storefront commands and HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Storefront                         │
//! │                                                                         │
//! │  Front end                    Rust backend                              │
//! │  ─────────                    ────────────                              │
//! │                                                                         │
//! │  POST /api/cart/items                                                   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │  Catalog error?  ─── CatalogError::NotFound ─────┐               │  │
//! │  │  Cart rule?      ─── CoreError::StockLimit... ───┤               │  │
//! │  │  Gateway error?  ─── GatewayError::Request ──────┼── ApiError ──►│  │
//! │  │         │                                        │               │  │
//! │  │  Success ───────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  HTTP 409 { "code": "STOCK_LIMIT_EXCEEDED",                             │
//! │             "message": "Only 3 of Red Katan Saree in stock, ...",       │
//! │             "retryable": false }                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use resham_core::{CatalogError, CoreError, ValidationError};
use resham_db::DbError;
use resham_payments::GatewayError;

/// API error returned from commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Product not found: sr-001",
///   "retryable": false
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Whether pressing the button again may succeed
    pub retryable: bool,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Product or transaction not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Product has no stock (409)
    StockUnavailable,

    /// Requested quantity exceeds stock (409)
    StockLimitExceeded,

    /// Checkout attempted with an empty cart (422)
    EmptyCart,

    /// A checkout for this session is already talking to a gateway (409)
    CheckoutInProgress,

    /// Checkout event not valid for the transaction's phase (409)
    InvalidTransition,

    /// Network failure or error status from a gateway (502)
    GatewayRequest,

    /// Gateway answered with something we cannot use (502)
    GatewayResponse,

    /// Gateway declined the payment request (402)
    PaymentRejected,

    /// Callback signature or checksum mismatch (401)
    CallbackVerification,

    /// Callback could not be parsed (400)
    InvalidCallback,

    /// Chosen gateway has no configuration (503)
    GatewayNotConfigured,

    /// Catalog backend could not answer (503)
    CatalogUnavailable,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    /// Returns true if the same request may succeed when simply repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::GatewayRequest | ErrorCode::GatewayResponse | ErrorCode::CatalogUnavailable
        )
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError | ErrorCode::InvalidCallback => StatusCode::BAD_REQUEST,
            ErrorCode::StockUnavailable
            | ErrorCode::StockLimitExceeded
            | ErrorCode::CheckoutInProgress
            | ErrorCode::InvalidTransition => StatusCode::CONFLICT,
            ErrorCode::EmptyCart => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::GatewayRequest | ErrorCode::GatewayResponse => StatusCode::BAD_GATEWAY,
            ErrorCode::PaymentRejected => StatusCode::PAYMENT_REQUIRED,
            ErrorCode::CallbackVerification => StatusCode::UNAUTHORIZED,
            ErrorCode::GatewayNotConfigured | ErrorCode::CatalogUnavailable => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            retryable: code.is_retryable(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn checkout_in_progress() -> Self {
        ApiError::new(
            ErrorCode::CheckoutInProgress,
            "A payment is already being started, please wait",
        )
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::StockUnavailable { .. } => {
                ApiError::new(ErrorCode::StockUnavailable, message)
            }
            CoreError::StockLimitExceeded { .. } => {
                ApiError::new(ErrorCode::StockLimitExceeded, message)
            }
            CoreError::EmptyCart => ApiError::new(ErrorCode::EmptyCart, message),
            CoreError::InvalidTransition { .. } => {
                ApiError::new(ErrorCode::InvalidTransition, message)
            }
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(id) => ApiError::not_found("Product", &id),
            CatalogError::Unavailable(reason) => {
                error!(reason = %reason, "Catalog unavailable");
                ApiError::new(
                    ErrorCode::CatalogUnavailable,
                    "The catalog is temporarily unavailable",
                )
            }
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        ApiError::from(CatalogError::from(err))
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        let message = err.to_string();
        match err {
            GatewayError::Request(_) | GatewayError::Status { .. } => ApiError::new(
                ErrorCode::GatewayRequest,
                "Could not reach the payment gateway, please try again",
            ),
            GatewayError::ResponseShape(_) => ApiError::new(
                ErrorCode::GatewayResponse,
                "The payment gateway sent an unexpected response, please try again",
            ),
            GatewayError::Rejected(reason) => ApiError::new(ErrorCode::PaymentRejected, reason),
            GatewayError::CallbackVerification(_) => {
                ApiError::new(ErrorCode::CallbackVerification, message)
            }
            GatewayError::InvalidCallback(_) => ApiError::new(ErrorCode::InvalidCallback, message),
            GatewayError::NotConfigured(what) => ApiError::new(
                ErrorCode::GatewayNotConfigured,
                format!("Payment method unavailable: {}", what),
            ),
            GatewayError::Serialization(e) => {
                error!(error = %e, "Gateway payload serialization failed");
                ApiError::internal("Could not prepare the payment request")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.http_status(), Json(self)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_errors_map_to_conflict() {
        let err = ApiError::from(CoreError::StockLimitExceeded {
            product_id: "p1".into(),
            name: "Red Katan".into(),
            stock: 3,
            requested: 4,
        });
        assert_eq!(err.code, ErrorCode::StockLimitExceeded);
        assert_eq!(err.code.http_status(), StatusCode::CONFLICT);
        assert!(!err.retryable);
    }

    #[test]
    fn test_gateway_request_is_retryable() {
        let err = ApiError::from(GatewayError::Request("connection reset".into()));
        assert_eq!(err.code, ErrorCode::GatewayRequest);
        assert!(err.retryable);

        let err = ApiError::from(GatewayError::CallbackVerification("bad".into()));
        assert_eq!(err.code.http_status(), StatusCode::UNAUTHORIZED);
        assert!(!err.retryable);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ApiError::not_found("Product", "sr-001")).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Product not found: sr-001");
        assert_eq!(json["retryable"], false);
    }

    #[test]
    fn test_db_errors_go_through_catalog() {
        let err = ApiError::from(DbError::not_found("Product", "x"));
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = ApiError::from(DbError::PoolExhausted);
        assert_eq!(err.code, ErrorCode::CatalogUnavailable);
        assert!(err.retryable);
    }
}
