//! # Gateway Error Types
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Gateway Error Categories                          │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   Initiation    │  │    Callback     │  │     Configuration       │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Request  (↻)   │  │  Callback-      │  │  NotConfigured          │ │
//! │  │  Status   (↻)   │  │  Verification   │  │  Serialization          │ │
//! │  │  ResponseShape  │  │  InvalidCallback│  │                         │ │
//! │  │  Rejected       │  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  (↻) retryable: the shopper can press "Pay" again                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    // =========================================================================
    // Initiation Errors
    // =========================================================================
    /// Network failure or timeout talking to the gateway.
    #[error("Gateway request failed: {0}")]
    Request(String),

    /// Gateway answered with a non-2xx status.
    #[error("Gateway returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// 2xx response without the fields we need (e.g., no redirect URL).
    #[error("Unexpected gateway response: {0}")]
    ResponseShape(String),

    /// Gateway understood the request and said no.
    #[error("Gateway rejected the payment: {0}")]
    Rejected(String),

    // =========================================================================
    // Callback Errors
    // =========================================================================
    /// Signature or checksum did not match. The status must not be trusted.
    #[error("Callback verification failed: {0}")]
    CallbackVerification(String),

    /// Callback is missing fields or cannot be parsed.
    #[error("Invalid callback: {0}")]
    InvalidCallback(String),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Gateway not configured: {0}")]
    NotConfigured(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::ResponseShape(err.to_string())
        } else {
            GatewayError::Request(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for GatewayError {
    fn from(err: url::ParseError) -> Self {
        GatewayError::NotConfigured(format!("invalid URL: {}", err))
    }
}

impl GatewayError {
    /// Returns true if the shopper can simply try the payment again.
    ///
    /// Verification failures are never retryable: the same payload will fail
    /// the same way.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayError::Request(_) | GatewayError::Status { .. } | GatewayError::ResponseShape(_)
        )
    }

    /// Returns true for errors raised while checking a callback.
    pub fn is_callback_error(&self) -> bool {
        matches!(
            self,
            GatewayError::CallbackVerification(_) | GatewayError::InvalidCallback(_)
        )
    }
}
