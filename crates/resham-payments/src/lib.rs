//! # resham-payments: Payment Gateway Adapters
//!
//! The `PaymentGateway` capability and its two implementations:
//!
//! - [`CardNetworkGateway`]: hosted checkout sessions, HMAC-signed webhooks
//! - [`RegionalWalletGateway`]: base64 JSON payloads with salted SHA-256
//!   `X-VERIFY` checksums
//!
//! ## Usage
//! ```rust,ignore
//! use resham_payments::{GatewayRegistry, PaymentsConfig};
//!
//! let registry = GatewayRegistry::from_config(&config.payments)?;
//! let wallet = registry.get(GatewayKind::RegionalWallet)?;
//! let target = wallet.initiate(&order).await?;
//! // send the shopper to target.url
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod card;
pub mod config;
pub mod error;
pub mod gateway;
pub mod signing;
pub mod wallet;

// =============================================================================
// Re-exports
// =============================================================================

pub use card::CardNetworkGateway;
pub use config::{CardNetworkConfig, PaymentsConfig, WalletConfig};
pub use error::{GatewayError, GatewayResult};
pub use gateway::{
    http_client, CallbackPayload, GatewayRegistry, PaymentGateway, RedirectTarget,
    VerifiedCallback,
};
pub use wallet::RegionalWalletGateway;
