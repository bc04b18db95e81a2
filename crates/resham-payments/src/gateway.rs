//! # Payment Gateway Capability
//!
//! One trait, two adapters. The checkout orchestrator only ever sees
//! `dyn PaymentGateway`.
//!
//! ## Round Trip
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Gateway Round Trip                                  │
//! │                                                                         │
//! │  initiate(order) ───────► gateway API ──► RedirectTarget { url }        │
//! │                                                 │                       │
//! │                               shopper pays on hosted page               │
//! │                                                 │                       │
//! │  verify_callback(payload) ◄── callback/webhook ─┘                       │
//! │       │                                                                 │
//! │       ├── signature ok  → VerifiedCallback { txn, status }              │
//! │       └── signature bad → GatewayError::CallbackVerification            │
//! │                                                                         │
//! │  fetch_status(txn) ─────► status API ──► VerifiedCallback               │
//! │  (used when the shopper comes back before the callback arrives)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use resham_core::{GatewayKind, GatewayStatus, Money, PaymentOrder};

use crate::card::CardNetworkGateway;
use crate::config::PaymentsConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::wallet::RegionalWalletGateway;

// =============================================================================
// Exchange Types
// =============================================================================

/// Where to send the shopper after a successful initiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    pub url: String,
    /// Gateway-side id to keep for status polling (card session id).
    pub gateway_reference: Option<String>,
}

/// A raw callback as received over HTTP, before any verification.
#[derive(Debug, Clone)]
pub enum CallbackPayload {
    /// Wallet redirect/callback form fields.
    Wallet(HashMap<String, String>),
    /// Card webhook: the exact body bytes and the signature header.
    Card { body: String, signature: String },
}

impl CallbackPayload {
    pub fn gateway(&self) -> GatewayKind {
        match self {
            CallbackPayload::Wallet(_) => GatewayKind::RegionalWallet,
            CallbackPayload::Card { .. } => GatewayKind::CardNetwork,
        }
    }
}

/// A callback (or status poll result) whose authenticity has been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedCallback {
    pub merchant_transaction_id: String,
    pub status: GatewayStatus,
    pub gateway_reference: Option<String>,
    /// Amount the gateway says was charged, when it reports one.
    pub amount: Option<Money>,
}

// =============================================================================
// Capability
// =============================================================================

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn kind(&self) -> GatewayKind;

    /// Opens a payment with the gateway and returns the hosted page URL.
    async fn initiate(&self, order: &PaymentOrder) -> GatewayResult<RedirectTarget>;

    /// Checks a callback's signature and extracts the outcome.
    fn verify_callback(&self, payload: &CallbackPayload) -> GatewayResult<VerifiedCallback>;

    /// Asks the gateway for the current status of a transaction.
    async fn fetch_status(
        &self,
        merchant_transaction_id: &str,
        gateway_reference: Option<&str>,
    ) -> GatewayResult<VerifiedCallback>;
}

// =============================================================================
// Registry
// =============================================================================

/// The gateways available to this storefront, keyed by kind.
#[derive(Clone, Default)]
pub struct GatewayRegistry {
    gateways: HashMap<GatewayKind, Arc<dyn PaymentGateway>>,
}

impl GatewayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds adapters for every gateway that has a config section.
    pub fn from_config(config: &PaymentsConfig) -> GatewayResult<Self> {
        config.validate()?;

        let client = http_client(Duration::from_secs(config.request_timeout_secs))?;
        let mut registry = GatewayRegistry::new();

        if let Some(card) = &config.card {
            registry.register(Arc::new(CardNetworkGateway::new(card.clone(), client.clone())));
        }
        if let Some(wallet) = &config.wallet {
            registry.register(Arc::new(RegionalWalletGateway::new(wallet.clone(), client)));
        }

        info!(gateways = ?registry.kinds(), "Payment gateways configured");
        Ok(registry)
    }

    pub fn register(&mut self, gateway: Arc<dyn PaymentGateway>) {
        self.gateways.insert(gateway.kind(), gateway);
    }

    pub fn get(&self, kind: GatewayKind) -> GatewayResult<Arc<dyn PaymentGateway>> {
        self.gateways
            .get(&kind)
            .cloned()
            .ok_or_else(|| GatewayError::NotConfigured(kind.to_string()))
    }

    pub fn kinds(&self) -> Vec<GatewayKind> {
        let mut kinds: Vec<GatewayKind> = self.gateways.keys().copied().collect();
        kinds.sort_by_key(|k| k.to_string());
        kinds
    }
}

/// HTTP client shared by both adapters.
pub fn http_client(timeout: Duration) -> GatewayResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("resham-storefront/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| GatewayError::NotConfigured(format!("HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WalletConfig;

    #[test]
    fn test_registry_reports_missing_gateway() {
        let config = PaymentsConfig {
            wallet: Some(WalletConfig::new(
                "M1",
                "salt",
                "https://resham.example/return",
                "https://resham.example/cb",
            )),
            ..PaymentsConfig::default()
        };

        let registry = GatewayRegistry::from_config(&config).unwrap();
        assert_eq!(registry.kinds(), vec![GatewayKind::RegionalWallet]);
        assert!(registry.get(GatewayKind::RegionalWallet).is_ok());
        assert!(matches!(
            registry.get(GatewayKind::CardNetwork),
            Err(GatewayError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_callback_payload_gateway() {
        let payload = CallbackPayload::Card {
            body: "{}".into(),
            signature: "t=1,v1=00".into(),
        };
        assert_eq!(payload.gateway(), GatewayKind::CardNetwork);
        assert_eq!(
            CallbackPayload::Wallet(HashMap::new()).gateway(),
            GatewayKind::RegionalWallet
        );
    }
}
