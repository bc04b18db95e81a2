//! # Gateway Configuration
//!
//! The `[payments]` section of `storefront.toml`.
//!
//! ## Configuration File Format
//! ```toml
//! [payments]
//! request_timeout_secs = 30
//!
//! [payments.card]
//! secret_key = "sk_test_..."
//! webhook_secret = "whsec_..."
//! success_url = "https://resham.example/checkout/success"
//! cancel_url = "https://resham.example/cart"
//!
//! [payments.wallet]
//! merchant_id = "RESHAMUAT"
//! salt_key = "099eb0cd-02cf-4e2a-8aca-3e6c6aff0399"
//! salt_index = 1
//! redirect_url = "https://resham.example/checkout/return"
//! callback_url = "https://resham.example/api/checkout/callback/wallet"
//! ```
//!
//! Either gateway sub-table may be omitted; that gateway is then reported as
//! not configured when a shopper picks it.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::error::{GatewayError, GatewayResult};

// =============================================================================
// Payments Section
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsConfig {
    /// HTTP client timeout for every gateway call (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub card: Option<CardNetworkConfig>,

    #[serde(default)]
    pub wallet: Option<WalletConfig>,
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        PaymentsConfig {
            request_timeout_secs: default_request_timeout(),
            card: None,
            wallet: None,
        }
    }
}

impl PaymentsConfig {
    pub fn validate(&self) -> GatewayResult<()> {
        if self.request_timeout_secs == 0 {
            return Err(GatewayError::NotConfigured(
                "payments.request_timeout_secs must be greater than 0".into(),
            ));
        }
        if let Some(card) = &self.card {
            card.validate()?;
        }
        if let Some(wallet) = &self.wallet {
            wallet.validate()?;
        }
        Ok(())
    }
}

// =============================================================================
// Card Network
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
pub struct CardNetworkConfig {
    /// API secret key, sent as the basic-auth user name.
    pub secret_key: String,

    /// Secret used to sign webhook bodies.
    pub webhook_secret: String,

    #[serde(default = "default_card_api_base")]
    pub api_base: String,

    /// Fallback hosted-page base when the session response has no `url`.
    #[serde(default = "default_hosted_checkout_base")]
    pub hosted_checkout_base: String,

    pub success_url: String,
    pub cancel_url: String,

    /// ISO country codes accepted for shipping.
    #[serde(default = "default_allowed_countries")]
    pub allowed_countries: Vec<String>,

    /// Maximum webhook timestamp skew (seconds).
    #[serde(default = "default_webhook_tolerance")]
    pub webhook_tolerance_secs: i64,
}

fn default_card_api_base() -> String {
    "https://api.stripe.com".to_string()
}

fn default_hosted_checkout_base() -> String {
    "https://checkout.stripe.com/c/pay".to_string()
}

fn default_allowed_countries() -> Vec<String> {
    vec!["IN".to_string()]
}

fn default_webhook_tolerance() -> i64 {
    300
}

impl CardNetworkConfig {
    /// Minimal config for the given keys and return URLs.
    pub fn new(
        secret_key: impl Into<String>,
        webhook_secret: impl Into<String>,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
    ) -> Self {
        CardNetworkConfig {
            secret_key: secret_key.into(),
            webhook_secret: webhook_secret.into(),
            api_base: default_card_api_base(),
            hosted_checkout_base: default_hosted_checkout_base(),
            success_url: success_url.into(),
            cancel_url: cancel_url.into(),
            allowed_countries: default_allowed_countries(),
            webhook_tolerance_secs: default_webhook_tolerance(),
        }
    }

    pub fn validate(&self) -> GatewayResult<()> {
        require("payments.card.secret_key", &self.secret_key)?;
        require("payments.card.webhook_secret", &self.webhook_secret)?;
        require_url("payments.card.api_base", &self.api_base)?;
        require_url("payments.card.success_url", &self.success_url)?;
        require_url("payments.card.cancel_url", &self.cancel_url)?;

        if self.webhook_tolerance_secs <= 0 {
            return Err(GatewayError::NotConfigured(
                "payments.card.webhook_tolerance_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for CardNetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardNetworkConfig")
            .field("secret_key", &"<redacted>")
            .field("webhook_secret", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("success_url", &self.success_url)
            .field("cancel_url", &self.cancel_url)
            .field("allowed_countries", &self.allowed_countries)
            .finish()
    }
}

// =============================================================================
// Regional Wallet
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    pub merchant_id: String,

    /// Salt appended to every checksum input.
    pub salt_key: String,

    /// Which salt the gateway should verify against (sent after `###`).
    #[serde(default = "default_salt_index")]
    pub salt_index: u32,

    #[serde(default = "default_wallet_api_base")]
    pub api_base: String,

    #[serde(default = "default_pay_path")]
    pub pay_path: String,

    #[serde(default = "default_status_path")]
    pub status_path: String,

    /// Where the shopper's browser lands after paying.
    pub redirect_url: String,

    /// Server-to-server callback target.
    pub callback_url: String,

    /// `POST` or `REDIRECT`.
    #[serde(default = "default_redirect_mode")]
    pub redirect_mode: String,
}

fn default_salt_index() -> u32 {
    1
}

fn default_wallet_api_base() -> String {
    "https://api-preprod.phonepe.com/apis/pg-sandbox".to_string()
}

fn default_pay_path() -> String {
    "/pg/v1/pay".to_string()
}

fn default_status_path() -> String {
    "/pg/v1/status".to_string()
}

fn default_redirect_mode() -> String {
    "POST".to_string()
}

impl WalletConfig {
    pub fn new(
        merchant_id: impl Into<String>,
        salt_key: impl Into<String>,
        redirect_url: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> Self {
        WalletConfig {
            merchant_id: merchant_id.into(),
            salt_key: salt_key.into(),
            salt_index: default_salt_index(),
            api_base: default_wallet_api_base(),
            pay_path: default_pay_path(),
            status_path: default_status_path(),
            redirect_url: redirect_url.into(),
            callback_url: callback_url.into(),
            redirect_mode: default_redirect_mode(),
        }
    }

    pub fn validate(&self) -> GatewayResult<()> {
        require("payments.wallet.merchant_id", &self.merchant_id)?;
        require("payments.wallet.salt_key", &self.salt_key)?;
        require_url("payments.wallet.api_base", &self.api_base)?;
        require_url("payments.wallet.redirect_url", &self.redirect_url)?;
        require_url("payments.wallet.callback_url", &self.callback_url)?;

        for (field, path) in [
            ("payments.wallet.pay_path", &self.pay_path),
            ("payments.wallet.status_path", &self.status_path),
        ] {
            if !path.starts_with('/') {
                return Err(GatewayError::NotConfigured(format!(
                    "{} must start with '/', got: {}",
                    field, path
                )));
            }
        }

        match self.redirect_mode.as_str() {
            "POST" | "REDIRECT" => Ok(()),
            other => Err(GatewayError::NotConfigured(format!(
                "payments.wallet.redirect_mode must be POST or REDIRECT, got: {}",
                other
            ))),
        }
    }
}

impl fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletConfig")
            .field("merchant_id", &self.merchant_id)
            .field("salt_key", &"<redacted>")
            .field("salt_index", &self.salt_index)
            .field("api_base", &self.api_base)
            .field("redirect_url", &self.redirect_url)
            .field("callback_url", &self.callback_url)
            .finish()
    }
}

fn require(field: &str, value: &str) -> GatewayResult<()> {
    if value.trim().is_empty() {
        return Err(GatewayError::NotConfigured(format!("{} is empty", field)));
    }
    Ok(())
}

fn require_url(field: &str, value: &str) -> GatewayResult<()> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| GatewayError::NotConfigured(format!("{}: {} ({})", field, e, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_optional_fields() {
        let toml_str = r#"
            request_timeout_secs = 10

            [wallet]
            merchant_id = "RESHAMUAT"
            salt_key = "salt"
            redirect_url = "https://resham.example/return"
            callback_url = "https://resham.example/api/checkout/callback/wallet"
        "#;

        let config: PaymentsConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.request_timeout_secs, 10);
        assert!(config.card.is_none());

        let wallet = config.wallet.as_ref().unwrap();
        assert_eq!(wallet.salt_index, 1);
        assert_eq!(wallet.pay_path, "/pg/v1/pay");
        assert_eq!(wallet.status_path, "/pg/v1/status");
        assert_eq!(wallet.redirect_mode, "POST");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_card_validation() {
        let mut card = CardNetworkConfig::new(
            "sk_test",
            "whsec",
            "https://resham.example/ok",
            "https://resham.example/cart",
        );
        assert!(card.validate().is_ok());
        assert_eq!(card.webhook_tolerance_secs, 300);

        card.secret_key = "  ".into();
        assert!(matches!(card.validate(), Err(GatewayError::NotConfigured(_))));

        card.secret_key = "sk_test".into();
        card.success_url = "not a url".into();
        assert!(card.validate().is_err());
    }

    #[test]
    fn test_wallet_validation() {
        let mut wallet = WalletConfig::new(
            "M1",
            "salt",
            "https://resham.example/return",
            "https://resham.example/cb",
        );
        assert!(wallet.validate().is_ok());

        wallet.redirect_mode = "GET".into();
        assert!(wallet.validate().is_err());

        wallet.redirect_mode = "REDIRECT".into();
        wallet.pay_path = "pg/v1/pay".into();
        assert!(wallet.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let wallet = WalletConfig::new("M1", "super-secret-salt", "https://a.b/r", "https://a.b/c");
        let printed = format!("{:?}", wallet);
        assert!(!printed.contains("super-secret-salt"));
        assert!(printed.contains("<redacted>"));
    }
}
