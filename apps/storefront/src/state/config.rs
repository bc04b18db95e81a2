//! # Storefront Configuration
//!
//! Everything the service needs to start, loaded from `storefront.toml`
//! with environment overrides.
//!
//! ## Configuration File Format
//! ```toml
//! [store]
//! name = "Resham"
//! currency = "INR"
//!
//! [storage]
//! backend = "file"            # or "memory"
//! data_dir = "/var/lib/resham/client"
//!
//! [catalog]
//! database_path = "/var/lib/resham/catalog.db"
//!
//! [server]
//! bind_addr = "127.0.0.1"
//! port = 8080
//!
//! [payments]
//! request_timeout_secs = 30
//! # [payments.card] and [payments.wallet]: see resham-payments
//! ```
//!
//! ## Environment Overrides
//! | Variable | Field |
//! |---|---|
//! | `RESHAM_BIND_ADDR` | `server.bind_addr` |
//! | `RESHAM_PORT` | `server.port` |
//! | `RESHAM_STORAGE_BACKEND` | `storage.backend` |
//! | `RESHAM_DATA_DIR` | `storage.data_dir` |
//! | `RESHAM_CATALOG_DB` | `catalog.database_path` |
//! | `RESHAM_CURRENCY` | `store.currency` |
//! | `RESHAM_REQUEST_TIMEOUT_SECS` | `payments.request_timeout_secs` |

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

use resham_payments::{GatewayError, PaymentsConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Invalid payments config: {0}")]
    Gateway(#[from] GatewayError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub name: String,
    /// ISO 4217 code sent to the gateways.
    pub currency: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            name: "Resham".to_string(),
            currency: resham_core::DEFAULT_CURRENCY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(ConfigError::Invalid(format!(
                "storage.backend must be \"file\" or \"memory\", got {:?}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Defaults to the platform data directory.
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Defaults to `catalog.db` in the platform data directory.
    pub database_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

// =============================================================================
// Storefront Config
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorefrontConfig {
    pub store: StoreSettings,
    pub storage: StorageSettings,
    pub catalog: CatalogSettings,
    pub server: ServerSettings,
    pub payments: PaymentsConfig,
}

impl StorefrontConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (storefront.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading storefront config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let currency = &self.store.currency;
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ConfigError::Invalid(format!(
                "store.currency must be a 3-letter ISO code, got {:?}",
                currency
            )));
        }

        if self.server.bind_addr.trim().is_empty() {
            return Err(ConfigError::Invalid("server.bind_addr must not be empty".into()));
        }

        self.payments.validate()?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `RESHAM_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("RESHAM_BIND_ADDR") {
            self.server.bind_addr = addr;
        }

        if let Some(port) = lookup("RESHAM_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("RESHAM_PORT is not a port: {}", port)))?;
            debug!(port = self.server.port, "Overriding port from environment");
        }

        if let Some(backend) = lookup("RESHAM_STORAGE_BACKEND") {
            self.storage.backend = backend.parse()?;
        }

        if let Some(dir) = lookup("RESHAM_DATA_DIR") {
            self.storage.data_dir = Some(PathBuf::from(dir));
        }

        if let Some(path) = lookup("RESHAM_CATALOG_DB") {
            self.catalog.database_path = Some(PathBuf::from(path));
        }

        if let Some(currency) = lookup("RESHAM_CURRENCY") {
            self.store.currency = currency.to_uppercase();
        }

        if let Some(timeout) = lookup("RESHAM_REQUEST_TIMEOUT_SECS") {
            self.payments.request_timeout_secs = timeout.parse().map_err(|_| {
                ConfigError::Invalid(format!("RESHAM_REQUEST_TIMEOUT_SECS is not a number: {}", timeout))
            })?;
        }

        Ok(())
    }

    /// Platform config file location.
    ///
    /// - **Linux**: `~/.config/resham-storefront/storefront.toml`
    /// - **macOS**: `~/Library/Application Support/com.resham.storefront/storefront.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "resham", "storefront")
            .map(|dirs| dirs.config_dir().join("storefront.toml"))
    }

    /// Catalog database path, falling back to the platform data directory.
    pub fn catalog_path(&self) -> PathBuf {
        self.catalog.database_path.clone().unwrap_or_else(|| {
            directories::ProjectDirs::from("com", "resham", "storefront")
                .map(|dirs| dirs.data_dir().join("catalog.db"))
                .unwrap_or_else(|| PathBuf::from("resham_catalog.db"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = StorefrontConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.store.currency, "INR");
        assert_eq!(config.server.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert!(config.payments.card.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: StorefrontConfig = toml::from_str(
            r#"
            [server]
            port = 9090

            [storage]
            backend = "memory"

            [payments.wallet]
            merchant_id = "RESHAMUAT"
            salt_key = "salt"
            redirect_url = "https://resham.example/checkout/return"
            callback_url = "https://resham.example/api/checkout/callback/wallet"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.bind_addr, "127.0.0.1");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.store.name, "Resham");
        assert!(config.payments.wallet.is_some());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("RESHAM_PORT", "3000"),
            ("RESHAM_STORAGE_BACKEND", "Memory"),
            ("RESHAM_CURRENCY", "usd"),
            ("RESHAM_CATALOG_DB", "/tmp/catalog.db"),
        ]);
        let mut config = StorefrontConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.store.currency, "USD");
        assert_eq!(config.catalog_path(), PathBuf::from("/tmp/catalog.db"));
    }

    #[test]
    fn test_bad_env_values_are_errors() {
        let mut config = StorefrontConfig::default();
        let err = config
            .apply_overrides(|key| (key == "RESHAM_PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = config
            .apply_overrides(|key| (key == "RESHAM_STORAGE_BACKEND").then(|| "redis".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_validation_rejects_bad_currency_and_gateway() {
        let mut config = StorefrontConfig::default();
        config.store.currency = "Rupee".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.store.currency = "INR".into();
        config.payments.request_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Gateway(_))));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorefrontConfig::load(Some(dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.store.name, "Resham");
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storefront.toml");
        std::fs::write(&path, "[store]\nname = \"Resham Kanchipuram\"\n").unwrap();

        let config = StorefrontConfig::load(Some(path)).unwrap();
        assert_eq!(config.store.name, "Resham Kanchipuram");
    }
}
