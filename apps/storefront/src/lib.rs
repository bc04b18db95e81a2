//! # resham-storefront: Storefront Service
//!
//! Hosts the cart, wishlist and checkout engines behind a JSON API and
//! receives the payment gateways' callbacks.
//!
//! ## Modules
//! - [`state`] - Engines (CartStore, WishlistStore, CheckoutOrchestrator),
//!   client store, configuration
//! - [`commands`] - Plain functions the API exposes
//! - [`server`] - axum router and listener
//! - [`error`] - `ApiError` returned to the front end

pub mod commands;
pub mod error;
pub mod server;
pub mod state;

use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use resham_core::{ClientStore, StoreError};
use resham_db::{Database, DbConfig, DbError};
use resham_payments::{GatewayError, GatewayRegistry};

use state::{AppState, ConfigError, FileStore, MemoryStore, StorageBackend, StorefrontConfig};

/// Anything that stops the service from starting or serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Catalog database: {0}")]
    Database(#[from] DbError),

    #[error("Client store: {0}")]
    Store(#[from] StoreError),

    #[error("Payment gateways: {0}")]
    Gateways(#[from] GatewayError),

    #[error("Server: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs the storefront until ctrl-c.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Service Startup                                   │
/// │                                                                         │
/// │  1. Open catalog database ────────────────────────────────────────────► │
/// │     • SQLite with WAL mode, pending migrations applied                  │
/// │                                                                         │
/// │  2. Open client store ────────────────────────────────────────────────► │
/// │     • file: one JSON file per key in the data directory                 │
/// │     • memory: nothing survives a restart                                │
/// │                                                                         │
/// │  3. Build gateway adapters from [payments] ───────────────────────────► │
/// │                                                                         │
/// │  4. Hydrate engines, bind, serve until ctrl-c ────────────────────────► │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run(config: StorefrontConfig) -> Result<(), StartupError> {
    info!(store = %config.store.name, "Starting Resham storefront");

    let db_path = config.catalog_path();
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let db = Database::new(DbConfig::new(db_path)).await?;

    let client_store = open_client_store(&config)?;
    let gateways = GatewayRegistry::from_config(&config.payments)?;

    let bind_addr = config.server.bind_address();
    let state = AppState::new(config, Arc::new(db.products()), client_store, gateways);

    server::serve(state, &bind_addr, async {
        // Err: no signal handler could be installed, so stop at once
        let _ = tokio::signal::ctrl_c().await;
    })
    .await?;

    db.close().await;
    info!("Storefront stopped");
    Ok(())
}

fn open_client_store(config: &StorefrontConfig) -> Result<Arc<dyn ClientStore>, StartupError> {
    match config.storage.backend {
        StorageBackend::Memory => {
            info!("Using in-memory client store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::File => {
            let dir = config
                .storage
                .data_dir
                .clone()
                .or_else(FileStore::default_dir)
                .ok_or_else(|| {
                    ConfigError::Invalid("storage.data_dir is required on this platform".into())
                })?;
            info!(dir = %dir.display(), "Using file client store");
            Ok(Arc::new(FileStore::new(dir)?))
        }
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=resham=trace` - Show trace for resham crates only
/// - Default: `info,resham=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,resham=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
