//! # Ports
//!
//! Traits the engines depend on, implemented outside this crate.
//!
//! ```text
//! ┌──────────────────────┐        ┌──────────────────────────────────────┐
//! │  CartStore           │──uses─►│ Catalog      (resham-db: SQLite)     │
//! │  WishlistStore       │        └──────────────────────────────────────┘
//! │  CheckoutOrchestrator│        ┌──────────────────────────────────────┐
//! │  (apps/storefront)   │──uses─►│ ClientStore  (memory, JSON files)    │
//! └──────────────────────┘        └──────────────────────────────────────┘
//! ```

use async_trait::async_trait;

use crate::error::{CatalogResult, StoreResult};
use crate::types::{Product, StockLevel};

/// Read access to products.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Lists active products, optionally restricted to one category
    /// (matched on category id or slug).
    async fn get_products(&self, category: Option<&str>) -> CatalogResult<Vec<Product>>;

    /// Fetches one product. Absent ids are `CatalogError::NotFound`.
    async fn get_product(&self, id: &str) -> CatalogResult<Product>;

    /// Current stock for a product.
    async fn check_stock(&self, id: &str) -> CatalogResult<StockLevel>;
}

/// Key-value persistence for client-side state.
///
/// Values are opaque strings; the engines store JSON. Writes are full
/// overwrites and the last one wins.
pub trait ClientStore: Send + Sync {
    fn read(&self, key: &str) -> StoreResult<Option<String>>;
    fn write(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove(&self, key: &str) -> StoreResult<()>;
}
