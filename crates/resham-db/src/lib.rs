//! # resham-db: Catalog Database Layer
//!
//! SQLite storage for the product catalog, and the implementation of the
//! `Catalog` port the storefront engines read stock through.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Storefront Catalog Flow                           │
//! │                                                                         │
//! │  GET /api/products?category=banarasi     CartStore::add_to_cart         │
//! │       │                                        │                        │
//! │       ▼                                        ▼                        │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     resham-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────────┐  ┌─────────────┐  │   │
//! │  │   │   Database    │    │   Repositories    │  │ Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ ProductRepository │  │ (embedded)  │  │   │
//! │  │   │  SqlitePool   │    │   impl Catalog    │  │ 001_init    │  │   │
//! │  │   │               │    │ CategoryRepository│  │             │  │   │
//! │  │   └───────────────┘    └───────────────────┘  └─────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (catalog.db in the platform data dir)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use resham_db::{Database, DbConfig};
//! use resham_core::Catalog;
//!
//! let db = Database::new(DbConfig::new("catalog.db")).await?;
//! let stock = db.products().check_stock("sr-001").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::category::CategoryRepository;
pub use repository::product::{generate_product_id, ProductRepository};
