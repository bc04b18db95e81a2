//! # Repository Module
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Storefront (via Arc<dyn Catalog>)     Seed tool / admin scripts        │
//! │       │                                     │                           │
//! │       │  catalog.check_stock("sr-001")      │  db.products().insert(p)  │
//! │       ▼                                     ▼                           │
//! │  ProductRepository ─────────────────────────────────────                │
//! │  ├── list_active(category)      ├── insert / update                     │
//! │  ├── get_by_id / get_by_slug    ├── update_stock(delta)                 │
//! │  └── stock_level                └── soft_delete                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (products, categories)                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Products, stock, `Catalog` port
//! - [`CategoryRepository`](category::CategoryRepository) - Category listing

pub mod category;
pub mod product;
