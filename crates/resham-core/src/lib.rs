//! # resham-core: Pure Business Logic for the Resham Storefront
//!
//! Everything that decides *what happens* to a shopper's cart, wishlist and
//! checkout lives here, as pure functions over plain data. Reading the
//! catalog, touching storage and talking to payment gateways happen in the
//! crates above, through the ports declared in [`ports`].
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Resham Storefront Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                Presentation (web front end)                     │   │
//! │  │    Catalog UI ──► Cart UI ──► Checkout UI ──► Confirmation      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          apps/storefront (engines, orchestrator, API)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ resham-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌──────────┐ ┌───────┐  │   │
//! │  │   │  money  │ │  cart   │ │ wishlist │ │ checkout │ │ ports │  │   │
//! │  │   │  Money  │ │  Cart   │ │ Wishlist │ │  Phase   │ │Catalog│  │   │
//! │  │   │         │ │CartItem │ │   Item   │ │  Order   │ │ Store │  │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └──────────┘ └───────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼──────┐  ┌─────────────────────────┐   │
//! │  │   resham-db (SQLite catalog)       │  │ resham-payments         │   │
//! │  └────────────────────────────────────┘  └─────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Catalog types (Product, Category, StockLevel)
//! - [`money`] - Money type with integer arithmetic (paise, never floats)
//! - [`cart`] - Stock-gated cart with merge-by-id
//! - [`wishlist`] - Saved-for-later list
//! - [`checkout`] - Checkout transaction state machine and payment orders
//! - [`notice`] - User-facing notices emitted after state changes
//! - [`ports`] - Catalog and client-store traits implemented elsewhere
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use resham_core::money::Money;
//!
//! let saree = Money::from_minor(1_249_900); // ₹12,499.00
//! let two = saree * 2;
//! assert_eq!(two.minor_units(), 2_499_800);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod error;
pub mod money;
pub mod notice;
pub mod ports;
pub mod types;
pub mod validation;
pub mod wishlist;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartItem, CartTotals, MAX_LINE_QUANTITY};
pub use checkout::{
    generate_merchant_transaction_id, CheckoutEvent, CheckoutPhase, CheckoutTransaction,
    CustomerContact, GatewayKind, GatewayStatus, OrderLine, PaymentOrder,
};
pub use error::{CatalogError, CoreError, CoreResult, StoreError, ValidationError};
pub use money::Money;
pub use notice::{Notice, NoticeLevel};
pub use ports::{Catalog, ClientStore};
pub use types::*;
pub use wishlist::{Wishlist, WishlistAdd, WishlistItem};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Image shown for products that have no images of their own.
pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder.jpg";

/// Currency every price in the catalog is denominated in.
pub const DEFAULT_CURRENCY: &str = "INR";
