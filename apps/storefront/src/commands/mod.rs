//! # Commands Module
//!
//! Everything the presentation layer can ask of the storefront.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (exports)
//! ├── catalog.rs   ◄─── Product listing and lookup
//! ├── cart.rs      ◄─── Cart manipulation
//! ├── wishlist.rs  ◄─── Saved-for-later list
//! └── checkout.rs  ◄─── Payment initiation, callbacks, status
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  fetch('/api/cart/items', { method: 'POST',                             │
//! │                             body: { productId: 'sr-001' } })            │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  server.rs handler  ── extracts State, Path, Json                       │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  commands::cart::add_to_cart(&AppState, "sr-001")                       │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Result<CartSnapshot, ApiError>  ── JSON, status from the error code    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands are plain functions over [`AppState`](crate::state::AppState) so
//! they can be called from tests without an HTTP layer.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod wishlist;

#[cfg(test)]
pub(crate) fn test_state(
    products: Vec<resham_core::Product>,
) -> (
    crate::state::AppState,
    std::sync::Arc<crate::state::test_support::StubGateway>,
) {
    use crate::state::test_support::{InitiateOutcome, StubCatalog, StubGateway};
    use crate::state::{AppState, MemoryStore, StorefrontConfig};
    use resham_core::GatewayKind;
    use resham_payments::GatewayRegistry;
    use std::sync::Arc;

    let gateway = Arc::new(StubGateway::new(
        GatewayKind::RegionalWallet,
        InitiateOutcome::Redirect("https://pay.example/page".into()),
    ));
    let mut registry = GatewayRegistry::new();
    registry.register(gateway.clone());

    let state = AppState::new(
        StorefrontConfig::default(),
        StubCatalog::with(products),
        Arc::new(MemoryStore::new()),
        registry,
    );
    (state, gateway)
}
