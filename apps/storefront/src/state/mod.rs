//! # State Module
//!
//! The engines behind the storefront API and the shared state handed to
//! every handler.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 AppState (cloned into each handler)             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │          │                  │                    │                      │
//! │          ▼                  ▼                    ▼                      │
//! │  ┌──────────────┐  ┌────────────────┐  ┌──────────────────────┐        │
//! │  │  CartStore   │◄─│ WishlistStore  │  │ CheckoutOrchestrator │        │
//! │  │ Mutex<Cart>  │  │ Mutex<Wishlist>│  │ GatewayRegistry      │        │
//! │  └──────┬───────┘  └───────┬────────┘  └──────────┬───────────┘        │
//! │         │    clear on success                      │                    │
//! │         │◄─────────────────────────────────────────┘                    │
//! │         ▼                  ▼                        ▼                   │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  ClientStore (resham.cart / resham.wishlist / resham.checkout)  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  All three publish on one EventBus (tokio broadcast).                   │
//! │  No lock is ever held across an .await.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod checkout;
mod config;
mod events;
mod persistence;
mod wishlist;

#[cfg(test)]
pub(crate) mod test_support;

pub use cart::{CartSnapshot, CartStore};
pub use checkout::CheckoutOrchestrator;
pub use config::{
    CatalogSettings, ConfigError, ConfigResult, ServerSettings, StorageBackend, StorageSettings,
    StoreSettings, StorefrontConfig,
};
pub use events::{EventBus, StoreEvent, EVENT_CHANNEL_CAPACITY};
pub use persistence::{
    load_items, save_items, FileStore, MemoryStore, CART_KEY, CHECKOUT_KEY, WISHLIST_KEY,
};
pub use wishlist::WishlistStore;

use std::sync::Arc;
use tokio::sync::broadcast;

use resham_core::{Catalog, ClientStore};
use resham_payments::GatewayRegistry;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn Catalog>,
    pub cart: Arc<CartStore>,
    pub wishlist: Arc<WishlistStore>,
    pub checkout: Arc<CheckoutOrchestrator>,
    pub config: Arc<StorefrontConfig>,
    events: EventBus,
}

impl AppState {
    /// Wires the engines together over one client store and event bus.
    pub fn new(
        config: StorefrontConfig,
        catalog: Arc<dyn Catalog>,
        client_store: Arc<dyn ClientStore>,
        gateways: GatewayRegistry,
    ) -> Self {
        let events = EventBus::new();

        let cart = Arc::new(CartStore::new(
            catalog.clone(),
            client_store.clone(),
            events.clone(),
        ));
        let wishlist = Arc::new(WishlistStore::new(
            catalog.clone(),
            cart.clone(),
            client_store.clone(),
            events.clone(),
        ));
        let checkout = Arc::new(CheckoutOrchestrator::new(
            gateways,
            cart.clone(),
            client_store,
            events.clone(),
            config.store.currency.clone(),
        ));

        AppState {
            catalog,
            cart,
            wishlist,
            checkout,
            config: Arc::new(config),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}
