//! # Wishlist
//!
//! Saved-for-later products. Unlike the cart there is no stock gate and no
//! quantity: a product is either saved or it is not.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::Product;

/// One saved product. This is also the persisted shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WishlistItem {
    pub id: String,
    pub name: String,
    pub price: Money,
    pub image: String,
}

impl WishlistItem {
    pub fn from_product(product: &Product) -> Self {
        WishlistItem {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            image: product.primary_image(),
        }
    }
}

/// Outcome of [`Wishlist::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WishlistAdd {
    Added,
    /// The id was already saved; nothing changed.
    AlreadyPresent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wishlist {
    items: Vec<WishlistItem>,
}

impl Wishlist {
    pub fn new() -> Self {
        Wishlist { items: Vec::new() }
    }

    /// Rebuilds from persisted items, keeping the first entry per id.
    pub fn from_items(items: Vec<WishlistItem>) -> Self {
        let mut wishlist = Wishlist::new();
        for item in items {
            if !wishlist.contains(&item.id) {
                wishlist.items.push(item);
            }
        }
        wishlist
    }

    pub fn items(&self) -> &[WishlistItem] {
        &self.items
    }

    pub fn get(&self, product_id: &str) -> Option<&WishlistItem> {
        self.items.iter().find(|i| i.id == product_id)
    }

    pub fn add(&mut self, product: &Product) -> WishlistAdd {
        if self.contains(&product.id) {
            return WishlistAdd::AlreadyPresent;
        }
        self.items.push(WishlistItem::from_product(product));
        WishlistAdd::Added
    }

    /// Removes an item; absent ids are a no-op. Returns whether one was removed.
    pub fn remove(&mut self, product_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != product_id);
        self.items.len() != before
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.items.iter().any(|i| i.id == product_id)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<WishlistItem> {
        self.items
    }
}
