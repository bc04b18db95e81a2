//! # Notices
//!
//! Short user-facing messages produced right after a state change commits
//! (the toast the front end shows). Engines publish them synchronously; they
//! never delay or undo the change that caused them.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum Notice {
    AddedToCart { product_id: String, name: String },
    OutOfStock { product_id: String, name: String },
    StockLimitReached { product_id: String, name: String, stock: i64 },
    AddedToWishlist { product_id: String, name: String },
    AlreadyInWishlist { product_id: String, name: String },
    RemovedFromWishlist { product_id: String },
    PaymentSucceeded { merchant_transaction_id: String },
    PaymentFailed { merchant_transaction_id: String, reason: String },
}

impl Notice {
    pub fn level(&self) -> NoticeLevel {
        match self {
            Notice::AddedToCart { .. }
            | Notice::AddedToWishlist { .. }
            | Notice::PaymentSucceeded { .. } => NoticeLevel::Success,
            Notice::AlreadyInWishlist { .. } | Notice::RemovedFromWishlist { .. } => {
                NoticeLevel::Info
            }
            Notice::OutOfStock { .. }
            | Notice::StockLimitReached { .. }
            | Notice::PaymentFailed { .. } => NoticeLevel::Error,
        }
    }

    /// Text for the toast.
    pub fn message(&self) -> String {
        match self {
            Notice::AddedToCart { name, .. } => format!("{} added to cart", name),
            Notice::OutOfStock { name, .. } => format!("{} is out of stock", name),
            Notice::StockLimitReached { name, stock, .. } => {
                format!("Only {} of {} available", stock, name)
            }
            Notice::AddedToWishlist { name, .. } => format!("{} added to wishlist", name),
            Notice::AlreadyInWishlist { name, .. } => format!("{} is already in your wishlist", name),
            Notice::RemovedFromWishlist { .. } => "Removed from wishlist".to_string(),
            Notice::PaymentSucceeded { merchant_transaction_id } => {
                format!("Payment received. Order {} confirmed", merchant_transaction_id)
            }
            Notice::PaymentFailed { reason, .. } => format!("Payment failed: {}", reason),
        }
    }
}
