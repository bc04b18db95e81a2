//! # Checkout
//!
//! The checkout transaction and its state machine, plus the gateway-neutral
//! payment order built from a cart.
//!
//! ## Phase Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Checkout Phases                                   │
//! │                                                                         │
//! │   ┌──────┐  GatewayAccepted   ┌─────────────────────────┐               │
//! │   │ Idle │───────────────────►│ AwaitingGatewayRedirect │               │
//! │   └──┬───┘                    └────────────┬────────────┘               │
//! │      │                                     │ RedirectConfirmed          │
//! │      │                                     ▼                            │
//! │      │                        ┌─────────────────────────┐               │
//! │      │                        │    AwaitingCallback     │               │
//! │      │                        └──────┬───────────┬──────┘               │
//! │      │         PaymentConfirmed      │           │ PaymentFailed        │
//! │      │                               ▼           ▼                      │
//! │      │                        ┌───────────┐ ┌────────┐                  │
//! │      │                        │ Succeeded │◄│ Failed │                  │
//! │      │                        └───────────┘ └────────┘                  │
//! │      │ GatewayRejected                           ▲                      │
//! │      └───────────────────────────────────────────┘                      │
//! │                                                                         │
//! │  Failed ──PaymentConfirmed──► Succeeded (late confirmation)             │
//! │  Succeeded is absorbing: nothing moves a transaction out of it.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A callback can beat the shopper's browser back to us, so a confirmation is
//! accepted while still in `AwaitingGatewayRedirect`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use uuid::Uuid;

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::{normalize_phone, validate_customer_name, validate_email, validate_phone};

// =============================================================================
// Gateway Kind
// =============================================================================

/// Which payment gateway a transaction goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum GatewayKind {
    /// Hosted card checkout session.
    CardNetwork,
    /// Regional wallet pay page (UPI, wallets, netbanking).
    RegionalWallet,
}

impl fmt::Display for GatewayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayKind::CardNetwork => write!(f, "card_network"),
            GatewayKind::RegionalWallet => write!(f, "regional_wallet"),
        }
    }
}

impl FromStr for GatewayKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "card_network" | "card" => Ok(GatewayKind::CardNetwork),
            "regional_wallet" | "wallet" | "upi" => Ok(GatewayKind::RegionalWallet),
            _ => Err(ValidationError::NotAllowed {
                field: "gateway".to_string(),
                allowed: vec!["card_network".to_string(), "regional_wallet".to_string()],
            }),
        }
    }
}

// =============================================================================
// Gateway Status
// =============================================================================

/// What the gateway has told us about the payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum GatewayStatus {
    #[default]
    Pending,
    Success,
    Failure,
}

// =============================================================================
// Phase Machine
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum CheckoutPhase {
    #[default]
    Idle,
    AwaitingGatewayRedirect,
    AwaitingCallback,
    Succeeded,
    Failed,
}

/// Inputs to the phase machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutEvent {
    /// Gateway accepted the order and returned a redirect.
    GatewayAccepted,
    /// Gateway call failed (network, non-2xx, unusable response).
    GatewayRejected,
    /// Shopper was sent to the gateway page.
    RedirectConfirmed,
    /// Verified success from callback or status poll.
    PaymentConfirmed,
    /// Verified failure, or a status we cannot treat as success.
    PaymentFailed,
}

impl fmt::Display for CheckoutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckoutPhase::Idle => "idle",
            CheckoutPhase::AwaitingGatewayRedirect => "awaiting_gateway_redirect",
            CheckoutPhase::AwaitingCallback => "awaiting_callback",
            CheckoutPhase::Succeeded => "succeeded",
            CheckoutPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

impl fmt::Display for CheckoutEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl CheckoutPhase {
    /// Computes the next phase, or rejects the event.
    pub fn apply(self, event: CheckoutEvent) -> CoreResult<CheckoutPhase> {
        use CheckoutEvent as E;
        use CheckoutPhase as P;

        let next = match (self, event) {
            (P::Idle, E::GatewayAccepted) => P::AwaitingGatewayRedirect,
            (P::Idle, E::GatewayRejected) => P::Failed,

            (P::AwaitingGatewayRedirect, E::RedirectConfirmed) => P::AwaitingCallback,
            (P::AwaitingCallback, E::RedirectConfirmed) => P::AwaitingCallback,

            (P::AwaitingGatewayRedirect | P::AwaitingCallback, E::PaymentConfirmed) => P::Succeeded,
            (P::AwaitingGatewayRedirect | P::AwaitingCallback, E::PaymentFailed) => P::Failed,

            (P::Failed, E::PaymentConfirmed) => P::Succeeded,
            (P::Failed, E::PaymentFailed) => P::Failed,

            (from, event) => {
                return Err(CoreError::InvalidTransition {
                    from: from.to_string(),
                    event: event.to_string(),
                })
            }
        };

        Ok(next)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckoutPhase::Succeeded | CheckoutPhase::Failed)
    }
}

// =============================================================================
// Checkout Transaction
// =============================================================================

/// One checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutTransaction {
    pub merchant_transaction_id: String,
    pub amount: Money,
    pub gateway: GatewayKind,
    pub gateway_status: GatewayStatus,
    pub phase: CheckoutPhase,

    /// Where the shopper must be sent to pay.
    pub redirect_url: Option<String>,

    /// Gateway-side id (card network session id; wallet provider reference).
    pub gateway_reference: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl CheckoutTransaction {
    pub fn new(merchant_transaction_id: String, amount: Money, gateway: GatewayKind) -> Self {
        let now = Utc::now();
        CheckoutTransaction {
            merchant_transaction_id,
            amount,
            gateway,
            gateway_status: GatewayStatus::Pending,
            phase: CheckoutPhase::Idle,
            redirect_url: None,
            gateway_reference: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies an event, keeping `gateway_status` in step with the phase.
    pub fn apply(&mut self, event: CheckoutEvent) -> CoreResult<()> {
        self.phase = self.phase.apply(event)?;
        self.gateway_status = match self.phase {
            CheckoutPhase::Succeeded => GatewayStatus::Success,
            CheckoutPhase::Failed => GatewayStatus::Failure,
            _ => GatewayStatus::Pending,
        };
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn is_succeeded(&self) -> bool {
        self.phase == CheckoutPhase::Succeeded
    }
}

/// Generates a merchant transaction id: `T` + UTC timestamp to the
/// millisecond + 6 hex characters. 24 characters, alphanumeric only, which
/// both gateways accept.
///
/// ```rust
/// use resham_core::checkout::generate_merchant_transaction_id;
///
/// let id = generate_merchant_transaction_id();
/// assert!(id.starts_with('T'));
/// assert_eq!(id.len(), 24);
/// ```
pub fn generate_merchant_transaction_id() -> String {
    let stamp = Utc::now().format("%Y%m%d%H%M%S%3f");
    let random = Uuid::new_v4().simple().to_string();
    format!("T{}{}", stamp, random[..6].to_uppercase())
}

// =============================================================================
// Customer Contact
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CustomerContact {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl CustomerContact {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_customer_name(&self.name)?;
        validate_email(&self.email)?;
        validate_phone(&self.phone)?;
        Ok(())
    }

    /// Returns a trimmed copy with the phone reduced to digits.
    pub fn normalized(&self) -> Self {
        CustomerContact {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            phone: normalize_phone(&self.phone),
        }
    }
}

// =============================================================================
// Payment Order
// =============================================================================

/// One line of a payment order, in gateway-neutral terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: String,
    pub name: String,
    pub image: String,
    pub unit_amount: Money,
    pub quantity: i64,
}

/// Everything an adapter needs to open a payment with its gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrder {
    pub merchant_transaction_id: String,
    /// Cart total in minor units.
    pub amount: Money,
    pub currency: String,
    pub lines: Vec<OrderLine>,
    pub contact: CustomerContact,
}

impl PaymentOrder {
    /// Builds an order from the cart's current lines.
    ///
    /// ## Errors
    /// - `EmptyCart` if there is nothing to pay for
    /// - `Validation` if the contact details are unusable
    pub fn from_cart(
        merchant_transaction_id: String,
        cart: &Cart,
        contact: &CustomerContact,
        currency: &str,
    ) -> CoreResult<Self> {
        if cart.is_empty() {
            return Err(CoreError::EmptyCart);
        }
        contact.validate()?;
        let amount = cart.checked_total().ok_or_else(|| {
            CoreError::from(ValidationError::OutOfRange {
                field: "cart total".to_string(),
                min: 0,
                max: i64::MAX,
            })
        })?;

        let lines = cart
            .items()
            .iter()
            .map(|item| OrderLine {
                product_id: item.id.clone(),
                name: item.name.clone(),
                image: item.image.clone(),
                unit_amount: item.price,
                quantity: item.quantity,
            })
            .collect();

        Ok(PaymentOrder {
            merchant_transaction_id,
            amount,
            currency: currency.to_string(),
            lines,
            contact: contact.normalized(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
