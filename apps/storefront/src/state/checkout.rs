//! # Checkout Orchestrator
//!
//! Drives one checkout attempt from the cart to a verified gateway outcome.
//!
//! ## Attempt Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Checkout Attempt                                     │
//! │                                                                         │
//! │  initiate(gateway, contact)                                             │
//! │     │  in-flight guard ── busy ──► CHECKOUT_IN_PROGRESS                 │
//! │     │  PaymentOrder::from_cart   (EMPTY_CART / VALIDATION_ERROR)        │
//! │     ▼                                                                   │
//! │  ┌──────┐  GatewayAccepted  ┌─────────────────────────┐                 │
//! │  │ Idle │──────────────────►│ AwaitingGatewayRedirect │                 │
//! │  └──────┘                   └────────────┬────────────┘                 │
//! │     │ GatewayRejected                    │ confirm_redirect             │
//! │     │ (cart untouched)                   ▼                              │
//! │     │                       ┌─────────────────────────┐                 │
//! │     │                       │    AwaitingCallback     │                 │
//! │     │                       └──────┬───────────┬──────┘                 │
//! │     │        handle_callback /     │           │                        │
//! │     │        poll_status           │ success   │ failure / ambiguous    │
//! │     ▼                              ▼           ▼                        │
//! │  ┌────────┐  late verified   ┌───────────┐  ┌────────┐                  │
//! │  │ Failed │─────success─────►│ Succeeded │  │ Failed │                  │
//! │  └────────┘                  │ clear cart│  │ keep   │                  │
//! │                              │ (once)    │  │ cart   │                  │
//! │                              └───────────┘  └────────┘                  │
//! │                                                                         │
//! │  Succeeded absorbs every later callback without side effects.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Persistence
//! The latest attempt is written to `resham.checkout` on every change, so a
//! restarted process can still reconcile the shopper's return from the
//! gateway. The entry is removed once that attempt succeeds.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use resham_core::{
    generate_merchant_transaction_id, CheckoutEvent, CheckoutPhase, CheckoutTransaction,
    ClientStore, CustomerContact, GatewayKind, GatewayStatus, Notice, PaymentOrder,
};
use resham_payments::{CallbackPayload, GatewayError, GatewayRegistry, VerifiedCallback};

use super::cart::CartStore;
use super::events::{EventBus, StoreEvent};
use super::persistence::{load_value, remove_value, save_value, CHECKOUT_KEY};
use crate::error::{ApiError, ApiResult};

// =============================================================================
// In-Flight Guard
// =============================================================================

/// Holds the orchestrator's "gateway call in progress" flag until dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Attempts kept in memory for late callbacks and status polls.
const MAX_TRACKED_ATTEMPTS: usize = 64;

#[derive(Default)]
struct Ledger {
    transactions: HashMap<String, CheckoutTransaction>,
    /// Id of the most recent attempt, the one mirrored in the client store.
    latest: Option<String>,
}

impl Ledger {
    /// Stores `txn`, then forgets attempts beyond [`MAX_TRACKED_ATTEMPTS`].
    ///
    /// Succeeded attempts go first, oldest `updated_at` first; Failed ones
    /// are kept longer since a late success can still upgrade them. The
    /// latest attempt is never evicted.
    fn insert(&mut self, txn: CheckoutTransaction) {
        self.transactions.insert(txn.merchant_transaction_id.clone(), txn);

        while self.transactions.len() > MAX_TRACKED_ATTEMPTS {
            let evict = self
                .transactions
                .values()
                .filter(|t| self.latest.as_deref() != Some(t.merchant_transaction_id.as_str()))
                .min_by_key(|t| (!t.is_succeeded(), t.updated_at))
                .map(|t| t.merchant_transaction_id.clone());

            let Some(id) = evict else { break };
            debug!(txn = %id, "Forgetting old checkout attempt");
            self.transactions.remove(&id);
        }
    }
}

pub struct CheckoutOrchestrator {
    gateways: GatewayRegistry,
    cart: Arc<CartStore>,
    store: Arc<dyn ClientStore>,
    events: EventBus,
    currency: String,
    in_flight: AtomicBool,
    ledger: Mutex<Ledger>,
}

impl CheckoutOrchestrator {
    /// Creates the orchestrator, picking up an attempt left in the client
    /// store by a previous run.
    pub fn new(
        gateways: GatewayRegistry,
        cart: Arc<CartStore>,
        store: Arc<dyn ClientStore>,
        events: EventBus,
        currency: impl Into<String>,
    ) -> Self {
        let mut ledger = Ledger::default();
        if let Some(txn) = load_value::<CheckoutTransaction>(store.as_ref(), CHECKOUT_KEY) {
            info!(
                txn = %txn.merchant_transaction_id,
                phase = %txn.phase,
                "Resuming checkout attempt"
            );
            ledger.latest = Some(txn.merchant_transaction_id.clone());
            ledger.insert(txn);
        }

        CheckoutOrchestrator {
            gateways,
            cart,
            store,
            events,
            currency: currency.into(),
            in_flight: AtomicBool::new(false),
            ledger: Mutex::new(ledger),
        }
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn transaction(&self, merchant_transaction_id: &str) -> Option<CheckoutTransaction> {
        self.ledger().transactions.get(merchant_transaction_id).cloned()
    }

    /// The most recent attempt, if any.
    pub fn active(&self) -> Option<CheckoutTransaction> {
        let ledger = self.ledger();
        ledger
            .latest
            .as_ref()
            .and_then(|id| ledger.transactions.get(id))
            .cloned()
    }

    pub fn gateways(&self) -> Vec<GatewayKind> {
        self.gateways.kinds()
    }

    /// Stores `txn` and mirrors it to the client store if it is the latest
    /// attempt. Must be called with the ledger lock held.
    fn record(&self, ledger: &mut Ledger, txn: CheckoutTransaction) {
        if ledger.latest.as_deref() == Some(txn.merchant_transaction_id.as_str()) {
            if txn.is_succeeded() {
                remove_value(self.store.as_ref(), CHECKOUT_KEY);
            } else {
                save_value(self.store.as_ref(), CHECKOUT_KEY, &txn);
            }
        }
        ledger.insert(txn);
    }

    // =========================================================================
    // Initiation
    // =========================================================================

    /// Opens a payment with `gateway` for the current cart.
    ///
    /// ## Returns
    /// The transaction in `AwaitingGatewayRedirect`, carrying the URL the
    /// shopper must be sent to.
    ///
    /// ## Errors
    /// - `CHECKOUT_IN_PROGRESS` while another initiation is talking to a gateway
    /// - `GATEWAY_NOT_CONFIGURED`, `EMPTY_CART`, `VALIDATION_ERROR` before any call
    /// - gateway errors; the attempt is recorded as Failed and the cart kept
    pub async fn initiate(
        &self,
        gateway: GatewayKind,
        contact: &CustomerContact,
    ) -> ApiResult<CheckoutTransaction> {
        debug!(gateway = %gateway, "initiate_checkout");

        let _guard = InFlight::acquire(&self.in_flight).ok_or_else(ApiError::checkout_in_progress)?;
        let adapter = self.gateways.get(gateway)?;

        let order = self.cart.with_cart(|cart| {
            PaymentOrder::from_cart(
                generate_merchant_transaction_id(),
                cart,
                contact,
                &self.currency,
            )
        })?;

        let mut txn =
            CheckoutTransaction::new(order.merchant_transaction_id.clone(), order.amount, gateway);
        self.ledger().latest = Some(txn.merchant_transaction_id.clone());

        info!(
            txn = %txn.merchant_transaction_id,
            gateway = %gateway,
            amount = txn.amount.minor_units(),
            lines = order.lines.len(),
            "Starting payment"
        );

        match adapter.initiate(&order).await {
            Ok(target) => {
                txn.apply(CheckoutEvent::GatewayAccepted)?;
                txn.redirect_url = Some(target.url);
                txn.gateway_reference = target.gateway_reference;

                {
                    let mut ledger = self.ledger();
                    self.record(&mut ledger, txn.clone());
                }
                self.events.publish(StoreEvent::CheckoutUpdated {
                    transaction: txn.clone(),
                });
                Ok(txn)
            }
            Err(err) => {
                warn!(txn = %txn.merchant_transaction_id, error = %err, "Gateway refused to start payment");
                txn.apply(CheckoutEvent::GatewayRejected)?;
                let api_error = ApiError::from(err);

                {
                    let mut ledger = self.ledger();
                    self.record(&mut ledger, txn.clone());
                }
                self.events.notice(Notice::PaymentFailed {
                    merchant_transaction_id: txn.merchant_transaction_id.clone(),
                    reason: api_error.message.clone(),
                });
                self.events.publish(StoreEvent::CheckoutUpdated { transaction: txn });
                Err(api_error)
            }
        }
    }

    /// Records that the shopper has been sent to the gateway page.
    pub fn confirm_redirect(&self, merchant_transaction_id: &str) -> ApiResult<CheckoutTransaction> {
        debug!(txn = %merchant_transaction_id, "confirm_redirect");

        let txn = {
            let mut ledger = self.ledger();
            let mut txn = ledger
                .transactions
                .get(merchant_transaction_id)
                .cloned()
                .ok_or_else(|| ApiError::not_found("Transaction", merchant_transaction_id))?;
            txn.apply(CheckoutEvent::RedirectConfirmed)?;
            self.record(&mut ledger, txn.clone());
            txn
        };

        self.events.publish(StoreEvent::CheckoutUpdated {
            transaction: txn.clone(),
        });
        Ok(txn)
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Verifies a gateway callback and applies its outcome.
    ///
    /// Nothing about the transaction changes unless the adapter accepts the
    /// payload's signature.
    pub async fn handle_callback(&self, payload: CallbackPayload) -> ApiResult<CheckoutTransaction> {
        let gateway = payload.gateway();
        debug!(gateway = %gateway, "handle_callback");

        let adapter = self.gateways.get(gateway)?;
        let verified = adapter.verify_callback(&payload).map_err(|err| {
            warn!(gateway = %gateway, error = %err, "Rejected gateway callback");
            err
        })?;

        self.resolve(verified)
    }

    /// Asks the gateway for the attempt's status and applies it.
    ///
    /// A Succeeded attempt is returned as is, without a gateway call.
    pub async fn poll_status(&self, merchant_transaction_id: &str) -> ApiResult<CheckoutTransaction> {
        debug!(txn = %merchant_transaction_id, "poll_status");

        let txn = self
            .transaction(merchant_transaction_id)
            .ok_or_else(|| ApiError::not_found("Transaction", merchant_transaction_id))?;
        if txn.is_succeeded() {
            return Ok(txn);
        }

        let adapter = self.gateways.get(txn.gateway)?;
        let verified = adapter
            .fetch_status(merchant_transaction_id, txn.gateway_reference.as_deref())
            .await?;

        self.resolve(verified)
    }

    fn resolve(&self, verified: VerifiedCallback) -> ApiResult<CheckoutTransaction> {
        let id = verified.merchant_transaction_id.as_str();

        let (txn, previous) = {
            let mut ledger = self.ledger();
            let Some(current) = ledger.transactions.get(id).cloned() else {
                warn!(txn = %id, "Verified outcome for an unknown transaction");
                return Err(ApiError::not_found("Transaction", id));
            };

            if current.is_succeeded() {
                debug!(txn = %id, "Duplicate confirmation ignored");
                return Ok(current);
            }

            if let Some(reported) = verified.amount.filter(|a| *a != current.amount) {
                warn!(
                    txn = %id,
                    expected = current.amount.minor_units(),
                    reported = reported.minor_units(),
                    "Gateway reported a different amount"
                );
                return Err(GatewayError::CallbackVerification(format!(
                    "amount {} does not match {}",
                    reported, current.amount
                ))
                .into());
            }

            let event = match verified.status {
                GatewayStatus::Success => CheckoutEvent::PaymentConfirmed,
                GatewayStatus::Failure | GatewayStatus::Pending => CheckoutEvent::PaymentFailed,
            };

            let previous = current.phase;
            let mut txn = current;
            txn.apply(event)?;
            if verified.gateway_reference.is_some() {
                txn.gateway_reference = verified.gateway_reference.clone();
            }
            self.record(&mut ledger, txn.clone());
            (txn, previous)
        };

        match txn.phase {
            CheckoutPhase::Succeeded => {
                info!(txn = %id, amount = txn.amount.minor_units(), "Payment confirmed");
                self.cart.clear_cart();
                self.events.notice(Notice::PaymentSucceeded {
                    merchant_transaction_id: txn.merchant_transaction_id.clone(),
                });
            }
            CheckoutPhase::Failed if previous != CheckoutPhase::Failed => {
                info!(txn = %id, status = ?verified.status, "Payment not completed");
                let reason = match verified.status {
                    GatewayStatus::Failure => "The payment was declined or cancelled",
                    _ => "The payment could not be confirmed",
                };
                self.events.notice(Notice::PaymentFailed {
                    merchant_transaction_id: txn.merchant_transaction_id.clone(),
                    reason: reason.to_string(),
                });
            }
            _ => {}
        }

        self.events.publish(StoreEvent::CheckoutUpdated {
            transaction: txn.clone(),
        });
        Ok(txn)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
