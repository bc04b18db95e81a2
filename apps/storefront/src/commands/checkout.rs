//! # Checkout Commands
//!
//! ## Payment Round Trip
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Front end                Storefront                  Gateway           │
//! │                                                                         │
//! │  initiate_checkout ─────► orchestrator.initiate ────► create payment    │
//! │        ◄──────────────── { redirectUrl, ... } ◄────── redirect url      │
//! │  confirm_redirect ──────► AwaitingCallback                              │
//! │  window.location = redirectUrl ──────────────────────► shopper pays     │
//! │                                                                         │
//! │                           wallet_callback /  ◄──────── signed callback  │
//! │                           card_webhook                                  │
//! │                             verify ► resolve ► clear cart on success    │
//! │                                                                         │
//! │  checkout_status ───────► poll_status ──────────────► status lookup     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use resham_core::validation::validate_id;
use resham_core::{CheckoutTransaction, CustomerContact, GatewayKind};
use resham_payments::CallbackPayload;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateCheckoutRequest {
    pub gateway: GatewayKind,
    pub contact: CustomerContact,
}

/// Gateways the shopper can choose from.
pub fn list_gateways(state: &AppState) -> Vec<GatewayKind> {
    state.checkout.gateways()
}

/// Starts a payment for the current cart.
///
/// ## Returns
/// The new transaction; `redirectUrl` is where the shopper goes next.
pub async fn initiate_checkout(
    state: &AppState,
    request: InitiateCheckoutRequest,
) -> ApiResult<CheckoutTransaction> {
    debug!(gateway = %request.gateway, "initiate_checkout command");
    state.checkout.initiate(request.gateway, &request.contact).await
}

pub fn confirm_redirect(state: &AppState, merchant_transaction_id: &str) -> ApiResult<CheckoutTransaction> {
    debug!(txn = %merchant_transaction_id, "confirm_redirect command");
    validate_id("merchantTransactionId", merchant_transaction_id)?;
    state.checkout.confirm_redirect(merchant_transaction_id)
}

pub async fn checkout_status(
    state: &AppState,
    merchant_transaction_id: &str,
) -> ApiResult<CheckoutTransaction> {
    debug!(txn = %merchant_transaction_id, "checkout_status command");
    validate_id("merchantTransactionId", merchant_transaction_id)?;
    state.checkout.poll_status(merchant_transaction_id).await
}

/// Regional wallet redirect/callback form.
pub async fn wallet_callback(
    state: &AppState,
    fields: HashMap<String, String>,
) -> ApiResult<CheckoutTransaction> {
    debug!(fields = fields.len(), "wallet_callback command");
    state
        .checkout
        .handle_callback(CallbackPayload::Wallet(fields))
        .await
}

/// Card network webhook. `body` must be the exact bytes the gateway signed.
pub async fn card_webhook(
    state: &AppState,
    body: String,
    signature: Option<String>,
) -> ApiResult<CheckoutTransaction> {
    debug!(bytes = body.len(), "card_webhook command");
    let signature = signature.ok_or_else(|| {
        ApiError::from(resham_payments::GatewayError::InvalidCallback(
            "missing signature header".into(),
        ))
    })?;
    state
        .checkout
        .handle_callback(CallbackPayload::Card { body, signature })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{cart, test_state};
    use crate::error::ErrorCode;
    use crate::state::test_support::{contact, product};
    use resham_core::CheckoutPhase;

    fn request(gateway: GatewayKind) -> InitiateCheckoutRequest {
        InitiateCheckoutRequest {
            gateway,
            contact: contact(),
        }
    }

    fn wallet_fields(txn: &str, status: &str, sig: &str) -> HashMap<String, String> {
        HashMap::from([
            ("transactionId".to_string(), txn.to_string()),
            ("status".to_string(), status.to_string()),
            ("sig".to_string(), sig.to_string()),
        ])
    }

    #[tokio::test]
    async fn test_full_wallet_round_trip() {
        let (state, _) = test_state(vec![product("a", 120_000, 2)]);
        cart::add_to_cart(&state, "a").await.unwrap();

        let txn = initiate_checkout(&state, request(GatewayKind::RegionalWallet))
            .await
            .unwrap();
        let id = txn.merchant_transaction_id.clone();
        confirm_redirect(&state, &id).unwrap();

        let done = wallet_callback(&state, wallet_fields(&id, "success", "ok"))
            .await
            .unwrap();
        assert_eq!(done.phase, CheckoutPhase::Succeeded);
        assert!(cart::get_cart(&state).items.is_empty());

        // Status after success does not go back to the gateway
        assert!(checkout_status(&state, &id).await.unwrap().is_succeeded());
    }

    #[tokio::test]
    async fn test_request_body_shape() {
        let parsed: InitiateCheckoutRequest = serde_json::from_str(
            r#"{"gateway":"regional_wallet","contact":{"name":"Meera","email":"m@example.in","phone":"9876543210"}}"#,
        )
        .unwrap();
        assert_eq!(parsed.gateway, GatewayKind::RegionalWallet);
    }

    #[tokio::test]
    async fn test_card_webhook_without_signature_or_config() {
        let (state, _) = test_state(vec![]);

        let err = card_webhook(&state, "{}".into(), None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCallback);

        let err = card_webhook(&state, "{}".into(), Some("t=1,v1=00".into()))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::GatewayNotConfigured);
        assert_eq!(list_gateways(&state), vec![GatewayKind::RegionalWallet]);
    }
}
