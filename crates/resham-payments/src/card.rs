//! # Card Network Gateway
//!
//! Hosted checkout sessions. The shopper pays on the network's page; we learn
//! the outcome from a signed webhook (or by polling the session).
//!
//! ## Session Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Card Checkout Session                               │
//! │                                                                         │
//! │  POST /v1/checkout/sessions   (form-encoded, basic auth secret_key)     │
//! │    mode=payment                                                         │
//! │    line_items[i][price_data][unit_amount]=<paise>                       │
//! │    client_reference_id=<txn>   metadata[order_id]=<txn>                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  { id: "cs_test_...", url: "https://checkout..." }                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  shopper pays ──► webhook  checkout.session.completed                   │
//! │                   header   t=<unix>,v1=<hmac hex>                       │
//! │                   v1 = HMAC-SHA256(webhook_secret, "<t>.<raw body>")    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

use resham_core::{GatewayKind, GatewayStatus, Money, PaymentOrder};

use crate::config::CardNetworkConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{CallbackPayload, PaymentGateway, RedirectTarget, VerifiedCallback};
use crate::signing::{constant_time_eq, hmac_sha256_hex};

const SESSIONS_PATH: &str = "/v1/checkout/sessions";

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct CheckoutSession {
    id: Option<String>,
    url: Option<String>,
    status: Option<String>,
    payment_status: Option<String>,
    client_reference_id: Option<String>,
    amount_total: Option<i64>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl CheckoutSession {
    fn merchant_transaction_id(&self) -> Option<String> {
        self.metadata
            .get("order_id")
            .cloned()
            .or_else(|| self.client_reference_id.clone())
            .filter(|id| !id.is_empty())
    }

    /// Status as seen by a poll: paid, expired, or still open.
    fn poll_status(&self) -> GatewayStatus {
        match (self.payment_status.as_deref(), self.status.as_deref()) {
            (Some("paid"), _) => GatewayStatus::Success,
            (_, Some("expired")) => GatewayStatus::Failure,
            _ => GatewayStatus::Pending,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    kind: String,
    data: WebhookData,
}

#[derive(Debug, Deserialize)]
struct WebhookData {
    object: CheckoutSession,
}

/// Maps a webhook event type plus the session's payment status.
fn status_from_event(kind: &str, payment_status: Option<&str>) -> GatewayStatus {
    match kind {
        "checkout.session.completed" | "checkout.session.async_payment_succeeded" => {
            if payment_status == Some("paid") {
                GatewayStatus::Success
            } else {
                GatewayStatus::Pending
            }
        }
        "checkout.session.expired" | "checkout.session.async_payment_failed" => {
            GatewayStatus::Failure
        }
        _ => GatewayStatus::Pending,
    }
}

// =============================================================================
// Webhook Signature
// =============================================================================

/// Parses `t=<unix>,v1=<hex>[,v1=<hex>...]`.
fn parse_signature_header(header: &str) -> GatewayResult<(i64, Vec<&str>)> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        GatewayError::CallbackVerification("signature header has no timestamp".into())
    })?;
    if signatures.is_empty() {
        return Err(GatewayError::CallbackVerification(
            "signature header has no v1 signature".into(),
        ));
    }

    Ok((timestamp, signatures))
}

/// Checks the webhook signature as of `now` (unix seconds).
pub fn verify_webhook_signature(
    body: &str,
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> GatewayResult<()> {
    let (timestamp, signatures) = parse_signature_header(header)?;

    // The header is unauthenticated until the HMAC matches; any i64 may arrive.
    if now.abs_diff(timestamp) > tolerance_secs.unsigned_abs() {
        return Err(GatewayError::CallbackVerification(format!(
            "timestamp {} outside {}s tolerance",
            timestamp, tolerance_secs
        )));
    }

    let expected = hmac_sha256_hex(secret, &format!("{}.{}", timestamp, body))?;
    if signatures.iter().any(|sig| constant_time_eq(&expected, sig)) {
        Ok(())
    } else {
        Err(GatewayError::CallbackVerification(
            "signature does not match".into(),
        ))
    }
}

// =============================================================================
// Gateway
// =============================================================================

pub struct CardNetworkGateway {
    config: CardNetworkConfig,
    client: reqwest::Client,
}

impl CardNetworkGateway {
    pub fn new(config: CardNetworkConfig, client: reqwest::Client) -> Self {
        CardNetworkGateway { config, client }
    }

    /// Form parameters for a checkout session.
    pub fn session_params(&self, order: &PaymentOrder) -> Vec<(String, String)> {
        let separator = if self.config.success_url.contains('?') { '&' } else { '?' };
        let currency = order.currency.to_lowercase();
        let txn = &order.merchant_transaction_id;

        let mut params = vec![
            ("mode".to_string(), "payment".to_string()),
            (
                "success_url".to_string(),
                format!(
                    "{}{}session_id={{CHECKOUT_SESSION_ID}}",
                    self.config.success_url, separator
                ),
            ),
            ("cancel_url".to_string(), self.config.cancel_url.clone()),
            ("customer_email".to_string(), order.contact.email.clone()),
            ("client_reference_id".to_string(), txn.clone()),
            ("metadata[order_id]".to_string(), txn.clone()),
            ("billing_address_collection".to_string(), "required".to_string()),
        ];

        for (i, country) in self.config.allowed_countries.iter().enumerate() {
            params.push((
                format!("shipping_address_collection[allowed_countries][{}]", i),
                country.clone(),
            ));
        }

        for (i, line) in order.lines.iter().enumerate() {
            let prefix = format!("line_items[{}]", i);
            params.push((format!("{}[price_data][currency]", prefix), currency.clone()));
            params.push((
                format!("{}[price_data][unit_amount]", prefix),
                line.unit_amount.minor_units().to_string(),
            ));
            params.push((
                format!("{}[price_data][product_data][name]", prefix),
                line.name.clone(),
            ));
            // Hosted pages only render absolute image URLs
            if line.image.starts_with("http://") || line.image.starts_with("https://") {
                params.push((
                    format!("{}[price_data][product_data][images][0]", prefix),
                    line.image.clone(),
                ));
            }
            params.push((format!("{}[quantity]", prefix), line.quantity.to_string()));
        }

        params
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base.trim_end_matches('/'), path)
    }

    async fn read_session(response: reqwest::Response) -> GatewayResult<CheckoutSession> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Card gateway returned an error status");
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| GatewayError::ResponseShape(e.to_string()))
    }
}

#[async_trait]
impl PaymentGateway for CardNetworkGateway {
    fn kind(&self) -> GatewayKind {
        GatewayKind::CardNetwork
    }

    #[instrument(skip(self, order), fields(txn = %order.merchant_transaction_id, amount = %order.amount))]
    async fn initiate(&self, order: &PaymentOrder) -> GatewayResult<RedirectTarget> {
        let params = self.session_params(order);
        debug!(lines = order.lines.len(), "Creating card checkout session");

        let response = self
            .client
            .post(self.endpoint(SESSIONS_PATH))
            .basic_auth(&self.config.secret_key, Some(""))
            .form(&params)
            .send()
            .await?;

        let session = Self::read_session(response).await?;
        let id = session
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| GatewayError::ResponseShape("session has no id".into()))?;

        let url = session.url.filter(|u| !u.is_empty()).unwrap_or_else(|| {
            format!(
                "{}/{}",
                self.config.hosted_checkout_base.trim_end_matches('/'),
                id
            )
        });

        info!(session_id = %id, "Card checkout session created");
        Ok(RedirectTarget {
            url,
            gateway_reference: Some(id),
        })
    }

    fn verify_callback(&self, payload: &CallbackPayload) -> GatewayResult<VerifiedCallback> {
        let (body, signature) = match payload {
            CallbackPayload::Card { body, signature } => (body, signature),
            other => {
                return Err(GatewayError::InvalidCallback(format!(
                    "expected a card webhook, got {}",
                    other.gateway()
                )))
            }
        };

        if let Err(e) = verify_webhook_signature(
            body,
            signature,
            &self.config.webhook_secret,
            self.config.webhook_tolerance_secs,
            Utc::now().timestamp(),
        ) {
            warn!(error = %e, "Card webhook rejected");
            return Err(e);
        }

        let event: WebhookEvent = serde_json::from_str(body)
            .map_err(|e| GatewayError::InvalidCallback(format!("webhook body: {}", e)))?;

        let session = event.data.object;
        let txn = session.merchant_transaction_id().ok_or_else(|| {
            GatewayError::InvalidCallback("session carries no order id".into())
        })?;
        let status = status_from_event(&event.kind, session.payment_status.as_deref());

        debug!(txn = %txn, event = %event.kind, ?status, "Card webhook verified");
        Ok(VerifiedCallback {
            merchant_transaction_id: txn,
            status,
            gateway_reference: session.id,
            amount: session.amount_total.map(Money::from_minor),
        })
    }

    #[instrument(skip(self))]
    async fn fetch_status(
        &self,
        merchant_transaction_id: &str,
        gateway_reference: Option<&str>,
    ) -> GatewayResult<VerifiedCallback> {
        let session_id = gateway_reference.ok_or_else(|| {
            GatewayError::InvalidCallback("card status lookup needs the session id".into())
        })?;

        let response = self
            .client
            .get(self.endpoint(&format!("{}/{}", SESSIONS_PATH, session_id)))
            .basic_auth(&self.config.secret_key, Some(""))
            .send()
            .await?;

        let session = Self::read_session(response).await?;
        let status = session.poll_status();

        if let Some(reported) = session.merchant_transaction_id() {
            if reported != merchant_transaction_id {
                return Err(GatewayError::CallbackVerification(format!(
                    "session {} belongs to {}",
                    session_id, reported
                )));
            }
        }

        debug!(?status, "Card session status fetched");
        Ok(VerifiedCallback {
            merchant_transaction_id: merchant_transaction_id.to_string(),
            status,
            gateway_reference: Some(session_id.to_string()),
            amount: session.amount_total.map(Money::from_minor),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
