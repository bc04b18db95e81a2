//! # Regional Wallet Gateway
//!
//! UPI/wallet pay-page integration. Payloads are JSON, base64-encoded, and
//! authenticated with a salted SHA-256 checksum in the `X-VERIFY` header.
//!
//! ## Pay Request
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Wallet Pay Request                                │
//! │                                                                         │
//! │  payload = { merchantId, merchantTransactionId, merchantUserId,        │
//! │              amount (paise), redirectUrl, redirectMode, callbackUrl,   │
//! │              mobileNumber, paymentInstrument: { type: PAY_PAGE } }     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  request  = base64(json(payload))                                       │
//! │  X-VERIFY = sha256(request + pay_path + salt_key) + "###" + salt_index  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  POST {api_base}{pay_path}   { "request": request }                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  { success, data.instrumentResponse.redirectInfo.url }                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Callback
//! The gateway posts `code`, `merchantId`, `transactionId`, `amount`,
//! `providerReferenceId` and `checksum` back to us. The checksum is
//! `sha256(transactionId + status_path + salt_key)`, optionally followed by
//! `###index`; nothing in the callback is trusted until it matches.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};
use url::Url;

use resham_core::{GatewayKind, GatewayStatus, Money, PaymentOrder};

use crate::config::WalletConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{CallbackPayload, PaymentGateway, RedirectTarget, VerifiedCallback};
use crate::signing::{constant_time_eq, sha256_hex, split_checksum, wallet_checksum};

const PAY_PAGE: &str = "PAY_PAGE";

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PayPayload<'a> {
    merchant_id: &'a str,
    merchant_transaction_id: &'a str,
    merchant_user_id: String,
    amount: i64,
    redirect_url: String,
    redirect_mode: &'a str,
    callback_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mobile_number: Option<&'a str>,
    payment_instrument: PaymentInstrument,
}

#[derive(Debug, Serialize)]
struct PaymentInstrument {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct PayRequestBody<'a> {
    request: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WalletResponse {
    #[serde(default)]
    success: bool,
    code: Option<String>,
    message: Option<String>,
    data: Option<WalletResponseData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WalletResponseData {
    instrument_response: Option<InstrumentResponse>,
    provider_reference_id: Option<String>,
    amount: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstrumentResponse {
    redirect_info: Option<RedirectInfo>,
}

#[derive(Debug, Deserialize)]
struct RedirectInfo {
    url: Option<String>,
}

/// Maps a wallet response code to a gateway status.
pub fn status_from_code(code: &str) -> GatewayStatus {
    match code {
        "PAYMENT_SUCCESS" => GatewayStatus::Success,
        "PAYMENT_ERROR" | "PAYMENT_DECLINED" | "PAYMENT_CANCELLED" | "TIMED_OUT"
        | "TRANSACTION_NOT_FOUND" => GatewayStatus::Failure,
        _ => GatewayStatus::Pending,
    }
}

// =============================================================================
// Gateway
// =============================================================================

pub struct RegionalWalletGateway {
    config: WalletConfig,
    client: reqwest::Client,
}

impl RegionalWalletGateway {
    pub fn new(config: WalletConfig, client: reqwest::Client) -> Self {
        RegionalWalletGateway { config, client }
    }

    /// Returns `(base64 payload, X-VERIFY)` for an order.
    pub fn sign_order(&self, order: &PaymentOrder) -> GatewayResult<(String, String)> {
        let mut redirect_url = Url::parse(&self.config.redirect_url)?;
        redirect_url
            .query_pairs_mut()
            .append_pair("transactionId", &order.merchant_transaction_id);

        let phone = order.contact.phone.trim();
        let payload = PayPayload {
            merchant_id: &self.config.merchant_id,
            merchant_transaction_id: &order.merchant_transaction_id,
            merchant_user_id: merchant_user_id(&order.contact.email),
            amount: order.amount.minor_units(),
            redirect_url: redirect_url.into(),
            redirect_mode: &self.config.redirect_mode,
            callback_url: &self.config.callback_url,
            mobile_number: (!phone.is_empty()).then_some(phone),
            payment_instrument: PaymentInstrument { kind: PAY_PAGE },
        };

        let encoded = STANDARD.encode(serde_json::to_vec(&payload)?);
        let x_verify = wallet_checksum(
            &format!("{}{}", encoded, self.config.pay_path),
            &self.config.salt_key,
            self.config.salt_index,
        );

        Ok((encoded, x_verify))
    }

    /// The checksum a genuine callback for `merchant_transaction_id` carries.
    pub fn expected_callback_digest(&self, merchant_transaction_id: &str) -> String {
        sha256_hex(&format!(
            "{}{}{}",
            merchant_transaction_id, self.config.status_path, self.config.salt_key
        ))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base.trim_end_matches('/'), path)
    }

    async fn read_response(response: reqwest::Response) -> GatewayResult<WalletResponse> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Wallet gateway returned an error status");
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| GatewayError::ResponseShape(e.to_string()))
    }
}

/// Stable, alphanumeric shopper id derived from the email address.
fn merchant_user_id(email: &str) -> String {
    let digest = sha256_hex(&email.trim().to_lowercase());
    format!("MU{}", digest[..16].to_uppercase())
}

fn form_field<'a>(fields: &'a HashMap<String, String>, name: &str) -> GatewayResult<&'a str> {
    fields
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| GatewayError::InvalidCallback(format!("missing field '{}'", name)))
}

#[async_trait]
impl PaymentGateway for RegionalWalletGateway {
    fn kind(&self) -> GatewayKind {
        GatewayKind::RegionalWallet
    }

    #[instrument(skip(self, order), fields(txn = %order.merchant_transaction_id, amount = %order.amount))]
    async fn initiate(&self, order: &PaymentOrder) -> GatewayResult<RedirectTarget> {
        let (encoded, x_verify) = self.sign_order(order)?;
        debug!("Submitting wallet pay request");

        let response = self
            .client
            .post(self.endpoint(&self.config.pay_path))
            .header(CONTENT_TYPE, "application/json")
            .header("X-VERIFY", x_verify)
            .json(&PayRequestBody { request: &encoded })
            .send()
            .await?;

        let body = Self::read_response(response).await?;

        if !body.success {
            let reason = body
                .message
                .or(body.code)
                .unwrap_or_else(|| "success=false".to_string());
            warn!(reason = %reason, "Wallet gateway declined the pay request");
            return Err(GatewayError::Rejected(reason));
        }

        let url = body
            .data
            .and_then(|d| d.instrument_response)
            .and_then(|i| i.redirect_info)
            .and_then(|r| r.url)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                GatewayError::ResponseShape(
                    "missing data.instrumentResponse.redirectInfo.url".to_string(),
                )
            })?;

        info!("Wallet pay page ready");
        Ok(RedirectTarget {
            url,
            gateway_reference: None,
        })
    }

    fn verify_callback(&self, payload: &CallbackPayload) -> GatewayResult<VerifiedCallback> {
        let fields = match payload {
            CallbackPayload::Wallet(fields) => fields,
            other => {
                return Err(GatewayError::InvalidCallback(format!(
                    "expected a wallet callback, got {}",
                    other.gateway()
                )))
            }
        };

        let txn = form_field(fields, "transactionId")?;
        let code = form_field(fields, "code")?;
        let checksum = form_field(fields, "checksum")?;

        if let Some(merchant_id) = fields.get("merchantId") {
            if merchant_id != &self.config.merchant_id {
                warn!(txn = %txn, "Wallet callback for a different merchant");
                return Err(GatewayError::CallbackVerification(
                    "merchant id mismatch".to_string(),
                ));
            }
        }

        let (digest, index) = split_checksum(checksum);
        let expected = self.expected_callback_digest(txn);
        if !constant_time_eq(&expected, &digest.to_lowercase()) {
            warn!(txn = %txn, "Wallet callback checksum mismatch");
            return Err(GatewayError::CallbackVerification(
                "checksum does not match".to_string(),
            ));
        }
        if let Some(index) = index {
            if index != self.config.salt_index.to_string() {
                warn!(txn = %txn, index = %index, "Wallet callback uses an unknown salt index");
                return Err(GatewayError::CallbackVerification(
                    "unknown salt index".to_string(),
                ));
            }
        }

        let amount = fields
            .get("amount")
            .map(|raw| {
                raw.parse::<i64>().map(Money::from_minor).map_err(|_| {
                    GatewayError::InvalidCallback(format!("amount is not a number: {}", raw))
                })
            })
            .transpose()?;

        let status = status_from_code(code);
        debug!(txn = %txn, code = %code, ?status, "Wallet callback verified");

        Ok(VerifiedCallback {
            merchant_transaction_id: txn.to_string(),
            status,
            gateway_reference: fields.get("providerReferenceId").cloned(),
            amount,
        })
    }

    #[instrument(skip(self, _gateway_reference))]
    async fn fetch_status(
        &self,
        merchant_transaction_id: &str,
        _gateway_reference: Option<&str>,
    ) -> GatewayResult<VerifiedCallback> {
        let path = format!(
            "{}/{}/{}",
            self.config.status_path, self.config.merchant_id, merchant_transaction_id
        );
        let x_verify = wallet_checksum(&path, &self.config.salt_key, self.config.salt_index);

        let response = self
            .client
            .get(self.endpoint(&path))
            .header(CONTENT_TYPE, "application/json")
            .header("X-VERIFY", x_verify)
            .header("X-MERCHANT-ID", &self.config.merchant_id)
            .send()
            .await?;

        let body = Self::read_response(response).await?;
        let code = body
            .code
            .ok_or_else(|| GatewayError::ResponseShape("status response has no code".into()))?;

        let status = status_from_code(&code);
        debug!(code = %code, ?status, success = body.success, "Wallet status fetched");

        let (gateway_reference, amount) = body
            .data
            .map(|d| (d.provider_reference_id, d.amount.map(Money::from_minor)))
            .unwrap_or_default();

        Ok(VerifiedCallback {
            merchant_transaction_id: merchant_transaction_id.to_string(),
            status,
            gateway_reference,
            amount,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::http_client;
    use resham_core::{CustomerContact, Money, OrderLine};
    use serde_json::{json, Value};
    use std::time::Duration;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SALT: &str = "099eb0cd-02cf-4e2a-8aca-3e6c6aff0399";

    fn config(api_base: &str) -> WalletConfig {
        let mut config = WalletConfig::new(
            "RESHAMUAT",
            SALT,
            "https://resham.example/checkout/return",
            "https://resham.example/api/checkout/callback/wallet",
        );
        config.api_base = api_base.to_string();
        config
    }

    fn gateway(api_base: &str) -> RegionalWalletGateway {
        let client = http_client(Duration::from_secs(5)).unwrap();
        RegionalWalletGateway::new(config(api_base), client)
    }

    fn order() -> PaymentOrder {
        PaymentOrder {
            merchant_transaction_id: "T20240101120000000ABC123".to_string(),
            amount: Money::from_minor(350),
            currency: "INR".to_string(),
            lines: vec![OrderLine {
                product_id: "a".into(),
                name: "Kanjivaram".into(),
                image: "/a.jpg".into(),
                unit_amount: Money::from_minor(100),
                quantity: 2,
            }],
            contact: CustomerContact {
                name: "Meera Iyer".into(),
                email: "meera@example.in".into(),
                phone: "9876543210".into(),
            },
        }
    }

    fn callback(gw: &RegionalWalletGateway, txn: &str, code: &str) -> HashMap<String, String> {
        let checksum = format!("{}###1", gw.expected_callback_digest(txn));
        HashMap::from([
            ("code".to_string(), code.to_string()),
            ("merchantId".to_string(), "RESHAMUAT".to_string()),
            ("transactionId".to_string(), txn.to_string()),
            ("amount".to_string(), "350".to_string()),
            ("providerReferenceId".to_string(), "P2401011200".to_string()),
            ("checksum".to_string(), checksum),
        ])
    }

    #[test]
    fn test_signed_payload_contents() {
        let gw = gateway("https://wallet.test");
        let (encoded, x_verify) = gw.sign_order(&order()).unwrap();

        let decoded: Value = serde_json::from_slice(&STANDARD.decode(&encoded).unwrap()).unwrap();
        assert_eq!(decoded["merchantId"], "RESHAMUAT");
        assert_eq!(decoded["merchantTransactionId"], "T20240101120000000ABC123");
        assert_eq!(decoded["amount"], 350);
        assert_eq!(decoded["redirectMode"], "POST");
        assert_eq!(decoded["paymentInstrument"]["type"], "PAY_PAGE");
        assert!(decoded["merchantUserId"].as_str().unwrap().starts_with("MU"));
        assert_eq!(
            decoded["redirectUrl"],
            "https://resham.example/checkout/return?transactionId=T20240101120000000ABC123"
        );

        let expected = format!("{}###1", sha256_hex(&format!("{}/pg/v1/pay{}", encoded, SALT)));
        assert_eq!(x_verify, expected);
    }

    #[tokio::test]
    async fn test_initiate_returns_pay_page() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pg/v1/pay"))
            .and(header_exists("X-VERIFY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "code": "PAYMENT_INITIATED",
                "data": {
                    "merchantId": "RESHAMUAT",
                    "instrumentResponse": {
                        "type": "PAY_PAGE",
                        "redirectInfo": { "url": "https://wallet.test/pay/abc", "method": "GET" }
                    }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gw = gateway(&server.uri());
        let target = gw.initiate(&order()).await.unwrap();
        assert_eq!(target.url, "https://wallet.test/pay/abc");

        // The header sent must match the body sent
        let requests = server.received_requests().await.unwrap();
        let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
        let encoded = sent["request"].as_str().unwrap();
        let x_verify = requests[0].headers.get("X-VERIFY").unwrap().to_str().unwrap();
        assert_eq!(x_verify, wallet_checksum(&format!("{}/pg/v1/pay", encoded), SALT, 1));
    }

    #[tokio::test]
    async fn test_initiate_missing_redirect_is_shape_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pg/v1/pay"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": {} })),
            )
            .mount(&server)
            .await;

        let err = gateway(&server.uri()).initiate(&order()).await.unwrap_err();
        assert!(matches!(err, GatewayError::ResponseShape(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_initiate_declined() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pg/v1/pay"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "code": "BAD_REQUEST",
                "message": "Please check the inputs you have provided."
            })))
            .mount(&server)
            .await;

        let err = gateway(&server.uri()).initiate(&order()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Rejected(ref m) if m.contains("check the inputs")));
    }

    #[tokio::test]
    async fn test_initiate_server_error_is_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let err = gateway(&server.uri()).initiate(&order()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Status { status: 503, .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_initiate_unparseable_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = gateway(&server.uri()).initiate(&order()).await.unwrap_err();
        assert!(matches!(err, GatewayError::ResponseShape(_)));
    }

    #[tokio::test]
    async fn test_initiate_network_failure() {
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let err = gateway(&uri).initiate(&order()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Request(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_verify_callback_statuses() {
        let gw = gateway("https://wallet.test");
        let txn = "T20240101120000000ABC123";

        let ok = gw
            .verify_callback(&CallbackPayload::Wallet(callback(&gw, txn, "PAYMENT_SUCCESS")))
            .unwrap();
        assert_eq!(ok.status, GatewayStatus::Success);
        assert_eq!(ok.merchant_transaction_id, txn);
        assert_eq!(ok.gateway_reference.as_deref(), Some("P2401011200"));
        assert_eq!(ok.amount, Some(Money::from_minor(350)));

        let failed = gw
            .verify_callback(&CallbackPayload::Wallet(callback(&gw, txn, "PAYMENT_DECLINED")))
            .unwrap();
        assert_eq!(failed.status, GatewayStatus::Failure);

        let pending = gw
            .verify_callback(&CallbackPayload::Wallet(callback(&gw, txn, "PAYMENT_PENDING")))
            .unwrap();
        assert_eq!(pending.status, GatewayStatus::Pending);
    }

    #[test]
    fn test_callback_amount_must_be_numeric() {
        let gw = gateway("https://wallet.test");
        let mut fields = callback(&gw, "T1", "PAYMENT_SUCCESS");
        fields.insert("amount".into(), "3.50".into());
        assert!(matches!(
            gw.verify_callback(&CallbackPayload::Wallet(fields)),
            Err(GatewayError::InvalidCallback(_))
        ));

        let mut fields = callback(&gw, "T1", "PAYMENT_SUCCESS");
        fields.remove("amount");
        let verified = gw.verify_callback(&CallbackPayload::Wallet(fields)).unwrap();
        assert_eq!(verified.amount, None);
    }

    #[test]
    fn test_altered_transaction_id_fails_verification() {
        let gw = gateway("https://wallet.test");
        let mut fields = callback(&gw, "T20240101120000000ABC123", "PAYMENT_SUCCESS");
        fields.insert("transactionId".into(), "T20240101120000000XYZ999".into());

        let err = gw.verify_callback(&CallbackPayload::Wallet(fields)).unwrap_err();
        assert!(matches!(err, GatewayError::CallbackVerification(_)));
    }

    #[test]
    fn test_callback_checksum_without_index_accepted() {
        let gw = gateway("https://wallet.test");
        let txn = "T1";
        let mut fields = callback(&gw, txn, "PAYMENT_SUCCESS");
        fields.insert("checksum".into(), gw.expected_callback_digest(txn));

        assert!(gw.verify_callback(&CallbackPayload::Wallet(fields)).is_ok());
    }

    #[test]
    fn test_callback_wrong_index_or_merchant_rejected() {
        let gw = gateway("https://wallet.test");
        let txn = "T1";

        let mut fields = callback(&gw, txn, "PAYMENT_SUCCESS");
        fields.insert("checksum".into(), format!("{}###2", gw.expected_callback_digest(txn)));
        assert!(matches!(
            gw.verify_callback(&CallbackPayload::Wallet(fields)),
            Err(GatewayError::CallbackVerification(_))
        ));

        let mut fields = callback(&gw, txn, "PAYMENT_SUCCESS");
        fields.insert("merchantId".into(), "SOMEONEELSE".into());
        assert!(matches!(
            gw.verify_callback(&CallbackPayload::Wallet(fields)),
            Err(GatewayError::CallbackVerification(_))
        ));
    }

    #[test]
    fn test_callback_missing_fields() {
        let gw = gateway("https://wallet.test");
        let mut fields = callback(&gw, "T1", "PAYMENT_SUCCESS");
        fields.remove("code");

        assert!(matches!(
            gw.verify_callback(&CallbackPayload::Wallet(fields)),
            Err(GatewayError::InvalidCallback(_))
        ));

        let card = CallbackPayload::Card {
            body: "{}".into(),
            signature: String::new(),
        };
        assert!(matches!(gw.verify_callback(&card), Err(GatewayError::InvalidCallback(_))));
    }

    #[tokio::test]
    async fn test_fetch_status() {
        let server = MockServer::start().await;
        let status_path = "/pg/v1/status/RESHAMUAT/T20240101120000000ABC123";
        Mock::given(method("GET"))
            .and(path(status_path))
            .and(header("X-MERCHANT-ID", "RESHAMUAT"))
            .and(header("X-VERIFY", wallet_checksum(status_path, SALT, 1).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "code": "PAYMENT_SUCCESS",
                "data": { "providerReferenceId": "P123" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let status = gateway(&server.uri())
            .fetch_status("T20240101120000000ABC123", None)
            .await
            .unwrap();
        assert_eq!(status.status, GatewayStatus::Success);
        assert_eq!(status.gateway_reference.as_deref(), Some("P123"));
    }

    #[tokio::test]
    async fn test_fetch_status_without_code_is_shape_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .mount(&server)
            .await;

        let err = gateway(&server.uri()).fetch_status("T1", None).await.unwrap_err();
        assert!(matches!(err, GatewayError::ResponseShape(_)));
    }
}
