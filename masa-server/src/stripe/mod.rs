//! Stripe integration via REST API (no SDK dependency)
//!
//! Payment intents sized server-side, plus webhook signature verification.
//! Every call has a bounded timeout; a timeout surfaces as a retryable
//! provider error, never a hung request.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use shared::error::{AppError, ErrorCode};
use std::time::Duration;
use thiserror::Error;

/// Timeout for provider calls
const STRIPE_TIMEOUT: Duration = Duration::from_secs(10);

/// Replay window for webhook timestamps (5 minutes)
const WEBHOOK_TOLERANCE_SECS: i64 = 300;

/// Provider errors
#[derive(Debug, Error)]
pub enum StripeError {
    /// Transport-level failure (connect, timeout), retryable
    #[error("Stripe request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe answered but the payload was not what we asked for
    #[error("Stripe response malformed: {0}")]
    Malformed(String),

    /// Stripe rejected the request (bad key, unknown intent, etc.)
    #[error("Stripe error: {0}")]
    Api(String),
}

impl From<StripeError> for AppError {
    fn from(err: StripeError) -> Self {
        match &err {
            StripeError::Http(e) if e.is_timeout() => {
                AppError::with_message(ErrorCode::TimeoutError, "Payment provider timed out")
            }
            StripeError::Http(_) => {
                AppError::with_message(ErrorCode::NetworkError, "Payment provider unreachable")
            }
            StripeError::Malformed(_) | StripeError::Api(_) => {
                tracing::error!(error = %err, "Stripe API error");
                AppError::with_message(ErrorCode::PaymentFailed, "Payment processing failed")
            }
        }
    }
}

/// A created payment intent
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

/// Metadata echoed onto the intent for reconciliation and receipts
#[derive(Debug, Clone, Default)]
pub struct IntentMetadata {
    pub order_number: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub order_type: String,
    pub delivery_address: String,
    pub receipt_email: Option<String>,
}

/// Minimal Stripe client over the REST API
#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
}

impl StripeClient {
    pub fn new(secret_key: impl Into<String>) -> Self {
        // Startup-time construction; only fails if the TLS backend is broken
        let http = reqwest::Client::builder()
            .timeout(STRIPE_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");
        Self {
            http,
            secret_key: secret_key.into(),
        }
    }

    /// Create a PaymentIntent for `amount` minor units.
    ///
    /// The amount is whatever the pricing engine computed; callers must
    /// never pass a client-supplied figure.
    pub async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
        metadata: &IntentMetadata,
    ) -> Result<PaymentIntent, StripeError> {
        let amount_str = amount.to_string();
        let description = format!("Order {}", metadata.order_number);
        let mut form: Vec<(&str, &str)> = vec![
            ("amount", &amount_str),
            ("currency", currency),
            ("payment_method_types[]", "card"),
            ("description", &description),
            ("metadata[order_number]", &metadata.order_number),
            ("metadata[customer_name]", &metadata.customer_name),
            ("metadata[customer_phone]", &metadata.customer_phone),
            ("metadata[order_type]", &metadata.order_type),
            ("metadata[delivery_address]", &metadata.delivery_address),
        ];
        if let Some(email) = &metadata.receipt_email {
            form.push(("receipt_email", email));
        }

        let resp: serde_json::Value = self
            .http
            .post("https://api.stripe.com/v1/payment_intents")
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&form)
            .send()
            .await?
            .json()
            .await?;

        if let Some(err) = resp.get("error") {
            return Err(StripeError::Api(
                err["message"].as_str().unwrap_or("unknown").to_string(),
            ));
        }

        let id = resp["id"]
            .as_str()
            .ok_or_else(|| StripeError::Malformed(format!("missing id: {resp}")))?;
        let client_secret = resp["client_secret"]
            .as_str()
            .ok_or_else(|| StripeError::Malformed(format!("missing client_secret: {resp}")))?;

        Ok(PaymentIntent {
            id: id.to_string(),
            client_secret: client_secret.to_string(),
        })
    }

    /// Fetch the current status string of an intent
    pub async fn get_payment_intent_status(&self, intent_id: &str) -> Result<String, StripeError> {
        let resp: serde_json::Value = self
            .http
            .get(format!(
                "https://api.stripe.com/v1/payment_intents/{intent_id}"
            ))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await?
            .json()
            .await?;

        if let Some(err) = resp.get("error") {
            return Err(StripeError::Api(
                err["message"].as_str().unwrap_or("unknown").to_string(),
            ));
        }

        resp["status"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| StripeError::Malformed(format!("missing status: {resp}")))
    }

    /// Cancel an intent. Used to void an intent whose order never persisted,
    /// so a failed checkout does not leave a chargeable orphan.
    pub async fn cancel_payment_intent(&self, intent_id: &str) -> Result<(), StripeError> {
        let resp: serde_json::Value = self
            .http
            .post(format!(
                "https://api.stripe.com/v1/payment_intents/{intent_id}/cancel"
            ))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await?
            .json()
            .await?;

        if let Some(err) = resp.get("error") {
            return Err(StripeError::Api(
                err["message"].as_str().unwrap_or("unknown").to_string(),
            ));
        }
        Ok(())
    }
}

/// Payload extracted from a `payment_intent.*` webhook event
#[derive(Debug, Clone, Deserialize)]
pub struct IntentEventObject {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl IntentEventObject {
    pub fn order_number(&self) -> Option<&str> {
        self.metadata.get("order_number").and_then(|v| v.as_str())
    }
}

/// Verify Stripe webhook signature (HMAC-SHA256)
pub fn verify_webhook_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
) -> Result<(), &'static str> {
    let mut timestamp = "";
    let mut signature = "";
    for part in sig_header.split(',') {
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signature = v;
        }
    }

    if timestamp.is_empty() || signature.is_empty() {
        return Err("Invalid Stripe-Signature header");
    }

    let signed_payload = format!("{timestamp}.{}", std::str::from_utf8(payload).unwrap_or(""));
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(signed_payload.as_bytes());

    // Decode hex signature and use constant-time comparison via hmac::verify_slice
    let sig_bytes = hex::decode(signature).map_err(|_| "Invalid signature hex")?;
    mac.verify_slice(&sig_bytes)
        .map_err(|_| "Webhook signature mismatch")?;

    // Reject events older than the tolerance window to prevent replay attacks
    let ts: i64 = timestamp.parse().map_err(|_| "Invalid timestamp")?;
    let now = chrono::Utc::now().timestamp();
    if (now - ts).abs() > WEBHOOK_TOLERANCE_SECS {
        return Err("Webhook timestamp too old");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmac::Mac;

    fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
        let signed = format!("{timestamp}.{}", std::str::from_utf8(payload).unwrap());
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(signed.as_bytes());
        let sig = hex::encode(mac.finalize().into_bytes());
        format!("t={timestamp},v1={sig}")
    }

    #[test]
    fn test_valid_signature_accepted() {
        let payload = br#"{"id":"evt_1","type":"payment_intent.succeeded"}"#;
        let secret = "whsec_test";
        let header = sign(payload, secret, chrono::Utc::now().timestamp());
        assert!(verify_webhook_signature(payload, &header, secret).is_ok());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let payload = br#"{"id":"evt_1"}"#;
        let secret = "whsec_test";
        let header = sign(payload, secret, chrono::Utc::now().timestamp());
        assert!(verify_webhook_signature(br#"{"id":"evt_2"}"#, &header, secret).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let payload = br#"{"id":"evt_1"}"#;
        let header = sign(payload, "whsec_a", chrono::Utc::now().timestamp());
        assert!(verify_webhook_signature(payload, &header, "whsec_b").is_err());
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let payload = br#"{"id":"evt_1"}"#;
        let secret = "whsec_test";
        let header = sign(payload, secret, chrono::Utc::now().timestamp() - 3600);
        assert_eq!(
            verify_webhook_signature(payload, &header, secret),
            Err("Webhook timestamp too old")
        );
    }

    #[test]
    fn test_missing_header_parts_rejected() {
        let payload = br#"{}"#;
        assert!(verify_webhook_signature(payload, "t=123", "s").is_err());
        assert!(verify_webhook_signature(payload, "v1=abcd", "s").is_err());
        assert!(verify_webhook_signature(payload, "", "s").is_err());
    }

    #[test]
    fn test_intent_event_object_metadata() {
        let json = r#"{
            "id": "pi_123",
            "status": "succeeded",
            "metadata": {"order_number": "ORD-20250806-0001"}
        }"#;
        let obj: IntentEventObject = serde_json::from_str(json).unwrap();
        assert_eq!(obj.order_number(), Some("ORD-20250806-0001"));
        assert_eq!(obj.status, "succeeded");
    }
}
