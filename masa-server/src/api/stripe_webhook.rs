//! Stripe webhook handler
//!
//! POST /stripe/webhook — handles Stripe events (raw body for signature
//! verification).

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use shared::util::now_millis;

use crate::payments::{reconcile, PaymentStatus};
use crate::state::AppState;
use crate::stripe::{verify_webhook_signature, IntentEventObject};

/// Handle incoming Stripe webhook events
///
/// Must receive raw body (not JSON) for HMAC signature verification.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    // 1. Get Stripe-Signature header
    let sig_header = match headers.get("stripe-signature").and_then(|v| v.to_str().ok()) {
        Some(s) => s,
        None => {
            tracing::warn!("Missing Stripe-Signature header");
            return StatusCode::BAD_REQUEST;
        }
    };

    // 2. Verify signature
    if let Err(e) = verify_webhook_signature(&body, sig_header, &state.config.stripe_webhook_secret)
    {
        tracing::warn!(error = e, "Webhook signature verification failed");
        return StatusCode::BAD_REQUEST;
    }

    // 3. Parse JSON event
    let event: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(%e, "Failed to parse webhook JSON");
            return StatusCode::BAD_REQUEST;
        }
    };

    let event_type = event["type"].as_str().unwrap_or("");
    tracing::info!(event_type = event_type, "Received Stripe webhook");

    // 4. Idempotency: INSERT first, check rows_affected (eliminates TOCTOU race)
    let event_id = match event["id"].as_str() {
        Some(id) => id,
        None => {
            tracing::warn!("Webhook event missing id");
            return StatusCode::BAD_REQUEST;
        }
    };

    let insert_result = sqlx::query(
        "INSERT INTO processed_webhook_events (event_id, event_type, processed_at)
         VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
    )
    .bind(event_id)
    .bind(event_type)
    .bind(now_millis())
    .execute(&state.pool)
    .await;

    match insert_result {
        Ok(r) if r.rows_affected() == 0 => {
            tracing::info!(event_id = event_id, "Duplicate webhook event, skipping");
            return StatusCode::OK;
        }
        Err(e) => {
            tracing::error!(%e, "DB error recording webhook event");
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        Ok(_) => {} // New event, proceed
    }

    // 5. Handle event types
    match event_type {
        "payment_intent.succeeded" | "payment_intent.payment_failed" => {
            handle_intent_event(&state, &event).await
        }
        _ => {
            tracing::debug!(event_type = event_type, "Unhandled webhook event type");
            StatusCode::OK
        }
    }
}

/// payment_intent.* → reconcile against the stored order
async fn handle_intent_event(state: &AppState, event: &serde_json::Value) -> StatusCode {
    let obj = match event.get("data").and_then(|d| d.get("object")) {
        Some(o) => o,
        None => return StatusCode::OK,
    };

    let intent: IntentEventObject = match serde_json::from_value(obj.clone()) {
        Ok(i) => i,
        Err(e) => {
            tracing::warn!(%e, "Malformed payment_intent object in webhook");
            return StatusCode::BAD_REQUEST;
        }
    };

    let order_number = match intent.order_number() {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => {
            // An intent we did not create (or created without a number);
            // nothing to reconcile against.
            tracing::warn!(
                intent_id = %intent.id,
                "Intent event without order_number metadata, skipping"
            );
            return StatusCode::OK;
        }
    };

    let status = PaymentStatus::from_provider(&intent.status);
    match reconcile(
        &state.ledger,
        &order_number,
        &intent.id,
        status,
        state.config.payment_auto_accept,
    )
    .await
    {
        Ok(outcome) => {
            tracing::debug!(order_number = %order_number, outcome = ?outcome, "Reconcile finished");
            StatusCode::OK
        }
        Err(e) => {
            tracing::error!(order_number = %order_number, error = %e, "Reconcile failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
