//! Payment intent endpoint
//!
//! Reachable without authentication (guest checkout is allowed), so the
//! computation must be attacker-resistant: the cart is re-priced from the
//! catalog with the same bounds as checkout, and the intent amount is the
//! recomputed total. The request carries no amount to trust.

use axum::extract::State;
use axum::Json;
use shared::order::{
    ConfirmPaymentRequest, ConfirmPaymentResponse, CreatePaymentIntentRequest,
    PaymentIntentResponse,
};

use crate::error::ServiceError;
use crate::orders::LedgerError;
use crate::payments::{confirm_payment, reconcile};
use crate::pricing::price_order;
use crate::state::AppState;
use crate::stripe::IntentMetadata;

/// POST /api/payment-intents
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreatePaymentIntentRequest>,
) -> Result<Json<PaymentIntentResponse>, ServiceError> {
    let priced = price_order(
        state.catalog.as_ref(),
        &req.lines,
        req.order_type,
        &state.pricing_config(),
    )
    .await?;

    let order_number = req.order_number.clone().unwrap_or_default();
    let metadata = IntentMetadata {
        order_number: order_number.clone(),
        customer_name: req.customer.name.clone(),
        customer_phone: req.customer.phone.clone(),
        order_type: req.order_type.as_db().to_string(),
        delivery_address: req.delivery_address.clone().unwrap_or_default(),
        receipt_email: req.customer.email.clone(),
    };

    let intent = state
        .stripe
        .create_payment_intent(priced.total, &state.config.currency, &metadata)
        .await?;

    tracing::info!(
        order_number = %order_number,
        intent_id = %intent.id,
        amount = priced.total,
        "Payment intent created"
    );

    // Stamp the reference if the order row already exists. If it doesn't yet,
    // the webhook stamps it at reconcile time via the intent metadata.
    if let Some(number) = &req.order_number {
        match state.ledger.get_order_by_number(number).await {
            Ok(order) => {
                if let Err(e) = state
                    .ledger
                    .stamp_payment_reference(order.id, &intent.id)
                    .await
                {
                    // Don't leave a chargeable intent pointing at an order we
                    // failed to update: void it, then surface the failure.
                    tracing::error!(
                        order_number = %number,
                        intent_id = %intent.id,
                        error = %e,
                        "Failed to stamp payment reference, cancelling intent"
                    );
                    if let Err(cancel_err) = state.stripe.cancel_payment_intent(&intent.id).await {
                        tracing::error!(
                            intent_id = %intent.id,
                            error = %cancel_err,
                            "Failed to cancel orphaned payment intent, manual cleanup required"
                        );
                    }
                    return Err(e.into());
                }
            }
            Err(LedgerError::NotFound(_)) => {
                // Client creates the intent before the order row; fine.
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(Json(PaymentIntentResponse {
        client_secret: intent.client_secret,
        publishable_key: state.config.stripe_publishable_key.clone(),
    }))
}

/// POST /api/payment-intents/confirm
///
/// Pull-side counterpart of the webhook: the customer page calls this after
/// returning from the payment flow. The provider is queried for the real
/// status; reconciliation uses the same CAS discipline as the webhook, so a
/// race between the two is harmless (one advances, the other no-ops).
pub async fn confirm(
    State(state): State<AppState>,
    Json(req): Json<ConfirmPaymentRequest>,
) -> Result<Json<ConfirmPaymentResponse>, ServiceError> {
    let status = confirm_payment(&state.stripe, &req.intent_id).await?;

    reconcile(
        &state.ledger,
        &req.order_number,
        &req.intent_id,
        status,
        state.config.payment_auto_accept,
    )
    .await?;

    // Authoritative state after reconciliation; 404s if the order row never
    // existed (the reconciliation gap is already logged)
    let order = state.ledger.get_order_by_number(&req.order_number).await?;

    Ok(Json(ConfirmPaymentResponse {
        payment_status: status.as_str().to_string(),
        order,
    }))
}
