//! Payment reconciliation
//!
//! Bridges provider-side payment state into the order ledger. The reconciler
//! is the only writer of the payment-triggered `pending → preparing`
//! transition and uses the ledger's compare-and-swap, so a late confirmation
//! can never resurrect a cancelled order.
//!
//! Anomalies (payment succeeded but no matching order, or the order already
//! moved on) are logged as operational alerts and reported in the outcome:
//! never crashes, never silent drops, never auto-created duplicate orders.


use shared::models::OrderStatus;

use crate::orders::{LedgerError, LedgerResult, OrderLedger};
use crate::stripe::{StripeClient, StripeError};

/// Internal view of a provider intent status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Succeeded,
    Processing,
    RequiresAction,
    Failed,
}

impl PaymentStatus {
    /// Map a Stripe intent status string to the internal enum
    pub fn from_provider(status: &str) -> Self {
        match status {
            "succeeded" => Self::Succeeded,
            "processing" => Self::Processing,
            "requires_action" | "requires_confirmation" => Self::RequiresAction,
            // requires_payment_method also covers declined-and-retryable
            _ => Self::Failed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Processing => "processing",
            Self::RequiresAction => "requires_action",
            Self::Failed => "failed",
        }
    }
}

/// Query the provider for an intent's current state.
pub async fn confirm_payment(
    stripe: &StripeClient,
    intent_id: &str,
) -> Result<PaymentStatus, StripeError> {
    let status = stripe.get_payment_intent_status(intent_id).await?;
    Ok(PaymentStatus::from_provider(&status))
}

/// What reconciliation did with a confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Payment confirmed; order advanced `pending → preparing`
    Advanced,
    /// Payment confirmed and stamped; order left `pending` (manual acceptance
    /// policy, or a concurrent writer got there first)
    Recorded,
    /// Order already past `pending` (duplicate webhook or terminal state)
    AlreadyProcessed,
    /// Payment succeeded but no order row exists: a reconciliation gap
    /// requiring manual resolution
    OrderMissing,
    /// Provider reported a non-success status; order untouched
    NotConfirmed(PaymentStatus),
}

/// Reconcile a provider confirmation against the stored order.
///
/// `auto_accept` controls whether a confirmed payment advances the order to
/// `preparing` or leaves it `pending` for manual kitchen acceptance.
pub async fn reconcile(
    ledger: &OrderLedger,
    order_number: &str,
    intent_id: &str,
    status: PaymentStatus,
    auto_accept: bool,
) -> LedgerResult<ReconcileOutcome> {
    if status != PaymentStatus::Succeeded {
        tracing::info!(
            order_number,
            intent_id,
            status = ?status,
            "Payment not confirmed, order left untouched"
        );
        return Ok(ReconcileOutcome::NotConfirmed(status));
    }

    let order = match ledger.get_order_by_number(order_number).await {
        Ok(order) => order,
        Err(LedgerError::NotFound(_)) => {
            // A captured payment with no order row is money without a home.
            // Surface loudly for manual resolution; an automatic retry or an
            // auto-created order would be worse than the gap itself.
            tracing::error!(
                order_number,
                intent_id,
                "RECONCILIATION GAP: payment succeeded but no matching order row"
            );
            return Ok(ReconcileOutcome::OrderMissing);
        }
        Err(e) => return Err(e),
    };

    if order.status != OrderStatus::Pending {
        // Duplicate webhook, or the order was cancelled/advanced before the
        // confirmation arrived. Either way the confirmation is a no-op.
        tracing::info!(
            order_number,
            intent_id,
            status = order.status.as_db(),
            "Payment confirmation for order already past pending, no-op"
        );
        return Ok(ReconcileOutcome::AlreadyProcessed);
    }

    ledger.stamp_payment_reference(order.id, intent_id).await?;

    if !auto_accept {
        tracing::info!(
            order_number,
            intent_id,
            "Payment recorded, awaiting manual kitchen acceptance"
        );
        return Ok(ReconcileOutcome::Recorded);
    }

    match ledger.transition(order.id, OrderStatus::Preparing).await {
        Ok(_) => {
            tracing::info!(order_number, intent_id, "Payment confirmed, order advanced");
            Ok(ReconcileOutcome::Advanced)
        }
        // Someone else moved the order between our read and the CAS write
        // (kitchen acceptance, cancellation, a duplicate webhook). The
        // payment is stamped; the order keeps whatever state won.
        Err(LedgerError::StatusConflict) | Err(LedgerError::InvalidTransition { .. }) => {
            tracing::info!(
                order_number,
                intent_id,
                "Order moved concurrently during reconcile, no-op"
            );
            Ok(ReconcileOutcome::AlreadyProcessed)
        }
        Err(e) => Err(e),
    }
}
