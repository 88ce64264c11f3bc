//! API routes
//!
//! - [`orders`] — checkout, lookup, kitchen queue, status transitions
//! - [`payment_intents`] — server-priced Stripe intent creation
//! - [`stripe_webhook`] — provider confirmations (signature-verified, raw body)
//! - [`feed`] — WebSocket order feed (notify-then-refetch)
//! - [`health`] — health check

pub mod feed;
pub mod health;
pub mod orders;
pub mod payment_intents;
pub mod stripe_webhook;

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Order lifecycle (checkout + kitchen)
    let orders = Router::new()
        .route("/api/orders", post(orders::create).get(orders::list))
        .route("/api/orders/active", get(orders::list_active))
        .route("/api/orders/feed", get(feed::order_feed))
        .route(
            "/api/orders/{id}",
            get(orders::get_by_id).delete(orders::delete),
        )
        .route("/api/orders/{id}/status", patch(orders::update_status));

    // Payments (guest-reachable; server-side re-pricing is the defense)
    let payments = Router::new()
        .route("/api/payment-intents", post(payment_intents::create))
        .route(
            "/api/payment-intents/confirm",
            post(payment_intents::confirm),
        )
        .route("/stripe/webhook", post(stripe_webhook::handle_webhook));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(orders)
        .merge(payments)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
