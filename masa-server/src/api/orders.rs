//! Order API handlers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use shared::error::ApiResponse;
use shared::models::Order;
use shared::order::{CreateOrderRequest, StatusUpdateRequest};

use crate::error::ServiceError;
use crate::orders::validate_order_request;
use crate::pricing::price_order;
use crate::state::AppState;

/// POST /api/orders (checkout)
///
/// Validates customer input first (a delivery order without an address fails
/// before any catalog read), prices the cart from the catalog, then persists
/// order + lines atomically.
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ServiceError> {
    validate_order_request(
        &req.customer,
        req.order_type,
        &req.delivery_address,
        &req.notes,
    )?;

    let priced = price_order(
        state.catalog.as_ref(),
        &req.lines,
        req.order_type,
        &state.pricing_config(),
    )
    .await?;

    let order = state
        .ledger
        .create_order(
            &req.customer,
            req.order_type,
            req.delivery_address,
            req.notes,
            priced,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

/// Query params for GET /api/orders
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Look up a single order by its human-readable number
    pub order_number: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/orders: by order number, or recent orders for the back office
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Order>>, ServiceError> {
    if let Some(number) = &query.order_number {
        let order = state.ledger.get_order_by_number(number).await?;
        return Ok(Json(vec![order]));
    }

    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);
    let orders = state.ledger.list_recent(limit, offset).await?;
    Ok(Json(orders))
}

/// GET /api/orders/active (kitchen queue, oldest first)
pub async fn list_active(
    State(state): State<AppState>,
) -> Result<Json<Vec<Order>>, ServiceError> {
    let orders = state.ledger.list_active().await?;
    Ok(Json(orders))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Order>, ServiceError> {
    let order = state.ledger.get_order(id).await?;
    Ok(Json(order))
}

/// PATCH /api/orders/{id}/status
///
/// Invalid edges and lost CAS races come back as 409; the caller re-fetches
/// and retries its intent.
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<Order>, ServiceError> {
    let order = state.ledger.transition(id, req.status).await?;
    Ok(Json(order))
}

/// DELETE /api/orders/{id} (administrative override)
///
/// Normal cancellation is `PATCH status=cancelled`; this removes the rows.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    state.ledger.delete_order(id).await?;
    Ok(Json(ApiResponse::ok()))
}
