use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Extension, Json, Router,
};
use futures_util::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use starlinker_core::Identity;
use starlinker_order::{CartLine, DeliveryInfo, OrderSummary, OrderView, PlacedOrder, Review};
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub items: Vec<CartLine>,
    pub delivery: DeliveryInfo,
}

#[derive(Debug, Deserialize)]
pub struct SubmitReviewRequest {
    pub product_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/orders", post(place_order).get(list_orders))
        .route("/v1/orders/{id}", get(get_order))
        .route("/v1/orders/{id}/cancel", post(cancel_order))
        .route("/v1/orders/{id}/reviews", post(submit_review))
        .route("/v1/orders/{id}/delivery/stream", get(delivery_stream))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/orders
async fn place_order(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<PlacedOrder>), AppError> {
    let placed = state.tracker.place_order(&identity, req.items, req.delivery).await?;
    Ok((StatusCode::CREATED, Json(placed)))
}

/// GET /v1/orders
async fn list_orders(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<OrderSummary>>, AppError> {
    Ok(Json(state.tracker.list_orders(&identity).await?))
}

/// GET /v1/orders/{id}
async fn get_order(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderView>, AppError> {
    Ok(Json(state.tracker.get_order_view(&identity, order_id).await?))
}

/// POST /v1/orders/{id}/cancel
async fn cancel_order(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderView>, AppError> {
    Ok(Json(state.tracker.cancel_order(&identity, order_id).await?))
}

/// POST /v1/orders/{id}/reviews
async fn submit_review(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(order_id): Path<Uuid>,
    Json(req): Json<SubmitReviewRequest>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let review = state
        .tracker
        .submit_review(&identity, order_id, req.product_id, req.rating, req.comment)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// GET /v1/orders/{id}/delivery/stream
///
/// Sends the current progress first, then every status change of this
/// order's delivery as it happens.
async fn delivery_stream(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(order_id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, AppError> {
    // Subscribe before reading so no change slips between the two.
    let rx = state.delivery_tx.subscribe();
    let view = state.tracker.get_order_view(&identity, order_id).await?;

    let snapshot = Event::default().event("progress").json_data(&view.progress);
    let updates = BroadcastStream::new(rx).filter_map(move |result| async move {
        match result {
            Ok(change) if change.order_id == order_id => {
                Some(Event::default().event("delivery_status").json_data(&change))
            }
            _ => None,
        }
    });

    let stream = stream::once(async move { snapshot }).chain(updates);
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
