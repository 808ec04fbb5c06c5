use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use starlinker_catalog::{NewProduct, Product, ProductCondition, ProductRepository};
use starlinker_core::Identity;
use starlinker_order::{Delivery, DeliveryListing, DeliveryStatus, OrderStats, TrackerError};
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct AdvanceStatusRequest {
    pub status: String,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDeliveryRequest {
    pub current_location: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    /// Defaults to the calling administrator
    pub seller_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub condition: ProductCondition,
    pub price: i64,
    pub stock_quantity: i32,
    pub location: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/deliveries", get(list_deliveries))
        .route("/v1/admin/deliveries/{id}", patch(update_delivery))
        .route("/v1/admin/deliveries/{id}/status", post(advance_status))
        .route("/v1/admin/products", post(create_product))
        .route("/v1/admin/stats", get(order_stats))
}

/// GET /v1/admin/deliveries
async fn list_deliveries(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<DeliveryListing>>, AppError> {
    Ok(Json(state.tracker.list_deliveries(&identity).await?))
}

/// GET /v1/admin/stats
async fn order_stats(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<OrderStats>, AppError> {
    Ok(Json(state.tracker.order_stats(&identity).await?))
}

/// POST /v1/admin/deliveries/{id}/status
async fn advance_status(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(delivery_id): Path<Uuid>,
    Json(req): Json<AdvanceStatusRequest>,
) -> Result<Json<Delivery>, AppError> {
    let next: DeliveryStatus = req.status.parse().map_err(AppError::ValidationError)?;
    let delivery = state
        .tracker
        .advance_delivery_status(&identity, delivery_id, next, req.location)
        .await?;
    Ok(Json(delivery))
}

/// PATCH /v1/admin/deliveries/{id}
async fn update_delivery(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(delivery_id): Path<Uuid>,
    Json(req): Json<UpdateDeliveryRequest>,
) -> Result<Json<Delivery>, AppError> {
    let delivery = state
        .tracker
        .update_delivery_details(&identity, delivery_id, req.current_location, req.estimated_delivery)
        .await?;
    Ok(Json(delivery))
}

/// POST /v1/admin/products
async fn create_product(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    if !identity.is_admin() {
        return Err(TrackerError::Forbidden("administrator role required".to_string()).into());
    }

    let product = NewProduct {
        seller_id: req.seller_id.unwrap_or(identity.user_id),
        title: req.title,
        description: req.description,
        category: req.category,
        condition: req.condition,
        price: req.price,
        stock_quantity: req.stock_quantity,
        location: req.location,
    }
    .into_product()?;

    state.tracker.store().create_product(&product).await?;
    tracing::info!("Product {} created by admin {}", product.id, identity.user_id);
    Ok((StatusCode::CREATED, Json(product)))
}
