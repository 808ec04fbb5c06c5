use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use starlinker_catalog::{Product, ProductRepository};
use starlinker_order::{ProductReviews, TrackerError};
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/products/{id}", get(get_product))
        .route("/v1/products/{id}/reviews", get(product_reviews))
}

/// GET /v1/products/{id}
async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Product>, AppError> {
    let product = state
        .tracker
        .store()
        .get_product(product_id)
        .await?
        .ok_or_else(|| TrackerError::NotFound(format!("product {}", product_id)))?;
    Ok(Json(product))
}

/// GET /v1/products/{id}/reviews
async fn product_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ProductReviews>, AppError> {
    Ok(Json(state.tracker.product_reviews(product_id).await?))
}
