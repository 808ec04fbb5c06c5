use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;
use starlinker_catalog::ProductRepository;

use crate::delivery::{Delivery, DeliveryStatus};
use crate::models::{Order, OrderItem, OrderStatus};
use crate::review::Review;

/// Everything written when an order is placed. Applied all-or-nothing.
#[derive(Debug, Clone)]
pub struct Placement {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub delivery: Delivery,
    /// Units to take out of stock, per product
    pub stock: BTreeMap<Uuid, u32>,
}

/// A compare-and-swap on a delivery's status, plus what follows from it.
#[derive(Debug, Clone)]
pub struct DeliveryTransition {
    pub delivery_id: Uuid,
    pub order_id: Uuid,
    pub expected: DeliveryStatus,
    pub next: DeliveryStatus,
    pub location: Option<String>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub order_status: Option<OrderStatus>,
    /// Return the order's units to stock
    pub restock: bool,
    pub at: DateTime<Utc>,
}

/// Location / ETA edit, guarded by the status it was computed against
#[derive(Debug, Clone)]
pub struct DeliveryDetails {
    pub delivery_id: Uuid,
    pub expected: DeliveryStatus,
    pub location: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub at: DateTime<Utc>,
}

/// An order with its line items and delivery
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub delivery: Delivery,
}

/// Durable storage for orders, deliveries and reviews.
///
/// Implementations must make `commit_placement` and `transition_delivery`
/// atomic, and must enforce review uniqueness on `(order_id, product_id)`
/// themselves.
#[async_trait]
pub trait FulfillmentStore: ProductRepository {
    async fn commit_placement(&self, placement: &Placement) -> Result<(), StoreError>;

    async fn get_order(&self, order_id: Uuid) -> Result<Option<OrderRecord>, StoreError>;

    /// The buyer's orders with their deliveries, newest first
    async fn list_orders_for_buyer(
        &self,
        buyer_id: Uuid,
    ) -> Result<Vec<OrderRecord>, StoreError>;

    async fn get_delivery(&self, delivery_id: Uuid) -> Result<Option<Delivery>, StoreError>;

    /// Every delivery with its order, newest first
    async fn list_deliveries(&self) -> Result<Vec<(Delivery, Order)>, StoreError>;

    /// Fails with `StatusConflict` when the stored status is not `expected`.
    async fn transition_delivery(
        &self,
        transition: &DeliveryTransition,
    ) -> Result<Delivery, StoreError>;

    /// Fails with `StatusConflict` when the stored status is not `expected`.
    async fn update_delivery_details(
        &self,
        details: &DeliveryDetails,
    ) -> Result<Delivery, StoreError>;

    /// Fails with `Duplicate` when the pair is already reviewed.
    async fn insert_review(&self, review: &Review) -> Result<(), StoreError>;

    async fn reviews_for_order(&self, order_id: Uuid) -> Result<Vec<Review>, StoreError>;

    async fn reviews_for_product(&self, product_id: Uuid) -> Result<Vec<Review>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Delivery status changed concurrently, now {actual}")]
    StatusConflict { actual: DeliveryStatus },

    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: Uuid,
        requested: u32,
        available: u32,
    },

    #[error("Product unavailable: {0}")]
    ProductUnavailable(String),

    #[error("Storage backend failed: {0}")]
    Backend(String),
}
