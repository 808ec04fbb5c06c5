use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use uuid::Uuid;
use starlinker_catalog::{inventory, pricing, CatalogError, Product};
use starlinker_core::{EventSink, Identity};
use starlinker_shared::models::events::{
    DeliveryStatusChangedEvent, DomainEvent, OrderPlacedEvent, ReviewSubmittedEvent,
};
use starlinker_shared::Masked;

use crate::delivery::{Delivery, DeliveryStatus};
use crate::models::{DeliveryAddress, Order, OrderItem};
use crate::review::{ProductReviews, Review};
use crate::store::{
    DeliveryDetails, DeliveryTransition, FulfillmentStore, OrderRecord, Placement, StoreError,
};
use crate::view::{DeliveryListing, OrderStats, OrderSummary, OrderView};

/// Tunables for placement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub estimated_delivery_days: i64,
    /// Flat fee added on top of the subtotal
    pub delivery_fee: i64,
}

/// Upper bound for the delivery estimate offset
pub const MAX_ESTIMATED_DELIVERY_DAYS: i64 = 365;

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.delivery_fee < 0 {
            return Err(TrackerError::Validation(format!(
                "delivery fee must not be negative, got {}",
                self.delivery_fee
            )));
        }
        if !(1..=MAX_ESTIMATED_DELIVERY_DAYS).contains(&self.estimated_delivery_days) {
            return Err(TrackerError::Validation(format!(
                "estimated delivery days must be between 1 and {}, got {}",
                MAX_ESTIMATED_DELIVERY_DAYS, self.estimated_delivery_days
            )));
        }
        Ok(())
    }

    /// Placement time plus the configured offset.
    fn estimated_delivery(&self, placed_at: DateTime<Utc>) -> Result<DateTime<Utc>, TrackerError> {
        Duration::try_days(self.estimated_delivery_days)
            .and_then(|offset| placed_at.checked_add_signed(offset))
            .ok_or_else(|| {
                TrackerError::Validation(format!(
                    "estimated delivery {} days out of range",
                    self.estimated_delivery_days
                ))
            })
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            estimated_delivery_days: 3,
            delivery_fee: 0,
        }
    }
}

/// One cart line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: u32,
}

/// Checkout form data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryInfo {
    pub address: String,
    pub city: String,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub phone: String,
    pub notes: Option<String>,
}

impl DeliveryInfo {
    fn validate(self) -> Result<(DeliveryAddress, Option<String>), TrackerError> {
        for (field, value) in [("address", &self.address), ("city", &self.city), ("phone", &self.phone)] {
            if value.trim().is_empty() {
                return Err(TrackerError::Validation(format!("{} is required", field)));
            }
        }
        let notes = self.notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        Ok((
            DeliveryAddress {
                address: Masked(self.address.trim().to_string()),
                city: self.city.trim().to_string(),
                state: self.state,
                zip: self.zip,
                phone: Masked(self.phone.trim().to_string()),
            },
            notes,
        ))
    }
}

/// Result of a successful checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub delivery: Delivery,
}

/// Owns the order lifecycle: placement, delivery progression, the
/// purchaser's view and review eligibility.
pub struct OrderTracker {
    store: Arc<dyn FulfillmentStore>,
    events: Arc<dyn EventSink>,
    config: TrackerConfig,
}

impl OrderTracker {
    pub fn new(
        store: Arc<dyn FulfillmentStore>,
        events: Arc<dyn EventSink>,
        config: TrackerConfig,
    ) -> Result<Self, TrackerError> {
        config.validate()?;
        Ok(Self { store, events, config })
    }

    pub fn store(&self) -> &Arc<dyn FulfillmentStore> {
        &self.store
    }

    /// Checkout: price the cart at today's prices, take the units out of
    /// stock and create the order, its items and its delivery in one go.
    pub async fn place_order(
        &self,
        identity: &Identity,
        lines: Vec<CartLine>,
        info: DeliveryInfo,
    ) -> Result<PlacedOrder, TrackerError> {
        if lines.is_empty() {
            return Err(TrackerError::Validation("cart is empty".to_string()));
        }
        if let Some(line) = lines.iter().find(|l| l.quantity == 0) {
            return Err(TrackerError::Validation(format!(
                "quantity must be positive for product {}",
                line.product_id
            )));
        }
        let (address, notes) = info.validate()?;

        let stock = inventory::aggregate_quantities(lines.iter().map(|l| (l.product_id, l.quantity)));
        let ids: Vec<Uuid> = stock.keys().copied().collect();
        let products: HashMap<Uuid, Product> = self
            .store
            .get_products(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        for (product_id, requested) in &stock {
            let product = products
                .get(product_id)
                .ok_or_else(|| TrackerError::Validation(format!("unknown product {}", product_id)))?;
            inventory::check_stock(product, *requested)
                .map_err(|e| TrackerError::Validation(e.to_string()))?;
        }

        let mut priced = Vec::with_capacity(lines.len());
        for line in &lines {
            let product = products
                .get(&line.product_id)
                .ok_or_else(|| TrackerError::Validation(format!("unknown product {}", line.product_id)))?;
            priced.push((product, line.quantity));
        }
        let quote = pricing::quote(priced).map_err(|e| TrackerError::Validation(e.to_string()))?;

        let now = Utc::now();
        let order = Order::new(
            identity.user_id,
            quote.subtotal,
            self.config.delivery_fee,
            address,
            notes,
            now,
        );
        let items: Vec<OrderItem> = quote
            .lines
            .into_iter()
            .map(|l| OrderItem::new(order.id, l.product_id, l.title, l.quantity, l.unit_price, now))
            .collect();
        let delivery = Delivery::new(order.id, now, self.config.estimated_delivery(now)?);

        let placement = Placement {
            order,
            items,
            delivery,
            stock,
        };
        // Stock is re-checked inside the transaction; a concurrent checkout may
        // have taken the last units since the read above.
        self.store.commit_placement(&placement).await?;

        let Placement { order, items, delivery, .. } = placement;
        tracing::info!(
            order_id = %order.id,
            buyer_id = %order.buyer_id,
            total = order.total,
            items = items.len(),
            "order placed"
        );

        self.publish(DomainEvent::OrderPlaced(OrderPlacedEvent {
            order_id: order.id,
            buyer_id: order.buyer_id,
            delivery_id: delivery.id,
            total: order.total,
            item_count: items.len(),
            timestamp: now.timestamp(),
        }))
        .await;

        Ok(PlacedOrder { order, items, delivery })
    }

    /// Administrative status change on a delivery.
    pub async fn advance_delivery_status(
        &self,
        identity: &Identity,
        delivery_id: Uuid,
        next: DeliveryStatus,
        location: Option<String>,
    ) -> Result<Delivery, TrackerError> {
        require_admin(identity)?;

        let delivery = self
            .store
            .get_delivery(delivery_id)
            .await?
            .ok_or_else(|| TrackerError::NotFound(format!("delivery {}", delivery_id)))?;
        let record = self
            .store
            .get_order(delivery.order_id)
            .await?
            .ok_or_else(|| TrackerError::NotFound(format!("order {}", delivery.order_id)))?;

        let location = location.map(|l| l.trim().to_string()).filter(|l| !l.is_empty());
        self.apply_transition(&record.order, &delivery, next, location).await
    }

    /// The purchaser's view of one of their orders.
    pub async fn get_order_view(
        &self,
        identity: &Identity,
        order_id: Uuid,
    ) -> Result<OrderView, TrackerError> {
        let record = self.owned_order(identity, order_id).await?;
        self.build_view(record).await
    }

    /// Review one product of a delivered order.
    pub async fn submit_review(
        &self,
        identity: &Identity,
        order_id: Uuid,
        product_id: Uuid,
        rating: i32,
        comment: Option<String>,
    ) -> Result<Review, TrackerError> {
        let record = self.owned_order(identity, order_id).await?;

        if !record.items.iter().any(|i| i.product_id == product_id) {
            return Err(TrackerError::NotFound(format!(
                "product {} in order {}",
                product_id, order_id
            )));
        }
        if record.delivery.status != DeliveryStatus::Delivered {
            return Err(TrackerError::Forbidden(format!(
                "order {} is not delivered yet (delivery is {})",
                order_id, record.delivery.status
            )));
        }

        let now = Utc::now();
        let review = Review::new(order_id, product_id, identity.user_id, rating, comment, now)
            .map_err(TrackerError::Validation)?;

        self.store.insert_review(&review).await?;
        tracing::info!(%order_id, %product_id, rating = review.rating, "review submitted");

        self.publish(DomainEvent::ReviewSubmitted(ReviewSubmittedEvent {
            review_id: review.id,
            order_id,
            product_id,
            rating: review.rating,
            timestamp: now.timestamp(),
        }))
        .await;

        Ok(review)
    }

    /// The caller's orders, newest first.
    pub async fn list_orders(&self, identity: &Identity) -> Result<Vec<OrderSummary>, TrackerError> {
        let records = self.store.list_orders_for_buyer(identity.user_id).await?;
        Ok(records
            .into_iter()
            .map(|r| OrderSummary {
                id: r.order.id,
                status: r.order.status,
                total: r.order.total,
                item_count: r.items.len(),
                delivery_status: r.delivery.status,
                estimated_delivery: r.delivery.estimated_delivery,
                created_at: r.order.created_at,
            })
            .collect())
    }

    /// Purchaser cancellation, possible until the courier picks the parcel up.
    pub async fn cancel_order(
        &self,
        identity: &Identity,
        order_id: Uuid,
    ) -> Result<OrderView, TrackerError> {
        let record = self.owned_order(identity, order_id).await?;
        if record.delivery.status != DeliveryStatus::Pending {
            return Err(TrackerError::InvalidTransition {
                from: record.delivery.status,
                to: DeliveryStatus::Cancelled,
            });
        }

        self.apply_transition(&record.order, &record.delivery, DeliveryStatus::Cancelled, None)
            .await?;

        let record = self.owned_order(identity, order_id).await?;
        self.build_view(record).await
    }

    /// All deliveries for the admin dashboard, newest first.
    pub async fn list_deliveries(
        &self,
        identity: &Identity,
    ) -> Result<Vec<DeliveryListing>, TrackerError> {
        require_admin(identity)?;
        let rows = self.store.list_deliveries().await?;
        Ok(rows
            .into_iter()
            .map(|(delivery, order)| DeliveryListing {
                delivery,
                buyer_id: order.buyer_id,
                order_status: order.status,
                order_total: order.total,
                order_created_at: order.created_at,
            })
            .collect())
    }

    /// Order counts and revenue across every buyer.
    pub async fn order_stats(&self, identity: &Identity) -> Result<OrderStats, TrackerError> {
        require_admin(identity)?;
        let rows = self.store.list_deliveries().await?;
        Ok(OrderStats::of(rows.iter().map(|(_, order)| order), Utc::now()))
    }

    /// Edit location or ETA without changing status.
    pub async fn update_delivery_details(
        &self,
        identity: &Identity,
        delivery_id: Uuid,
        location: Option<String>,
        estimated_delivery: Option<DateTime<Utc>>,
    ) -> Result<Delivery, TrackerError> {
        require_admin(identity)?;

        let delivery = self
            .store
            .get_delivery(delivery_id)
            .await?
            .ok_or_else(|| TrackerError::NotFound(format!("delivery {}", delivery_id)))?;
        if delivery.status.is_terminal() {
            return Err(TrackerError::Forbidden(format!(
                "delivery {} is {} and can no longer change",
                delivery_id, delivery.status
            )));
        }

        let details = DeliveryDetails {
            delivery_id,
            expected: delivery.status,
            location: location.map(|l| l.trim().to_string()).filter(|l| !l.is_empty()),
            estimated_delivery,
            at: Utc::now(),
        };
        let result = self.store.update_delivery_details(&details).await;
        match result {
            Ok(updated) => Ok(updated),
            Err(StoreError::StatusConflict { actual }) if actual.is_terminal() => {
                Err(TrackerError::Forbidden(format!(
                    "delivery {} is {} and can no longer change",
                    delivery_id, actual
                )))
            }
            Err(StoreError::StatusConflict { .. }) => {
                // Status moved forward between read and write; retry the edit once
                // against the fresh status.
                let fresh = self
                    .store
                    .get_delivery(delivery_id)
                    .await?
                    .ok_or_else(|| TrackerError::NotFound(format!("delivery {}", delivery_id)))?;
                if fresh.status.is_terminal() {
                    return Err(TrackerError::Forbidden(format!(
                        "delivery {} is {} and can no longer change",
                        delivery_id, fresh.status
                    )));
                }
                let retry = DeliveryDetails { expected: fresh.status, ..details };
                Ok(self.store.update_delivery_details(&retry).await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Public reviews of a product with a rating summary.
    pub async fn product_reviews(&self, product_id: Uuid) -> Result<ProductReviews, TrackerError> {
        self.store
            .get_product(product_id)
            .await?
            .ok_or_else(|| TrackerError::NotFound(format!("product {}", product_id)))?;
        let reviews = self.store.reviews_for_product(product_id).await?;
        Ok(ProductReviews::new(product_id, reviews))
    }

    async fn apply_transition(
        &self,
        order: &Order,
        delivery: &Delivery,
        next: DeliveryStatus,
        location: Option<String>,
    ) -> Result<Delivery, TrackerError> {
        if !delivery.status.can_transition_to(next) {
            tracing::warn!(
                delivery_id = %delivery.id,
                from = %delivery.status,
                to = %next,
                "rejected delivery transition"
            );
            return Err(TrackerError::InvalidTransition { from: delivery.status, to: next });
        }

        let now = Utc::now();
        let transition = DeliveryTransition {
            delivery_id: delivery.id,
            order_id: order.id,
            expected: delivery.status,
            next,
            location,
            delivered_at: (next == DeliveryStatus::Delivered).then_some(now),
            order_status: order.next_status_for(next),
            restock: next.is_halted(),
            at: now,
        };

        let updated = match self.store.transition_delivery(&transition).await {
            Ok(updated) => updated,
            Err(StoreError::StatusConflict { actual }) => {
                tracing::warn!(
                    delivery_id = %delivery.id,
                    expected = %delivery.status,
                    %actual,
                    "delivery changed concurrently"
                );
                return Err(TrackerError::InvalidTransition { from: actual, to: next });
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            delivery_id = %updated.id,
            order_id = %order.id,
            from = %delivery.status,
            to = %updated.status,
            "delivery status changed"
        );

        self.publish(DomainEvent::DeliveryStatusChanged(DeliveryStatusChangedEvent {
            delivery_id: updated.id,
            order_id: order.id,
            buyer_id: order.buyer_id,
            from_status: delivery.status.to_string(),
            to_status: updated.status.to_string(),
            current_location: updated.current_location.clone(),
            timestamp: now.timestamp(),
        }))
        .await;

        Ok(updated)
    }

    /// Orders are private: someone else's order is reported as missing.
    async fn owned_order(
        &self,
        identity: &Identity,
        order_id: Uuid,
    ) -> Result<OrderRecord, TrackerError> {
        match self.store.get_order(order_id).await? {
            Some(record) if record.order.buyer_id == identity.user_id => Ok(record),
            _ => Err(TrackerError::NotFound(format!("order {}", order_id))),
        }
    }

    async fn build_view(&self, record: OrderRecord) -> Result<OrderView, TrackerError> {
        let ids: Vec<Uuid> = record.items.iter().map(|i| i.product_id).collect();
        let products = self.store.get_products(&ids).await?;
        let reviewed: BTreeSet<Uuid> = self
            .store
            .reviews_for_order(record.order.id)
            .await?
            .into_iter()
            .map(|r| r.product_id)
            .collect();

        let view = OrderView::build(record.order, record.items, record.delivery, &products, reviewed);
        if !view.reconciled {
            tracing::warn!(order_id = %view.order.id, "order items do not add up to the subtotal");
        }
        Ok(view)
    }

    async fn publish(&self, event: DomainEvent) {
        if let Err(e) = self.events.emit(&event).await {
            tracing::warn!(topic = event.topic(), key = %event.key(), "event not delivered: {}", e);
        }
    }
}

fn require_admin(identity: &Identity) -> Result<(), TrackerError> {
    if identity.is_admin() {
        Ok(())
    } else {
        Err(TrackerError::Forbidden("administrator role required".to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: DeliveryStatus,
        to: DeliveryStatus,
    },

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Dependency failed: {0}")]
    Dependency(String),
}

impl From<StoreError> for TrackerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => TrackerError::NotFound(what),
            StoreError::Duplicate(what) => TrackerError::Duplicate(what),
            StoreError::StatusConflict { actual } => TrackerError::Dependency(format!(
                "concurrent delivery update, now {}",
                actual
            )),
            e @ (StoreError::InsufficientStock { .. } | StoreError::ProductUnavailable(_)) => {
                TrackerError::Validation(e.to_string())
            }
            StoreError::Backend(msg) => TrackerError::Dependency(msg),
        }
    }
}

impl From<CatalogError> for TrackerError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(what) => TrackerError::NotFound(what),
            CatalogError::Invalid(msg) => TrackerError::Validation(msg),
            CatalogError::Storage(msg) => TrackerError::Dependency(msg),
        }
    }
}
