use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;
use starlinker_catalog::{inventory, CatalogError, InventoryError, Product, ProductRepository};

use crate::delivery::Delivery;
use crate::models::{Order, OrderItem};
use crate::review::Review;
use crate::store::{
    DeliveryDetails, DeliveryTransition, FulfillmentStore, OrderRecord, Placement, StoreError,
};

#[derive(Default)]
struct State {
    products: HashMap<Uuid, Product>,
    orders: HashMap<Uuid, Order>,
    items: HashMap<Uuid, Vec<OrderItem>>,
    deliveries: HashMap<Uuid, Delivery>,
    delivery_by_order: HashMap<Uuid, Uuid>,
    reviews: Vec<Review>,
}

impl State {
    fn record(&self, order: &Order) -> Result<OrderRecord, StoreError> {
        let delivery = self
            .delivery_by_order
            .get(&order.id)
            .and_then(|id| self.deliveries.get(id))
            .ok_or_else(|| StoreError::Backend(format!("order {} has no delivery", order.id)))?;

        Ok(OrderRecord {
            order: order.clone(),
            items: self.items.get(&order.id).cloned().unwrap_or_default(),
            delivery: delivery.clone(),
        })
    }
}

/// In-process store. Every mutation runs under one write lock, which gives
/// the same all-or-nothing behaviour as a database transaction.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stock level of a product, for inspection
    pub async fn stock_of(&self, product_id: Uuid) -> Option<i32> {
        self.state
            .read()
            .await
            .products
            .get(&product_id)
            .map(|p| p.stock_quantity)
    }

    /// Change a listing's price, as a seller would
    pub async fn set_price(&self, product_id: Uuid, price: i64) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let product = state
            .products
            .get_mut(&product_id)
            .ok_or_else(|| StoreError::NotFound(product_id.to_string()))?;
        product.price = price;
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn create_product(&self, product: &Product) -> Result<(), CatalogError> {
        let mut state = self.state.write().await;
        if state.products.contains_key(&product.id) {
            return Err(CatalogError::Invalid(format!("duplicate product id {}", product.id)));
        }
        state.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, CatalogError> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn get_products(&self, ids: &[Uuid]) -> Result<Vec<Product>, CatalogError> {
        let state = self.state.read().await;
        Ok(ids.iter().filter_map(|id| state.products.get(id).cloned()).collect())
    }
}

#[async_trait]
impl FulfillmentStore for MemoryStore {
    async fn commit_placement(&self, placement: &Placement) -> Result<(), StoreError> {
        let mut state = self.state.write().await;

        // Check everything before touching anything.
        for (product_id, quantity) in &placement.stock {
            let product = state
                .products
                .get(product_id)
                .ok_or_else(|| StoreError::ProductUnavailable(product_id.to_string()))?;
            inventory::check_stock(product, *quantity).map_err(StoreError::from)?;
        }
        if state.orders.contains_key(&placement.order.id) {
            return Err(StoreError::Duplicate(format!("order {}", placement.order.id)));
        }

        for (product_id, quantity) in &placement.stock {
            if let Some(product) = state.products.get_mut(product_id) {
                inventory::decrement(product, *quantity).map_err(StoreError::from)?;
            }
        }

        let order_id = placement.order.id;
        state.orders.insert(order_id, placement.order.clone());
        state.items.insert(order_id, placement.items.clone());
        state.delivery_by_order.insert(order_id, placement.delivery.id);
        state.deliveries.insert(placement.delivery.id, placement.delivery.clone());
        Ok(())
    }

    async fn get_order(&self, order_id: Uuid) -> Result<Option<OrderRecord>, StoreError> {
        let state = self.state.read().await;
        match state.orders.get(&order_id) {
            Some(order) => Ok(Some(state.record(order)?)),
            None => Ok(None),
        }
    }

    async fn list_orders_for_buyer(
        &self,
        buyer_id: Uuid,
    ) -> Result<Vec<OrderRecord>, StoreError> {
        let state = self.state.read().await;
        let mut records = state
            .orders
            .values()
            .filter(|o| o.buyer_id == buyer_id)
            .map(|o| state.record(o))
            .collect::<Result<Vec<_>, _>>()?;
        records.sort_by(|a, b| b.order.created_at.cmp(&a.order.created_at));
        Ok(records)
    }

    async fn get_delivery(&self, delivery_id: Uuid) -> Result<Option<Delivery>, StoreError> {
        Ok(self.state.read().await.deliveries.get(&delivery_id).cloned())
    }

    async fn list_deliveries(&self) -> Result<Vec<(Delivery, Order)>, StoreError> {
        let state = self.state.read().await;
        let mut rows: Vec<(Delivery, Order)> = state
            .deliveries
            .values()
            .filter_map(|d| state.orders.get(&d.order_id).map(|o| (d.clone(), o.clone())))
            .collect();
        rows.sort_by(|a, b| b.0.created_at.cmp(&a.0.created_at));
        Ok(rows)
    }

    async fn transition_delivery(
        &self,
        transition: &DeliveryTransition,
    ) -> Result<Delivery, StoreError> {
        let mut state = self.state.write().await;

        let delivery = state
            .deliveries
            .get_mut(&transition.delivery_id)
            .ok_or_else(|| StoreError::NotFound(transition.delivery_id.to_string()))?;
        if delivery.status != transition.expected {
            return Err(StoreError::StatusConflict { actual: delivery.status });
        }

        delivery
            .advance(transition.next, transition.location.clone(), transition.at)
            .map_err(|e| StoreError::StatusConflict { actual: e.from })?;
        let updated = delivery.clone();

        if let Some(status) = transition.order_status {
            if let Some(order) = state.orders.get_mut(&transition.order_id) {
                order.status = status;
                order.updated_at = transition.at;
            }
        }

        if transition.restock {
            let items = state.items.get(&transition.order_id).cloned().unwrap_or_default();
            for item in items {
                if let Some(product) = state.products.get_mut(&item.product_id) {
                    inventory::restock(product, item.quantity);
                }
            }
        }

        Ok(updated)
    }

    async fn update_delivery_details(
        &self,
        details: &DeliveryDetails,
    ) -> Result<Delivery, StoreError> {
        let mut state = self.state.write().await;

        let delivery = state
            .deliveries
            .get_mut(&details.delivery_id)
            .ok_or_else(|| StoreError::NotFound(details.delivery_id.to_string()))?;
        if delivery.status != details.expected {
            return Err(StoreError::StatusConflict { actual: delivery.status });
        }

        if let Some(location) = &details.location {
            delivery.current_location = Some(location.clone());
        }
        if let Some(eta) = details.estimated_delivery {
            delivery.estimated_delivery = Some(eta);
        }
        delivery.updated_at = details.at;
        Ok(delivery.clone())
    }

    async fn insert_review(&self, review: &Review) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let exists = state
            .reviews
            .iter()
            .any(|r| r.order_id == review.order_id && r.product_id == review.product_id);
        if exists {
            return Err(StoreError::Duplicate(format!(
                "review for order {} product {}",
                review.order_id, review.product_id
            )));
        }
        state.reviews.push(review.clone());
        Ok(())
    }

    async fn reviews_for_order(&self, order_id: Uuid) -> Result<Vec<Review>, StoreError> {
        let state = self.state.read().await;
        Ok(state.reviews.iter().filter(|r| r.order_id == order_id).cloned().collect())
    }

    async fn reviews_for_product(&self, product_id: Uuid) -> Result<Vec<Review>, StoreError> {
        let state = self.state.read().await;
        Ok(state.reviews.iter().filter(|r| r.product_id == product_id).cloned().collect())
    }
}

impl From<InventoryError> for StoreError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::InsufficientStock { product_id, requested, available } => {
                StoreError::InsufficientStock { product_id, requested, available }
            }
            InventoryError::NotFound(id) | InventoryError::Inactive(id) => {
                StoreError::ProductUnavailable(id)
            }
        }
    }
}
