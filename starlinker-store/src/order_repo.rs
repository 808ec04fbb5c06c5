use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;
use tracing::{info, warn};

use starlinker_catalog::{CatalogError, Product, ProductCondition, ProductRepository};
use starlinker_order::store::{
    DeliveryDetails, DeliveryTransition, OrderRecord, Placement,
};
use starlinker_order::{
    Delivery, DeliveryAddress, DeliveryStatus, FulfillmentStore, Order, OrderItem, OrderStatus,
    Review, StoreError,
};
use starlinker_shared::Masked;

const PRODUCT_COLUMNS: &str = "id, seller_id, title, description, category, condition, price, \
    stock_quantity, location, is_active, created_at";

const ORDER_COLUMNS: &str = "id, buyer_id, status, subtotal, delivery_fee, total, \
    delivery_address, delivery_city, delivery_state, delivery_zip, delivery_phone, notes, \
    created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, order_id, product_id, product_title, quantity, price_at_time, created_at";

const DELIVERY_COLUMNS: &str = "id, order_id, status, current_location, estimated_delivery, \
    delivered_at, created_at, updated_at";

const REVIEW_COLUMNS: &str = "id, order_id, product_id, reviewer_id, rating, comment, created_at";

/// Postgres-backed store. Placement and delivery transitions each run in a
/// single transaction; review uniqueness rides on `reviews_order_product_key`.
#[derive(Clone)]
pub struct PgFulfillmentStore {
    pool: PgPool,
}

impl PgFulfillmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn items_for(&self, order_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<OrderItem>>, StoreError> {
        let rows: Vec<OrderItemRow> = sqlx::query_as(&format!(
            "SELECT {} FROM order_items WHERE order_id = ANY($1) ORDER BY created_at, id",
            ITEM_COLUMNS
        ))
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        let mut grouped: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            let item = OrderItem::try_from(row)?;
            grouped.entry(item.order_id).or_default().push(item);
        }
        Ok(grouped)
    }

    async fn deliveries_for(&self, order_ids: &[Uuid]) -> Result<HashMap<Uuid, Delivery>, StoreError> {
        let rows: Vec<DeliveryRow> = sqlx::query_as(&format!(
            "SELECT {} FROM deliveries WHERE order_id = ANY($1)",
            DELIVERY_COLUMNS
        ))
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter()
            .map(|row| Delivery::try_from(row).map(|d| (d.order_id, d)))
            .collect()
    }

    async fn assemble(&self, orders: Vec<Order>) -> Result<Vec<OrderRecord>, StoreError> {
        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let mut items = self.items_for(&ids).await?;
        let mut deliveries = self.deliveries_for(&ids).await?;

        orders
            .into_iter()
            .map(|order| {
                let delivery = deliveries.remove(&order.id).ok_or_else(|| {
                    StoreError::Backend(format!("order {} has no delivery", order.id))
                })?;
                Ok(OrderRecord {
                    items: items.remove(&order.id).unwrap_or_default(),
                    order,
                    delivery,
                })
            })
            .collect()
    }

    /// The status a delivery holds right now, to explain a failed CAS
    async fn current_status(
        tx: &mut Transaction<'_, Postgres>,
        delivery_id: Uuid,
    ) -> Result<StoreError, StoreError> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM deliveries WHERE id = $1")
                .bind(delivery_id)
                .fetch_optional(&mut **tx)
                .await
                .map_err(backend)?;

        match status {
            Some(s) => Ok(StoreError::StatusConflict { actual: parse_delivery_status(&s)? }),
            None => Ok(StoreError::NotFound(delivery_id.to_string())),
        }
    }
}

#[async_trait]
impl ProductRepository for PgFulfillmentStore {
    async fn create_product(&self, product: &Product) -> Result<(), CatalogError> {
        sqlx::query(
            r#"
            INSERT INTO products (id, seller_id, title, description, category, condition, price, stock_quantity, location, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(product.id)
        .bind(product.seller_id)
        .bind(&product.title)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.condition.as_str())
        .bind(product.price)
        .bind(product.stock_quantity)
        .bind(&product.location)
        .bind(product.is_active)
        .bind(product.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                CatalogError::Invalid(format!("duplicate product id {}", product.id))
            }
            other => CatalogError::Storage(other.to_string()),
        })?;

        info!("Product {} listed by {}", product.id, product.seller_id);
        Ok(())
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, CatalogError> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| CatalogError::Storage(e.to_string()))?;

        row.map(Product::try_from).transpose()
    }

    async fn get_products(&self, ids: &[Uuid]) -> Result<Vec<Product>, CatalogError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {} FROM products WHERE id = ANY($1)",
            PRODUCT_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CatalogError::Storage(e.to_string()))?;

        rows.into_iter().map(Product::try_from).collect()
    }
}

#[async_trait]
impl FulfillmentStore for PgFulfillmentStore {
    async fn commit_placement(&self, placement: &Placement) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        // Lock the rows in id order so concurrent placements cannot deadlock.
        let ids: Vec<Uuid> = placement.stock.keys().copied().collect();
        let locked: Vec<(Uuid, i32, bool)> = sqlx::query_as(
            "SELECT id, stock_quantity, is_active FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await
        .map_err(backend)?;

        let locked: HashMap<Uuid, (i32, bool)> =
            locked.into_iter().map(|(id, stock, active)| (id, (stock, active))).collect();

        for (product_id, quantity) in &placement.stock {
            let (stock, active) = locked
                .get(product_id)
                .copied()
                .ok_or_else(|| StoreError::ProductUnavailable(product_id.to_string()))?;
            if !active {
                return Err(StoreError::ProductUnavailable(product_id.to_string()));
            }
            let available = u32::try_from(stock).unwrap_or(0);
            if *quantity > available {
                return Err(StoreError::InsufficientStock {
                    product_id: *product_id,
                    requested: *quantity,
                    available,
                });
            }
        }

        for (product_id, quantity) in &placement.stock {
            sqlx::query("UPDATE products SET stock_quantity = stock_quantity - $2 WHERE id = $1")
                .bind(product_id)
                .bind(to_db_quantity(*quantity)?)
                .execute(&mut *tx)
                .await
                .map_err(backend)?;
        }

        let order = &placement.order;
        sqlx::query(
            r#"
            INSERT INTO orders (id, buyer_id, status, subtotal, delivery_fee, total, delivery_address, delivery_city, delivery_state, delivery_zip, delivery_phone, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(order.id)
        .bind(order.buyer_id)
        .bind(order.status.as_str())
        .bind(order.subtotal)
        .bind(order.delivery_fee)
        .bind(order.total)
        .bind(order.shipping.address.expose())
        .bind(&order.shipping.city)
        .bind(&order.shipping.state)
        .bind(&order.shipping.zip)
        .bind(order.shipping.phone.expose())
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| duplicate_or_backend(e, format!("order {}", order.id)))?;

        for item in &placement.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_id, product_title, quantity, price_at_time, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(item.id)
            .bind(item.order_id)
            .bind(item.product_id)
            .bind(&item.product_title)
            .bind(to_db_quantity(item.quantity)?)
            .bind(item.price_at_time)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        }

        let delivery = &placement.delivery;
        sqlx::query(
            r#"
            INSERT INTO deliveries (id, order_id, status, current_location, estimated_delivery, delivered_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(delivery.id)
        .bind(delivery.order_id)
        .bind(delivery.status.as_str())
        .bind(&delivery.current_location)
        .bind(delivery.estimated_delivery)
        .bind(delivery.delivered_at)
        .bind(delivery.created_at)
        .bind(delivery.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| duplicate_or_backend(e, format!("delivery for order {}", order.id)))?;

        tx.commit().await.map_err(backend)?;
        Ok(())
    }

    async fn get_order(&self, order_id: Uuid) -> Result<Option<OrderRecord>, StoreError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
                .bind(order_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let order = Order::try_from(row)?;
        Ok(self.assemble(vec![order]).await?.pop())
    }

    async fn list_orders_for_buyer(
        &self,
        buyer_id: Uuid,
    ) -> Result<Vec<OrderRecord>, StoreError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM orders WHERE buyer_id = $1 ORDER BY created_at DESC",
            ORDER_COLUMNS
        ))
        .bind(buyer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        let orders = rows.into_iter().map(Order::try_from).collect::<Result<Vec<_>, _>>()?;
        self.assemble(orders).await
    }

    async fn get_delivery(&self, delivery_id: Uuid) -> Result<Option<Delivery>, StoreError> {
        let row: Option<DeliveryRow> =
            sqlx::query_as(&format!("SELECT {} FROM deliveries WHERE id = $1", DELIVERY_COLUMNS))
                .bind(delivery_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;

        row.map(Delivery::try_from).transpose()
    }

    async fn list_deliveries(&self) -> Result<Vec<(Delivery, Order)>, StoreError> {
        let rows: Vec<DeliveryRow> = sqlx::query_as(&format!(
            "SELECT {} FROM deliveries ORDER BY created_at DESC",
            DELIVERY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        let deliveries = rows.into_iter().map(Delivery::try_from).collect::<Result<Vec<_>, _>>()?;

        let ids: Vec<Uuid> = deliveries.iter().map(|d| d.order_id).collect();
        let order_rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM orders WHERE id = ANY($1)",
            ORDER_COLUMNS
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        let mut orders: HashMap<Uuid, Order> = order_rows
            .into_iter()
            .map(|row| Order::try_from(row).map(|o| (o.id, o)))
            .collect::<Result<_, _>>()?;

        Ok(deliveries
            .into_iter()
            .filter_map(|d| orders.remove(&d.order_id).map(|o| (d, o)))
            .collect())
    }

    async fn transition_delivery(
        &self,
        transition: &DeliveryTransition,
    ) -> Result<Delivery, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let row: Option<DeliveryRow> = sqlx::query_as(&format!(
            r#"
            UPDATE deliveries
            SET status = $3,
                current_location = COALESCE($4, current_location),
                delivered_at = COALESCE($5, delivered_at),
                updated_at = $6
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            DELIVERY_COLUMNS
        ))
        .bind(transition.delivery_id)
        .bind(transition.expected.as_str())
        .bind(transition.next.as_str())
        .bind(&transition.location)
        .bind(transition.delivered_at)
        .bind(transition.at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?;

        let Some(row) = row else {
            let err = Self::current_status(&mut tx, transition.delivery_id).await?;
            warn!("Delivery {} transition rejected: {}", transition.delivery_id, err);
            return Err(err);
        };
        let delivery = Delivery::try_from(row)?;

        if let Some(status) = transition.order_status {
            sqlx::query("UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1")
                .bind(transition.order_id)
                .bind(status.as_str())
                .bind(transition.at)
                .execute(&mut *tx)
                .await
                .map_err(backend)?;
        }

        if transition.restock {
            sqlx::query(
                r#"
                UPDATE products p
                SET stock_quantity = p.stock_quantity + agg.qty
                FROM (
                    SELECT product_id, SUM(quantity)::INTEGER AS qty
                    FROM order_items
                    WHERE order_id = $1
                    GROUP BY product_id
                ) agg
                WHERE p.id = agg.product_id
                "#,
            )
            .bind(transition.order_id)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        }

        tx.commit().await.map_err(backend)?;
        Ok(delivery)
    }

    async fn update_delivery_details(
        &self,
        details: &DeliveryDetails,
    ) -> Result<Delivery, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let row: Option<DeliveryRow> = sqlx::query_as(&format!(
            r#"
            UPDATE deliveries
            SET current_location = COALESCE($3, current_location),
                estimated_delivery = COALESCE($4, estimated_delivery),
                updated_at = $5
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            DELIVERY_COLUMNS
        ))
        .bind(details.delivery_id)
        .bind(details.expected.as_str())
        .bind(&details.location)
        .bind(details.estimated_delivery)
        .bind(details.at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?;

        let Some(row) = row else {
            return Err(Self::current_status(&mut tx, details.delivery_id).await?);
        };
        let delivery = Delivery::try_from(row)?;

        tx.commit().await.map_err(backend)?;
        Ok(delivery)
    }

    async fn insert_review(&self, review: &Review) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO reviews (id, order_id, product_id, reviewer_id, rating, comment, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(review.id)
        .bind(review.order_id)
        .bind(review.product_id)
        .bind(review.reviewer_id)
        .bind(i16::from(review.rating))
        .bind(&review.comment)
        .bind(review.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            duplicate_or_backend(
                e,
                format!("review for order {} product {}", review.order_id, review.product_id),
            )
        })?;

        Ok(())
    }

    async fn reviews_for_order(&self, order_id: Uuid) -> Result<Vec<Review>, StoreError> {
        let rows: Vec<ReviewRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reviews WHERE order_id = $1",
            REVIEW_COLUMNS
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(Review::try_from).collect()
    }

    async fn reviews_for_product(&self, product_id: Uuid) -> Result<Vec<Review>, StoreError> {
        let rows: Vec<ReviewRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reviews WHERE product_id = $1 ORDER BY created_at DESC",
            REVIEW_COLUMNS
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(Review::try_from).collect()
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn duplicate_or_backend(err: sqlx::Error, what: String) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::Duplicate(what),
        other => backend(other),
    }
}

fn to_db_quantity(quantity: u32) -> Result<i32, StoreError> {
    i32::try_from(quantity).map_err(|_| StoreError::Backend(format!("quantity {} out of range", quantity)))
}

fn parse_delivery_status(s: &str) -> Result<DeliveryStatus, StoreError> {
    s.parse().map_err(StoreError::Backend)
}

// Row types for runtime-checked queries

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    seller_id: Uuid,
    title: String,
    description: Option<String>,
    category: String,
    condition: String,
    price: i64,
    stock_quantity: i32,
    location: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = CatalogError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let condition: ProductCondition = row
            .condition
            .parse()
            .map_err(|e: CatalogError| CatalogError::Storage(e.to_string()))?;
        Ok(Product {
            id: row.id,
            seller_id: row.seller_id,
            title: row.title,
            description: row.description,
            category: row.category,
            condition,
            price: row.price,
            stock_quantity: row.stock_quantity,
            location: row.location,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    buyer_id: Uuid,
    status: String,
    subtotal: i64,
    delivery_fee: i64,
    total: i64,
    delivery_address: String,
    delivery_city: String,
    delivery_state: Option<String>,
    delivery_zip: Option<String>,
    delivery_phone: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row.status.parse().map_err(StoreError::Backend)?;
        Ok(Order {
            id: row.id,
            buyer_id: row.buyer_id,
            status,
            subtotal: row.subtotal,
            delivery_fee: row.delivery_fee,
            total: row.total,
            shipping: DeliveryAddress {
                address: Masked(row.delivery_address),
                city: row.delivery_city,
                state: row.delivery_state,
                zip: row.delivery_zip,
                phone: Masked(row.delivery_phone),
            },
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    product_id: Uuid,
    product_title: String,
    quantity: i32,
    price_at_time: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = StoreError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity)
            .map_err(|_| StoreError::Backend(format!("negative quantity on item {}", row.id)))?;
        Ok(OrderItem {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            product_title: row.product_title,
            quantity,
            price_at_time: row.price_at_time,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct DeliveryRow {
    id: Uuid,
    order_id: Uuid,
    status: String,
    current_location: Option<String>,
    estimated_delivery: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DeliveryRow> for Delivery {
    type Error = StoreError;

    fn try_from(row: DeliveryRow) -> Result<Self, Self::Error> {
        Ok(Delivery {
            id: row.id,
            order_id: row.order_id,
            status: parse_delivery_status(&row.status)?,
            current_location: row.current_location,
            estimated_delivery: row.estimated_delivery,
            delivered_at: row.delivered_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    order_id: Uuid,
    product_id: Uuid,
    reviewer_id: Uuid,
    rating: i16,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = StoreError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating = u8::try_from(row.rating)
            .map_err(|_| StoreError::Backend(format!("rating {} out of range", row.rating)))?;
        Ok(Review {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            reviewer_id: row.reviewer_id,
            rating,
            comment: row.comment,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivery_row(status: &str) -> DeliveryRow {
        let now = Utc::now();
        DeliveryRow {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            status: status.to_string(),
            current_location: None,
            estimated_delivery: None,
            delivered_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_delivery_row_parses_status() {
        let delivery = Delivery::try_from(delivery_row("out_for_delivery")).unwrap();
        assert_eq!(delivery.status, DeliveryStatus::OutForDelivery);

        assert!(matches!(
            Delivery::try_from(delivery_row("lost")),
            Err(StoreError::Backend(_))
        ));
    }

    #[test]
    fn test_item_row_rejects_negative_quantity() {
        let row = OrderItemRow {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            product_title: "Router".to_string(),
            quantity: -1,
            price_at_time: 100,
            created_at: Utc::now(),
        };
        assert!(OrderItem::try_from(row).is_err());
    }

    #[test]
    fn test_order_row_masks_contact_details() {
        let now = Utc::now();
        let order = Order::try_from(OrderRow {
            id: Uuid::new_v4(),
            buyer_id: Uuid::new_v4(),
            status: "shipped".to_string(),
            subtotal: 2500,
            delivery_fee: 0,
            total: 2500,
            delivery_address: "12 Moi Avenue".to_string(),
            delivery_city: "Nairobi".to_string(),
            delivery_state: None,
            delivery_zip: None,
            delivery_phone: "+254700000000".to_string(),
            notes: None,
            created_at: now,
            updated_at: now,
        })
        .unwrap();

        assert_eq!(order.status, OrderStatus::Shipped);
        assert!(!format!("{:?}", order).contains("Moi Avenue"));
        assert_eq!(order.shipping.phone.expose(), "+254700000000");
    }

    #[test]
    fn test_to_db_quantity_bounds() {
        assert_eq!(to_db_quantity(3).unwrap(), 3);
        assert!(to_db_quantity(u32::MAX).is_err());
    }
}
