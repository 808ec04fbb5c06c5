use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Datelike, Utc};
use std::collections::BTreeSet;
use starlinker_catalog::{Product, ProductCondition};

use crate::delivery::{Delivery, DeliveryProgress, DeliveryStatus};
use crate::models::{Order, OrderItem, OrderStatus};

/// Current catalog data for an ordered product. Absent once the listing is gone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub title: String,
    pub category: String,
    pub condition: ProductCondition,
    pub is_active: bool,
}

impl From<&Product> for ProductSnapshot {
    fn from(p: &Product) -> Self {
        Self {
            title: p.title.clone(),
            category: p.category.clone(),
            condition: p.condition,
            is_active: p.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemView {
    #[serde(flatten)]
    pub item: OrderItem,
    pub line_total: i64,
    pub product: Option<ProductSnapshot>,
    pub reviewed: bool,
    pub can_review: bool,
}

/// Everything the purchaser's order page shows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    pub order: Order,
    pub items: Vec<OrderItemView>,
    pub delivery: Delivery,
    pub progress: DeliveryProgress,
    pub reviewed_product_ids: BTreeSet<Uuid>,
    pub reconciled: bool,
}

impl OrderView {
    pub fn build(
        order: Order,
        items: Vec<OrderItem>,
        delivery: Delivery,
        products: &[Product],
        reviewed_product_ids: BTreeSet<Uuid>,
    ) -> Self {
        let delivered = delivery.status == DeliveryStatus::Delivered;
        let reconciled = order.reconciles_with(&items);

        let items = items
            .into_iter()
            .map(|item| {
                let reviewed = reviewed_product_ids.contains(&item.product_id);
                let product = products
                    .iter()
                    .find(|p| p.id == item.product_id)
                    .map(ProductSnapshot::from);
                OrderItemView {
                    line_total: item.line_total().unwrap_or(i64::MAX),
                    product,
                    reviewed,
                    can_review: delivered && !reviewed,
                    item,
                }
            })
            .collect();

        Self {
            progress: delivery.progress(),
            order,
            items,
            delivery,
            reviewed_product_ids,
            reconciled,
        }
    }
}

/// Row of the "My Orders" list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: Uuid,
    pub status: OrderStatus,
    pub total: i64,
    pub item_count: usize,
    pub delivery_status: DeliveryStatus,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Row of the admin deliveries list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryListing {
    pub delivery: Delivery,
    pub buyer_id: Uuid,
    pub order_status: OrderStatus,
    pub order_total: i64,
    pub order_created_at: DateTime<Utc>,
}

/// Sales figures for the admin dashboard. Cancelled orders count towards
/// `cancelled_count` only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStats {
    pub order_count: usize,
    pub orders_this_month: usize,
    pub revenue: i64,
    pub average_order_value: Option<i64>,
    pub delivered_count: usize,
    pub cancelled_count: usize,
}

impl OrderStats {
    pub fn of<'a>(orders: impl IntoIterator<Item = &'a Order>, now: DateTime<Utc>) -> Self {
        let mut stats = Self::default();
        let mut paid = 0i64;

        for order in orders {
            stats.order_count += 1;
            if order.created_at.year() == now.year() && order.created_at.month() == now.month() {
                stats.orders_this_month += 1;
            }
            match order.status {
                OrderStatus::Cancelled => {
                    stats.cancelled_count += 1;
                    continue;
                }
                OrderStatus::Delivered => stats.delivered_count += 1,
                _ => {}
            }
            stats.revenue = stats.revenue.saturating_add(order.total);
            paid += 1;
        }

        stats.average_order_value = (paid > 0).then(|| stats.revenue / paid);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use starlinker_shared::Masked;
    use crate::models::DeliveryAddress;

    fn order(total: i64, status: OrderStatus, created_at: DateTime<Utc>) -> Order {
        let mut order = Order::new(
            Uuid::new_v4(),
            total,
            0,
            DeliveryAddress {
                address: Masked("9 Moi Avenue".to_string()),
                city: "Mombasa".to_string(),
                state: None,
                zip: None,
                phone: Masked("0722".to_string()),
            },
            None,
            created_at,
        );
        order.status = status;
        order
    }

    #[test]
    fn test_stats_skip_cancelled_revenue() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let orders = vec![
            order(1000, OrderStatus::Delivered, now),
            order(3000, OrderStatus::Shipped, now - Duration::days(20)),
            order(5000, OrderStatus::Cancelled, now - Duration::days(1)),
        ];

        let stats = OrderStats::of(&orders, now);
        assert_eq!(stats.order_count, 3);
        assert_eq!(stats.orders_this_month, 2);
        assert_eq!(stats.revenue, 4000);
        assert_eq!(stats.average_order_value, Some(2000));
        assert_eq!(stats.delivered_count, 1);
        assert_eq!(stats.cancelled_count, 1);
    }

    #[test]
    fn test_stats_of_nothing() {
        let stats = OrderStats::of(Vec::<Order>::new().iter(), Utc::now());
        assert_eq!(stats, OrderStats::default());
        assert!(stats.average_order_value.is_none());
    }
}
