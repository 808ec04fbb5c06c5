use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::str::FromStr;
use starlinker_shared::Masked;

use crate::delivery::DeliveryStatus;

/// Order status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    fn rank(&self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Confirmed => 1,
            OrderStatus::Processing => 2,
            OrderStatus::Shipped => 3,
            OrderStatus::Delivered => 4,
            OrderStatus::Cancelled => 5,
        }
    }

    /// The order status implied by a delivery status, if any.
    pub fn implied_by(delivery: DeliveryStatus) -> Option<OrderStatus> {
        match delivery {
            DeliveryStatus::Pending => None,
            DeliveryStatus::PickedUp
            | DeliveryStatus::InTransit
            | DeliveryStatus::OutForDelivery => Some(OrderStatus::Shipped),
            DeliveryStatus::Delivered => Some(OrderStatus::Delivered),
            DeliveryStatus::Cancelled | DeliveryStatus::Failed => Some(OrderStatus::Cancelled),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {}", other)),
        }
    }
}

/// Where the order goes. The phone number stays out of logs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryAddress {
    pub address: Masked<String>,
    pub city: String,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub phone: Masked<String>,
}

/// A purchase transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub status: OrderStatus,
    pub subtotal: i64,
    pub delivery_fee: i64,
    pub total: i64,
    pub shipping: DeliveryAddress,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        buyer_id: Uuid,
        subtotal: i64,
        delivery_fee: i64,
        shipping: DeliveryAddress,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            buyer_id,
            status: OrderStatus::Pending,
            subtotal,
            delivery_fee,
            total: subtotal.saturating_add(delivery_fee),
            shipping,
            notes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Status the order should move to after its delivery reached
    /// `delivery`. `None` means no change: terminal orders never move, and
    /// non-cancelling moves only go forward.
    pub fn next_status_for(&self, delivery: DeliveryStatus) -> Option<OrderStatus> {
        if self.status.is_terminal() {
            return None;
        }
        let target = OrderStatus::implied_by(delivery)?;
        if target.rank() > self.status.rank() {
            Some(target)
        } else {
            None
        }
    }

    /// Σ quantity × price-at-time matches the recorded subtotal
    pub fn reconciles_with(&self, items: &[OrderItem]) -> bool {
        let sum = items
            .iter()
            .try_fold(0i64, |acc, item| acc.checked_add(item.line_total()?));
        sum == Some(self.subtotal)
    }
}

/// A line item within an order, priced at purchase time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_title: String,
    pub quantity: u32,
    pub price_at_time: i64,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    pub fn new(
        order_id: Uuid,
        product_id: Uuid,
        product_title: String,
        quantity: u32,
        price_at_time: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            product_id,
            product_title,
            quantity,
            price_at_time,
            created_at: now,
        }
    }

    pub fn line_total(&self) -> Option<i64> {
        self.price_at_time.checked_mul(i64::from(self.quantity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> DeliveryAddress {
        DeliveryAddress {
            address: Masked("12 Moi Avenue".to_string()),
            city: "Nairobi".to_string(),
            state: None,
            zip: None,
            phone: Masked("+254700000000".to_string()),
        }
    }

    #[test]
    fn test_order_follows_delivery_forward_only() {
        let mut order = Order::new(Uuid::new_v4(), 100, 0, address(), None, Utc::now());

        assert_eq!(order.next_status_for(DeliveryStatus::Pending), None);
        assert_eq!(order.next_status_for(DeliveryStatus::InTransit), Some(OrderStatus::Shipped));

        order.status = OrderStatus::Shipped;
        assert_eq!(order.next_status_for(DeliveryStatus::OutForDelivery), None);
        assert_eq!(order.next_status_for(DeliveryStatus::Delivered), Some(OrderStatus::Delivered));
        assert_eq!(order.next_status_for(DeliveryStatus::Failed), Some(OrderStatus::Cancelled));

        order.status = OrderStatus::Delivered;
        assert_eq!(order.next_status_for(DeliveryStatus::Cancelled), None);
    }

    #[test]
    fn test_reconciliation() {
        let order = Order::new(Uuid::new_v4(), 2500, 0, address(), None, Utc::now());
        let now = Utc::now();
        let items = vec![
            OrderItem::new(order.id, Uuid::new_v4(), "P".to_string(), 2, 1000, now),
            OrderItem::new(order.id, Uuid::new_v4(), "Q".to_string(), 1, 500, now),
        ];
        assert!(order.reconciles_with(&items));
        assert!(!order.reconciles_with(&items[..1]));
    }

    #[test]
    fn test_total_includes_fee() {
        let order = Order::new(Uuid::new_v4(), 2500, 2000, address(), None, Utc::now());
        assert_eq!(order.total, 4500);
        assert_eq!(order.status, OrderStatus::Pending);
    }
}
