use uuid::Uuid;

pub const ORDER_PLACED_TOPIC: &str = "order.placed";
pub const DELIVERY_STATUS_TOPIC: &str = "delivery.status_changed";
pub const REVIEW_SUBMITTED_TOPIC: &str = "review.submitted";

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OrderPlacedEvent {
    pub order_id: Uuid,
    pub buyer_id: Uuid,
    pub delivery_id: Uuid,
    pub total: i64,
    pub item_count: usize,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct DeliveryStatusChangedEvent {
    pub delivery_id: Uuid,
    pub order_id: Uuid,
    pub buyer_id: Uuid,
    pub from_status: String,
    pub to_status: String,
    pub current_location: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct ReviewSubmittedEvent {
    pub review_id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub rating: u8,
    pub timestamp: i64,
}

/// Envelope used when events share a single channel.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    OrderPlaced(OrderPlacedEvent),
    DeliveryStatusChanged(DeliveryStatusChangedEvent),
    ReviewSubmitted(ReviewSubmittedEvent),
}

impl DomainEvent {
    pub fn topic(&self) -> &'static str {
        match self {
            DomainEvent::OrderPlaced(_) => ORDER_PLACED_TOPIC,
            DomainEvent::DeliveryStatusChanged(_) => DELIVERY_STATUS_TOPIC,
            DomainEvent::ReviewSubmitted(_) => REVIEW_SUBMITTED_TOPIC,
        }
    }

    /// Partition key; events of one order land on the same partition.
    pub fn key(&self) -> String {
        match self {
            DomainEvent::OrderPlaced(e) => e.order_id.to_string(),
            DomainEvent::DeliveryStatusChanged(e) => e.order_id.to_string(),
            DomainEvent::ReviewSubmitted(e) => e.order_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_is_tagged() {
        let event = DomainEvent::ReviewSubmitted(ReviewSubmittedEvent {
            review_id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            rating: 5,
            timestamp: 0,
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "review_submitted");
        assert_eq!(event.topic(), REVIEW_SUBMITTED_TOPIC);
    }
}
