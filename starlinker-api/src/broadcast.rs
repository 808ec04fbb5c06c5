use async_trait::async_trait;
use starlinker_core::{CoreResult, EventSink};
use starlinker_shared::models::events::{DeliveryStatusChangedEvent, DomainEvent};
use tokio::sync::broadcast;

/// Feeds delivery status changes to in-process subscribers (the SSE
/// stream). Other events are ignored.
pub struct BroadcastEventSink {
    tx: broadcast::Sender<DeliveryStatusChangedEvent>,
}

impl BroadcastEventSink {
    pub fn new(tx: broadcast::Sender<DeliveryStatusChangedEvent>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl EventSink for BroadcastEventSink {
    async fn emit(&self, event: &DomainEvent) -> CoreResult<()> {
        if let DomainEvent::DeliveryStatusChanged(change) = event {
            // No open streams is fine.
            let _ = self.tx.send(change.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use starlinker_shared::models::events::ReviewSubmittedEvent;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_forwards_only_delivery_changes() {
        let (tx, mut rx) = broadcast::channel(8);
        let sink = BroadcastEventSink::new(tx);
        let order_id = Uuid::new_v4();

        sink.emit(&DomainEvent::ReviewSubmitted(ReviewSubmittedEvent {
            review_id: Uuid::new_v4(),
            order_id,
            product_id: Uuid::new_v4(),
            rating: 4,
            timestamp: 0,
        }))
        .await
        .unwrap();
        sink.emit(&DomainEvent::DeliveryStatusChanged(DeliveryStatusChangedEvent {
            delivery_id: Uuid::new_v4(),
            order_id,
            buyer_id: Uuid::new_v4(),
            from_status: "pending".to_string(),
            to_status: "picked_up".to_string(),
            current_location: None,
            timestamp: 0,
        }))
        .await
        .unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.order_id, order_id);
        assert_eq!(received.to_status, "picked_up");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_no_subscribers_is_not_an_error() {
        let (tx, rx) = broadcast::channel(8);
        drop(rx);
        let sink = BroadcastEventSink::new(tx);

        let result = sink
            .emit(&DomainEvent::DeliveryStatusChanged(DeliveryStatusChangedEvent {
                delivery_id: Uuid::new_v4(),
                order_id: Uuid::new_v4(),
                buyer_id: Uuid::new_v4(),
                from_status: "pending".to_string(),
                to_status: "cancelled".to_string(),
                current_location: None,
                timestamp: 0,
            }))
            .await;
        assert!(result.is_ok());
    }
}
