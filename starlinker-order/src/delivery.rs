use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::str::FromStr;

/// Delivery status.
///
/// The main sequence is `Pending → PickedUp → InTransit → OutForDelivery →
/// Delivered`. `Cancelled` and `Failed` can be reached from any non-terminal
/// state. `Delivered`, `Cancelled` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    PickedUp,
    InTransit,
    OutForDelivery,
    Delivered,
    Cancelled,
    Failed,
}

/// Main progression, in order
pub const MAIN_SEQUENCE: [DeliveryStatus; 5] = [
    DeliveryStatus::Pending,
    DeliveryStatus::PickedUp,
    DeliveryStatus::InTransit,
    DeliveryStatus::OutForDelivery,
    DeliveryStatus::Delivered,
];

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::PickedUp => "picked_up",
            DeliveryStatus::InTransit => "in_transit",
            DeliveryStatus::OutForDelivery => "out_for_delivery",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Cancelled => "cancelled",
            DeliveryStatus::Failed => "failed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "Order Placed",
            DeliveryStatus::PickedUp => "Picked Up",
            DeliveryStatus::InTransit => "In Transit",
            DeliveryStatus::OutForDelivery => "Out for Delivery",
            DeliveryStatus::Delivered => "Delivered",
            DeliveryStatus::Cancelled => "Cancelled",
            DeliveryStatus::Failed => "Failed",
        }
    }

    /// Position on the main sequence; `None` for the side exits.
    pub fn step_index(&self) -> Option<usize> {
        MAIN_SEQUENCE.iter().position(|s| s == self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeliveryStatus::Delivered | DeliveryStatus::Cancelled | DeliveryStatus::Failed
        )
    }

    /// Side exits end the delivery without completing it.
    pub fn is_halted(&self) -> bool {
        matches!(self, DeliveryStatus::Cancelled | DeliveryStatus::Failed)
    }

    /// Whether `self → next` is an edge of the state machine.
    ///
    /// Forward moves along the main sequence may skip stages. Backward moves,
    /// self-loops and anything leaving a terminal state are rejected.
    pub fn can_transition_to(&self, next: DeliveryStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next.is_halted() {
            return true;
        }
        match (self.step_index(), next.step_index()) {
            (Some(from), Some(to)) => to > from,
            _ => false,
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DeliveryStatus::Pending),
            "picked_up" => Ok(DeliveryStatus::PickedUp),
            "in_transit" => Ok(DeliveryStatus::InTransit),
            "out_for_delivery" => Ok(DeliveryStatus::OutForDelivery),
            "delivered" => Ok(DeliveryStatus::Delivered),
            "cancelled" => Ok(DeliveryStatus::Cancelled),
            "failed" => Ok(DeliveryStatus::Failed),
            other => Err(format!("unknown delivery status: {}", other)),
        }
    }
}

/// Fulfillment-tracking record for an order (one per order)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Delivery {
    pub id: Uuid,
    pub order_id: Uuid,
    pub status: DeliveryStatus,
    pub current_location: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Delivery {
    pub fn new(order_id: Uuid, now: DateTime<Utc>, estimated_delivery: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            status: DeliveryStatus::Pending,
            current_location: None,
            estimated_delivery: Some(estimated_delivery),
            delivered_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `next`, stamping `delivered_at` on completion.
    pub fn advance(
        &mut self,
        next: DeliveryStatus,
        location: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<DeliveryStatus, TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError { from: self.status, to: next });
        }

        let previous = self.status;
        self.status = next;
        if let Some(location) = location {
            self.current_location = Some(location);
        }
        if next == DeliveryStatus::Delivered {
            self.delivered_at = Some(now);
        }
        self.updated_at = now;
        Ok(previous)
    }

    pub fn progress(&self) -> DeliveryProgress {
        DeliveryProgress::of(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid delivery transition from {from} to {to}")]
pub struct TransitionError {
    pub from: DeliveryStatus,
    pub to: DeliveryStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Completed,
    Current,
    Upcoming,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressStep {
    pub status: DeliveryStatus,
    pub label: String,
    pub state: StepState,
}

/// What the purchaser sees as the delivery tracker
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryProgress {
    pub status: DeliveryStatus,
    pub steps: Vec<ProgressStep>,
    /// Set when the delivery ended in `cancelled` or `failed`
    pub halted: bool,
    pub current_location: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

impl DeliveryProgress {
    pub fn of(delivery: &Delivery) -> Self {
        let halted = delivery.status.is_halted();
        let current = delivery.status.step_index();

        let steps = MAIN_SEQUENCE
            .iter()
            .enumerate()
            .map(|(index, status)| {
                let state = match current {
                    Some(c) if index < c => StepState::Completed,
                    Some(c) if index == c => StepState::Current,
                    _ => StepState::Upcoming,
                };
                ProgressStep {
                    status: *status,
                    label: status.label().to_string(),
                    state,
                }
            })
            .collect();

        let show_eta = !halted && delivery.status != DeliveryStatus::Delivered;

        Self {
            status: delivery.status,
            steps,
            halted,
            current_location: if halted { None } else { delivery.current_location.clone() },
            estimated_delivery: if show_eta { delivery.estimated_delivery } else { None },
        }
    }
}
