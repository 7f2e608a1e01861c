use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::entities::inventory_movement::MovementType;
use crate::entities::order::OrderStatus;

/// Domain events emitted after a successful commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    SupplierCreated(i32),
    ProductCreated(i32),
    OrderCreated(i32),
    OrderStatusChanged {
        order_id: i32,
        old_status: OrderStatus,
        new_status: OrderStatus,
    },
    MovementRecorded {
        movement_id: i64,
        product_id: i32,
        movement_type: MovementType,
        quantity_changed: i32,
    },
    PartitionProvisioned {
        year: i32,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel and logs each event. Spawned once from `main`;
/// events are observability signals here, losing the task only costs logs.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::MovementRecorded {
                movement_id,
                product_id,
                movement_type,
                quantity_changed,
            } => info!(
                movement_id,
                product_id,
                %movement_type,
                quantity_changed,
                "movement recorded"
            ),
            Event::PartitionProvisioned { year } => info!(year, "partition provisioned"),
            other => info!(event = ?other, "event processed"),
        }
    }
    warn!("Event channel closed; event processor exiting");
}
