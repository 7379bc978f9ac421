use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Events emitted by services after successful state changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    OrderCancelled(Uuid),
    OrderCompleted(Uuid),
    OrderDeleted(Uuid),

    PaymentRecorded {
        order_id: Uuid,
        method: String,
        amount: Decimal,
    },

    InventoryRestocked {
        item_id: Uuid,
        quantity_added: Decimal,
    },
    InventoryConsumed {
        item_id: Uuid,
        amount: Decimal,
    },
    LowStock {
        item_id: Uuid,
        name: String,
        quantity: Decimal,
        min_quantity: Decimal,
    },

    TableStatusChanged {
        table_id: Uuid,
        old_status: String,
        new_status: String,
    },

    RecipeReplaced {
        menu_item_id: Uuid,
        ingredient_count: usize,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Consumes events and logs them. Runs for the lifetime of the process.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::LowStock {
                name,
                quantity,
                min_quantity,
                ..
            } => {
                warn!(
                    item = %name,
                    quantity = %quantity,
                    min_quantity = %min_quantity,
                    "Inventory item at or below reorder threshold"
                );
            }
            other => {
                info!(event = ?other, "Event processed");
            }
        }
    }
    info!("Event channel closed; event processor shutting down");
}
