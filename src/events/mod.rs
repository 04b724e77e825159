use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::order;
use crate::notifications::OrderNotifier;

/// Events emitted by the services after a successful state change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Storefront events
    OrderCreated(Uuid),
    MessageReceived(Uuid),

    // Catalog events
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),
    CategoryCreated(Uuid),
    CategoryUpdated(Uuid),
    CategoryDeleted(Uuid),
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

    /// Sends an event, logging instead of failing when the channel is
    /// closed or full. Events are advisory; the state change that
    /// produced them has already been committed.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event.clone()).await {
            warn!("Dropping event {:?}: {}", event, e);
        }
    }
}

/// Drains the event channel. `OrderCreated` fans out to the configured
/// notifier; everything else is logged for observability. Runs until
/// every `EventSender` is dropped.
pub async fn process_events(
    mut rx: mpsc::Receiver<Event>,
    db: Arc<DbPool>,
    notifier: Option<Arc<dyn OrderNotifier>>,
) {
    while let Some(event) = rx.recv().await {
        match event {
            Event::OrderCreated(order_id) => {
                debug!(%order_id, "Processing OrderCreated event");
                let Some(notifier) = notifier.as_ref() else {
                    debug!(%order_id, "No order notifier configured; skipping");
                    continue;
                };
                match order::Entity::find_by_id(order_id).one(db.as_ref()).await {
                    Ok(Some(order)) => {
                        // Best effort: a delivery failure never affects the order
                        if let Err(e) = notifier.order_created(&order).await {
                            warn!(%order_id, "Order notification failed: {}", e);
                        }
                    }
                    Ok(None) => warn!(%order_id, "OrderCreated event for unknown order"),
                    Err(e) => error!(%order_id, "Failed to load order for notification: {}", e),
                }
            }
            other => debug!("Event processed: {:?}", other),
        }
    }
    debug!("Event channel closed; processor exiting");
}
