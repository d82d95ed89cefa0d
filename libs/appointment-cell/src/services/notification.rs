use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use crate::models::{BookingEvent, NotificationError};

pub type NotificationReceiver = broadcast::Receiver<String>;

/// Downstream sink for booking events. Delivery guarantees belong to the implementation;
/// the booking path never waits on or fails because of it.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn publish(&self, event: BookingEvent) -> Result<(), NotificationError>;
}

/// Role-addressed fan-out over broadcast channels, one channel per audience.
pub struct StaffNotificationHub {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<String>>>>,
    capacity: usize,
}

impl StaffNotificationHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    pub async fn subscribe(&self, audience: &str) -> NotificationReceiver {
        let mut channels = self.channels.write().await;
        let sender = channels
            .entry(audience.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0);

        debug!("New subscriber for audience {}", audience);
        sender.subscribe()
    }

    /// Returns the number of subscribers reached; an audience nobody listens to is not an error.
    pub async fn send_to_role(&self, audience: &str, message: String) -> Result<usize, NotificationError> {
        let channels = self.channels.read().await;
        let Some(sender) = channels.get(audience) else {
            debug!("No channel for audience {}, dropping message", audience);
            return Ok(0);
        };

        match sender.send(message) {
            Ok(delivered) => Ok(delivered),
            Err(_) => {
                debug!("Audience {} has no live subscribers", audience);
                Ok(0)
            }
        }
    }

    pub async fn active_audiences(&self) -> Vec<String> {
        let channels = self.channels.read().await;
        channels.keys().cloned().collect()
    }
}

impl Default for StaffNotificationHub {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Clone for StaffNotificationHub {
    fn clone(&self) -> Self {
        Self {
            channels: Arc::clone(&self.channels),
            capacity: self.capacity,
        }
    }
}

#[async_trait]
impl NotificationSink for StaffNotificationHub {
    async fn publish(&self, event: BookingEvent) -> Result<(), NotificationError> {
        let data = serde_json::to_value(&event)?;
        let message = serde_json::json!({
            "type": &event.event_type,
            "appointment_id": event.appointment_id,
            "sent_at": Utc::now().to_rfc3339(),
            "data": data,
        })
        .to_string();

        let delivered = self.send_to_role(&event.audience, message).await?;
        debug!("Booking event for {} delivered to {} subscriber(s)", event.appointment_id, delivered);
        Ok(())
    }
}
