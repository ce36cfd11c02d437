// ============================================================================
// Messaging - Event Publisher Port and Redpanda adapters
// ============================================================================

mod redpanda;
mod dispatch_subscriber;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::domain::order::{OrderAcceptedEvent, OrderDispatchedEvent};

pub use redpanda::RedpandaPublisher;
pub use dispatch_subscriber::{subscribe_dispatched_orders, DispatchSubscription};

#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    #[error("Failed to encode event: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Message bus error: {0}")]
    Transport(String),

    #[error("Failed to subscribe to {topic}: {reason}")]
    Subscription { topic: String, reason: String },
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Hand an event to the transport.
    ///
    /// `Ok(true)` means the transport accepted the send, not that it was
    /// delivered. `Ok(false)` means the transport refused it.
    async fn publish(&self, channel: &str, event: &OrderAcceptedEvent) -> Result<bool, MessagingError>;
}

/// Outcome of handling one inbound dispatch notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchAck {
    /// Applied or deliberately dropped; the offset can be committed
    Commit,
    /// Not applied; the notification must be delivered again
    Redeliver,
}

/// A dispatch notification plus the channel its outcome is reported on.
///
/// Dropping a delivery without settling it counts as `Redeliver`.
pub struct DispatchDelivery {
    event: OrderDispatchedEvent,
    ack: oneshot::Sender<DispatchAck>,
}

impl DispatchDelivery {
    pub fn new(event: OrderDispatchedEvent, ack: oneshot::Sender<DispatchAck>) -> Self {
        Self { event, ack }
    }

    pub fn event(&self) -> &OrderDispatchedEvent {
        &self.event
    }

    pub fn settle(self, outcome: DispatchAck) {
        // subscriber already gone: the offset stays uncommitted either way
        let _ = self.ack.send(outcome);
    }
}
