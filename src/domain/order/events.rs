use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Order Events - Facts exchanged with the message bus
// ============================================================================

pub trait DomainEvent: Serialize + for<'de> Deserialize<'de> + Clone + Send + Sync {
    fn event_type() -> &'static str where Self: Sized;
    fn event_version() -> i32 where Self: Sized { 1 }
}

/// Order Accepted - published once an accepted order is committed
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderAcceptedEvent {
    pub order_id: Uuid,
}

impl DomainEvent for OrderAcceptedEvent {
    fn event_type() -> &'static str { "OrderAccepted" }
}

/// Order Dispatched - consumed from the fulfillment side
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderDispatchedEvent {
    pub order_id: Uuid,
}

impl DomainEvent for OrderDispatchedEvent {
    fn event_type() -> &'static str { "OrderDispatched" }
}
