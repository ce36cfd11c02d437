// ============================================================================
// Order Domain - Business Logic for the Order lifecycle
// ============================================================================
//
// This module contains ALL Order-specific code:
// - Value objects (Book, OrderStatus)
// - Events (OrderAcceptedEvent, OrderDispatchedEvent)
// - Errors (OrderError, ServiceError)
// - Aggregate (Order with its pure transitions)
// - Service (OrderService orchestrating catalog, store and bus)
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod errors;
pub mod aggregate;
pub mod service;

// Re-export for convenience
pub use value_objects::*;
pub use events::*;
pub use errors::*;
pub use aggregate::*;
pub use service::*;
