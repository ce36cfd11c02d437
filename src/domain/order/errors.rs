use uuid::Uuid;

use super::value_objects::OrderStatus;
use crate::catalog::CatalogError;
use crate::store::StoreError;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order {0} is already dispatched")]
    AlreadyDispatched(Uuid),

    #[error("Cannot move order from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order has not been persisted yet")]
    NotPersisted,

    #[error("Unknown order status: {0}")]
    UnknownStatus(String),
}

// ============================================================================
// Orchestration Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Order(#[from] OrderError),
}

impl ServiceError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, ServiceError::Store(StoreError::Conflict { .. }))
    }

    /// Failures that may succeed on another attempt. Order rule violations
    /// never will.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Store(_) | ServiceError::Catalog(_))
    }
}
