// ============================================================================
// Order Store Port
// ============================================================================
//
// Responsibilities of every implementation:
// 1. Assign identity, version 1 and both timestamps on the first save
// 2. Enforce optimistic concurrency on updates: the saved order must carry
//    the version currently stored, otherwise the write fails with Conflict
// 3. Bump the version and refresh last_modified_date on every update
// 4. Stream all orders lazily; each call starts a fresh listing
//
// ============================================================================

pub mod memory;
pub mod scylla_store;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use futures_util::stream::BoxStream;
use uuid::Uuid;

use crate::domain::order::Order;

pub use memory::InMemoryOrderRepository;
pub use scylla_store::ScyllaOrderRepository;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Concurrency conflict on order {id}: expected version {expected}, but current is {actual:?}")]
    Conflict {
        id: Uuid,
        expected: i64,
        actual: Option<i64>,
    },

    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error("Order store error: {0}")]
    Backend(String),
}

impl StoreError {
    pub(crate) fn backend(err: impl std::fmt::Display) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Current time at the millisecond precision of a CQL `timestamp` column, so
/// an order handed back by `save` equals the one read back later.
pub(crate) fn store_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert a new order or update an existing one under optimistic concurrency
    async fn save(&self, order: Order) -> Result<Order, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, StoreError>;

    fn find_all(&self) -> BoxStream<'_, Result<Order, StoreError>>;
}
