use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{store_timestamp, OrderRepository, StoreError};
use crate::domain::order::Order;

/// Order store kept in process memory.
///
/// The version check and the write happen under one write lock, so two
/// writers holding the same version cannot both succeed.
#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<Uuid, Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn save(&self, order: Order) -> Result<Order, StoreError> {
        let now = store_timestamp();
        let mut orders = self.orders.write().await;

        let saved = match order.id {
            None => {
                let id = Uuid::new_v4();
                Order {
                    id: Some(id),
                    version: 1,
                    created_date: Some(now),
                    last_modified_date: Some(now),
                    ..order
                }
            }
            Some(id) => {
                let current = orders.get(&id).ok_or(StoreError::NotFound(id))?;
                if current.version != order.version {
                    return Err(StoreError::Conflict {
                        id,
                        expected: order.version,
                        actual: Some(current.version),
                    });
                }
                Order {
                    version: order.version + 1,
                    created_date: current.created_date,
                    last_modified_date: Some(now),
                    ..order
                }
            }
        };

        if let Some(id) = saved.id {
            orders.insert(id, saved.clone());
        }

        tracing::debug!(
            order_id = ?saved.id,
            version = saved.version,
            status = %saved.status,
            "Saved order in memory"
        );

        Ok(saved)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    fn find_all(&self) -> BoxStream<'_, Result<Order, StoreError>> {
        stream::once(async move {
            let snapshot: Vec<Order> = self.orders.read().await.values().cloned().collect();
            stream::iter(snapshot.into_iter().map(Ok))
        })
        .flatten()
        .boxed()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
