use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::stream::{self, BoxStream, StreamExt, TryStreamExt};
use scylla::client::session::Session;
use scylla::response::query_result::QueryResult;
use scylla::value::{CqlValue, Row};
use std::sync::Arc;
use uuid::Uuid;

use super::{store_timestamp, OrderRepository, StoreError};
use crate::domain::order::{Order, OrderStatus};

// ============================================================================
// Scylla Order Store
// ============================================================================
//
// One row per order in the `orders` table. Inserts are guarded by
// `IF NOT EXISTS`, updates by `IF version = ?`, which gives the
// compare-and-swap needed for optimistic concurrency:
// - [applied] = true            -> write went through
// - [applied] = false, version  -> someone else advanced the row (Conflict)
// - [applied] = false, null     -> row does not exist (NotFound)
//
// ============================================================================

const ORDER_COLUMNS: &str = "id, book_isbn, book_name, book_price, quantity, status, \
                             created_date, last_modified_date, version";

type OrderRow = (
    Uuid,
    String,
    Option<String>,
    Option<f64>,
    i32,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
    i64,
);

pub struct ScyllaOrderRepository {
    session: Arc<Session>,
}

impl ScyllaOrderRepository {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Create the keyspace (single-node replication) and the orders table
    pub async fn ensure_schema(&self, keyspace: &str) -> Result<(), StoreError> {
        self.session
            .query_unpaged(
                format!(
                    "CREATE KEYSPACE IF NOT EXISTS {} WITH REPLICATION = \
                     {{'class': 'SimpleStrategy', 'replication_factor': 1}}",
                    keyspace
                ),
                (),
            )
            .await
            .map_err(StoreError::backend)?;

        self.session
            .use_keyspace(keyspace, false)
            .await
            .map_err(StoreError::backend)?;

        self.session
            .query_unpaged(
                "CREATE TABLE IF NOT EXISTS orders (
                    id uuid PRIMARY KEY,
                    book_isbn text,
                    book_name text,
                    book_price double,
                    quantity int,
                    status text,
                    created_date timestamp,
                    last_modified_date timestamp,
                    version bigint
                )",
                (),
            )
            .await
            .map_err(StoreError::backend)?;

        tracing::info!(keyspace = %keyspace, "Order schema ready");
        Ok(())
    }

    async fn insert(&self, order: Order) -> Result<Order, StoreError> {
        let now = store_timestamp();
        let id = Uuid::new_v4();
        let saved = Order {
            id: Some(id),
            version: 1,
            created_date: Some(now),
            last_modified_date: Some(now),
            ..order
        };

        let result = self
            .session
            .query_unpaged(
                format!(
                    "INSERT INTO orders ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) IF NOT EXISTS",
                    ORDER_COLUMNS
                ),
                (
                    id,
                    &saved.book_isbn,
                    &saved.book_name,
                    saved.book_price,
                    saved.quantity,
                    saved.status.as_str(),
                    now,
                    now,
                    saved.version,
                ),
            )
            .await
            .map_err(StoreError::backend)?;

        let (applied, _) = lwt_outcome(result)?;
        if !applied {
            return Err(StoreError::Backend(format!("order id {} already exists", id)));
        }

        tracing::info!(
            order_id = %id,
            status = %saved.status,
            "Inserted order"
        );

        Ok(saved)
    }

    async fn update(&self, id: Uuid, order: Order) -> Result<Order, StoreError> {
        let now = store_timestamp();
        let expected = order.version;
        let saved = Order {
            version: expected + 1,
            last_modified_date: Some(now),
            ..order
        };

        let result = self
            .session
            .query_unpaged(
                "UPDATE orders SET book_name = ?, book_price = ?, quantity = ?, status = ?, \
                 last_modified_date = ?, version = ? WHERE id = ? IF version = ?",
                (
                    &saved.book_name,
                    saved.book_price,
                    saved.quantity,
                    saved.status.as_str(),
                    now,
                    saved.version,
                    id,
                    expected,
                ),
            )
            .await
            .map_err(StoreError::backend)?;

        let (applied, current) = lwt_outcome(result)?;
        if !applied {
            return match current {
                Some(actual) => Err(StoreError::Conflict {
                    id,
                    expected,
                    actual: Some(actual),
                }),
                None => Err(StoreError::NotFound(id)),
            };
        }

        tracing::info!(
            order_id = %id,
            status = %saved.status,
            new_version = saved.version,
            "Updated order"
        );

        Ok(saved)
    }
}

/// `[applied]` of a lightweight transaction, plus the stored `version` the
/// node returns alongside it when the condition failed
fn lwt_outcome(result: QueryResult) -> Result<(bool, Option<i64>), StoreError> {
    let rows = result.into_rows_result().map_err(StoreError::backend)?;
    let row = rows
        .maybe_first_row::<Row>()
        .map_err(StoreError::backend)?
        .ok_or_else(|| StoreError::Backend("LWT returned no result row".to_string()))?;

    Ok(applied_and_version(&row))
}

fn applied_and_version(row: &Row) -> (bool, Option<i64>) {
    let applied = row
        .columns
        .first()
        .and_then(|c| c.as_ref())
        .and_then(CqlValue::as_boolean)
        .unwrap_or(false);
    let version = row
        .columns
        .get(1)
        .and_then(|c| c.as_ref())
        .and_then(CqlValue::as_bigint);

    (applied, version)
}

fn order_from_row(row: OrderRow) -> Result<Order, StoreError> {
    let (id, book_isbn, book_name, book_price, quantity, status, created, modified, version) = row;
    let status: OrderStatus = status.parse().map_err(StoreError::backend)?;

    Ok(Order {
        id: Some(id),
        version,
        book_isbn,
        book_name,
        book_price,
        quantity,
        status,
        created_date: Some(created),
        last_modified_date: Some(modified),
    })
}

#[async_trait]
impl OrderRepository for ScyllaOrderRepository {
    async fn save(&self, order: Order) -> Result<Order, StoreError> {
        match order.id {
            None => self.insert(order).await,
            Some(id) => self.update(id, order).await,
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        let result = self
            .session
            .query_unpaged(
                format!("SELECT {} FROM orders WHERE id = ?", ORDER_COLUMNS),
                (id,),
            )
            .await
            .map_err(StoreError::backend)?;

        let rows_result = match result.into_rows_result() {
            Ok(rows) => rows,
            Err(_) => return Ok(None), // No rows
        };

        match rows_result.maybe_first_row::<OrderRow>() {
            Ok(Some(row)) => order_from_row(row).map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::backend(e)),
        }
    }

    fn find_all(&self) -> BoxStream<'_, Result<Order, StoreError>> {
        let session = self.session.clone();

        stream::once(async move {
            let pager = session
                .query_iter(format!("SELECT {} FROM orders", ORDER_COLUMNS), ())
                .await
                .map_err(StoreError::backend)?;
            let rows = pager
                .rows_stream::<OrderRow>()
                .map_err(StoreError::backend)?;

            Ok::<_, StoreError>(rows.map(|row| row.map_err(StoreError::backend).and_then(order_from_row)))
        })
        .try_flatten()
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scylla::value::CqlTimestamp;

    #[test]
    fn test_row_maps_to_order() {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let row: OrderRow = (
            id,
            "1234567890".to_string(),
            Some("Lord of the Rings - J.R.R. Tolkien".to_string()),
            Some(9.90),
            3,
            "DISPATCHED".to_string(),
            now,
            now,
            2,
        );

        let order = order_from_row(row).unwrap();
        assert_eq!(order.id, Some(id));
        assert_eq!(order.status, OrderStatus::Dispatched);
        assert_eq!(order.version, 2);
        assert_eq!(order.quantity, 3);
        assert_eq!(order.created_date, Some(now));
    }

    #[test]
    fn test_row_with_unknown_status_is_a_backend_error() {
        let now = Utc::now();
        let row: OrderRow = (
            Uuid::new_v4(),
            "7390201231".to_string(),
            None,
            None,
            1,
            "LOST".to_string(),
            now,
            now,
            1,
        );

        assert!(matches!(order_from_row(row), Err(StoreError::Backend(_))));
    }

    #[test]
    fn test_store_timestamp_survives_cql_round_trip() {
        let now = store_timestamp();
        let stored: DateTime<Utc> = CqlTimestamp::from(now).try_into().unwrap();

        assert_eq!(stored, now);
    }

    #[test]
    fn test_applied_lwt_row() {
        let row = Row { columns: vec![Some(CqlValue::Boolean(true))] };
        assert_eq!(applied_and_version(&row), (true, None));
    }

    #[test]
    fn test_refused_lwt_row_carries_current_version() {
        let row = Row {
            columns: vec![Some(CqlValue::Boolean(false)), Some(CqlValue::BigInt(3))],
        };
        assert_eq!(applied_and_version(&row), (false, Some(3)));
    }

    #[test]
    fn test_refused_lwt_row_for_missing_order_has_no_version() {
        let row = Row {
            columns: vec![Some(CqlValue::Boolean(false)), None],
        };
        assert_eq!(applied_and_version(&row), (false, None));
    }

    // Insert, LWT conflict detection and paging need a running ScyllaDB node;
    // the same contract is exercised against the in-memory store.
}
