use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use super::value_objects::{Book, OrderStatus};
use super::errors::OrderError;

// ============================================================================
// Order - Immutable value, replaced wholesale on every transition
// ============================================================================
//
// Identity, timestamps and version are owned by the order store:
// - `id` is None until the first save
// - `version` is 0 until the first save, then bumped by every update
//
// `book_name` and `book_price` are present exactly when status != REJECTED.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    // Identity
    pub id: Option<Uuid>,
    pub version: i64,

    // Request
    pub book_isbn: String,
    pub book_name: Option<String>,
    pub book_price: Option<f64>,
    pub quantity: i32,
    pub status: OrderStatus,

    // Audit Trail
    pub created_date: Option<DateTime<Utc>>,
    pub last_modified_date: Option<DateTime<Utc>>,
}

impl Order {
    /// Build an unsaved order for a book the catalog knows about
    pub fn accepted(book: &Book, quantity: i32) -> Self {
        Self {
            id: None,
            version: 0,
            book_isbn: book.isbn.clone(),
            book_name: Some(format!("{} - {}", book.title, book.author)),
            book_price: Some(book.price),
            quantity,
            status: OrderStatus::Accepted,
            created_date: None,
            last_modified_date: None,
        }
    }

    /// Build an unsaved order for a book the catalog does not have
    pub fn rejected(book_isbn: impl Into<String>, quantity: i32) -> Self {
        Self {
            id: None,
            version: 0,
            book_isbn: book_isbn.into(),
            book_name: None,
            book_price: None,
            quantity,
            status: OrderStatus::Rejected,
            created_date: None,
            last_modified_date: None,
        }
    }

    /// Copy of this order with status DISPATCHED.
    ///
    /// Only an accepted, persisted order can be dispatched. Version and
    /// modification time are left for the store to advance on save.
    pub fn dispatched(&self) -> Result<Self, OrderError> {
        let id = self.id.ok_or(OrderError::NotPersisted)?;

        match self.status {
            OrderStatus::Accepted => {}
            OrderStatus::Dispatched => return Err(OrderError::AlreadyDispatched(id)),
            OrderStatus::Rejected => {
                return Err(OrderError::InvalidStatusTransition {
                    from: self.status,
                    to: OrderStatus::Dispatched,
                })
            }
        }

        Ok(Self {
            status: OrderStatus::Dispatched,
            ..self.clone()
        })
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn lotr() -> Book {
        Book {
            isbn: "1234567890".to_string(),
            title: "Lord of the Rings".to_string(),
            author: "J.R.R. Tolkien".to_string(),
            price: 9.90,
        }
    }

    fn persisted(order: Order) -> Order {
        let now = Utc::now();
        Order {
            id: Some(Uuid::new_v4()),
            version: 1,
            created_date: Some(now),
            last_modified_date: Some(now),
            ..order
        }
    }

    #[test]
    fn test_accepted_order_denormalizes_book() {
        let order = Order::accepted(&lotr(), 3);

        assert!(order.id.is_none());
        assert_eq!(order.version, 0);
        assert_eq!(order.status, OrderStatus::Accepted);
        assert_eq!(order.book_isbn, "1234567890");
        assert_eq!(order.book_name.as_deref(), Some("Lord of the Rings - J.R.R. Tolkien"));
        assert_eq!(order.book_price, Some(9.90));
        assert_eq!(order.quantity, 3);
    }

    #[test]
    fn test_rejected_order_has_no_book_details() {
        let order = Order::rejected("7390201231", 1);

        assert_eq!(order.status, OrderStatus::Rejected);
        assert_eq!(order.book_isbn, "7390201231");
        assert!(order.book_name.is_none());
        assert!(order.book_price.is_none());
        assert_eq!(order.quantity, 1);
    }

    #[test]
    fn test_dispatch_preserves_everything_but_status() {
        let order = persisted(Order::accepted(&lotr(), 2));
        let dispatched = order.dispatched().unwrap();

        assert_eq!(dispatched.status, OrderStatus::Dispatched);
        assert_eq!(dispatched.id, order.id);
        assert_eq!(dispatched.version, order.version);
        assert_eq!(dispatched.book_name, order.book_name);
        assert_eq!(dispatched.book_price, order.book_price);
        assert_eq!(dispatched.quantity, order.quantity);
        assert_eq!(dispatched.created_date, order.created_date);
        // original value is untouched
        assert_eq!(order.status, OrderStatus::Accepted);
    }

    #[test]
    fn test_dispatch_of_rejected_order_is_refused() {
        let order = persisted(Order::rejected("7390201231", 1));

        match order.dispatched() {
            Err(OrderError::InvalidStatusTransition { from, to }) => {
                assert_eq!(from, OrderStatus::Rejected);
                assert_eq!(to, OrderStatus::Dispatched);
            }
            other => panic!("expected invalid transition, got {:?}", other),
        }
    }

    #[test]
    fn test_dispatch_twice_reports_duplicate() {
        let order = persisted(Order::accepted(&lotr(), 1)).dispatched().unwrap();
        let id = order.id.unwrap();

        assert!(matches!(order.dispatched(), Err(OrderError::AlreadyDispatched(d)) if d == id));
    }

    #[test]
    fn test_unsaved_order_cannot_be_dispatched() {
        let order = Order::accepted(&lotr(), 1);
        assert!(matches!(order.dispatched(), Err(OrderError::NotPersisted)));
    }

    #[test]
    fn test_order_json_uses_camel_case() {
        let order = persisted(Order::accepted(&lotr(), 3));
        let json = serde_json::to_value(&order).unwrap();

        assert_eq!(json["bookIsbn"], "1234567890");
        assert_eq!(json["bookName"], "Lord of the Rings - J.R.R. Tolkien");
        assert_eq!(json["status"], "ACCEPTED");
        assert!(json.get("lastModifiedDate").is_some());
    }
}
