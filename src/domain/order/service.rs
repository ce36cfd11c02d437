use futures_util::stream::{BoxStream, Stream, StreamExt};
use std::sync::Arc;
use std::time::Instant;

use crate::catalog::BookCatalog;
use crate::messaging::{DispatchAck, DispatchDelivery, EventPublisher};
use crate::metrics::OrderMetrics;
use crate::store::{OrderRepository, StoreError};

use super::aggregate::Order;
use super::errors::{OrderError, ServiceError};
use super::events::{OrderAcceptedEvent, OrderDispatchedEvent};
use super::value_objects::OrderStatus;

// ============================================================================
// Order Service
// ============================================================================
//
// Orchestrates: Catalog → Order → Order Store → Event Publisher
//
// Submission steps run strictly in sequence. The accepted event is sent only
// after the order is committed, and a failed send never undoes the order.
//
// ============================================================================

pub struct OrderService {
    catalog: Arc<dyn BookCatalog>,
    repository: Arc<dyn OrderRepository>,
    publisher: Arc<dyn EventPublisher>,
    accepted_channel: String,
    metrics: Option<Arc<OrderMetrics>>,
}

impl OrderService {
    pub fn new(
        catalog: Arc<dyn BookCatalog>,
        repository: Arc<dyn OrderRepository>,
        publisher: Arc<dyn EventPublisher>,
        accepted_channel: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            repository,
            publisher,
            accepted_channel: accepted_channel.into(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<OrderMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Look the book up, record the order as accepted or rejected, and
    /// announce acceptance.
    ///
    /// A rejected order is a successful outcome. A failed catalog lookup
    /// fails the call before anything is stored.
    pub async fn submit_order(&self, book_isbn: &str, quantity: i32) -> Result<Order, ServiceError> {
        tracing::info!(isbn = %book_isbn, quantity = quantity, "Submitting order");

        let started = Instant::now();
        let lookup = self.catalog.find_by_isbn(book_isbn).await;
        if let Some(metrics) = &self.metrics {
            metrics.record_catalog_lookup(started.elapsed().as_secs_f64());
        }

        let order = match lookup? {
            Some(book) => Order::accepted(&book, quantity),
            None => Order::rejected(book_isbn, quantity),
        };

        let order = self.repository.save(order).await?;

        tracing::info!(
            order_id = ?order.id,
            isbn = %order.book_isbn,
            status = %order.status,
            "Order recorded"
        );
        if let Some(metrics) = &self.metrics {
            metrics.record_submission(order.status.as_str());
        }

        self.publish_order_accepted_event(&order).await;

        Ok(order)
    }

    async fn publish_order_accepted_event(&self, order: &Order) {
        if order.status != OrderStatus::Accepted {
            return;
        }
        let Some(order_id) = order.id else {
            tracing::warn!("Accepted order has no id, skipping event");
            return;
        };

        let event = OrderAcceptedEvent { order_id };
        tracing::info!(order_id = %order_id, "Sending order accepted event");

        let outcome = match self.publisher.publish(&self.accepted_channel, &event).await {
            Ok(true) => {
                tracing::info!(order_id = %order_id, "Order accepted event sent");
                "sent"
            }
            Ok(false) => {
                tracing::warn!(order_id = %order_id, "Order accepted event was not accepted by the bus");
                "refused"
            }
            Err(e) => {
                tracing::error!(
                    order_id = %order_id,
                    error = %e,
                    "Failed to send order accepted event"
                );
                "failed"
            }
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_publish(outcome);
        }
    }

    /// Every stored order. Each call starts a new listing.
    pub fn get_all_orders(&self) -> BoxStream<'_, Result<Order, StoreError>> {
        self.repository.find_all()
    }

    /// Apply one dispatch notification.
    ///
    /// Returns `Ok(None)` when the notification is dropped: the order is
    /// unknown, or it is already dispatched (redelivery).
    pub async fn dispatch_order(&self, event: OrderDispatchedEvent) -> Result<Option<Order>, ServiceError> {
        let Some(existing) = self.repository.find_by_id(event.order_id).await? else {
            tracing::debug!(order_id = %event.order_id, "No order for dispatch notification, dropping");
            self.record_dropped("not_found");
            return Ok(None);
        };

        let dispatched = match existing.dispatched() {
            Ok(order) => order,
            Err(OrderError::AlreadyDispatched(id)) => {
                tracing::debug!(order_id = %id, "Order already dispatched, dropping duplicate");
                self.record_dropped("duplicate");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let saved = self.repository.save(dispatched).await?;
        if let Some(metrics) = &self.metrics {
            metrics.record_dispatched();
        }

        Ok(Some(saved))
    }

    /// Turn a stream of dispatch notifications into a stream of updated orders.
    ///
    /// Notifications are applied one at a time in arrival order. Dropped
    /// notifications yield nothing; a failed one yields its error and the
    /// stream moves on to the next notification.
    pub fn consume_order_dispatched_events<'a, S>(
        &'a self,
        events: S,
    ) -> impl Stream<Item = Result<Order, ServiceError>> + 'a
    where
        S: Stream<Item = OrderDispatchedEvent> + 'a,
    {
        events
            .then(move |event| self.dispatch_order(event))
            .filter_map(|result| async move { result.transpose() })
    }

    /// Drive dispatch reconciliation until the inbound stream ends.
    ///
    /// Each delivery is settled once handled: applied and dropped
    /// notifications are committed, transient failures (store, catalog) are
    /// sent back for redelivery, rule violations are committed since another
    /// attempt cannot succeed.
    pub async fn run_dispatch_consumer<S>(&self, deliveries: S)
    where
        S: Stream<Item = DispatchDelivery>,
    {
        futures_util::pin_mut!(deliveries);

        while let Some(delivery) = deliveries.next().await {
            let result = self.dispatch_order(delivery.event().clone()).await;

            let ack = match &result {
                Ok(Some(order)) => {
                    tracing::info!(order_id = ?order.id, "The order is dispatched");
                    DispatchAck::Commit
                }
                Ok(None) => DispatchAck::Commit,
                Err(e) => {
                    if let Some(metrics) = &self.metrics {
                        metrics.record_dispatch_failed();
                    }
                    if e.is_conflict() {
                        tracing::warn!(error = %e, "Dispatch lost a concurrent update");
                    } else {
                        tracing::error!(error = %e, "Failed to apply dispatch notification");
                    }

                    if e.is_retryable() {
                        DispatchAck::Redeliver
                    } else {
                        DispatchAck::Commit
                    }
                }
            };

            delivery.settle(ack);
        }

        tracing::info!("Dispatch notification stream ended");
    }

    fn record_dropped(&self, reason: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_dispatch_dropped(reason);
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
