use futures_util::stream::{self, BoxStream, StreamExt};
use rdkafka::{
    config::ClientConfig,
    consumer::{CommitMode, Consumer, StreamConsumer},
    message::Message,
};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

use super::{DispatchAck, DispatchDelivery, MessagingError};
use crate::domain::order::OrderDispatchedEvent;

/// Inbound dispatch notifications, decoded and in arrival order
pub type DispatchSubscription = BoxStream<'static, DispatchDelivery>;

const REDELIVERY_BACKOFF: Duration = Duration::from_secs(1);

/// Subscribe to the dispatch topic.
///
/// A background task owns the consumer and hands each decoded notification
/// over together with an ack channel, one at a time. The offset is committed
/// only once the handler settles the notification with `Commit`. A
/// `Redeliver` (or an unsettled delivery) leaves the offset uncommitted and
/// hands the same notification over again after a backoff, so a crash at any
/// point means the bus redelivers it. Payloads that do not decode are logged
/// and committed.
pub fn subscribe_dispatched_orders(
    brokers: &str,
    consumer_group: &str,
    topic: &str,
) -> Result<DispatchSubscription, MessagingError> {
    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", brokers)
        .set("group.id", consumer_group)
        .set("enable.auto.commit", "false")
        .set("auto.offset.reset", "earliest")
        .set("session.timeout.ms", "6000")
        .set("enable.partition.eof", "false")
        .create()
        .map_err(|e| MessagingError::Subscription {
            topic: topic.to_string(),
            reason: format!("Failed to create consumer: {}", e),
        })?;

    consumer.subscribe(&[topic]).map_err(|e| MessagingError::Subscription {
        topic: topic.to_string(),
        reason: e.to_string(),
    })?;

    tracing::info!(
        topic = %topic,
        consumer_group = %consumer_group,
        "Subscribed to dispatch notifications"
    );

    let (tx, rx) = mpsc::channel::<DispatchDelivery>(1);

    tokio::spawn(async move {
        let mut messages = consumer.stream();

        while let Some(next) = messages.next().await {
            let message = match next {
                Ok(message) => message,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to receive dispatch notification");
                    continue;
                }
            };

            let decoded = message
                .payload()
                .map(serde_json::from_slice::<OrderDispatchedEvent>);

            match decoded {
                Some(Ok(event)) => {
                    tracing::debug!(
                        order_id = %event.order_id,
                        partition = message.partition(),
                        offset = message.offset(),
                        "Received dispatch notification"
                    );

                    if !hand_over(&tx, &event, REDELIVERY_BACKOFF).await {
                        tracing::debug!("Dispatch receiver dropped, stopping consumer");
                        break; // exit WITHOUT committing
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!(
                        error = %e,
                        offset = message.offset(),
                        "Skipping undecodable dispatch notification"
                    );
                }
                None => {
                    tracing::warn!(offset = message.offset(), "Skipping empty dispatch notification");
                }
            }

            if let Err(e) = consumer.commit_message(&message, CommitMode::Async) {
                tracing::warn!(
                    error = %e,
                    offset = message.offset(),
                    "Failed to commit offset (message may be redelivered)"
                );
            }
        }

        tracing::debug!("Dispatch consumer task exiting");
    });

    let deliveries = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|delivery| (delivery, rx))
    });

    Ok(deliveries.boxed())
}

/// Hand one notification to the handler until it is settled with `Commit`.
///
/// Returns `false` once the receiving side is gone; the notification is then
/// left uncommitted.
async fn hand_over(
    tx: &mpsc::Sender<DispatchDelivery>,
    event: &OrderDispatchedEvent,
    backoff: Duration,
) -> bool {
    loop {
        let (ack_tx, ack_rx) = oneshot::channel();
        if tx.send(DispatchDelivery::new(event.clone(), ack_tx)).await.is_err() {
            return false;
        }

        match ack_rx.await {
            Ok(DispatchAck::Commit) => return true,
            Ok(DispatchAck::Redeliver) | Err(_) => {
                tracing::warn!(order_id = %event.order_id, "Dispatch notification not applied, redelivering");
                tokio::time::sleep(backoff).await;
            }
        }
    }
}
