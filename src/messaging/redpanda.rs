use async_trait::async_trait;
use rdkafka::{
    config::ClientConfig,
    error::{KafkaError, RDKafkaErrorCode},
    message::{Header, OwnedHeaders},
    producer::{FutureProducer, FutureRecord},
};

use super::{EventPublisher, MessagingError};
use crate::domain::order::{DomainEvent, OrderAcceptedEvent};

pub struct RedpandaPublisher {
    producer: FutureProducer,
}

impl RedpandaPublisher {
    pub fn new(brokers: &str) -> Result<Self, MessagingError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| MessagingError::Transport(format!("Failed to create Redpanda producer: {}", e)))?;

        Ok(Self { producer })
    }
}

#[async_trait]
impl EventPublisher for RedpandaPublisher {
    async fn publish(&self, channel: &str, event: &OrderAcceptedEvent) -> Result<bool, MessagingError> {
        let key = event.order_id.to_string();
        let payload = serde_json::to_string(event)?;
        let event_version = OrderAcceptedEvent::event_version().to_string();
        let headers = OwnedHeaders::new()
            .insert(Header {
                key: "event_type",
                value: Some(OrderAcceptedEvent::event_type()),
            })
            .insert(Header {
                key: "event_version",
                value: Some(event_version.as_str()),
            });

        let record = FutureRecord::to(channel)
            .key(&key)
            .payload(&payload)
            .headers(headers);

        // Enqueue only; delivery is reported asynchronously
        let delivery = match self.producer.send_result(record) {
            Ok(delivery) => delivery,
            Err((KafkaError::MessageProduction(RDKafkaErrorCode::QueueFull), _)) => {
                tracing::warn!(
                    topic = %channel,
                    key = %key,
                    "Producer queue full, event not accepted"
                );
                return Ok(false);
            }
            Err((e, _)) => {
                tracing::error!(
                    error = %e,
                    topic = %channel,
                    "Failed to publish to Redpanda"
                );
                return Err(MessagingError::Transport(e.to_string()));
            }
        };

        let topic = channel.to_string();
        tokio::spawn(async move {
            match delivery.await {
                Ok(Ok(_)) => {
                    tracing::debug!(topic = %topic, key = %key, "Delivered to Redpanda");
                }
                Ok(Err((e, _))) => {
                    tracing::error!(error = %e, topic = %topic, key = %key, "Redpanda delivery failed");
                }
                Err(_) => {
                    tracing::warn!(topic = %topic, key = %key, "Delivery report dropped");
                }
            }
        });

        tracing::info!(
            topic = %channel,
            key = %event.order_id,
            "Published to Redpanda"
        );

        Ok(true)
    }
}
