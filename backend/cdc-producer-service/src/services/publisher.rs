use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use tracing::{error, info, warn};

use crate::config::KafkaConfig;
use crate::error::{ProducerError, Result};
use crate::metrics::helpers;

/// Transport seam for serialized envelopes.
///
/// Implementations are fire-and-forget from the caller's point of view: an
/// `Err` means the message was not handed to the transport, and the caller
/// never retries it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EnvelopePublisher: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> Result<()>;
}

/// Kafka-backed publisher.
///
/// Messages are enqueued on librdkafka's internal queue; delivery reports
/// are observed on a detached task that only logs and counts failures.
pub struct KafkaEnvelopePublisher {
    producer: FutureProducer,
}

impl KafkaEnvelopePublisher {
    pub fn new(config: &KafkaConfig) -> Result<Self> {
        info!(
            "Initializing Kafka publisher (brokers: {}, acks: {}, compression: {})",
            config.brokers, config.acks, config.compression
        );

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("acks", &config.acks)
            .set("linger.ms", config.linger_ms.to_string())
            .set("compression.type", &config.compression)
            .set("message.timeout.ms", config.message_timeout_ms.to_string())
            .set("queue.buffering.max.messages", "100000")
            .create()
            .map_err(|e| {
                error!("Failed to create Kafka producer: {}", e);
                ProducerError::Kafka(e)
            })?;

        Ok(Self { producer })
    }
}

#[async_trait]
impl EnvelopePublisher for KafkaEnvelopePublisher {
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> Result<()> {
        let record = FutureRecord::to(topic).key(key).payload(payload);

        let delivery = self
            .producer
            .send_result(record)
            .map_err(|(e, _)| {
                ProducerError::Publish(format!("enqueue to {} failed: {}", topic, e))
            })?;

        let topic = topic.to_string();
        tokio::spawn(async move {
            match delivery.await {
                Ok(Ok(_)) => {}
                Ok(Err((e, _))) => {
                    warn!(topic = %topic, error = %e, "Kafka delivery failed");
                    helpers::record_delivery_failure(&topic);
                }
                Err(_) => {
                    warn!(topic = %topic, "Kafka delivery report dropped");
                    helpers::record_delivery_failure(&topic);
                }
            }
        });

        Ok(())
    }
}
