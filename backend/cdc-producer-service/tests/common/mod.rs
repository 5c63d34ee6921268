use async_trait::async_trait;
use cdc_producer_service::{CdcProducer, EnvelopePublisher, ProducerConfig, ProducerContext, Result};
use serde_json::Value;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub topic: String,
    pub key: String,
    pub body: Value,
}

/// Keeps every published envelope in memory, in publish order.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<PublishedEvent>>,
}

#[allow(dead_code)]
impl RecordingPublisher {
    pub fn events(&self) -> Vec<PublishedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

#[async_trait]
impl EnvelopePublisher for RecordingPublisher {
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> Result<()> {
        let body = serde_json::from_slice(payload)?;
        self.events.lock().unwrap().push(PublishedEvent {
            topic: topic.to_string(),
            key: key.to_string(),
            body,
        });
        Ok(())
    }
}

#[allow(dead_code)]
pub fn producer(
    publisher: &Arc<RecordingPublisher>,
    mode: &str,
    events_per_second: u32,
    threads: u32,
) -> CdcProducer {
    let config = ProducerConfig {
        mode: mode.to_string(),
        events_per_second,
        threads,
        ..ProducerConfig::default()
    };
    let publisher: Arc<dyn EnvelopePublisher> = publisher.clone();

    let ctx = Arc::new(ProducerContext::with_position_seed(1_700_000_000_000));

    CdcProducer::with_context(config, publisher, ctx)
}

/// SCN, or the LSN decoded from hex.
#[allow(dead_code)]
pub fn position_of(body: &Value) -> u64 {
    let source = &body["source"];
    match source.get("scn") {
        Some(scn) => scn.as_u64().unwrap(),
        None => u64::from_str_radix(source["lsn"].as_str().unwrap(), 16).unwrap(),
    }
}

#[allow(dead_code)]
pub fn id_of(body: &Value) -> u64 {
    body["after"]["id"].as_u64().unwrap()
}
