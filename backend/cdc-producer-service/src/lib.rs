//! CDC Producer Service
//!
//! Synthetic load generator that publishes Debezium-style change events for
//! simulated Oracle and DB2 tables to Kafka at a configured rate.

pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;

// Public re-exports
pub use config::{Config, ProducerConfig, ProducerMode};
pub use context::ProducerContext;
pub use error::{ProducerError, Result};
pub use services::{CdcProducer, EnvelopePublisher, KafkaEnvelopePublisher};
