//! Configuration management
use serde::Deserialize;
use std::env;
use std::str::FromStr;

use crate::error::{ProducerError, Result};
use crate::models::{EntityKind, SourceSystem};

/// Which source systems the producer emits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerMode {
    Oracle,
    Db2,
    Both,
}

impl ProducerMode {
    pub fn produces(&self, system: SourceSystem) -> bool {
        match (self, system) {
            (ProducerMode::Both, _) => true,
            (ProducerMode::Oracle, SourceSystem::Oracle) => true,
            (ProducerMode::Db2, SourceSystem::Db2) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProducerMode::Oracle => "oracle",
            ProducerMode::Db2 => "db2",
            ProducerMode::Both => "both",
        }
    }
}

impl FromStr for ProducerMode {
    type Err = ProducerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oracle" => Ok(ProducerMode::Oracle),
            "db2" => Ok(ProducerMode::Db2),
            "both" => Ok(ProducerMode::Both),
            other => Err(ProducerError::Config(format!(
                "mode must be one of oracle, db2, both (got '{}')",
                other
            ))),
        }
    }
}

/// Producer settings, read from `PRODUCER_*` environment variables.
///
/// `mode` is kept as the raw string and only parsed by [`ProducerConfig::plan`],
/// so a bad value fails the start attempt rather than process boot.
#[derive(Debug, Clone, Deserialize)]
pub struct ProducerConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_mode")]
    pub mode: String,

    /// Aggregate target rate across all workers
    #[serde(default = "default_events_per_second")]
    pub events_per_second: u32,

    #[serde(default = "default_threads")]
    pub threads: u32,

    #[serde(default = "default_topic_oracle_customers")]
    pub topic_oracle_customers: String,

    #[serde(default = "default_topic_oracle_orders")]
    pub topic_oracle_orders: String,

    #[serde(default = "default_topic_db2_products")]
    pub topic_db2_products: String,

    #[serde(default = "default_topic_db2_inventory")]
    pub topic_db2_inventory: String,

    /// Period of the stats log line
    #[serde(default = "default_stats_interval_secs")]
    pub stats_interval_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_mode() -> String {
    "both".to_string()
}

fn default_events_per_second() -> u32 {
    1000
}

fn default_threads() -> u32 {
    4
}

fn default_topic_oracle_customers() -> String {
    "oracle-cdc-customers".to_string()
}

fn default_topic_oracle_orders() -> String {
    "oracle-cdc-orders".to_string()
}

fn default_topic_db2_products() -> String {
    "db2-cdc-products".to_string()
}

fn default_topic_db2_inventory() -> String {
    "db2-cdc-inventory".to_string()
}

fn default_stats_interval_secs() -> u64 {
    10
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            mode: default_mode(),
            events_per_second: default_events_per_second(),
            threads: default_threads(),
            topic_oracle_customers: default_topic_oracle_customers(),
            topic_oracle_orders: default_topic_oracle_orders(),
            topic_db2_products: default_topic_db2_products(),
            topic_db2_inventory: default_topic_db2_inventory(),
            stats_interval_secs: default_stats_interval_secs(),
        }
    }
}

/// Validated worker layout derived from [`ProducerConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPlan {
    pub mode: ProducerMode,
    pub threads: usize,
    /// `events_per_second / threads`; the remainder is dropped.
    pub per_worker_rate: u32,
}

impl ProducerConfig {
    pub fn from_env() -> std::result::Result<Self, envy::Error> {
        envy::prefixed("PRODUCER_").from_env()
    }

    /// Validate the settings and split the aggregate rate across workers.
    pub fn plan(&self) -> Result<RunPlan> {
        let mode: ProducerMode = self.mode.parse()?;

        if self.threads == 0 {
            return Err(ProducerError::Config("threads must be >= 1".to_string()));
        }
        if self.events_per_second == 0 {
            return Err(ProducerError::Config(
                "events-per-second must be >= 1".to_string(),
            ));
        }

        let per_worker_rate = self.events_per_second / self.threads;
        if per_worker_rate == 0 {
            return Err(ProducerError::Config(format!(
                "events-per-second ({}) must be >= threads ({})",
                self.events_per_second, self.threads
            )));
        }

        Ok(RunPlan {
            mode,
            threads: self.threads as usize,
            per_worker_rate,
        })
    }

    pub fn topic_for(&self, entity: EntityKind) -> &str {
        match entity {
            EntityKind::Customer => &self.topic_oracle_customers,
            EntityKind::Order => &self.topic_oracle_orders,
            EntityKind::Product => &self.topic_db2_products,
            EntityKind::Inventory => &self.topic_db2_inventory,
        }
    }
}

/// Kafka producer settings
#[derive(Debug, Clone)]
pub struct KafkaConfig {
    /// Kafka broker addresses (comma-separated)
    pub brokers: String,

    pub acks: String,

    pub linger_ms: u64,

    pub compression: String,

    /// Delivery timeout for a single message (milliseconds)
    pub message_timeout_ms: u64,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            brokers: "localhost:9092".to_string(),
            acks: "1".to_string(),
            linger_ms: 5,
            compression: "lz4".to_string(),
            message_timeout_ms: 30000,
        }
    }
}

impl KafkaConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            brokers: env::var("KAFKA_BROKERS").unwrap_or(defaults.brokers),
            acks: env::var("KAFKA_ACKS").unwrap_or(defaults.acks),
            linger_ms: env::var("KAFKA_LINGER_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.linger_ms),
            compression: env::var("KAFKA_COMPRESSION").unwrap_or(defaults.compression),
            message_timeout_ms: env::var("KAFKA_MESSAGE_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.message_timeout_ms),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub producer: ProducerConfig,
    pub kafka: KafkaConfig,
    pub http_port: u16,
}

impl Config {
    pub fn from_env() -> std::result::Result<Self, envy::Error> {
        dotenvy::dotenv().ok();

        Ok(Config {
            producer: ProducerConfig::from_env()?,
            kafka: KafkaConfig::from_env(),
            http_port: env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
        })
    }
}
