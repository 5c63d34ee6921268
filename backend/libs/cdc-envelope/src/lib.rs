//! Debezium-compatible change event envelope
//!
//! Wire model for synthetic change-data-capture events. The JSON produced by
//! serializing an [`Envelope`] matches what a Debezium connector publishes
//! with `value.converter.schemas.enable = false`:
//!
//! ```text
//! {
//!   "before": {...} | null,
//!   "after":  {...} | null,
//!   "source": { "version", "connector", "name", "ts_ms", "snapshot",
//!               "db", "schema", "table", ("txId", "scn") | ("lsn") },
//!   "op": "c" | "u" | "d" | "r",
//!   "ts_ms": 1700000000000
//! }
//! ```
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod record;

pub use record::{FieldValue, Record};

pub type Result<T> = std::result::Result<T, EnvelopeError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// CDC operation codes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Row inserted (c = create)
    #[serde(rename = "c")]
    Create,
    /// Row updated (u = update)
    #[serde(rename = "u")]
    Update,
    /// Row deleted (d = delete)
    #[serde(rename = "d")]
    Delete,
    /// Row read during a snapshot (r = read)
    #[serde(rename = "r")]
    Read,
}

impl Operation {
    pub fn code(&self) -> &'static str {
        match self {
            Operation::Create => "c",
            Operation::Update => "u",
            Operation::Delete => "d",
            Operation::Read => "r",
        }
    }

    pub fn has_before(&self) -> bool {
        !matches!(self, Operation::Create)
    }

    pub fn has_after(&self) -> bool {
        !matches!(self, Operation::Delete)
    }
}

/// Debezium encodes the snapshot marker as a string
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFlag {
    True,
    False,
    Last,
}

/// Replication position of the change in the source log.
///
/// Flattened into `source`, so only the fields of the active variant are
/// written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PositionMarker {
    /// Oracle system change number plus the owning transaction
    Scn {
        #[serde(rename = "txId")]
        tx_id: String,
        scn: u64,
    },
    /// DB2 log sequence number, 16 uppercase hex digits
    Lsn { lsn: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceMetadata {
    /// Connector version (e.g. "2.4.0.Final")
    pub version: String,

    /// Connector type (e.g. "oracle", "db2")
    pub connector: String,

    /// Logical name of the source server
    pub name: String,

    /// Capture timestamp in milliseconds since epoch
    pub ts_ms: i64,

    pub snapshot: SnapshotFlag,

    pub db: String,

    pub schema: String,

    pub table: String,

    #[serde(flatten)]
    pub position: PositionMarker,
}

/// One change event
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    /// Row state before the change (null for create)
    pub before: Option<Record>,

    /// Row state after the change (null for delete)
    pub after: Option<Record>,

    pub source: SourceMetadata,

    pub op: Operation,

    /// Emission timestamp in milliseconds since epoch
    pub ts_ms: i64,
}

impl Envelope {
    /// Check the structural invariants every emitted envelope must hold.
    pub fn validate(&self) -> Result<()> {
        if self.after.is_some() != self.op.has_after() {
            return Err(EnvelopeError::InvariantViolation(format!(
                "op '{}' with after present = {}",
                self.op.code(),
                self.after.is_some()
            )));
        }

        if self.before.is_some() != self.op.has_before() {
            return Err(EnvelopeError::InvariantViolation(format!(
                "op '{}' with before present = {}",
                self.op.code(),
                self.before.is_some()
            )));
        }

        if self.ts_ms != self.source.ts_ms {
            return Err(EnvelopeError::InvariantViolation(format!(
                "envelope ts_ms {} differs from source ts_ms {}",
                self.ts_ms, self.source.ts_ms
            )));
        }

        Ok(())
    }

    pub fn table(&self) -> &str {
        &self.source.table
    }

    /// Primary key of the changed row, taken from `after` or, for deletes,
    /// from `before`.
    pub fn key_id(&self) -> Option<u64> {
        self.after
            .as_ref()
            .or(self.before.as_ref())
            .and_then(|record| record.get("id"))
            .and_then(FieldValue::as_id)
    }
}
