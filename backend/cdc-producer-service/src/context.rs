//! Process-wide counters shared by every emission worker.
//!
//! Id sequences and position counters are plain atomic cells owned by a
//! [`ProducerContext`]; workers hold an `Arc` to it. Nothing here takes a
//! lock, and nothing is reset by stopping and restarting the producer.

use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::models::{EntityKind, SourceSystem};

/// Per-table primary key sequences.
#[derive(Debug, Default)]
pub struct IdSequences {
    customers: AtomicU64,
    orders: AtomicU64,
    products: AtomicU64,
    inventory: AtomicU64,
}

impl IdSequences {
    fn cell(&self, entity: EntityKind) -> &AtomicU64 {
        match entity {
            EntityKind::Customer => &self.customers,
            EntityKind::Order => &self.orders,
            EntityKind::Product => &self.products,
            EntityKind::Inventory => &self.inventory,
        }
    }

    /// Allocate the next id. Ids start at 1 and are never reused.
    pub fn next(&self, entity: EntityKind) -> u64 {
        self.cell(entity).fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Last id handed out (0 before the first allocation).
    pub fn current(&self, entity: EntityKind) -> u64 {
        self.cell(entity).load(Ordering::Relaxed)
    }

    /// Total ids allocated across all tables.
    pub fn total(&self) -> u64 {
        EntityKind::ALL
            .iter()
            .map(|entity| self.current(*entity))
            .fold(0u64, u64::wrapping_add)
    }
}

/// Per-source-system replication position counters (SCN for Oracle, LSN for DB2).
#[derive(Debug)]
pub struct PositionCounters {
    oracle_scn: AtomicU64,
    db2_lsn: AtomicU64,
}

impl PositionCounters {
    pub fn starting_at(seed: u64) -> Self {
        Self {
            oracle_scn: AtomicU64::new(seed),
            db2_lsn: AtomicU64::new(seed),
        }
    }

    fn cell(&self, system: SourceSystem) -> &AtomicU64 {
        match system {
            SourceSystem::Oracle => &self.oracle_scn,
            SourceSystem::Db2 => &self.db2_lsn,
        }
    }

    /// Exactly one atomic increment per call.
    pub fn next(&self, system: SourceSystem) -> u64 {
        self.cell(system).fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn current(&self, system: SourceSystem) -> u64 {
        self.cell(system).load(Ordering::Acquire)
    }
}

/// Emission outcome totals across all workers and runs.
#[derive(Debug, Default)]
pub struct EmissionStats {
    sent: AtomicU64,
    errors: AtomicU64,
}

impl EmissionStats {
    pub fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SequenceSnapshot {
    pub customers: u64,
    pub orders: u64,
    pub products: u64,
    pub inventory: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PositionSnapshot {
    pub oracle_scn: u64,
    pub db2_lsn: u64,
}

/// Shared state handed to every worker.
#[derive(Debug)]
pub struct ProducerContext {
    pub sequences: IdSequences,
    pub positions: PositionCounters,
    pub stats: EmissionStats,
}

impl ProducerContext {
    /// Position counters start at the current epoch millis so markers keep
    /// increasing across process restarts.
    pub fn new() -> Self {
        Self::with_position_seed(Utc::now().timestamp_millis().max(0) as u64)
    }

    pub fn with_position_seed(seed: u64) -> Self {
        Self {
            sequences: IdSequences::default(),
            positions: PositionCounters::starting_at(seed),
            stats: EmissionStats::default(),
        }
    }

    pub fn sequence_snapshot(&self) -> SequenceSnapshot {
        SequenceSnapshot {
            customers: self.sequences.current(EntityKind::Customer),
            orders: self.sequences.current(EntityKind::Order),
            products: self.sequences.current(EntityKind::Product),
            inventory: self.sequences.current(EntityKind::Inventory),
        }
    }

    pub fn position_snapshot(&self) -> PositionSnapshot {
        PositionSnapshot {
            oracle_scn: self.positions.current(SourceSystem::Oracle),
            db2_lsn: self.positions.current(SourceSystem::Db2),
        }
    }
}

impl Default for ProducerContext {
    fn default() -> Self {
        Self::new()
    }
}
