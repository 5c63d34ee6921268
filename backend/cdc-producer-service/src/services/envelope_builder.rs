use cdc_envelope::{Envelope, Operation, PositionMarker, SnapshotFlag, SourceMetadata};
use rand::Rng;

use crate::context::PositionCounters;
use crate::models::SourceSystem;
use crate::services::synthesizer::RowImages;

/// Connector version stamped on every event
pub const CONNECTOR_VERSION: &str = "2.4.0.Final";

/// Fixed identity of the simulated connector for one source system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectorIdentity {
    pub connector: &'static str,
    pub name: &'static str,
    pub db: &'static str,
    pub schema: &'static str,
}

impl ConnectorIdentity {
    pub fn for_system(system: SourceSystem) -> Self {
        match system {
            SourceSystem::Oracle => Self {
                connector: "oracle",
                name: "oracle-source",
                db: "ORCL",
                schema: "TESTDB",
            },
            SourceSystem::Db2 => Self {
                connector: "db2",
                name: "db2-source",
                db: "TESTDB",
                schema: "DB2INST1",
            },
        }
    }
}

/// Wraps synthesized row images into Debezium envelopes.
///
/// Each call to [`EnvelopeBuilder::build`] consumes exactly one position
/// from the source system's counter.
pub struct EnvelopeBuilder<'a> {
    positions: &'a PositionCounters,
}

impl<'a> EnvelopeBuilder<'a> {
    pub fn new(positions: &'a PositionCounters) -> Self {
        Self { positions }
    }

    pub fn build<R: Rng + ?Sized>(
        &self,
        system: SourceSystem,
        table: &str,
        images: RowImages,
        op: Operation,
        captured_at_ms: i64,
        rng: &mut R,
    ) -> Envelope {
        let identity = ConnectorIdentity::for_system(system);
        let position = self.next_position(system, rng);

        let source = SourceMetadata {
            version: CONNECTOR_VERSION.to_string(),
            connector: identity.connector.to_string(),
            name: identity.name.to_string(),
            ts_ms: captured_at_ms,
            snapshot: SnapshotFlag::False,
            db: identity.db.to_string(),
            schema: identity.schema.to_string(),
            table: table.to_string(),
            position,
        };

        let RowImages { before, after } = images;

        Envelope {
            before: before.filter(|_| op.has_before()),
            after: after.filter(|_| op.has_after()),
            source,
            op,
            ts_ms: captured_at_ms,
        }
    }

    fn next_position<R: Rng + ?Sized>(&self, system: SourceSystem, rng: &mut R) -> PositionMarker {
        let value = self.positions.next(system);

        match system {
            SourceSystem::Oracle => PositionMarker::Scn {
                tx_id: format!("tx-{:08x}", rng.gen::<u32>()),
                scn: value,
            },
            SourceSystem::Db2 => PositionMarker::Lsn {
                lsn: format!("{:016X}", value),
            },
        }
    }
}
