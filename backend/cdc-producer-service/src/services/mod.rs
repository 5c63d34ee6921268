pub mod emission;
pub mod envelope_builder;
pub mod producer;
pub mod publisher;
pub mod router;
pub mod synthesizer;

pub use emission::{EmissionWorker, Pacer, WorkerState, WorkerStatus};
pub use envelope_builder::{ConnectorIdentity, EnvelopeBuilder};
pub use producer::{CdcProducer, ProducerSnapshot};
pub use publisher::{EnvelopePublisher, KafkaEnvelopePublisher};
pub use router::{Allocation, Dispatch, DispatchRouter};
pub use synthesizer::{synthesize, RowImages};
