use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::config::ProducerConfig;
use crate::context::ProducerContext;
use crate::error::{ProducerError, Result};
use crate::metrics::helpers;
use crate::services::envelope_builder::EnvelopeBuilder;
use crate::services::publisher::EnvelopePublisher;
use crate::services::router::{Allocation, DispatchRouter};
use crate::services::synthesizer::synthesize;

/// How far the pacing deadline may trail the clock before it is reset
/// instead of caught up.
pub const MAX_PACING_LAG: Duration = Duration::from_secs(1);

/// Lifecycle of one emission worker. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

/// Lock-free cell publishing a worker's state to the orchestrator.
#[derive(Debug)]
pub struct WorkerStatus(AtomicU8);

impl WorkerStatus {
    pub fn new() -> Self {
        Self(AtomicU8::new(WorkerState::Idle as u8))
    }

    pub fn get(&self) -> WorkerState {
        match self.0.load(Ordering::Acquire) {
            0 => WorkerState::Idle,
            1 => WorkerState::Running,
            2 => WorkerState::Stopping,
            _ => WorkerState::Stopped,
        }
    }

    fn set(&self, state: WorkerState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

impl Default for WorkerStatus {
    fn default() -> Self {
        Self::new()
    }
}

pub fn pacing_interval(events_per_second: u32) -> Duration {
    Duration::from_nanos(1_000_000_000 / u64::from(events_per_second.max(1)))
}

/// Deadline-based pacing against a monotonic clock.
#[derive(Debug, Clone)]
pub struct Pacer {
    interval: Duration,
    next_deadline: Instant,
}

impl Pacer {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next_deadline: now,
        }
    }

    pub fn next_deadline(&self) -> Instant {
        self.next_deadline
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_deadline
    }

    /// Move the deadline one interval forward after a cycle that began at
    /// `now`. Returns `true` when the deadline had fallen more than
    /// [`MAX_PACING_LAG`] behind and was reset to `now` instead.
    pub fn advance(&mut self, now: Instant) -> bool {
        self.next_deadline += self.interval;

        if self.next_deadline + MAX_PACING_LAG < now {
            self.next_deadline = now;
            return true;
        }
        false
    }
}

/// One self-paced producer loop.
pub struct EmissionWorker {
    worker_id: u64,
    target_rate: u32,
    router: DispatchRouter,
    ctx: Arc<ProducerContext>,
    publisher: Arc<dyn EnvelopePublisher>,
    config: Arc<ProducerConfig>,
    status: Arc<WorkerStatus>,
    rng: StdRng,
}

impl EmissionWorker {
    pub fn new(
        worker_id: u64,
        target_rate: u32,
        router: DispatchRouter,
        ctx: Arc<ProducerContext>,
        publisher: Arc<dyn EnvelopePublisher>,
        config: Arc<ProducerConfig>,
        status: Arc<WorkerStatus>,
    ) -> Self {
        Self {
            worker_id,
            target_rate,
            router,
            ctx,
            publisher,
            config,
            status,
            rng: StdRng::from_entropy(),
        }
    }

    /// Replace the entropy-seeded random source with a deterministic one.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Run until `stop` flips to `true` (or its sender is dropped).
    ///
    /// The stop flag is checked once per iteration; a cycle already in
    /// flight is allowed to finish.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) {
        self.status.set(WorkerState::Running);
        helpers::worker_started();
        info!(
            worker_id = self.worker_id,
            target_rate = self.target_rate,
            "Producer worker started"
        );

        let mut pacer = Pacer::new(pacing_interval(self.target_rate), Instant::now());

        loop {
            if *stop.borrow() {
                break;
            }

            let now = Instant::now();
            if pacer.is_due(now) {
                if let Err(e) = self.emit_once().await {
                    self.ctx.stats.record_error();
                    helpers::record_event_error(e.kind());
                    error!(worker_id = self.worker_id, error = %e, "Error in producer worker");
                }

                if pacer.advance(now) {
                    debug!(worker_id = self.worker_id, "Pacing fell behind, deadline reset");
                }

                tokio::task::yield_now().await;
            } else {
                let deadline = tokio::time::Instant::from_std(pacer.next_deadline());
                tokio::select! {
                    biased;
                    changed = stop.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
        }

        self.status.set(WorkerState::Stopping);
        helpers::worker_stopped();
        info!(worker_id = self.worker_id, "Producer worker stopped");
        self.status.set(WorkerState::Stopped);
    }

    /// One route, synthesize, build, serialize and publish cycle.
    ///
    /// Any error abandons the whole cycle; nothing is published partially.
    pub async fn emit_once(&mut self) -> Result<()> {
        let started = Instant::now();

        let Allocation { dispatch, id } = self.router.route(self.worker_id, &self.ctx.sequences);
        let entity = dispatch.entity();
        let op = dispatch.operation();
        let now_ms = Utc::now().timestamp_millis();

        let images = synthesize(entity, id, op, now_ms, &mut self.rng)?;
        let envelope = EnvelopeBuilder::new(&self.ctx.positions).build(
            entity.system(),
            entity.table(),
            images,
            op,
            now_ms,
            &mut self.rng,
        );

        let key = envelope
            .key_id()
            .ok_or_else(|| {
                ProducerError::Synthesis(format!("{} row {} has no id", entity.table(), id))
            })?
            .to_string();
        let payload = serde_json::to_vec(&envelope)?;
        self.publisher
            .publish(self.config.topic_for(entity), &key, &payload)
            .await?;

        self.ctx.stats.record_sent();
        helpers::record_event_sent(
            entity.system().as_str(),
            envelope.table(),
            started.elapsed(),
        );
        Ok(())
    }
}
