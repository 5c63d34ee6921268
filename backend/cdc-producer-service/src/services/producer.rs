use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::{ProducerConfig, RunPlan};
use crate::context::{PositionSnapshot, ProducerContext, SequenceSnapshot};
use crate::error::Result;
use crate::metrics::helpers;
use crate::services::emission::{EmissionWorker, WorkerState, WorkerStatus};
use crate::services::publisher::EnvelopePublisher;
use crate::services::router::DispatchRouter;

/// Point-in-time view of the producer, served by the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ProducerSnapshot {
    pub running: bool,
    pub mode: String,
    pub events_per_second: u32,
    pub threads: u32,
    pub sequences: SequenceSnapshot,
    pub positions: PositionSnapshot,
    pub events_sent: u64,
    pub errors: u64,
}

struct WorkerPool {
    plan: RunPlan,
    stop_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
    statuses: Vec<Arc<WorkerStatus>>,
}

/// Owns the worker pool and the shared counters.
///
/// `start` and `stop` are idempotent and serialized through the pool lock.
/// Counters live in the [`ProducerContext`] and survive restarts.
pub struct CdcProducer {
    config: Arc<ProducerConfig>,
    ctx: Arc<ProducerContext>,
    publisher: Arc<dyn EnvelopePublisher>,
    running: AtomicBool,
    pool: Mutex<Option<WorkerPool>>,
}

impl CdcProducer {
    pub fn new(config: ProducerConfig, publisher: Arc<dyn EnvelopePublisher>) -> Self {
        Self::with_context(config, publisher, Arc::new(ProducerContext::new()))
    }

    pub fn with_context(
        config: ProducerConfig,
        publisher: Arc<dyn EnvelopePublisher>,
        ctx: Arc<ProducerContext>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            ctx,
            publisher,
            running: AtomicBool::new(false),
            pool: Mutex::new(None),
        }
    }

    /// Spawn the worker pool. A no-op when already running; configuration
    /// errors leave the producer stopped.
    pub async fn start(&self) -> Result<()> {
        let mut pool = self.pool.lock().await;
        if pool.is_some() {
            debug!("CDC producer already running");
            return Ok(());
        }

        let plan = self.config.plan()?;
        info!(
            "Starting CDC producer with {} events/sec across {} workers ({} per worker, mode: {})",
            self.config.events_per_second,
            plan.threads,
            plan.per_worker_rate,
            plan.mode.as_str()
        );

        let (stop_tx, stop_rx) = watch::channel(false);
        let router = DispatchRouter::new(plan.mode);
        let mut handles = Vec::with_capacity(plan.threads);
        let mut statuses = Vec::with_capacity(plan.threads);

        for worker_id in 0..plan.threads {
            let status = Arc::new(WorkerStatus::new());
            let worker = EmissionWorker::new(
                worker_id as u64,
                plan.per_worker_rate,
                router,
                Arc::clone(&self.ctx),
                Arc::clone(&self.publisher),
                Arc::clone(&self.config),
                Arc::clone(&status),
            );

            handles.push(tokio::spawn(worker.run(stop_rx.clone())));
            statuses.push(status);
        }

        *pool = Some(WorkerPool {
            plan,
            stop_tx,
            handles,
            statuses,
        });
        self.running.store(true, Ordering::Release);

        Ok(())
    }

    /// Signal every worker and wait for all of them to exit. A no-op when
    /// not running.
    pub async fn stop(&self) {
        let mut guard = self.pool.lock().await;
        let Some(pool) = guard.take() else {
            return;
        };

        info!("Stopping CDC producer ({} workers)", pool.plan.threads);
        self.running.store(false, Ordering::Release);
        let _ = pool.stop_tx.send(true);

        for handle in pool.handles {
            if let Err(e) = handle.await {
                error!("Producer worker terminated abnormally: {}", e);
            }
        }

        let snapshot = self.snapshot();
        info!(
            "CDC producer stopped (sent: {}, errors: {})",
            snapshot.events_sent, snapshot.errors
        );
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// States of the current pool's workers, empty when stopped.
    pub async fn worker_states(&self) -> Vec<WorkerState> {
        self.pool
            .lock()
            .await
            .as_ref()
            .map(|pool| pool.statuses.iter().map(|s| s.get()).collect())
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> ProducerSnapshot {
        ProducerSnapshot {
            running: self.is_running(),
            mode: self.config.mode.clone(),
            events_per_second: self.config.events_per_second,
            threads: self.config.threads,
            sequences: self.ctx.sequence_snapshot(),
            positions: self.ctx.position_snapshot(),
            events_sent: self.ctx.stats.sent(),
            errors: self.ctx.stats.errors(),
        }
    }

    /// Periodically log the id sequences and refresh the sequence gauges
    /// while the producer is running.
    pub fn spawn_stats_reporter(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let producer = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if !producer.is_running() {
                    continue;
                }

                let snapshot = producer.snapshot();
                helpers::update_sequences(&snapshot.sequences);
                info!(
                    customers = snapshot.sequences.customers,
                    orders = snapshot.sequences.orders,
                    products = snapshot.sequences.products,
                    inventory = snapshot.sequences.inventory,
                    sent = snapshot.events_sent,
                    errors = snapshot.errors,
                    "CDC Producer Stats"
                );
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProducerError;
    use crate::services::publisher::MockEnvelopePublisher;

    fn producer(mode: &str, events_per_second: u32, threads: u32) -> CdcProducer {
        let mut publisher = MockEnvelopePublisher::new();
        publisher.expect_publish().returning(|_, _, _| Ok(()));

        let config = ProducerConfig {
            mode: mode.to_string(),
            events_per_second,
            threads,
            ..ProducerConfig::default()
        };
        CdcProducer::with_context(
            config,
            Arc::new(publisher),
            Arc::new(ProducerContext::with_position_seed(0)),
        )
    }

    #[tokio::test]
    async fn test_start_and_stop_are_idempotent() {
        let producer = producer("both", 40, 2);

        producer.start().await.unwrap();
        producer.start().await.unwrap();
        assert!(producer.is_running());
        assert_eq!(producer.worker_states().await.len(), 2);

        tokio::time::sleep(Duration::from_millis(60)).await;

        producer.stop().await;
        producer.stop().await;
        assert!(!producer.is_running());
        assert!(producer.worker_states().await.is_empty());
        assert!(producer.snapshot().events_sent > 0);
    }

    #[tokio::test]
    async fn test_stop_before_start_is_noop() {
        let producer = producer("oracle", 10, 1);
        producer.stop().await;

        assert!(!producer.is_running());
        assert_eq!(producer.snapshot().events_sent, 0);
    }

    #[tokio::test]
    async fn test_invalid_config_fails_start() {
        let producer = producer("sqlserver", 10, 1);

        let err = producer.start().await.unwrap_err();
        assert!(matches!(err, ProducerError::Config(_)));
        assert!(!producer.is_running());
    }
}
