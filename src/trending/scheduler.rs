//! Background scheduling of trending recomputation.
//!
//! Two independent producers drive the trending store: a periodic batch
//! pass over every candidate, and a bounded queue of targeted recomputes
//! triggered by high-impact interactions. Submitting a targeted recompute
//! never blocks event ingestion; a full queue drops the request and the
//! next batch pass covers it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use crossbeam_channel::{Receiver, Sender, bounded};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{PharosError, Result};
use crate::store::{InteractionEvent, InteractionKind, InteractionStats, InteractionStore};
use crate::trending::analyzer::TrendingAnalyzer;

/// How often sleeping loops re-check the running flag.
const WAKE_SLICE: Duration = Duration::from_millis(100);

/// Counters describing scheduler activity.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchedulerStats {
    /// Completed batch passes.
    pub batch_passes: u64,
    /// Completed targeted recomputes.
    pub targeted_recomputes: u64,
    /// Targeted requests dropped because the queue was full.
    pub dropped_requests: u64,
}

/// Decide whether an interaction warrants an immediate targeted recompute:
/// a first-time share, or the window count crossing the spike threshold.
pub fn is_high_impact(kind: InteractionKind, stats: &InteractionStats, spike_threshold: u64) -> bool {
    if kind == InteractionKind::Share && stats.shares == 1 {
        return true;
    }
    stats.window_count == spike_threshold
}

/// Drives batch and targeted trending recomputation on independent
/// schedules.
pub struct TrendingScheduler {
    analyzer: Arc<TrendingAnalyzer>,
    interactions: Arc<dyn InteractionStore>,
    running: Arc<AtomicBool>,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
    sender: Sender<String>,
    receiver: Receiver<String>,
    batch_passes: Arc<AtomicU64>,
    targeted_recomputes: Arc<AtomicU64>,
    dropped_requests: Arc<AtomicU64>,
    batch_interval: Duration,
    recompute_workers: usize,
}

impl TrendingScheduler {
    /// Create a scheduler over an analyzer and the interaction log.
    pub fn new(
        analyzer: Arc<TrendingAnalyzer>,
        interactions: Arc<dyn InteractionStore>,
        queue_capacity: usize,
        batch_interval: Duration,
        recompute_workers: usize,
    ) -> Self {
        let (sender, receiver) = bounded(queue_capacity.max(1));
        Self {
            analyzer,
            interactions,
            running: Arc::new(AtomicBool::new(false)),
            workers: Mutex::new(Vec::new()),
            sender,
            receiver,
            batch_passes: Arc::new(AtomicU64::new(0)),
            targeted_recomputes: Arc::new(AtomicU64::new(0)),
            dropped_requests: Arc::new(AtomicU64::new(0)),
            batch_interval,
            recompute_workers: recompute_workers.max(1),
        }
    }

    /// Whether background workers are running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Start the batch and targeted-recompute workers.
    pub fn start(&self) -> Result<()> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(PharosError::trending("scheduler already running"));
        }

        let mut workers = self.workers.lock();
        workers.push(self.spawn_batch_worker()?);
        for worker_id in 0..self.recompute_workers {
            workers.push(self.spawn_recompute_worker(worker_id)?);
        }
        Ok(())
    }

    /// Stop the workers and wait for them to finish.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        let mut workers = self.workers.lock();
        while let Some(worker) = workers.pop() {
            let _ = worker.join();
        }
    }

    /// Ingest one interaction event.
    ///
    /// The event is always recorded; when it is high-impact a targeted
    /// recompute of that single item is queued asynchronously and
    /// best-effort. Ingestion never blocks on recomputation.
    pub fn observe_interaction(&self, event: InteractionEvent) {
        let content_id = event.content_id.clone();
        let kind = event.kind;
        self.interactions.record(event);

        if !self.is_running() {
            return;
        }

        let stats = self
            .interactions
            .stats(&content_id, self.analyzer.window(), Utc::now());

        if is_high_impact(kind, &stats, self.analyzer.spike_threshold()) {
            if self.sender.try_send(content_id.clone()).is_err() {
                self.dropped_requests.fetch_add(1, Ordering::Relaxed);
                warn!(content_id = %content_id, "recompute queue full, dropping targeted request");
            }
        }
    }

    /// Snapshot of activity counters.
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            batch_passes: self.batch_passes.load(Ordering::Relaxed),
            targeted_recomputes: self.targeted_recomputes.load(Ordering::Relaxed),
            dropped_requests: self.dropped_requests.load(Ordering::Relaxed),
        }
    }

    fn spawn_batch_worker(&self) -> Result<thread::JoinHandle<()>> {
        let analyzer = Arc::clone(&self.analyzer);
        let running = Arc::clone(&self.running);
        let batch_passes = Arc::clone(&self.batch_passes);
        let interval = self.batch_interval;

        let handle = thread::Builder::new()
            .name("trending-batch".to_string())
            .spawn(move || {
                while running.load(Ordering::Acquire) {
                    let stats = analyzer.batch_pass(Utc::now());
                    batch_passes.fetch_add(1, Ordering::Relaxed);
                    debug!(stored = stats.stored, "scheduled batch pass finished");

                    let mut slept = Duration::ZERO;
                    while slept < interval && running.load(Ordering::Acquire) {
                        thread::sleep(WAKE_SLICE.min(interval - slept));
                        slept += WAKE_SLICE;
                    }
                }
            })?;
        Ok(handle)
    }

    fn spawn_recompute_worker(&self, worker_id: usize) -> Result<thread::JoinHandle<()>> {
        let analyzer = Arc::clone(&self.analyzer);
        let running = Arc::clone(&self.running);
        let receiver = self.receiver.clone();
        let targeted = Arc::clone(&self.targeted_recomputes);

        let handle = thread::Builder::new()
            .name(format!("trending-recompute-{worker_id}"))
            .spawn(move || {
                while running.load(Ordering::Acquire) {
                    match receiver.recv_timeout(WAKE_SLICE) {
                        Ok(content_id) => {
                            analyzer.recompute_item(&content_id, Utc::now());
                            targeted.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(_) => {
                            // Timeout or closed channel; re-check running.
                        }
                    }
                }
            })?;
        Ok(handle)
    }
}

impl Drop for TrendingScheduler {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}
