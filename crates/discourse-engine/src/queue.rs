//! # Scheduling Queue
//!
//! Serializes expensive work for passive consumers so they cannot flood the
//! store.
//!
//! ## Guarantees
//!
//! - FIFO: jobs start in the order they were scheduled
//! - At most one job runs at a time, per queue instance
//! - A job's caller is answered as soon as the job finishes; the queue then
//!   idles `(end - start) * backoff_factor` before starting the next job
//! - Started jobs run to completion even if the caller stops waiting
//!
//! The worker task is spawned on construction, so a queue must be built
//! inside a Tokio runtime. It stops once every handle has been dropped.

use crate::error::EngineError;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Timestamps of one executed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobTiming {
    pub id: Uuid,
    pub enqueued_at: Instant,
    pub start: Instant,
    /// When the job reported its external response as fully received.
    /// Jobs that never report it get `end`.
    pub mid: Instant,
    pub end: Instant,
}

/// Handed to every job; lets it mark the `mid` timestamp.
#[derive(Debug, Clone, Default)]
pub struct JobTicket {
    mid: Arc<OnceLock<Instant>>,
}

impl JobTicket {
    /// Record that the external response has arrived. Only the first call counts.
    pub fn mark_mid(&self) {
        let _ = self.mid.set(Instant::now());
    }

    fn mid(&self) -> Option<Instant> {
        self.mid.get().copied()
    }
}

type QueuedJob = Box<dyn FnOnce() -> BoxFuture<'static, JobTiming> + Send>;

/// One queue, one worker.
#[derive(Debug)]
pub struct SchedulingQueue {
    sender: mpsc::UnboundedSender<QueuedJob>,
    pending: Arc<AtomicUsize>,
    backoff_factor: u32,
}

impl SchedulingQueue {
    /// Spawn the worker.
    #[must_use]
    pub fn new(backoff_factor: u32) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        tokio::spawn(run_worker(receiver, Arc::clone(&pending), backoff_factor));
        Self {
            sender,
            pending,
            backoff_factor,
        }
    }

    #[must_use]
    pub fn backoff_factor(&self) -> u32 {
        self.backoff_factor
    }

    /// Jobs waiting to start.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Run `job` when its turn comes and return its output.
    pub async fn schedule<F, Fut, T>(&self, job: F) -> Result<T, EngineError>
    where
        F: FnOnce(JobTicket) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.schedule_timed(job).await.map(|(value, _)| value)
    }

    /// Like [`schedule`](Self::schedule), also returning the job's timestamps.
    pub async fn schedule_timed<F, Fut, T>(&self, job: F) -> Result<(T, JobTiming), EngineError>
    where
        F: FnOnce(JobTicket) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let id = Uuid::new_v4();
        let enqueued_at = Instant::now();
        let (reply, answer) = oneshot::channel();

        let queued: QueuedJob = Box::new(move || {
            async move {
                let start = Instant::now();
                let ticket = JobTicket::default();
                let value = job(ticket.clone()).await;
                let end = Instant::now();
                let timing = JobTiming {
                    id,
                    enqueued_at,
                    start,
                    mid: ticket.mid().unwrap_or(end),
                    end,
                };
                // The caller may have stopped waiting; the job still counts.
                let _ = reply.send((value, timing.clone()));
                timing
            }
            .boxed()
        });

        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.sender.send(queued).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(EngineError::QueueClosed);
        }
        answer.await.map_err(|_| EngineError::JobFailed)
    }
}

async fn run_worker(
    mut receiver: mpsc::UnboundedReceiver<QueuedJob>,
    pending: Arc<AtomicUsize>,
    backoff_factor: u32,
) {
    while let Some(job) = receiver.recv().await {
        pending.fetch_sub(1, Ordering::SeqCst);

        // Spawned so a panicking job cannot take the worker down with it.
        match tokio::spawn(job()).await {
            Ok(timing) => {
                let runtime = timing.end.duration_since(timing.start);
                let backoff = runtime.saturating_mul(backoff_factor);
                info!(
                    "Job {} ran {:?} after waiting {:?}, backing off {:?}",
                    timing.id,
                    runtime,
                    timing.start.duration_since(timing.enqueued_at),
                    backoff
                );
                tokio::time::sleep(backoff).await;
            }
            Err(e) => warn!("Scheduled job aborted: {}", e),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
