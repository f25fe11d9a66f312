//! Per-session background worker and callback sink.
//!
//! A [`QuerySession`] pairs one dedicated worker task (executing jobs
//! strictly one at a time, in submission order) with one event channel
//! on which all callbacks are delivered. The receiving side of that
//! channel is the session's serialized callback context: the consumer
//! processes events one by one and never sees two callbacks
//! concurrently.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::provider::ProviderClient;

use super::error::EngineError;
use super::job::{CancelHandle, EventSink, JobFlags, JobRequest, RetryConfig, RetryingJob};
use super::outcome::{JobEvent, JobId};

/// Handle to a submitted job.
#[derive(Debug)]
pub struct JobTicket {
    /// The job's id; events on the sink carry it
    pub id: JobId,
    /// Cancels the job cooperatively
    pub cancel: CancelHandle,
}

/// One logical query session: a worker task plus a callback sink.
///
/// Dropping the session's event receiver discards not-yet-consumed
/// callbacks; [`QuerySession::shutdown`] additionally stops the worker
/// without waiting for queued jobs.
pub struct QuerySession {
    jobs: mpsc::UnboundedSender<RetryingJob>,
    events: EventSink,
    worker: JoinHandle<Result<(), EngineError>>,
    next_id: AtomicU64,
    config: RetryConfig,
}

impl QuerySession {
    /// Spawn a session worker around the given provider.
    ///
    /// Returns the session and the receiving half of its callback sink.
    pub fn spawn<P>(provider: P, config: RetryConfig) -> (Self, mpsc::UnboundedReceiver<JobEvent>)
    where
        P: ProviderClient + 'static,
    {
        let (jobs_tx, mut jobs_rx) = mpsc::unbounded_channel::<RetryingJob>();
        let (events_tx, events_rx) = mpsc::unbounded_channel::<JobEvent>();

        let worker_events = events_tx.clone();
        let worker = tokio::spawn(async move {
            while let Some(job) = jobs_rx.recv().await {
                job.run(&provider, &worker_events).await?;
            }
            Ok(())
        });

        let session = Self {
            jobs: jobs_tx,
            events: events_tx,
            worker,
            next_id: AtomicU64::new(1),
            config,
        };
        (session, events_rx)
    }

    /// Queue a job for execution on the session's worker.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SessionClosed`] if the worker has stopped
    /// (after a fatal job failure or shutdown).
    pub fn submit(&self, request: JobRequest) -> Result<JobTicket, EngineError> {
        let id = JobId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let flags = Arc::new(JobFlags::default());
        let job = RetryingJob::new(id, request, self.config.clone(), flags.clone());

        self.jobs
            .send(job)
            .map_err(|_| EngineError::SessionClosed)?;

        Ok(JobTicket {
            id,
            cancel: CancelHandle::new(id, flags, self.events.clone()),
        })
    }

    /// Let queued jobs drain, then surface the worker's result.
    ///
    /// This is the graceful counterpart of [`QuerySession::shutdown`]:
    /// it reports a fatal job failure as `Err` instead of discarding it.
    pub async fn join(self) -> Result<(), EngineError> {
        drop(self.jobs);
        match self.worker.await {
            Ok(result) => result,
            Err(join_err) => Err(EngineError::Worker(join_err.to_string())),
        }
    }

    /// Stop the worker immediately, discarding queued jobs.
    ///
    /// A fatal failure the worker already hit is still surfaced.
    pub async fn shutdown(self) -> Result<(), EngineError> {
        drop(self.jobs);
        self.worker.abort();
        match self.worker.await {
            Ok(result) => result,
            Err(join_err) if join_err.is_cancelled() => Ok(()),
            Err(join_err) => Err(EngineError::Worker(join_err.to_string())),
        }
    }
}
