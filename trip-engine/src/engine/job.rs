//! One retrying query attempt sequence.
//!
//! A [`RetryingJob`] executes a single [`JobRequest`] against the
//! provider: it retries transient I/O failures with linear backoff
//! (sleep `attempt` seconds after failed attempt number `attempt`),
//! surfaces classified terminal errors immediately, degrades benign
//! exhaustion to a `ServiceDown` result, and propagates everything else
//! as fatal. Cancellation is cooperative: an in-flight provider call is
//! allowed to complete, only the dispatch of its outcome is suppressed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::provider::{
    Direction, JourneyResult, JourneyStatus, ProviderClient, ProviderError, Response,
    TripsContext, TripsResult, TripsStatus,
};
use crate::query::Query;

use super::error::EngineError;
use super::outcome::{JobEvent, JobEventKind, JobId, JobOutcome};

/// Sender half of a session's callback sink.
pub(crate) type EventSink = mpsc::UnboundedSender<JobEvent>;

/// Retry policy for a session's jobs.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of provider attempts per job.
    pub max_tries: u32,
}

/// Default maximum attempt count.
const DEFAULT_MAX_TRIES: u32 = 3;

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_tries: DEFAULT_MAX_TRIES,
        }
    }
}

/// What a job asks the provider for.
#[derive(Debug, Clone)]
pub enum JobRequest {
    /// Run a query from scratch
    Fresh(Query),
    /// Fetch another page of a previous search
    Page {
        /// The search the page belongs to; returned as the snapshot
        origin: Query,
        /// Continuation token from the previous page
        context: Arc<dyn TripsContext>,
        /// Which time direction to page in
        direction: Direction,
    },
}

impl JobRequest {
    /// The query snapshot delivered alongside this request's result.
    pub fn snapshot(&self) -> &Query {
        match self {
            JobRequest::Fresh(query) => query,
            JobRequest::Page { origin, .. } => origin,
        }
    }

    async fn execute<P: ProviderClient>(&self, provider: &P) -> Result<Response, ProviderError> {
        match self {
            JobRequest::Fresh(Query::TripSearch {
                from,
                via,
                to,
                time,
                options,
            }) => provider
                .query_trips(from, via.as_ref(), to, time, options)
                .await
                .map(Response::Trips),
            JobRequest::Fresh(Query::Reload(trip_ref)) => provider
                .query_reload_trip(trip_ref)
                .await
                .map(Response::Trips),
            JobRequest::Fresh(Query::Shared(share)) => provider
                .load_shared_trip(share)
                .await
                .map(Response::Trips),
            JobRequest::Fresh(Query::Journey(journey_ref)) => provider
                .query_journey(journey_ref)
                .await
                .map(Response::Journey),
            JobRequest::Page {
                context, direction, ..
            } => provider
                .query_more_trips(context, *direction)
                .await
                .map(Response::Trips),
        }
    }

    /// The synthesized response for benign retry exhaustion.
    fn service_down(&self) -> Response {
        match self {
            JobRequest::Fresh(Query::Journey(_)) => {
                Response::Journey(JourneyResult::status(JourneyStatus::ServiceDown))
            }
            _ => Response::Trips(TripsResult::status(TripsStatus::ServiceDown)),
        }
    }
}

/// Shared cancellation/dispatch state between a job and its handle.
///
/// `dispatched` guards the exactly-one-terminal-callback invariant: both
/// the job loop and a racing `cancel()` claim it before sending.
#[derive(Debug, Default)]
pub(crate) struct JobFlags {
    cancelled: AtomicBool,
    dispatched: AtomicBool,
}

/// Handle for cancelling a submitted job.
///
/// Cancelling sets the job's flag and delivers the `Cancelled` terminal
/// outcome; the job's worker-side loop still terminates normally and
/// still emits `PostExecute`.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    job: JobId,
    flags: Arc<JobFlags>,
    events: EventSink,
}

impl CancelHandle {
    pub(crate) fn new(job: JobId, flags: Arc<JobFlags>, events: EventSink) -> Self {
        Self { job, flags, events }
    }

    /// The job this handle cancels.
    pub fn job(&self) -> JobId {
        self.job
    }

    /// Whether the job has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.flags.cancelled.load(Ordering::SeqCst)
    }

    /// Cancel the job and deliver the `Cancelled` terminal outcome.
    ///
    /// Idempotent: only the first call delivers the outcome, and nothing
    /// is delivered if the job's own outcome already went out.
    pub fn cancel(&self) {
        if self.flags.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.flags.dispatched.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.events.send(JobEvent {
            job: self.job,
            kind: JobEventKind::Finished(JobOutcome::Cancelled),
        });
    }
}

/// Lifecycle phase of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobPhase {
    Pending,
    Retrying,
    Dispatched,
    Cancelled,
    Done,
}

/// One query attempt sequence, created per submission and never reused.
#[derive(Debug)]
pub struct RetryingJob {
    id: JobId,
    request: JobRequest,
    config: RetryConfig,
    attempt: u32,
    phase: JobPhase,
    flags: Arc<JobFlags>,
}

impl RetryingJob {
    pub(crate) fn new(
        id: JobId,
        request: JobRequest,
        config: RetryConfig,
        flags: Arc<JobFlags>,
    ) -> Self {
        Self {
            id,
            request,
            config,
            attempt: 0,
            phase: JobPhase::Pending,
            flags,
        }
    }

    /// The job's id within its session.
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Run the attempt sequence to completion on the current task.
    ///
    /// Emits `PreExecute`, then exactly one terminal outcome (unless the
    /// failure is fatal), then `PostExecute`. Fatal failures are
    /// returned as `Err` after `PostExecute` has been emitted.
    pub(crate) async fn run<P: ProviderClient>(
        mut self,
        provider: &P,
        events: &EventSink,
    ) -> Result<(), EngineError> {
        self.emit(events, JobEventKind::PreExecute);
        let result = self.attempt_loop(provider, events).await;
        debug!(job = self.id.0, phase = ?self.phase, tries = self.attempt, "job finished");
        self.phase = JobPhase::Done;
        self.emit(events, JobEventKind::PostExecute);
        result
    }

    async fn attempt_loop<P: ProviderClient>(
        &mut self,
        provider: &P,
        events: &EventSink,
    ) -> Result<(), EngineError> {
        while !self.is_cancelled() {
            self.phase = JobPhase::Retrying;
            self.attempt += 1;

            match self.request.execute(provider).await {
                Ok(response) => {
                    self.dispatch(
                        events,
                        JobOutcome::Result {
                            response,
                            query: self.request.snapshot().clone(),
                        },
                    );
                    return Ok(());
                }
                Err(ProviderError::Redirect { url }) => {
                    self.dispatch(events, JobOutcome::Redirect { url });
                    return Ok(());
                }
                Err(ProviderError::Blocked { url }) => {
                    self.dispatch(events, JobOutcome::Blocked { url });
                    return Ok(());
                }
                Err(ProviderError::Internal { url }) => {
                    self.dispatch(events, JobOutcome::InternalError { url });
                    return Ok(());
                }
                Err(ProviderError::Tls(message)) => {
                    self.dispatch(events, JobOutcome::TlsFailure { message });
                    return Ok(());
                }
                Err(ProviderError::Io(failure)) => {
                    if self.attempt >= self.config.max_tries {
                        if failure.kind.is_benign() {
                            warn!(
                                job = self.id.0,
                                tries = self.attempt,
                                error = %failure,
                                "provider unreachable, reporting service down"
                            );
                            self.dispatch(
                                events,
                                JobOutcome::Result {
                                    response: self.request.service_down(),
                                    query: self.request.snapshot().clone(),
                                },
                            );
                            return Ok(());
                        }
                        return Err(EngineError::RetriesExhausted {
                            tries: self.attempt,
                            source: failure,
                        });
                    }
                    debug!(
                        job = self.id.0,
                        attempt = self.attempt,
                        backoff_secs = self.attempt,
                        error = %failure,
                        "transient provider failure, retrying"
                    );
                    if self.is_cancelled() {
                        break;
                    }
                    tokio::time::sleep(Duration::from_secs(u64::from(self.attempt))).await;
                }
                Err(ProviderError::Fault(message)) => {
                    return Err(EngineError::Fault(message));
                }
            }
        }

        self.phase = JobPhase::Cancelled;
        Ok(())
    }

    fn is_cancelled(&self) -> bool {
        self.flags.cancelled.load(Ordering::SeqCst)
    }

    fn dispatch(&mut self, events: &EventSink, outcome: JobOutcome) {
        if self.is_cancelled() {
            debug!(job = self.id.0, "cancelled, suppressing outcome dispatch");
            self.phase = JobPhase::Cancelled;
            return;
        }
        if self.flags.dispatched.swap(true, Ordering::SeqCst) {
            // A racing cancel() already delivered the terminal outcome.
            return;
        }
        self.phase = JobPhase::Dispatched;
        self.emit(events, JobEventKind::Finished(outcome));
    }

    fn emit(&self, events: &EventSink, kind: JobEventKind) {
        // A dropped receiver means the session was torn down; remaining
        // callbacks are discarded by design.
        let _ = events.send(JobEvent { job: self.id, kind });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Location;
    use crate::provider::mock::MockProvider;
    use crate::provider::{IoKind, TripsStatus};
    use crate::query::{JourneyRef, TimeSpec};
    use chrono::{TimeZone, Utc};
    use tokio::sync::mpsc::UnboundedReceiver;

    fn search_query() -> Query {
        Query::trip_search(
            Location::station("900001", "Hbf"),
            Location::station("900002", "Ostbahnhof"),
            TimeSpec::DepartAt(Utc.with_ymd_and_hms(2026, 8, 6, 9, 0, 0).unwrap()),
        )
    }

    fn make_job(request: JobRequest) -> (RetryingJob, CancelHandle, UnboundedReceiver<JobEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let flags = Arc::new(JobFlags::default());
        let job = RetryingJob::new(JobId(1), request, RetryConfig::default(), flags.clone());
        let handle = CancelHandle::new(JobId(1), flags, tx);
        (job, handle, rx)
    }

    fn events_sink(handle: &CancelHandle) -> EventSink {
        handle.events.clone()
    }

    async fn drain(rx: &mut UnboundedReceiver<JobEvent>) -> Vec<JobEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn success_dispatches_result_with_snapshot() {
        let mock = MockProvider::new();
        mock.push_trips(TripsResult::ok(vec![], None));

        let query = search_query();
        let (job, handle, mut rx) = make_job(JobRequest::Fresh(query.clone()));
        let sink = events_sink(&handle);

        job.run(&mock, &sink).await.unwrap();

        let events = drain(&mut rx).await;
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0].kind, JobEventKind::PreExecute));
        match &events[1].kind {
            JobEventKind::Finished(JobOutcome::Result { response, query: snapshot }) => {
                assert_eq!(
                    response.as_trips().unwrap().status,
                    TripsStatus::Ok
                );
                assert_eq!(snapshot, &query);
            }
            other => panic!("expected result outcome, got {other:?}"),
        }
        assert!(matches!(events[2].kind, JobEventKind::PostExecute));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn classified_errors_never_retry() {
        for (err, probe) in [
            (
                ProviderError::Redirect { url: "http://r".into() },
                "redirect",
            ),
            (ProviderError::Blocked { url: "http://b".into() }, "blocked"),
            (
                ProviderError::Internal { url: "http://i".into() },
                "internal",
            ),
            (ProviderError::Tls("bad cert".into()), "tls"),
        ] {
            let mock = MockProvider::new();
            mock.push_err(err);

            let (job, handle, mut rx) = make_job(JobRequest::Fresh(search_query()));
            let sink = events_sink(&handle);
            job.run(&mock, &sink).await.unwrap();

            let events = drain(&mut rx).await;
            assert_eq!(events.len(), 3, "case {probe}");
            let matched = match &events[1].kind {
                JobEventKind::Finished(JobOutcome::Redirect { .. }) => probe == "redirect",
                JobEventKind::Finished(JobOutcome::Blocked { .. }) => probe == "blocked",
                JobEventKind::Finished(JobOutcome::InternalError { .. }) => probe == "internal",
                JobEventKind::Finished(JobOutcome::TlsFailure { .. }) => probe == "tls",
                other => panic!("case {probe}: unexpected event {other:?}"),
            };
            assert!(matched, "case {probe} dispatched the wrong outcome");
            assert_eq!(mock.calls(), 1, "case {probe} must not retry");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_use_linear_backoff_and_stop_at_max() {
        let mock = MockProvider::new();
        mock.push_io_err(IoKind::Timeout);
        mock.push_io_err(IoKind::Timeout);
        mock.push_io_err(IoKind::Timeout);

        let (job, handle, mut rx) = make_job(JobRequest::Fresh(search_query()));
        let sink = events_sink(&handle);

        let started = tokio::time::Instant::now();
        job.run(&mock, &sink).await.unwrap();

        // Sleeps of 1s and 2s after the first two attempts, none after
        // the final one.
        assert_eq!(started.elapsed(), Duration::from_secs(3));
        assert_eq!(mock.calls(), 3);

        let events = drain(&mut rx).await;
        match &events[1].kind {
            JobEventKind::Finished(JobOutcome::Result { response, .. }) => {
                assert_eq!(
                    response.as_trips().unwrap().status,
                    TripsStatus::ServiceDown
                );
            }
            other => panic!("expected service-down result, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn host_unresolved_exhaustion_becomes_service_down() {
        let mock = MockProvider::new();
        for _ in 0..3 {
            mock.push_io_err(IoKind::HostUnresolved);
        }

        let (job, handle, mut rx) = make_job(JobRequest::Fresh(search_query()));
        let sink = events_sink(&handle);
        job.run(&mock, &sink).await.unwrap();

        let events = drain(&mut rx).await;
        match &events[1].kind {
            JobEventKind::Finished(JobOutcome::Result { response, .. }) => {
                assert_eq!(
                    response.as_trips().unwrap().status,
                    TripsStatus::ServiceDown
                );
            }
            other => panic!("expected service-down result, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unclassified_io_exhaustion_is_fatal() {
        let mock = MockProvider::new();
        for _ in 0..3 {
            mock.push_io_err(IoKind::Other);
        }

        let (job, handle, mut rx) = make_job(JobRequest::Fresh(search_query()));
        let sink = events_sink(&handle);
        let result = job.run(&mock, &sink).await;

        assert!(matches!(
            result,
            Err(EngineError::RetriesExhausted { tries: 3, .. })
        ));
        assert_eq!(mock.calls(), 3);

        // No terminal outcome, but PreExecute and PostExecute still fire.
        let events = drain(&mut rx).await;
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0].kind, JobEventKind::PreExecute));
        assert!(matches!(events[1].kind, JobEventKind::PostExecute));
    }

    #[tokio::test]
    async fn fault_is_fatal_immediately() {
        let mock = MockProvider::new();
        mock.push_err(ProviderError::Fault("wedged".into()));

        let (job, handle, mut rx) = make_job(JobRequest::Fresh(search_query()));
        let sink = events_sink(&handle);
        let result = job.run(&mock, &sink).await;

        assert!(matches!(result, Err(EngineError::Fault(_))));
        assert_eq!(mock.calls(), 1);

        let events = drain(&mut rx).await;
        assert_eq!(events.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn journey_exhaustion_synthesizes_journey_service_down() {
        let mock = MockProvider::new();
        for _ in 0..3 {
            mock.push_io_err(IoKind::Connection);
        }

        let (job, handle, mut rx) =
            make_job(JobRequest::Fresh(Query::Journey(JourneyRef::new("j-1"))));
        let sink = events_sink(&handle);
        job.run(&mock, &sink).await.unwrap();

        let events = drain(&mut rx).await;
        match &events[1].kind {
            JobEventKind::Finished(JobOutcome::Result { response, .. }) => {
                assert_eq!(
                    response.as_journey().unwrap().status,
                    JourneyStatus::ServiceDown
                );
            }
            other => panic!("expected journey service-down, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_provider_call_suppresses_outcome() {
        let mock = Arc::new(MockProvider::new());
        mock.push_delayed_trips(Duration::from_secs(10), TripsResult::ok(vec![], None));

        let (job, handle, mut rx) = make_job(JobRequest::Fresh(search_query()));
        let sink = events_sink(&handle);

        let provider = mock.clone();
        let worker = tokio::spawn(async move { job.run(provider.as_ref(), &sink).await });

        // Wait for the job to start, then cancel while the call is in
        // flight.
        let first = rx.recv().await.unwrap();
        assert!(matches!(first.kind, JobEventKind::PreExecute));
        handle.cancel();

        worker.await.unwrap().unwrap();

        let events = drain(&mut rx).await;
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0].kind,
            JobEventKind::Finished(JobOutcome::Cancelled)
        ));
        assert!(matches!(events[1].kind, JobEventKind::PostExecute));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn cancel_is_idempotent() {
        let (_, handle, mut rx) = make_job(JobRequest::Fresh(search_query()));

        handle.cancel();
        handle.cancel();

        let events = drain(&mut rx).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0].kind,
            JobEventKind::Finished(JobOutcome::Cancelled)
        ));
        assert!(handle.is_cancelled());
    }
}
