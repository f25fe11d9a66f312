//! Scriptable mock provider for testing without network access.
//!
//! Responses are queued up front and served in order, shared across all
//! five query operations. An optional per-response delay makes in-flight
//! cancellation testable under tokio's paused clock.

use std::any::Any;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::domain::Location;
use crate::query::{JourneyRef, Options, TimeSpec, TripRef, TripShare};

use super::error::{IoFailure, IoKind, ProviderError};
use super::{
    Direction, JourneyResult, ProviderClient, Response, TripsContext, TripsResult,
};

/// A continuation context with fixed paging capabilities.
#[derive(Debug, Clone, Copy)]
pub struct MockContext {
    /// Whether "earlier" pages are available
    pub earlier: bool,
    /// Whether "later" pages are available
    pub later: bool,
}

impl TripsContext for MockContext {
    fn can_query_earlier(&self) -> bool {
        self.earlier
    }

    fn can_query_later(&self) -> bool {
        self.later
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct ScriptedCall {
    delay: Option<Duration>,
    reply: Result<Response, ProviderError>,
}

/// Mock provider serving pre-scripted replies.
#[derive(Default)]
pub struct MockProvider {
    script: Mutex<VecDeque<ScriptedCall>>,
    calls: AtomicU32,
}

impl MockProvider {
    /// Create a mock with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a trips reply.
    pub fn push_trips(&self, result: TripsResult) {
        self.push(None, Ok(Response::Trips(result)));
    }

    /// Queue a trips reply served only after `delay` has elapsed.
    pub fn push_delayed_trips(&self, delay: Duration, result: TripsResult) {
        self.push(Some(delay), Ok(Response::Trips(result)));
    }

    /// Queue a journey reply.
    pub fn push_journey(&self, result: JourneyResult) {
        self.push(None, Ok(Response::Journey(result)));
    }

    /// Queue an error reply.
    pub fn push_err(&self, err: ProviderError) {
        self.push(None, Err(err));
    }

    /// Queue an I/O error reply of the given kind.
    pub fn push_io_err(&self, kind: IoKind) {
        self.push_err(ProviderError::Io(IoFailure::new(kind, "scripted failure")));
    }

    /// Number of provider calls received so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn push(&self, delay: Option<Duration>, reply: Result<Response, ProviderError>) {
        self.script
            .lock()
            .expect("mock script lock poisoned")
            .push_back(ScriptedCall { delay, reply });
    }

    async fn next(&self) -> Result<Response, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let call = self
            .script
            .lock()
            .expect("mock script lock poisoned")
            .pop_front();
        match call {
            Some(call) => {
                if let Some(delay) = call.delay {
                    tokio::time::sleep(delay).await;
                }
                call.reply
            }
            None => Err(ProviderError::Fault("mock script exhausted".into())),
        }
    }

    async fn next_trips(&self) -> Result<TripsResult, ProviderError> {
        match self.next().await? {
            Response::Trips(result) => Ok(result),
            Response::Journey(_) => Err(ProviderError::Fault(
                "scripted journey reply for a trips call".into(),
            )),
        }
    }

    async fn next_journey(&self) -> Result<JourneyResult, ProviderError> {
        match self.next().await? {
            Response::Journey(result) => Ok(result),
            Response::Trips(_) => Err(ProviderError::Fault(
                "scripted trips reply for a journey call".into(),
            )),
        }
    }
}

impl ProviderClient for MockProvider {
    fn query_trips(
        &self,
        _from: &Location,
        _via: Option<&Location>,
        _to: &Location,
        _time: &TimeSpec,
        _options: &Options,
    ) -> impl Future<Output = Result<TripsResult, ProviderError>> + Send {
        self.next_trips()
    }

    fn query_more_trips(
        &self,
        _context: &std::sync::Arc<dyn TripsContext>,
        _direction: Direction,
    ) -> impl Future<Output = Result<TripsResult, ProviderError>> + Send {
        self.next_trips()
    }

    fn query_reload_trip(
        &self,
        _trip_ref: &TripRef,
    ) -> impl Future<Output = Result<TripsResult, ProviderError>> + Send {
        self.next_trips()
    }

    fn load_shared_trip(
        &self,
        _share: &TripShare,
    ) -> impl Future<Output = Result<TripsResult, ProviderError>> + Send {
        self.next_trips()
    }

    fn query_journey(
        &self,
        _journey_ref: &JourneyRef,
    ) -> impl Future<Output = Result<JourneyResult, ProviderError>> + Send {
        self.next_journey()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::TripsStatus;

    #[tokio::test]
    async fn replies_are_served_in_order() {
        let mock = MockProvider::new();
        mock.push_trips(TripsResult::status(TripsStatus::NoTrips));
        mock.push_io_err(IoKind::Timeout);

        let first = mock.next_trips().await.unwrap();
        assert_eq!(first.status, TripsStatus::NoTrips);

        let second = mock.next_trips().await;
        assert!(matches!(
            second,
            Err(ProviderError::Io(IoFailure {
                kind: IoKind::Timeout,
                ..
            }))
        ));

        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn exhausted_script_is_a_fault() {
        let mock = MockProvider::new();
        let result = mock.next_trips().await;
        assert!(matches!(result, Err(ProviderError::Fault(_))));
    }

    #[test]
    fn context_capabilities() {
        let ctx = MockContext {
            earlier: true,
            later: false,
        };
        assert!(ctx.can_query_earlier());
        assert!(!ctx.can_query_later());
        assert!(ctx.as_any().downcast_ref::<MockContext>().is_some());
    }
}
