//! Incremental paging of trip results.
//!
//! A [`PaginationSession`] owns the continuation context of a trip
//! search and a deduplicated, time-ordered [`TripSet`]. It issues
//! further page-fetch jobs ("earlier"/"later") through a
//! [`QuerySession`], guarded so that at most one page fetch is in flight
//! at a time, and merges each page into the set.
//!
//! All of its state is mutated only from the callback sink side: feed
//! every [`JobEvent`] to [`PaginationSession::on_event`] from the task
//! that consumes the sink, and the session is effectively
//! single-threaded. The background worker never touches it.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, warn};

use crate::domain::{Trip, TripKey};
use crate::engine::{
    EngineError, JobEvent, JobEventKind, JobId, JobOutcome, JobRequest, JobTicket, QuerySession,
};
use crate::provider::{Direction, Response, TripsContext, TripsResult, TripsStatus};
use crate::query::Query;

/// Longest plausible trip duration; anything above is provider garbage.
const MAX_TRIP_DAYS: i64 = 5;

/// A deduplicated set of trips, ordered by [`TripKey`].
///
/// Structurally identical trips collapse; distinct trips that share a
/// key are kept side by side in insertion order.
#[derive(Debug, Default)]
pub struct TripSet {
    buckets: BTreeMap<TripKey, Vec<Trip>>,
    len: usize,
}

impl TripSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a trip. Returns false if a structurally identical trip is
    /// already present.
    pub fn insert(&mut self, trip: Trip) -> bool {
        let bucket = self.buckets.entry(trip.key()).or_default();
        if bucket.contains(&trip) {
            return false;
        }
        bucket.push(trip);
        self.len += 1;
        true
    }

    /// Whether a structurally identical trip is present.
    pub fn contains(&self, trip: &Trip) -> bool {
        self.buckets
            .get(&trip.key())
            .is_some_and(|bucket| bucket.contains(trip))
    }

    /// Iterate trips in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Trip> {
        self.buckets.values().flatten()
    }

    /// Number of trips in the set.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remove all trips.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.len = 0;
    }
}

/// What [`PaginationSession::on_event`] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDisposition {
    /// The event belongs to a job this session did not issue
    Unrelated,
    /// The page job started executing
    Started,
    /// An Ok page was merged; `added` trips were new
    Merged {
        /// Number of trips newly inserted
        added: usize,
    },
    /// The page reported no trips: no more data in that direction
    NoMoreData,
    /// A non-Ok outcome the caller should surface (see [`crate::classify`])
    Surface,
    /// The page job was cancelled
    Cancelled,
    /// The page job finished; the single-flight guard is clear again
    Completed,
}

#[derive(Debug, Clone, Copy)]
struct PendingPage {
    job: JobId,
    /// True for a reload: its page replaces the whole set.
    replaces_all: bool,
}

/// Paging state of one trip search.
pub struct PaginationSession {
    query: Query,
    context: Option<Arc<dyn TripsContext>>,
    trips: TripSet,
    in_flight: Option<PendingPage>,
}

impl PaginationSession {
    /// Create a session for the given original search query.
    pub fn new(query: Query) -> Self {
        Self {
            query,
            context: None,
            trips: TripSet::new(),
            in_flight: None,
        }
    }

    /// The original search query this session pages.
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// The merged trips, ordered and deduplicated.
    pub fn trips(&self) -> &TripSet {
        &self.trips
    }

    /// The current continuation context, if any.
    pub fn context(&self) -> Option<&Arc<dyn TripsContext>> {
        self.context.as_ref()
    }

    /// Whether a page fetch is currently in flight.
    pub fn fetch_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether the current context allows paging in `direction`.
    pub fn can_query(&self, direction: Direction) -> bool {
        self.context.as_ref().is_some_and(|ctx| match direction {
            Direction::Earlier => ctx.can_query_earlier(),
            Direction::Later => ctx.can_query_later(),
        })
    }

    /// Merge a result page into the set.
    ///
    /// Clears the set first when `is_initial`. Trips with a negative
    /// duration or one above five days are dropped with a log line.
    /// The stored continuation context is replaced by the page's.
    /// Returns the number of trips newly inserted.
    pub fn merge(&mut self, result: &TripsResult, is_initial: bool) -> usize {
        if is_initial {
            self.trips.clear();
        }

        let mut added = 0;
        for trip in &result.trips {
            let duration = trip.duration();
            if duration < Duration::zero() || duration > Duration::days(MAX_TRIP_DAYS) {
                warn!(
                    duration_mins = duration.num_minutes(),
                    "discarding trip with implausible duration"
                );
                continue;
            }
            if self.trips.insert(trip.clone()) {
                added += 1;
            }
        }

        self.context = result.continuation.clone();
        added
    }

    /// Request another page of trips in `direction`.
    ///
    /// No-op (returning `Ok(None)`) while a fetch is in flight or when
    /// the context disallows that direction. The guard is cleared when
    /// the issued job's `PostExecute` passes through
    /// [`PaginationSession::on_event`].
    pub fn request_more(
        &mut self,
        session: &QuerySession,
        direction: Direction,
    ) -> Result<Option<JobTicket>, EngineError> {
        if self.in_flight.is_some() {
            debug!("page fetch already in flight, ignoring request");
            return Ok(None);
        }
        if !self.can_query(direction) {
            debug!(?direction, "context does not allow paging, ignoring request");
            return Ok(None);
        }
        let Some(context) = self.context.clone() else {
            return Ok(None);
        };

        let ticket = session.submit(JobRequest::Page {
            origin: self.query.clone(),
            context,
            direction,
        })?;
        self.in_flight = Some(PendingPage {
            job: ticket.id,
            replaces_all: false,
        });
        Ok(Some(ticket))
    }

    /// Re-issue the original search and replace the whole set with its
    /// result. Follows the same single-flight guard as
    /// [`PaginationSession::request_more`].
    pub fn reload(&mut self, session: &QuerySession) -> Result<Option<JobTicket>, EngineError> {
        if self.in_flight.is_some() {
            debug!("page fetch already in flight, ignoring reload");
            return Ok(None);
        }

        let ticket = session.submit(JobRequest::Fresh(self.query.clone()))?;
        self.in_flight = Some(PendingPage {
            job: ticket.id,
            replaces_all: true,
        });
        Ok(Some(ticket))
    }

    /// Process one event from the callback sink.
    ///
    /// Events of jobs this session did not issue are reported as
    /// [`PageDisposition::Unrelated`] and left untouched.
    pub fn on_event(&mut self, event: &JobEvent) -> PageDisposition {
        let Some(pending) = self.in_flight else {
            return PageDisposition::Unrelated;
        };
        if event.job != pending.job {
            return PageDisposition::Unrelated;
        }

        match &event.kind {
            JobEventKind::PreExecute => PageDisposition::Started,
            JobEventKind::Finished(JobOutcome::Result {
                response: Response::Trips(result),
                ..
            }) => match result.status {
                TripsStatus::Ok => {
                    let added = self.merge(result, pending.replaces_all);
                    PageDisposition::Merged { added }
                }
                TripsStatus::NoTrips => {
                    debug!("page fetch found no further trips");
                    PageDisposition::NoMoreData
                }
                _ => PageDisposition::Surface,
            },
            JobEventKind::Finished(JobOutcome::Cancelled) => PageDisposition::Cancelled,
            JobEventKind::Finished(_) => PageDisposition::Surface,
            JobEventKind::PostExecute => {
                self.in_flight = None;
                PageDisposition::Completed
            }
        }
    }
}

/// Cursor index the consuming layer should select after the first
/// successful page: 1 when the page was fetched "later", else the last
/// index. This shows the most relevant edge of the result window.
pub fn initial_cursor(fetched_later: bool, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    if fetched_later {
        1.min(len - 1)
    } else {
        len - 1
    }
}
