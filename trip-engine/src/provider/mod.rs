//! The abstract transit-data provider.
//!
//! Concrete providers (one per transit network) live outside this crate;
//! the engine only sees the [`ProviderClient`] trait and the result
//! types defined here. [`http`] offers a uniform mapping from
//! `reqwest` errors onto the provider error taxonomy, and [`mock`]
//! ships a scriptable in-memory implementation used by the engine tests.

pub mod error;
pub mod http;
pub mod mock;

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{Location, PublicLeg, Trip};
use crate::query::{JourneyRef, Options, TimeSpec, TripRef, TripShare};

pub use error::{IoFailure, IoKind, ProviderError};

/// Opaque continuation token for paging through trip results.
///
/// The engine never inspects a context beyond the two capability flags;
/// providers downcast via [`TripsContext::as_any`] to recover their own
/// concrete type.
pub trait TripsContext: fmt::Debug + Send + Sync {
    /// Whether an "earlier" page can be requested from this context.
    fn can_query_earlier(&self) -> bool;

    /// Whether a "later" page can be requested from this context.
    fn can_query_later(&self) -> bool;

    /// Downcast support for provider implementations.
    fn as_any(&self) -> &dyn Any;
}

/// Which time direction to page in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Trips before the current window
    Earlier,
    /// Trips after the current window
    Later,
}

/// Status of a trip query response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripsStatus {
    /// Trips were found
    Ok,
    /// The origin could not be resolved
    UnknownFrom,
    /// The via location could not be resolved
    UnknownVia,
    /// The destination could not be resolved
    UnknownTo,
    /// Some location could not be resolved
    UnknownLocation,
    /// Origin and destination are too close together
    TooClose,
    /// An address could not be resolved to a stop
    UnresolvableAddress,
    /// The query succeeded but found no trips
    NoTrips,
    /// The requested date is outside the timetable period
    InvalidDate,
    /// The provider is unreachable or persistently failing
    ServiceDown,
    /// Input was ambiguous; candidate locations may be attached
    Ambiguous,
}

/// Which query slot an ambiguous candidate list belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmbiguitySlot {
    /// Candidates for the origin
    From,
    /// Candidates for the via location
    Via,
    /// Candidates for the destination
    To,
}

/// Provider metadata attached to a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHeader {
    /// Network identifier of the answering provider
    pub network: String,
    /// Provider software/version banner, if reported
    pub server_product: Option<String>,
    /// When the provider produced the response
    pub served_at: DateTime<Utc>,
}

/// Result of a trip query.
///
/// # Invariants
///
/// At most one of the ambiguous candidate lists is present, and only
/// when `status` is [`TripsStatus::Ambiguous`]. The constructors enforce
/// this.
#[derive(Debug, Clone)]
pub struct TripsResult {
    /// Response status
    pub status: TripsStatus,
    /// Found trips, possibly empty
    pub trips: Vec<Trip>,
    /// Continuation token for paging, if the provider supports it
    pub continuation: Option<Arc<dyn TripsContext>>,
    /// Provider metadata, if reported
    pub header: Option<ResponseHeader>,
    ambiguous_from: Option<Vec<Location>>,
    ambiguous_via: Option<Vec<Location>>,
    ambiguous_to: Option<Vec<Location>>,
}

impl TripsResult {
    /// A successful response carrying trips and an optional continuation.
    pub fn ok(trips: Vec<Trip>, continuation: Option<Arc<dyn TripsContext>>) -> Self {
        Self {
            status: TripsStatus::Ok,
            trips,
            continuation,
            header: None,
            ambiguous_from: None,
            ambiguous_via: None,
            ambiguous_to: None,
        }
    }

    /// A response carrying only a status (no trips, no candidates).
    pub fn status(status: TripsStatus) -> Self {
        Self {
            status,
            trips: Vec::new(),
            continuation: None,
            header: None,
            ambiguous_from: None,
            ambiguous_via: None,
            ambiguous_to: None,
        }
    }

    /// An ambiguous response with candidates for exactly one slot.
    pub fn ambiguous(slot: AmbiguitySlot, candidates: Vec<Location>) -> Self {
        let mut result = Self::status(TripsStatus::Ambiguous);
        match slot {
            AmbiguitySlot::From => result.ambiguous_from = Some(candidates),
            AmbiguitySlot::Via => result.ambiguous_via = Some(candidates),
            AmbiguitySlot::To => result.ambiguous_to = Some(candidates),
        }
        result
    }

    /// Attach a provider header.
    #[must_use]
    pub fn with_header(mut self, header: ResponseHeader) -> Self {
        self.header = Some(header);
        self
    }

    /// Candidate origins, when the origin was ambiguous.
    pub fn ambiguous_from(&self) -> Option<&[Location]> {
        self.ambiguous_from.as_deref()
    }

    /// Candidate via locations, when the via was ambiguous.
    pub fn ambiguous_via(&self) -> Option<&[Location]> {
        self.ambiguous_via.as_deref()
    }

    /// Candidate destinations, when the destination was ambiguous.
    pub fn ambiguous_to(&self) -> Option<&[Location]> {
        self.ambiguous_to.as_deref()
    }
}

/// Status of a journey lookup response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JourneyStatus {
    /// The journey was found
    Ok,
    /// The journey reference is unknown or expired
    NotFound,
    /// The provider is unreachable or persistently failing
    ServiceDown,
}

/// Result of a journey lookup.
#[derive(Debug, Clone)]
pub struct JourneyResult {
    /// Response status
    pub status: JourneyStatus,
    /// The journey's leg, when found
    pub leg: Option<PublicLeg>,
    /// Provider metadata, if reported
    pub header: Option<ResponseHeader>,
}

impl JourneyResult {
    /// A successful journey lookup.
    pub fn ok(leg: PublicLeg) -> Self {
        Self {
            status: JourneyStatus::Ok,
            leg: Some(leg),
            header: None,
        }
    }

    /// A response carrying only a status.
    pub fn status(status: JourneyStatus) -> Self {
        Self {
            status,
            leg: None,
            header: None,
        }
    }
}

/// Union of the provider's response types, as delivered by the engine.
#[derive(Debug, Clone)]
pub enum Response {
    /// Response to a trip query (search, reload, shared, page)
    Trips(TripsResult),
    /// Response to a journey lookup
    Journey(JourneyResult),
}

impl Response {
    /// The trips result, if this is one.
    pub fn as_trips(&self) -> Option<&TripsResult> {
        match self {
            Response::Trips(result) => Some(result),
            Response::Journey(_) => None,
        }
    }

    /// The journey result, if this is one.
    pub fn as_journey(&self) -> Option<&JourneyResult> {
        match self {
            Response::Trips(_) => None,
            Response::Journey(result) => Some(result),
        }
    }
}

/// Query operations of a transit-data provider. All methods may fail
/// with a classified [`ProviderError`].
///
/// The engine holds one instance per session and calls it from the
/// session's single background worker, so implementations need no
/// internal request serialization.
pub trait ProviderClient: Send + Sync {
    /// Search trips between locations.
    fn query_trips(
        &self,
        from: &Location,
        via: Option<&Location>,
        to: &Location,
        time: &TimeSpec,
        options: &Options,
    ) -> impl Future<Output = Result<TripsResult, ProviderError>> + Send;

    /// Fetch another page of trips in the given direction.
    fn query_more_trips(
        &self,
        context: &Arc<dyn TripsContext>,
        direction: Direction,
    ) -> impl Future<Output = Result<TripsResult, ProviderError>> + Send;

    /// Re-query a previously found trip.
    fn query_reload_trip(
        &self,
        trip_ref: &TripRef,
    ) -> impl Future<Output = Result<TripsResult, ProviderError>> + Send;

    /// Resolve a trip shared by another user.
    fn load_shared_trip(
        &self,
        share: &TripShare,
    ) -> impl Future<Output = Result<TripsResult, ProviderError>> + Send;

    /// Look up a single vehicle journey.
    fn query_journey(
        &self,
        journey_ref: &JourneyRef,
    ) -> impl Future<Output = Result<JourneyResult, ProviderError>> + Send;
}

impl<P: ProviderClient> ProviderClient for Arc<P> {
    fn query_trips(
        &self,
        from: &Location,
        via: Option<&Location>,
        to: &Location,
        time: &TimeSpec,
        options: &Options,
    ) -> impl Future<Output = Result<TripsResult, ProviderError>> + Send {
        (**self).query_trips(from, via, to, time, options)
    }

    fn query_more_trips(
        &self,
        context: &Arc<dyn TripsContext>,
        direction: Direction,
    ) -> impl Future<Output = Result<TripsResult, ProviderError>> + Send {
        (**self).query_more_trips(context, direction)
    }

    fn query_reload_trip(
        &self,
        trip_ref: &TripRef,
    ) -> impl Future<Output = Result<TripsResult, ProviderError>> + Send {
        (**self).query_reload_trip(trip_ref)
    }

    fn load_shared_trip(
        &self,
        share: &TripShare,
    ) -> impl Future<Output = Result<TripsResult, ProviderError>> + Send {
        (**self).load_shared_trip(share)
    }

    fn query_journey(
        &self,
        journey_ref: &JourneyRef,
    ) -> impl Future<Output = Result<JourneyResult, ProviderError>> + Send {
        (**self).query_journey(journey_ref)
    }
}
