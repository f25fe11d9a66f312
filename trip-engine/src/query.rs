//! Query parameters.
//!
//! A [`Query`] describes one lookup against the provider: a fresh trip
//! search, a reload of a known trip, the resolution of a shared trip, or
//! a journey lookup. Exactly one of these modes is active per query; the
//! enum makes the modes mutually exclusive by construction.
//!
//! Queries are immutable and serializable so the consuming layer can
//! persist a request snapshot for later manual reload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::{Location, ProductSet};

/// Opaque provider-issued reference to a specific trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TripRef(String);

impl TripRef {
    /// Wrap a provider-issued reference string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw reference string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Opaque token describing a trip shared by another user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TripShare(String);

impl TripShare {
    /// Wrap a share token.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Opaque provider-issued reference to a single vehicle journey.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JourneyRef(String);

impl JourneyRef {
    /// Wrap a journey reference string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw reference string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Whether the requested time is a departure or an arrival constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeSpec {
    /// Trips departing at or after this time
    DepartAt(DateTime<Utc>),
    /// Trips arriving at or before this time
    ArriveBy(DateTime<Utc>),
}

impl TimeSpec {
    /// The requested timestamp.
    pub fn time(&self) -> DateTime<Utc> {
        match self {
            TimeSpec::DepartAt(t) | TimeSpec::ArriveBy(t) => *t,
        }
    }

    /// True for a departure constraint.
    pub fn is_departure(&self) -> bool {
        matches!(self, TimeSpec::DepartAt(_))
    }
}

/// What to optimize trips for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Optimize {
    /// Shortest total duration
    #[default]
    LeastDuration,
    /// Fewest changes
    LeastChanges,
    /// Least walking
    LeastWalking,
}

/// Assumed walking speed for transfers and footpaths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WalkSpeed {
    /// Slow walker
    Slow,
    /// Average walker
    #[default]
    Normal,
    /// Fast walker
    Fast,
}

/// Accessibility requirement for suggested trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Accessibility {
    /// No requirement
    #[default]
    Neutral,
    /// Prefer step-free where possible
    Limited,
    /// Only barrier-free connections
    BarrierFree,
}

/// Optional query flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TripFlag {
    /// Only trips that allow bicycle carriage
    Bike,
}

/// Search options for a trip query. Compared by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Allowed transport products
    pub products: ProductSet,
    /// Optimization preference
    pub optimize: Optimize,
    /// Walking speed assumption
    pub walk_speed: WalkSpeed,
    /// Accessibility requirement
    pub accessibility: Accessibility,
    /// Optional flags
    pub flags: BTreeSet<TripFlag>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            products: ProductSet::all(),
            optimize: Optimize::default(),
            walk_speed: WalkSpeed::default(),
            accessibility: Accessibility::default(),
            flags: BTreeSet::new(),
        }
    }
}

/// One lookup request against the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Query {
    /// A fresh trip search between locations
    TripSearch {
        /// Origin
        from: Location,
        /// Optional intermediate location
        via: Option<Location>,
        /// Destination
        to: Location,
        /// Requested departure or arrival time
        time: TimeSpec,
        /// Search options
        options: Options,
    },
    /// Reload a previously found trip
    Reload(TripRef),
    /// Resolve a trip shared by another user
    Shared(TripShare),
    /// Look up a single vehicle journey
    Journey(JourneyRef),
}

impl Query {
    /// A trip search with default options and no via.
    pub fn trip_search(from: Location, to: Location, time: TimeSpec) -> Self {
        Query::TripSearch {
            from,
            via: None,
            to,
            time,
            options: Options::default(),
        }
    }
}
