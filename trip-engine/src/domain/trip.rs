//! Trips and their legs.
//!
//! A [`Trip`] is an ordered sequence of legs from an origin to a
//! destination. Legs are either [`PublicLeg`]s (a ride on a scheduled
//! line) or [`IndividualLeg`]s (walk, bike, car). Times are validated at
//! construction so [`Trip::first_departure`] and [`Trip::last_arrival`]
//! never fail.

use chrono::{DateTime, Duration, Utc};

use super::{DomainError, Line, Location, Stop};

/// A ride on a scheduled line, from a boarding stop to an alighting stop.
///
/// # Invariants
///
/// Inside a [`Trip`], the departure stop carries a planned departure and
/// the arrival stop a planned arrival (validated by [`Trip::new`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicLeg {
    /// The line being ridden
    pub line: Line,
    /// Boarding stop
    pub departure: Stop,
    /// Alighting stop
    pub arrival: Stop,
    /// Intermediate calls between boarding and alighting
    pub intermediate: Vec<Stop>,
}

impl PublicLeg {
    /// Create a public leg with no intermediate stops.
    pub fn new(line: Line, departure: Stop, arrival: Stop) -> Self {
        Self {
            line,
            departure,
            arrival,
            intermediate: Vec::new(),
        }
    }
}

/// How an individual leg is travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndividualKind {
    /// On foot
    Walk,
    /// By bicycle
    Bike,
    /// By car
    Car,
    /// An in-station transfer
    Transfer,
}

/// A self-powered connection between two locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndividualLeg {
    /// How the leg is travelled
    pub kind: IndividualKind,
    /// Start location
    pub departure: Location,
    /// End location
    pub arrival: Location,
    /// When the leg starts
    pub departure_time: DateTime<Utc>,
    /// When the leg ends
    pub arrival_time: DateTime<Utc>,
    /// Distance in meters, if known
    pub distance_meters: Option<u32>,
}

impl IndividualLeg {
    /// Time needed for this leg.
    pub fn duration(&self) -> Duration {
        self.arrival_time - self.departure_time
    }
}

/// One segment of a trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Leg {
    /// A ride on a scheduled line
    Public(PublicLeg),
    /// A walk/bike/car connection
    Individual(IndividualLeg),
}

impl Leg {
    /// Best known departure time of this leg.
    pub fn departure_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Leg::Public(leg) => leg.departure.departure(),
            Leg::Individual(leg) => Some(leg.departure_time),
        }
    }

    /// Best known arrival time of this leg.
    pub fn arrival_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Leg::Public(leg) => leg.arrival.arrival(),
            Leg::Individual(leg) => Some(leg.arrival_time),
        }
    }

    /// Returns true if this is a public leg.
    pub fn is_public(&self) -> bool {
        matches!(self, Leg::Public(_))
    }

    /// Returns the public leg, if this is one.
    pub fn as_public(&self) -> Option<&PublicLeg> {
        match self {
            Leg::Public(leg) => Some(leg),
            Leg::Individual(_) => None,
        }
    }

    /// Returns the individual leg, if this is one.
    pub fn as_individual(&self) -> Option<&IndividualLeg> {
        match self {
            Leg::Public(_) => None,
            Leg::Individual(leg) => Some(leg),
        }
    }
}

/// Identity key of a trip: (first departure, last arrival, change count).
///
/// Two trips with equal keys are not necessarily the same trip; the key
/// only determines their deterministic ordering and groups candidates
/// for structural deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TripKey {
    /// Departure time of the first leg
    pub first_departure: DateTime<Utc>,
    /// Arrival time of the last leg
    pub last_arrival: DateTime<Utc>,
    /// Number of changes between public legs
    pub num_changes: usize,
}

/// An ordered sequence of legs from an origin to a destination.
///
/// # Invariants
///
/// - At least one leg
/// - Every public leg's departure stop has a planned departure and its
///   arrival stop a planned arrival
/// - The first leg has a departure time and the last leg an arrival time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    legs: Vec<Leg>,
    // Cached validated times (guaranteed present - validated at construction)
    first_departure: DateTime<Utc>,
    last_arrival: DateTime<Utc>,
    num_changes: usize,
}

impl Trip {
    /// Construct a trip, validating that the required times exist.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `legs` is empty, if any public leg is missing a
    /// planned departure/arrival at its boarding/alighting stop, or if
    /// the first/last leg has no usable time.
    pub fn new(legs: Vec<Leg>) -> Result<Self, DomainError> {
        for leg in &legs {
            if let Leg::Public(public) = leg {
                if public.departure.planned_departure.is_none() {
                    return Err(DomainError::MissingTime("planned departure of public leg"));
                }
                if public.arrival.planned_arrival.is_none() {
                    return Err(DomainError::MissingTime("planned arrival of public leg"));
                }
            }
        }

        let first_departure = legs
            .first()
            .ok_or(DomainError::EmptyTrip)?
            .departure_time()
            .ok_or(DomainError::MissingTime("departure of first leg"))?;
        let last_arrival = legs
            .last()
            .ok_or(DomainError::EmptyTrip)?
            .arrival_time()
            .ok_or(DomainError::MissingTime("arrival of last leg"))?;

        let public_count = legs.iter().filter(|l| l.is_public()).count();

        Ok(Trip {
            legs,
            first_departure,
            last_arrival,
            num_changes: public_count.saturating_sub(1),
        })
    }

    /// The legs of this trip, in travel order.
    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    /// Departure time of the first leg (guaranteed present).
    pub fn first_departure(&self) -> DateTime<Utc> {
        self.first_departure
    }

    /// Arrival time of the last leg (guaranteed present).
    pub fn last_arrival(&self) -> DateTime<Utc> {
        self.last_arrival
    }

    /// Number of changes between public legs.
    pub fn num_changes(&self) -> usize {
        self.num_changes
    }

    /// Total duration from first departure to last arrival.
    pub fn duration(&self) -> Duration {
        self.last_arrival - self.first_departure
    }

    /// Identity key for ordering and deduplication.
    pub fn key(&self) -> TripKey {
        TripKey {
            first_departure: self.first_departure,
            last_arrival: self.last_arrival,
            num_changes: self.num_changes,
        }
    }
}
