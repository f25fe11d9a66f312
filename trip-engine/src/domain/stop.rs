//! Stops along a public leg.

use chrono::{DateTime, Duration, Utc};

use super::Location;

/// A call of a vehicle at a location, with planned and predicted times.
///
/// Any of the four timestamps may be absent: an origin stop has no
/// arrival, a terminus no departure, and predictions are only present
/// when the provider carries realtime data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stop {
    /// Where the vehicle calls
    pub location: Location,
    /// Timetabled arrival
    pub planned_arrival: Option<DateTime<Utc>>,
    /// Realtime arrival prediction
    pub predicted_arrival: Option<DateTime<Utc>>,
    /// Timetabled departure
    pub planned_departure: Option<DateTime<Utc>>,
    /// Realtime departure prediction
    pub predicted_departure: Option<DateTime<Utc>>,
}

impl Stop {
    /// A stop at `location` with no times.
    pub fn at(location: Location) -> Self {
        Self {
            location,
            planned_arrival: None,
            predicted_arrival: None,
            planned_departure: None,
            predicted_departure: None,
        }
    }

    /// Best known arrival time: the prediction if present, else the plan.
    pub fn arrival(&self) -> Option<DateTime<Utc>> {
        self.predicted_arrival.or(self.planned_arrival)
    }

    /// Best known departure time: the prediction if present, else the plan.
    pub fn departure(&self) -> Option<DateTime<Utc>> {
        self.predicted_departure.or(self.planned_departure)
    }

    /// Arrival delay (predicted minus planned), if both are known.
    pub fn arrival_delay(&self) -> Option<Duration> {
        Some(self.predicted_arrival? - self.planned_arrival?)
    }

    /// Departure delay (predicted minus planned), if both are known.
    pub fn departure_delay(&self) -> Option<Duration> {
        Some(self.predicted_departure? - self.planned_departure?)
    }
}
