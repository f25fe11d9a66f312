//! Locations a query can start from, pass through, or end at.
//!
//! A location is either a provider-identified place (station, address,
//! point of interest), a bare coordinate, or a free-form name the
//! provider has yet to resolve. Coordinates are stored in microdegrees
//! so locations can be compared and hashed exactly.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A WGS84 coordinate in microdegrees (degrees × 1e6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    lat_e6: i32,
    lon_e6: i32,
}

impl Point {
    /// Create a point from degree values.
    ///
    /// # Examples
    ///
    /// ```
    /// use trip_engine::domain::Point;
    ///
    /// let p = Point::from_degrees(52.5200, 13.4050);
    /// assert_eq!(p.lat_e6(), 52_520_000);
    /// assert_eq!(p.lon_e6(), 13_405_000);
    /// ```
    pub fn from_degrees(lat: f64, lon: f64) -> Self {
        Self {
            lat_e6: (lat * 1e6).round() as i32,
            lon_e6: (lon * 1e6).round() as i32,
        }
    }

    /// Latitude in microdegrees.
    pub fn lat_e6(&self) -> i32 {
        self.lat_e6
    }

    /// Longitude in microdegrees.
    pub fn lon_e6(&self) -> i32 {
        self.lon_e6
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        f64::from(self.lat_e6) / 1e6
    }

    /// Longitude in degrees.
    pub fn lon(&self) -> f64 {
        f64::from(self.lon_e6) / 1e6
    }
}

/// The kind of place a [`Location`] denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationKind {
    /// A transit stop or station with a provider id
    Station,
    /// A street address
    Address,
    /// A point of interest
    Poi,
    /// A bare coordinate
    Coord,
    /// Unresolved free-form input
    Any,
}

/// A place in a query or a result.
///
/// All fields except `kind` are optional: a station usually carries an
/// id and a name, a coordinate only a point, unresolved user input only
/// a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// What kind of place this is
    pub kind: LocationKind,
    /// Provider-issued stable identifier, if known
    pub id: Option<String>,
    /// Coordinate, if known
    pub coord: Option<Point>,
    /// Containing place (city/borough), if known
    pub place: Option<String>,
    /// Display name, if known
    pub name: Option<String>,
}

impl Location {
    /// A station identified by a provider id.
    pub fn station(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: LocationKind::Station,
            id: Some(id.into()),
            coord: None,
            place: None,
            name: Some(name.into()),
        }
    }

    /// An address with place and name.
    pub fn address(place: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: LocationKind::Address,
            id: None,
            coord: None,
            place: Some(place.into()),
            name: Some(name.into()),
        }
    }

    /// A bare coordinate.
    pub fn coord(point: Point) -> Self {
        Self {
            kind: LocationKind::Coord,
            id: None,
            coord: Some(point),
            place: None,
            name: None,
        }
    }

    /// Unresolved free-form input, to be disambiguated by the provider.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            kind: LocationKind::Any,
            id: None,
            coord: None,
            place: None,
            name: Some(name.into()),
        }
    }

    /// Whether the provider has issued a stable id for this location.
    pub fn has_id(&self) -> bool {
        self.id.is_some()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.place, &self.name) {
            (Some(place), Some(name)) => write!(f, "{place}, {name}"),
            (None, Some(name)) => write!(f, "{name}"),
            _ => match (&self.id, &self.coord) {
                (Some(id), _) => write!(f, "{id}"),
                (None, Some(coord)) => write!(f, "{:.6},{:.6}", coord.lat(), coord.lon()),
                (None, None) => write!(f, "?"),
            },
        }
    }
}
