//! Domain types for the trip query engine.
//!
//! These types represent validated transit data. Invariants are enforced
//! at construction time, so code that receives them can trust their
//! validity: a [`Trip`] always has at least one leg and a well-defined
//! first departure and last arrival.

mod error;
mod line;
mod location;
mod stop;
mod trip;

pub use error::DomainError;
pub use line::{Line, Product, ProductSet};
pub use location::{Location, LocationKind, Point};
pub use stop::Stop;
pub use trip::{IndividualKind, IndividualLeg, Leg, PublicLeg, Trip, TripKey};
