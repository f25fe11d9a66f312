//! Mapping of trip query statuses onto required follow-up actions.
//!
//! Every non-Ok status maps to exactly one action the consuming layer
//! must take: show one distinct message, or prompt the user to pick from
//! a candidate list. The engine owns the mapping; wording and rendering
//! are owned by the consumer.

use crate::domain::Location;
use crate::provider::{AmbiguitySlot, TripsResult, TripsStatus};

/// The distinct user-facing message a status calls for.
///
/// One variant per classified cause; the consuming layer maps these to
/// localized wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserMessage {
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
    /// No trips were found
    NoTrips,
    /// The requested date is outside the timetable period
    InvalidDate,
    /// The provider is unreachable
    ServiceDown,
    /// Input was ambiguous but no candidates were offered
    AmbiguousLocation,
}

/// The follow-up action a non-Ok result requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    /// Show one distinct message
    Message(UserMessage),
    /// Prompt the user to choose among candidate locations
    Disambiguate {
        /// Which query slot the candidates belong to
        slot: AmbiguitySlot,
        /// Candidate locations to present
        candidates: Vec<Location>,
    },
}

/// Classify a result into its required follow-up action.
///
/// Returns `None` for an Ok result. For an ambiguous result the
/// candidate list is chosen with priority from > via > to; when no list
/// is present the generic ambiguous-location message is used.
pub fn follow_up(result: &TripsResult) -> Option<FollowUp> {
    let message = match result.status {
        TripsStatus::Ok => return None,
        TripsStatus::UnknownFrom => UserMessage::UnknownFrom,
        TripsStatus::UnknownVia => UserMessage::UnknownVia,
        TripsStatus::UnknownTo => UserMessage::UnknownTo,
        TripsStatus::UnknownLocation => UserMessage::UnknownLocation,
        TripsStatus::TooClose => UserMessage::TooClose,
        TripsStatus::UnresolvableAddress => UserMessage::UnresolvableAddress,
        TripsStatus::NoTrips => UserMessage::NoTrips,
        TripsStatus::InvalidDate => UserMessage::InvalidDate,
        TripsStatus::ServiceDown => UserMessage::ServiceDown,
        TripsStatus::Ambiguous => {
            let prioritized = [
                (AmbiguitySlot::From, result.ambiguous_from()),
                (AmbiguitySlot::Via, result.ambiguous_via()),
                (AmbiguitySlot::To, result.ambiguous_to()),
            ];
            for (slot, candidates) in prioritized {
                if let Some(candidates) = candidates {
                    return Some(FollowUp::Disambiguate {
                        slot,
                        candidates: candidates.to_vec(),
                    });
                }
            }
            UserMessage::AmbiguousLocation
        }
    };
    Some(FollowUp::Message(message))
}
