//! Feasibility rating of walking transfers between scheduled legs.
//!
//! [`classify`] is a pure function over planned/predicted timestamps.
//! It subtracts a fixed 60-second safety buffer from every connection
//! and rates what remains after the required transit time against a
//! 180-second tightness threshold. The planned departure bounds the
//! connection from below and the predicted departure from above, so a
//! delayed connecting vehicle can turn a tight transfer back into a
//! feasible one ("possibly ..." categories).
//!
//! The buffer and threshold are deliberate product-tuning constants;
//! do not adjust them.

use chrono::{DateTime, Duration, Utc};

use crate::domain::{Leg, Trip};

/// Safety buffer subtracted from every connection.
const SAFETY_SECS: i64 = 60;

/// Remaining-time threshold below which a transfer counts as tight.
const TIGHT_SECS: i64 = 180;

/// Feasibility category of a transfer, from hopeless to comfortable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TransferRisk {
    /// The connection is already gone
    Missed,
    /// Not enough time, and possibly already gone
    DifficultPossiblyMissed,
    /// Not enough time for the required transit
    Difficult,
    /// Tight, and possibly not enough time
    EndangeredPossiblyDifficult,
    /// Tight
    Endangered,
    /// Comfortable only if the connecting vehicle leaves late
    PossiblyDifficult,
    /// Tight unless the connecting vehicle leaves late
    PossiblyEndangered,
    /// Comfortable, but the margin depends on a prediction
    PossiblyGood,
    /// Comfortable
    Good,
}

/// Timestamps of one transfer, consumed once by [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferInput {
    /// Planned arrival of the feeding leg
    pub arrival_planned: DateTime<Utc>,
    /// Predicted arrival of the feeding leg, if known
    pub arrival_predicted: Option<DateTime<Utc>>,
    /// Planned departure of the connecting leg
    pub departure_planned: DateTime<Utc>,
    /// Predicted departure of the connecting leg, if known
    pub departure_predicted: Option<DateTime<Utc>>,
    /// Transit time needed between the two legs
    pub required_transit: Duration,
}

/// Result of rating one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferAssessment {
    /// Feasibility category
    pub risk: TransferRisk,
    /// Margin backing the category; negative when the connection is gone
    pub margin: Duration,
}

impl TransferAssessment {
    /// The margin in whole minutes, rounded towards zero.
    pub fn margin_minutes(&self) -> i64 {
        self.margin.num_minutes()
    }
}

/// Rate the feasibility of one transfer.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use trip_engine::transfer::{classify, TransferInput, TransferRisk};
///
/// let input = TransferInput {
///     arrival_planned: Utc.with_ymd_and_hms(2026, 8, 6, 10, 0, 0).unwrap(),
///     arrival_predicted: None,
///     departure_planned: Utc.with_ymd_and_hms(2026, 8, 6, 10, 5, 0).unwrap(),
///     departure_predicted: None,
///     required_transit: Duration::zero(),
/// };
/// assert_eq!(classify(&input).risk, TransferRisk::Good);
/// ```
pub fn classify(input: &TransferInput) -> TransferAssessment {
    let arr_max = input.arrival_predicted.unwrap_or(input.arrival_planned);
    let dep_min = input.departure_planned;
    let dep_max = input.departure_predicted.unwrap_or(input.departure_planned);
    let required = input.required_transit.num_seconds();

    let diff_min = (dep_min - arr_max).num_seconds() - SAFETY_SECS;
    let diff_max = (dep_max - arr_max).num_seconds() - SAFETY_SECS;
    let left_min = diff_min - required;
    let left_max = diff_max - required;

    let (risk, margin_secs) = if diff_max < 0 {
        (TransferRisk::Missed, -diff_max - SAFETY_SECS)
    } else if left_max < 0 {
        if diff_min < 0 {
            (TransferRisk::DifficultPossiblyMissed, diff_max)
        } else {
            (TransferRisk::Difficult, diff_max)
        }
    } else if left_max < TIGHT_SECS {
        if left_min < 0 {
            (TransferRisk::EndangeredPossiblyDifficult, diff_max)
        } else {
            (TransferRisk::Endangered, diff_max)
        }
    } else if left_min < 0 {
        (TransferRisk::PossiblyDifficult, diff_max)
    } else if left_min < TIGHT_SECS {
        (TransferRisk::PossiblyEndangered, diff_max)
    } else if left_min != left_max {
        (TransferRisk::PossiblyGood, diff_max)
    } else {
        (TransferRisk::Good, diff_max)
    };

    TransferAssessment {
        risk,
        margin: Duration::seconds(margin_secs),
    }
}

/// One rated transfer within a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripTransfer {
    /// Index of the individual leg being rated
    pub leg_index: usize,
    /// The rating
    pub assessment: TransferAssessment,
}

/// Rate every public → individual → public transfer of a trip.
///
/// Each triple is rated independently; the individual leg's own
/// duration is taken as the required transit time.
pub fn assess_trip(trip: &Trip) -> Vec<TripTransfer> {
    let legs = trip.legs();
    let mut transfers = Vec::new();

    for (index, window) in legs.windows(3).enumerate() {
        let [Leg::Public(feeding), Leg::Individual(walk), Leg::Public(connecting)] = window else {
            continue;
        };
        let Some(arrival_planned) = feeding.arrival.planned_arrival else {
            continue;
        };
        let Some(departure_planned) = connecting.departure.planned_departure else {
            continue;
        };

        let input = TransferInput {
            arrival_planned,
            arrival_predicted: feeding.arrival.predicted_arrival,
            departure_planned,
            departure_predicted: connecting.departure.predicted_departure,
            required_transit: walk.duration(),
        };
        transfers.push(TripTransfer {
            leg_index: index + 1,
            assessment: classify(&input),
        });
    }

    transfers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IndividualKind, IndividualLeg, Line, Location, Product, PublicLeg, Stop};
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 6, h, m, s).unwrap()
    }

    fn input(
        arrival_predicted: Option<DateTime<Utc>>,
        departure_planned: DateTime<Utc>,
        departure_predicted: Option<DateTime<Utc>>,
        required_secs: i64,
    ) -> TransferInput {
        TransferInput {
            arrival_planned: at(10, 0, 0),
            arrival_predicted,
            departure_planned,
            departure_predicted,
            required_transit: Duration::seconds(required_secs),
        }
    }

    #[test]
    fn thirty_seconds_is_missed() {
        let assessment = classify(&input(None, at(10, 0, 30), None, 0));
        assert_eq!(assessment.risk, TransferRisk::Missed);
        assert_eq!(assessment.margin, Duration::seconds(-30));
    }

    #[test]
    fn five_minutes_is_good() {
        let assessment = classify(&input(None, at(10, 5, 0), None, 0));
        assert_eq!(assessment.risk, TransferRisk::Good);
        assert_eq!(assessment.margin, Duration::seconds(240));
        assert_eq!(assessment.margin_minutes(), 4);
    }

    #[test]
    fn difficult_possibly_missed() {
        // Planned connection already gone, prediction leaves too little.
        let assessment = classify(&input(None, at(10, 0, 30), Some(at(10, 2, 0)), 120));
        assert_eq!(assessment.risk, TransferRisk::DifficultPossiblyMissed);
        assert_eq!(assessment.margin, Duration::seconds(60));
    }

    #[test]
    fn difficult() {
        let assessment = classify(&input(None, at(10, 2, 0), None, 120));
        assert_eq!(assessment.risk, TransferRisk::Difficult);
        assert_eq!(assessment.margin, Duration::seconds(60));
    }

    #[test]
    fn endangered_possibly_difficult() {
        let assessment = classify(&input(None, at(10, 2, 0), Some(at(10, 5, 0)), 100));
        assert_eq!(assessment.risk, TransferRisk::EndangeredPossiblyDifficult);
        assert_eq!(assessment.margin, Duration::seconds(240));
    }

    #[test]
    fn endangered() {
        let assessment = classify(&input(None, at(10, 4, 0), None, 60));
        assert_eq!(assessment.risk, TransferRisk::Endangered);
        assert_eq!(assessment.margin, Duration::seconds(180));
    }

    #[test]
    fn possibly_difficult() {
        let assessment = classify(&input(None, at(10, 0, 45), Some(at(10, 5, 0)), 0));
        assert_eq!(assessment.risk, TransferRisk::PossiblyDifficult);
        assert_eq!(assessment.margin, Duration::seconds(240));
    }

    #[test]
    fn possibly_endangered() {
        let assessment = classify(&input(None, at(10, 3, 0), Some(at(10, 6, 0)), 0));
        assert_eq!(assessment.risk, TransferRisk::PossiblyEndangered);
        assert_eq!(assessment.margin, Duration::seconds(300));
    }

    #[test]
    fn possibly_good() {
        let assessment = classify(&input(None, at(10, 5, 0), Some(at(10, 6, 0)), 0));
        assert_eq!(assessment.risk, TransferRisk::PossiblyGood);
        assert_eq!(assessment.margin, Duration::seconds(300));
    }

    #[test]
    fn arrival_prediction_tightens_the_transfer() {
        // On time this would be Good; three minutes of arrival delay
        // leave only a tight connection.
        let assessment = classify(&input(Some(at(10, 3, 0)), at(10, 5, 0), None, 0));
        assert_eq!(assessment.risk, TransferRisk::Endangered);
        assert_eq!(assessment.margin, Duration::seconds(60));
    }

    #[test]
    fn assess_trip_rates_each_triple() {
        let mut feeding_arrival = Stop::at(Location::station("b", "b"));
        feeding_arrival.planned_arrival = Some(at(10, 0, 0));
        let mut feeding_departure = Stop::at(Location::station("a", "a"));
        feeding_departure.planned_departure = Some(at(9, 40, 0));

        let mut connecting_departure = Stop::at(Location::station("c", "c"));
        connecting_departure.planned_departure = Some(at(10, 10, 0));
        let mut connecting_arrival = Stop::at(Location::station("d", "d"));
        connecting_arrival.planned_arrival = Some(at(10, 30, 0));

        let trip = Trip::new(vec![
            Leg::Public(PublicLeg::new(
                Line::new(Product::SuburbanTrain, "S1"),
                feeding_departure,
                feeding_arrival,
            )),
            Leg::Individual(IndividualLeg {
                kind: IndividualKind::Walk,
                departure: Location::station("b", "b"),
                arrival: Location::station("c", "c"),
                departure_time: at(10, 0, 0),
                arrival_time: at(10, 5, 0),
                distance_meters: Some(350),
            }),
            Leg::Public(PublicLeg::new(
                Line::new(Product::Subway, "U6"),
                connecting_departure,
                connecting_arrival,
            )),
        ])
        .unwrap();

        let transfers = assess_trip(&trip);
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].leg_index, 1);
        // 10 minutes minus the buffer, minus a 5-minute walk: comfortable.
        assert_eq!(transfers[0].assessment.risk, TransferRisk::Good);
        assert_eq!(transfers[0].assessment.margin, Duration::seconds(540));
    }

    #[test]
    fn assess_trip_without_transfers_is_empty() {
        let mut departure = Stop::at(Location::station("a", "a"));
        departure.planned_departure = Some(at(10, 0, 0));
        let mut arrival = Stop::at(Location::station("b", "b"));
        arrival.planned_arrival = Some(at(10, 30, 0));

        let trip = Trip::new(vec![Leg::Public(PublicLeg::new(
            Line::new(Product::Bus, "100"),
            departure,
            arrival,
        ))])
        .unwrap();

        assert!(assess_trip(&trip).is_empty());
    }
}
