use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::hours_until;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyTarget {
    /// The user performing the action loses the points.
    Actor,
    /// The driver being reported loses the points.
    ReportedDriver,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyKind {
    BookingCancellation,
    RideCancellation,
    NoShowReport,
}

/// Display-only: the backend applies the deduction on the mutating call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PenaltyPolicy {
    pub kind: PenaltyKind,
    pub threshold_hours: i64,
    pub points: u32,
    pub target: PenaltyTarget,
}

impl PenaltyPolicy {
    /// Passenger cancelling their own booking.
    pub const BOOKING_CANCELLATION: PenaltyPolicy = PenaltyPolicy {
        kind: PenaltyKind::BookingCancellation,
        threshold_hours: 6,
        points: 5,
        target: PenaltyTarget::Actor,
    };

    /// Driver cancelling a published ride that still has bookings.
    pub const RIDE_CANCELLATION: PenaltyPolicy = PenaltyPolicy {
        kind: PenaltyKind::RideCancellation,
        threshold_hours: 24,
        points: 20,
        target: PenaltyTarget::Actor,
    };

    /// Passenger reporting that the driver never showed up.
    pub const NO_SHOW_REPORT: PenaltyPolicy = PenaltyPolicy {
        kind: PenaltyKind::NoShowReport,
        threshold_hours: 6,
        points: 20,
        target: PenaltyTarget::ReportedDriver,
    };

    pub fn threshold(&self) -> Duration {
        Duration::hours(self.threshold_hours)
    }

    /// Evaluate the notice for a departure seen at `now`.
    ///
    /// Penalty applies iff strictly less than the threshold remains; a
    /// departure exactly on the threshold is still free.
    pub fn evaluate(&self, departure: DateTime<Utc>, now: DateTime<Utc>) -> PenaltyNotice {
        let hours_remaining = hours_until(departure, now);
        let state = if hours_remaining < self.threshold_hours as f64 {
            PenaltyState::PenaltyApplies { points: self.points }
        } else {
            PenaltyState::NoPenalty
        };

        PenaltyNotice { policy: *self, hours_remaining, state }
    }

    /// Ride cancellation only costs reputation when passengers are affected.
    pub fn evaluate_ride_cancellation(departure: DateTime<Utc>, now: DateTime<Utc>, active_bookings: usize) -> PenaltyNotice {
        let mut notice = Self::RIDE_CANCELLATION.evaluate(departure, now);
        if active_bookings == 0 {
            notice.state = PenaltyState::NoPenalty;
        }
        notice
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PenaltyState {
    NoPenalty,
    PenaltyApplies { points: u32 },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PenaltyNotice {
    pub policy: PenaltyPolicy,
    pub hours_remaining: f64,
    pub state: PenaltyState,
}

impl PenaltyNotice {
    pub fn applies(&self) -> bool {
        matches!(self.state, PenaltyState::PenaltyApplies { .. })
    }

    pub fn points(&self) -> u32 {
        match self.state {
            PenaltyState::PenaltyApplies { points } => points,
            PenaltyState::NoPenalty => 0,
        }
    }

    pub fn headline(&self) -> &'static str {
        match (self.policy.kind, self.applies()) {
            (PenaltyKind::NoShowReport, _) => "Serious action",
            (_, true) => "Penalty applies",
            (_, false) => "No penalty",
        }
    }

    /// The sentence shown under the headline.
    pub fn message(&self) -> String {
        let threshold = self.policy.threshold_hours;
        match (self.policy.kind, self.state) {
            (PenaltyKind::NoShowReport, _) => format!(
                "Only report if the driver really did not show up. The driver will lose {} reputation points.",
                self.policy.points
            ),
            (_, PenaltyState::PenaltyApplies { points }) => format!(
                "Less than {} hours remain before departure. Cancelling now costs {} reputation points.",
                threshold, points
            ),
            (_, PenaltyState::NoPenalty) => format!(
                "More than {} hours remain. You can cancel without affecting your reputation.",
                threshold
            ),
        }
    }

    pub fn confirm_label(&self) -> &'static str {
        match (self.policy.kind, self.applies()) {
            (PenaltyKind::NoShowReport, _) => "Send report",
            (_, true) => "Accept penalty",
            (_, false) => "Confirm cancellation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_booking_cancellation_thresholds() {
        let now = now();
        let policy = PenaltyPolicy::BOOKING_CANCELLATION;

        let free = policy.evaluate(now + Duration::hours(7), now);
        assert_eq!(free.state, PenaltyState::NoPenalty);
        assert_eq!(free.confirm_label(), "Confirm cancellation");

        let costly = policy.evaluate(now + Duration::hours(5), now);
        assert_eq!(costly.state, PenaltyState::PenaltyApplies { points: 5 });
        assert!(costly.message().contains("5 reputation points"));
    }

    #[test]
    fn test_exact_threshold_is_free() {
        let now = now();
        let notice = PenaltyPolicy::BOOKING_CANCELLATION.evaluate(now + Duration::hours(6), now);
        assert!(!notice.applies());
    }

    #[test]
    fn test_ride_cancellation_needs_bookings() {
        let now = now();
        let departure = now + Duration::hours(10);

        let with_passengers = PenaltyPolicy::evaluate_ride_cancellation(departure, now, 2);
        assert_eq!(with_passengers.points(), 20);

        let empty = PenaltyPolicy::evaluate_ride_cancellation(departure, now, 0);
        assert_eq!(empty.points(), 0);

        let early = PenaltyPolicy::evaluate_ride_cancellation(now + Duration::hours(30), now, 2);
        assert!(!early.applies());
    }

    #[test]
    fn test_no_show_report_penalizes_driver() {
        let now = now();
        let notice = PenaltyPolicy::NO_SHOW_REPORT.evaluate(now - Duration::hours(1), now);
        assert!(notice.applies());
        assert_eq!(notice.points(), 20);
        assert_eq!(notice.policy.target, PenaltyTarget::ReportedDriver);
        assert_eq!(notice.headline(), "Serious action");
    }
}
