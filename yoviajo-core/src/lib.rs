pub mod models;
pub mod payloads;
pub mod clock;
pub mod policy;
pub mod countdown;
pub mod card;
pub mod filter;
pub mod pricing;

pub use models::{Booking, BookingStatus, Match, MatchKind, PaymentStatus, Ride, RideRequest, RideStatus, Role, User};
pub use card::{ActionButton, CardEntity, CardSummary, PrimaryAction, RouteLink, Viewer};
pub use countdown::{Countdown, CountdownDisplay, Urgency};
pub use filter::ListingFilter;
pub use policy::{PenaltyNotice, PenaltyPolicy, PenaltyState};
pub use pricing::TripCost;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Unparseable timestamp: {0}")]
    TimestampError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
