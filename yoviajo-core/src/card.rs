use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::countdown::CountdownDisplay;
use crate::models::{Booking, Match, Ride, RideRequest, User};

/// Fuel price (ARS per litre) used to turn a ride price into litres.
pub const FUEL_PRICE_PER_LITRE: f64 = 1750.0;

/// Who is looking at a card. No identity means an anonymous visitor.
#[derive(Debug, Clone, Default)]
pub struct Viewer {
    pub identity: Option<User>,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self { identity: None }
    }

    pub fn user(user: User) -> Self {
        Self { identity: Some(user) }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Anonymous visitors browse as passengers.
    pub fn is_driver(&self) -> bool {
        self.identity.as_ref().is_some_and(User::is_driver)
    }

    fn id(&self) -> Option<i64> {
        self.identity.as_ref().map(|u| u.id)
    }
}

/// One listing entry, carrying only the fields valid for its kind.
#[derive(Debug, Clone)]
pub enum CardEntity {
    Offer(Ride),
    Request(RideRequest),
    Booking(Booking),
    Match(Match),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryAction {
    MakeMatch,
    Manage,
    Reserve,
    LogIn,
    ReportAbsence,
    Cancel,
    Pending,
    OfferSeat,
    RequestToJoin,
}

impl PrimaryAction {
    pub fn label(&self) -> &'static str {
        match self {
            PrimaryAction::MakeMatch => "make match",
            PrimaryAction::Manage => "manage",
            PrimaryAction::Reserve => "reserve",
            PrimaryAction::LogIn => "log in",
            PrimaryAction::ReportAbsence => "report absence",
            PrimaryAction::Cancel => "cancel",
            PrimaryAction::Pending => "pending",
            PrimaryAction::OfferSeat => "offer seat",
            PrimaryAction::RequestToJoin => "request to join",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionButton {
    pub action: PrimaryAction,
    pub enabled: bool,
}

impl ActionButton {
    fn enabled(action: PrimaryAction) -> Option<Self> {
        Some(Self { action, enabled: true })
    }

    fn disabled(action: PrimaryAction) -> Option<Self> {
        Some(Self { action, enabled: false })
    }

    pub fn label(&self) -> &'static str {
        self.action.label()
    }
}

/// Target of the always-available "view route" action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteLink {
    /// The backend already built a maps URL.
    Provided(String),
    /// Build a directions link from the two place names.
    Directions { origin: String, destination: String },
}

pub const DIRECTIONS_BASE_URL: &str = "https://www.google.com/maps/dir/";

impl RouteLink {
    /// Query pairs for the directions fallback, unencoded.
    pub fn directions_query(origin: &str, destination: &str) -> [(&'static str, String); 4] {
        [
            ("api", "1".to_string()),
            ("origin", origin.to_string()),
            ("destination", destination.to_string()),
            ("travelmode", "driving".to_string()),
        ]
    }
}

impl CardEntity {
    /// The single primary action for this card. `None` hides the button.
    pub fn primary_action(&self, viewer: &Viewer, now: DateTime<Utc>) -> Option<ActionButton> {
        match (self, viewer.is_driver()) {
            (CardEntity::Match(_), true) => ActionButton::enabled(PrimaryAction::OfferSeat),
            (CardEntity::Match(_), false) => ActionButton::enabled(PrimaryAction::RequestToJoin),

            (CardEntity::Request(_), true) => ActionButton::enabled(PrimaryAction::MakeMatch),
            (CardEntity::Offer(_), true) => ActionButton::enabled(PrimaryAction::Manage),
            (CardEntity::Booking(_), true) => None,

            (CardEntity::Offer(_), false) if viewer.is_authenticated() => ActionButton::enabled(PrimaryAction::Reserve),
            (CardEntity::Offer(_), false) => ActionButton::disabled(PrimaryAction::LogIn),

            (CardEntity::Booking(booking), false) => {
                // No readable departure keeps the booking cancellable.
                let departed = booking.departure().is_some_and(|dep| dep < now);
                if departed {
                    ActionButton::enabled(PrimaryAction::ReportAbsence)
                } else {
                    ActionButton::enabled(PrimaryAction::Cancel)
                }
            }

            (CardEntity::Request(request), false) => {
                if viewer.id() == Some(request.passenger_id) {
                    ActionButton::enabled(PrimaryAction::Manage)
                } else {
                    ActionButton::disabled(PrimaryAction::Pending)
                }
            }
        }
    }

    pub fn origin(&self) -> &str {
        match self {
            CardEntity::Offer(r) => &r.origin,
            CardEntity::Request(r) => &r.origin,
            CardEntity::Booking(b) => b.ride_origin.as_deref().unwrap_or_default(),
            CardEntity::Match(m) => &m.details.origin,
        }
    }

    pub fn destination(&self) -> &str {
        match self {
            CardEntity::Offer(r) => &r.destination,
            CardEntity::Request(r) => &r.destination,
            CardEntity::Booking(b) => b.ride_destination.as_deref().unwrap_or_default(),
            CardEntity::Match(m) => &m.details.destination,
        }
    }

    fn maps_url(&self) -> Option<&str> {
        match self {
            CardEntity::Offer(r) => r.maps_url.as_deref(),
            CardEntity::Request(r) => r.maps_url.as_deref(),
            CardEntity::Booking(b) => b.maps_url.as_deref(),
            CardEntity::Match(_) => None,
        }
    }

    /// Secondary "view route" action; always available.
    pub fn route_link(&self) -> RouteLink {
        match self.maps_url().filter(|url| !url.is_empty()) {
            Some(url) => RouteLink::Provided(url.to_string()),
            None => RouteLink::Directions {
                origin: self.origin().to_string(),
                destination: self.destination().to_string(),
            },
        }
    }

    fn departure(&self) -> Option<DateTime<Utc>> {
        match self {
            CardEntity::Offer(r) => r.departure(),
            CardEntity::Booking(b) => b.departure(),
            CardEntity::Request(_) | CardEntity::Match(_) => None,
        }
    }

    /// Everything the card shows besides its buttons.
    pub fn summary(&self, viewer: &Viewer, now: DateTime<Utc>) -> CardSummary {
        let (date, time) = self.schedule();
        let countdown = self.departure().map(|dep| CountdownDisplay::compute(dep, now));

        let (price, liters) = match self {
            CardEntity::Offer(r) => (r.price, r.fuel_liters_total),
            CardEntity::Booking(b) => (b.ride_price.unwrap_or_default(), None),
            CardEntity::Request(r) => (r.proposed_price.unwrap_or_default(), None),
            CardEntity::Match(m) => (m.details.price.or(m.details.price_proposal).unwrap_or_default(), None),
        };
        let estimated_liters = match liters {
            Some(l) if l > 0.0 => Some(l.round()),
            _ if price > 0.0 => Some((price / FUEL_PRICE_PER_LITRE).round()),
            _ => None,
        };

        let interest = match self {
            CardEntity::Offer(r) if viewer.is_driver() => Some(r.bookings_count),
            _ => None,
        };

        CardSummary {
            title: format!("{} → {}", self.origin(), self.destination()),
            date,
            time,
            countdown,
            estimated_liters,
            shows_fee_notice: !viewer.is_driver() && estimated_liters.is_some(),
            bookings_interest: interest,
        }
    }

    fn schedule(&self) -> (String, Option<String>) {
        const PENDING: &str = "pending";
        match self {
            CardEntity::Offer(r) => match r.departure() {
                Some(dep) => (dep.format("%Y-%m-%d").to_string(), Some(dep.format("%H:%M").to_string())),
                None => (PENDING.to_string(), None),
            },
            CardEntity::Booking(b) => match b.departure() {
                Some(dep) => (dep.format("%Y-%m-%d").to_string(), Some(dep.format("%H:%M").to_string())),
                None => (PENDING.to_string(), None),
            },
            CardEntity::Request(r) => {
                let date = if r.date.is_empty() { PENDING.to_string() } else { r.date.clone() };
                let window = match (&r.time_window_start, &r.time_window_end) {
                    (Some(start), Some(end)) => Some(format!("{} - {}", hhmm(start), hhmm(end))),
                    _ => None,
                };
                (date, window)
            }
            CardEntity::Match(m) => (m.details.date.clone().unwrap_or_else(|| PENDING.to_string()), None),
        }
    }
}

fn hhmm(raw: &str) -> &str {
    raw.get(..5).unwrap_or(raw)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardSummary {
    pub title: String,
    pub date: String,
    pub time: Option<String>,
    pub countdown: Option<CountdownDisplay>,
    /// `None` renders "to be agreed".
    pub estimated_liters: Option<f64>,
    pub shows_fee_notice: bool,
    pub bookings_interest: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingStatus, MatchDetails, MatchKind, CandidateUser, PaymentStatus, Role, RideStatus};
    use chrono::Duration;

    fn user(id: i64, role: Role) -> User {
        User {
            id,
            name: format!("user-{}", id),
            email: None,
            dni: None,
            role,
            reputation_score: 100,
            cancellation_count: 0,
            is_verified: false,
            verification_status: None,
            car_model: None,
            car_plate: None,
            car_color: None,
            photo_url: None,
        }
    }

    fn ride(departure: DateTime<Utc>) -> Ride {
        Ride {
            id: 1,
            origin: "Mendoza".into(),
            destination: "San Juan".into(),
            departure_time: departure.to_rfc3339(),
            price: 17500.0,
            available_seats: 3,
            driver_id: 10,
            driver_name: None,
            driver_verified: false,
            driver_phone: None,
            car_model: None,
            car_color: None,
            status: RideStatus::Active,
            bookings_count: 2,
            matches_count: 0,
            maps_url: None,
            fuel_liters_total: None,
            price_per_seat_liters: None,
            women_only: false,
            allow_pets: false,
            allow_smoking: false,
            allow_luggage: true,
        }
    }

    fn booking(departure: DateTime<Utc>) -> Booking {
        Booking {
            id: 5,
            ride_id: 1,
            passenger_id: 20,
            seats_booked: 1,
            status: BookingStatus::Confirmed,
            payment_status: PaymentStatus::Paid,
            fee_amount: 0.0,
            created_at: None,
            ride_origin: Some("Mendoza".into()),
            ride_destination: Some("San Juan".into()),
            ride_departure_time: Some(departure.to_rfc3339()),
            ride_price: None,
            driver_id: Some(10),
            driver_name: None,
            passenger_name: None,
            passenger_phone: None,
            maps_url: None,
            ride: None,
        }
    }

    fn request(passenger_id: i64) -> RideRequest {
        RideRequest {
            id: 3,
            passenger_id,
            passenger_name: None,
            passenger_phone: None,
            origin: "Neuquén".into(),
            destination: "Bariloche".into(),
            date: "2025-06-01".into(),
            time_window_start: Some("08:00:00".into()),
            time_window_end: Some("11:30:00".into()),
            is_flexible: true,
            proposed_price: None,
            matches_count: 0,
            maps_url: None,
            origin_reference: None,
            destination_reference: None,
        }
    }

    fn a_match() -> Match {
        Match {
            kind: MatchKind::PassengerFound,
            match_score: 95,
            ride_id: 1,
            request_id: 3,
            candidate_user: CandidateUser { id: 20, name: "Eva".into(), age: None, reputation: 90, photo: None },
            details: MatchDetails {
                origin: "Neuquén".into(),
                destination: "Bariloche".into(),
                date: None,
                price: None,
                price_proposal: None,
                car: None,
            },
        }
    }

    fn action(entity: &CardEntity, viewer: &Viewer) -> Option<ActionButton> {
        entity.primary_action(viewer, Utc::now())
    }

    #[test]
    fn test_driver_actions() {
        let driver = Viewer::user(user(10, Role::Driver));
        let future = Utc::now() + Duration::days(1);

        assert_eq!(action(&CardEntity::Request(request(20)), &driver).unwrap().action, PrimaryAction::MakeMatch);
        assert_eq!(action(&CardEntity::Offer(ride(future)), &driver).unwrap().action, PrimaryAction::Manage);
        assert_eq!(action(&CardEntity::Match(a_match()), &driver).unwrap().action, PrimaryAction::OfferSeat);
        assert!(action(&CardEntity::Booking(booking(future)), &driver).is_none());
    }

    #[test]
    fn test_anonymous_offer_is_disabled_login() {
        let offer = CardEntity::Offer(ride(Utc::now() + Duration::days(1)));
        let button = action(&offer, &Viewer::anonymous()).unwrap();
        assert_eq!(button.action, PrimaryAction::LogIn);
        assert!(!button.enabled);
        assert_eq!(button.label(), "log in");
    }

    #[test]
    fn test_passenger_offer_reserve() {
        let passenger = Viewer::user(user(20, Role::Passenger));
        let button = action(&CardEntity::Offer(ride(Utc::now() + Duration::days(1))), &passenger).unwrap();
        assert_eq!(button.action, PrimaryAction::Reserve);
        assert!(button.enabled);
    }

    #[test]
    fn test_booking_past_vs_future() {
        let passenger = Viewer::user(user(20, Role::Passenger));

        let past = CardEntity::Booking(booking(Utc::now() - Duration::hours(1)));
        assert_eq!(action(&past, &passenger).unwrap().action, PrimaryAction::ReportAbsence);

        let future = CardEntity::Booking(booking(Utc::now() + Duration::hours(1)));
        assert_eq!(action(&future, &passenger).unwrap().action, PrimaryAction::Cancel);
    }

    #[test]
    fn test_request_ownership() {
        let passenger = Viewer::user(user(20, Role::Passenger));

        let own = action(&CardEntity::Request(request(20)), &passenger).unwrap();
        assert_eq!(own.action, PrimaryAction::Manage);

        let other = action(&CardEntity::Request(request(21)), &passenger).unwrap();
        assert_eq!(other.action, PrimaryAction::Pending);
        assert!(!other.enabled);

        let joined = action(&CardEntity::Match(a_match()), &passenger).unwrap();
        assert_eq!(joined.action, PrimaryAction::RequestToJoin);
    }

    #[test]
    fn test_route_link_fallback() {
        let mut offer = ride(Utc::now());
        assert_eq!(
            CardEntity::Offer(offer.clone()).route_link(),
            RouteLink::Directions { origin: "Mendoza".into(), destination: "San Juan".into() }
        );

        offer.maps_url = Some("https://maps.example/r/1".into());
        assert_eq!(CardEntity::Offer(offer).route_link(), RouteLink::Provided("https://maps.example/r/1".into()));
    }

    #[test]
    fn test_summary_for_request_window() {
        let summary = CardEntity::Request(request(20)).summary(&Viewer::anonymous(), Utc::now());
        assert_eq!(summary.date, "2025-06-01");
        assert_eq!(summary.time.as_deref(), Some("08:00 - 11:30"));
        assert!(summary.estimated_liters.is_none());
        assert!(summary.countdown.is_none());
    }

    #[test]
    fn test_summary_for_driver_offer() {
        let driver = Viewer::user(user(10, Role::Driver));
        let summary = CardEntity::Offer(ride(Utc::now() + Duration::days(3))).summary(&driver, Utc::now());
        assert_eq!(summary.estimated_liters, Some(10.0));
        assert_eq!(summary.bookings_interest, Some(2));
        assert!(!summary.shows_fee_notice);
        assert!(summary.countdown.is_some());
    }
}
