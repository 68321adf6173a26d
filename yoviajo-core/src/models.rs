use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::clock::parse_server_timestamp;

/// Account role as the backend encodes it (`C` driver, `P` passenger).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Driver,
    Passenger,
    Admin,
    Other(String),
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "C" => Role::Driver,
            "P" => Role::Passenger,
            "admin" | "super_admin" => Role::Admin,
            _ => Role::Other(raw),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Driver => "C".to_string(),
            Role::Passenger => "P".to_string(),
            Role::Admin => "admin".to_string(),
            Role::Other(raw) => raw,
        }
    }
}

impl Role {
    pub fn as_code(&self) -> &str {
        match self {
            Role::Driver => "C",
            Role::Passenger => "P",
            Role::Admin => "admin",
            Role::Other(raw) => raw,
        }
    }
}

fn default_reputation() -> i32 { 100 }
fn default_true() -> bool { true }

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub dni: Option<String>,
    pub role: Role,
    #[serde(default = "default_reputation")]
    pub reputation_score: i32,
    #[serde(default)]
    pub cancellation_count: i32,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub verification_status: Option<String>,
    #[serde(default)]
    pub car_model: Option<String>,
    #[serde(default)]
    pub car_plate: Option<String>,
    #[serde(default)]
    pub car_color: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl User {
    pub fn is_driver(&self) -> bool {
        self.role == Role::Driver
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// ============================================================================
// Rides
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    #[default]
    Active,
    Cancelled,
    Completed,
    #[serde(other)]
    Unknown,
}

/// A driver-published trip with seats for sale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ride {
    pub id: i64,
    pub origin: String,
    pub destination: String,
    pub departure_time: String,
    #[serde(default)]
    pub price: f64,
    pub available_seats: i32,
    pub driver_id: i64,
    #[serde(default)]
    pub driver_name: Option<String>,
    #[serde(default)]
    pub driver_verified: bool,
    #[serde(default)]
    pub driver_phone: Option<String>,
    #[serde(default)]
    pub car_model: Option<String>,
    #[serde(default)]
    pub car_color: Option<String>,
    #[serde(default)]
    pub status: RideStatus,
    #[serde(default)]
    pub bookings_count: i64,
    #[serde(default)]
    pub matches_count: i64,
    #[serde(default)]
    pub maps_url: Option<String>,
    #[serde(default)]
    pub fuel_liters_total: Option<f64>,
    #[serde(default)]
    pub price_per_seat_liters: Option<f64>,
    #[serde(default)]
    pub women_only: bool,
    #[serde(default)]
    pub allow_pets: bool,
    #[serde(default)]
    pub allow_smoking: bool,
    #[serde(default = "default_true")]
    pub allow_luggage: bool,
}

impl Ride {
    /// Departure as a UTC instant, if the server string parses.
    pub fn departure(&self) -> Option<DateTime<Utc>> {
        parse_server_timestamp(&self.departure_time).ok()
    }

    pub fn is_active(&self) -> bool {
        self.status == RideStatus::Active
    }
}

// ============================================================================
// Requests
// ============================================================================

/// A passenger-published desire to travel a route on a date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RideRequest {
    pub id: i64,
    pub passenger_id: i64,
    #[serde(default)]
    pub passenger_name: Option<String>,
    #[serde(default)]
    pub passenger_phone: Option<String>,
    pub origin: String,
    pub destination: String,
    pub date: String,
    #[serde(default)]
    pub time_window_start: Option<String>,
    #[serde(default)]
    pub time_window_end: Option<String>,
    #[serde(default = "default_true")]
    pub is_flexible: bool,
    #[serde(default)]
    pub proposed_price: Option<f64>,
    #[serde(default)]
    pub matches_count: i64,
    #[serde(default)]
    pub maps_url: Option<String>,
    #[serde(default)]
    pub origin_reference: Option<String>,
    #[serde(default)]
    pub destination_reference: Option<String>,
}

// ============================================================================
// Bookings
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    AwaitingPayment,
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    Paid,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Approved,
    Failed,
    Refunded,
    #[serde(other)]
    Unknown,
}

/// Minimal ride reference some booking payloads nest instead of flattening.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RideRef {
    #[serde(default)]
    pub driver_id: Option<i64>,
    #[serde(default)]
    pub departure_time: Option<String>,
}

/// A passenger's claim on seats in a ride.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: i64,
    pub ride_id: i64,
    pub passenger_id: i64,
    pub seats_booked: i32,
    pub status: BookingStatus,
    #[serde(default = "default_payment_status")]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub fee_amount: f64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub ride_origin: Option<String>,
    #[serde(default)]
    pub ride_destination: Option<String>,
    #[serde(default)]
    pub ride_departure_time: Option<String>,
    #[serde(default)]
    pub ride_price: Option<f64>,
    #[serde(default)]
    pub driver_id: Option<i64>,
    #[serde(default)]
    pub driver_name: Option<String>,
    #[serde(default)]
    pub passenger_name: Option<String>,
    #[serde(default)]
    pub passenger_phone: Option<String>,
    #[serde(default)]
    pub maps_url: Option<String>,
    #[serde(default)]
    pub ride: Option<RideRef>,
}

fn default_payment_status() -> PaymentStatus { PaymentStatus::Pending }

impl Booking {
    fn departure_raw(&self) -> Option<&str> {
        self.ride_departure_time
            .as_deref()
            .or_else(|| self.ride.as_ref().and_then(|r| r.departure_time.as_deref()))
    }

    /// Departure of the booked ride, from the flattened field or the nested ride.
    pub fn departure(&self) -> Option<DateTime<Utc>> {
        self.departure_raw().and_then(|raw| parse_server_timestamp(raw).ok())
    }

    /// Driver id, when the payload carries one. `/bookings/me` does not.
    pub fn driver_id(&self) -> Option<i64> {
        self.ride.as_ref().and_then(|r| r.driver_id).or(self.driver_id)
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == BookingStatus::Cancelled
    }
}

// ============================================================================
// Matches
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchKind {
    /// Shown to drivers: a passenger request fits one of their rides.
    PassengerFound,
    /// Shown to passengers: a ride fits one of their requests.
    RideFound,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateUser {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default = "default_reputation")]
    pub reputation: i32,
    #[serde(default)]
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchDetails {
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub price_proposal: Option<f64>,
    #[serde(default)]
    pub car: Option<String>,
}

/// A server-computed pairing between a ride and a request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Match {
    #[serde(rename = "type")]
    pub kind: MatchKind,
    #[serde(default)]
    pub match_score: i32,
    pub ride_id: i64,
    pub request_id: i64,
    pub candidate_user: CandidateUser,
    pub details: MatchDetails,
}
