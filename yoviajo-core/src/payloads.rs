use serde::{Deserialize, Serialize};
use chrono::NaiveDate;
use yoviajo_shared::Masked;

use crate::models::{BookingStatus, User};
use crate::{CoreError, CoreResult};

/// Seats a single booking may claim, inclusive.
pub const MIN_SEATS_PER_BOOKING: i32 = 1;
pub const MAX_SEATS_PER_BOOKING: i32 = 10;

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub dni: String,
    pub password: Masked<String>,
    /// Disambiguates a DNI that owns both a driver and a passenger account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub dni: String,
    pub password: Masked<String>,
    pub role: String,
    pub gender: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub car_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub car_plate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub car_color: Option<String>,
    pub prefs_smoking: bool,
    pub prefs_pets: bool,
    pub prefs_luggage: bool,
}

impl Registration {
    /// Mirrors the backend's field rules so obviously bad forms never leave the client.
    pub fn validate(&self) -> CoreResult<()> {
        if !self.dni.chars().all(|c| c.is_ascii_digit()) || !(7..=8).contains(&self.dni.len()) {
            return Err(CoreError::ValidationError("DNI must be 7 or 8 digits".to_string()));
        }
        if self.password.expose().chars().count() < 8 {
            return Err(CoreError::ValidationError("password must be at least 8 characters".to_string()));
        }
        if self.name.trim().chars().count() < 3 {
            return Err(CoreError::ValidationError("name must be at least 3 characters".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RoleOption {
    pub role: String,
    pub label: String,
}

/// Body of the 300 answer the backend gives when a DNI has several accounts.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleChoice {
    #[serde(default)]
    pub detail: Option<String>,
    pub roles_available: Vec<RoleOption>,
}

// ============================================================================
// Profile
// ============================================================================

#[derive(Debug, Clone, Serialize, Default)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub car_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub car_plate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub car_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefs_smoking: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefs_pets: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefs_luggage: Option<bool>,
}

/// Generic `{ "message": ... }` acknowledgement.
#[derive(Debug, Clone, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub message: Option<String>,
}

// ============================================================================
// Publishing
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct NewRide {
    pub origin: String,
    pub destination: String,
    pub departure_time: String,
    pub price: f64,
    pub available_seats: i32,
    pub women_only: bool,
    pub allow_pets: bool,
    pub allow_smoking: bool,
    pub allow_luggage: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_lng: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_lng: Option<f64>,
}

impl NewRide {
    pub fn new(origin: String, destination: String, departure_time: String, price: f64, available_seats: i32) -> Self {
        Self {
            origin,
            destination,
            departure_time,
            price,
            available_seats,
            women_only: false,
            allow_pets: false,
            allow_smoking: false,
            allow_luggage: true,
            origin_lat: None,
            origin_lng: None,
            destination_lat: None,
            destination_lng: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewRideRequest {
    pub origin: String,
    pub destination: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_window_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_window_end: Option<String>,
    pub is_flexible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposed_price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_reference: Option<String>,
}

// ============================================================================
// Bookings, reports, matches, payments
// ============================================================================

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewBooking {
    pub ride_id: i64,
    pub seats_booked: i32,
}

impl NewBooking {
    pub fn new(ride_id: i64, seats_booked: i32) -> CoreResult<Self> {
        if !(MIN_SEATS_PER_BOOKING..=MAX_SEATS_PER_BOOKING).contains(&seats_booked) {
            return Err(CoreError::ValidationError(format!(
                "seats must be between {} and {}",
                MIN_SEATS_PER_BOOKING, MAX_SEATS_PER_BOOKING
            )));
        }
        Ok(Self { ride_id, seats_booked })
    }
}

#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct BookingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BookingStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seats_booked: Option<i32>,
}

impl BookingUpdate {
    pub fn cancel() -> Self {
        Self { status: Some(BookingStatus::Cancelled), seats_booked: None }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportReason {
    NoShow,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReportCreate {
    pub ride_id: i64,
    pub target_user_id: i64,
    pub reason: ReportReason,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportOutcome {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub new_target_reputation: Option<i32>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MatchInvite {
    pub ride_id: i64,
    pub request_id: i64,
    pub target_user_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentPreference {
    pub init_point: String,
    #[serde(default)]
    pub preference_id: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RideCancellation {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub penalty_applied: bool,
    #[serde(default)]
    pub new_reputation: Option<i32>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReviewCreate {
    pub booking_id: i64,
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ReviewCreate {
    pub fn new(booking_id: i64, rating: u8, comment: Option<String>) -> CoreResult<Self> {
        if !(1..=5).contains(&rating) {
            return Err(CoreError::ValidationError("rating must be between 1 and 5".to_string()));
        }
        Ok(Self { booking_id, rating, comment })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: i64,
    pub reviewer_name: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

// ============================================================================
// Geocoding
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaceSuggestion {
    pub label: String,
    pub value: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReversePlace {
    pub display_name: String,
    #[serde(default)]
    pub address: serde_json::Value,
    pub lat: f64,
    pub lng: f64,
}

// ============================================================================
// Admin
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminStats {
    pub total_users: i64,
    pub total_rides: i64,
    pub active_rides: i64,
    pub total_bookings: i64,
    #[serde(default)]
    pub users_preview: Vec<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: i64,
    pub action: String,
    #[serde(default)]
    pub details: serde_json::Value,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Approved,
    Rejected,
}

/// Body of an admin identity-verification decision.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct VerificationDecision {
    pub status: VerificationStatus,
}

/// `skip`/`limit` paging used by every admin listing.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Page {
    pub skip: u32,
    pub limit: u32,
}

impl Page {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { skip: page * limit, limit }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { skip: 0, limit: 50 }
    }
}
