use chrono::{DateTime, Utc};

/// Why a session ended.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
    /// The user asked to log out.
    UserRequested,
    /// The backend answered 401 to an authenticated call.
    Unauthorized,
    /// The stored session could not be read back.
    CorruptStorage,
}

/// Identity changes published by the session manager.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    LoggedIn {
        user_id: i64,
        role: String,
        at: DateTime<Utc>,
    },
    LoggedOut {
        reason: LogoutReason,
        at: DateTime<Utc>,
    },
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ListingKind {
    Rides,
    Requests,
    Matches,
    MyRides,
    MyBookings,
    MyRequests,
}

/// Emitted after a full re-fetch, with the size of each list that was reloaded.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct ListingRefreshedEvent {
    pub counts: Vec<(ListingKind, usize)>,
    pub at: DateTime<Utc>,
}
