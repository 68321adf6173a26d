use chrono::Utc;
use std::future::Future;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use yoviajo_core::{Booking, ListingFilter, Match, Ride, RideRequest};
use yoviajo_shared::{ListingKind, ListingRefreshedEvent};

use crate::api::ApiClient;
use crate::error::ClientResult;

/// Await one list fetch, degrading any failure to an empty list.
pub(crate) async fn guarded<T, F>(kind: ListingKind, fetch: F) -> Vec<T>
where
    F: Future<Output = ClientResult<Vec<T>>>,
{
    match fetch.await {
        Ok(items) => {
            debug!("Loaded {} {:?}", items.len(), kind);
            items
        }
        Err(e) => {
            warn!("Failed to load {:?}, showing empty list: {}", kind, e);
            Vec::new()
        }
    }
}

/// Publish a refresh to whoever listens. Returns the event for callers.
pub(crate) fn announce(
    events: &broadcast::Sender<ListingRefreshedEvent>,
    counts: Vec<(ListingKind, usize)>,
) -> ListingRefreshedEvent {
    let event = ListingRefreshedEvent { counts, at: Utc::now() };
    let _ = events.send(event.clone());
    event
}

// ============================================================================
// Public marketplace
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Listings {
    pub rides: Vec<Ride>,
    pub requests: Vec<RideRequest>,
    pub matches: Vec<Match>,
}

impl Listings {
    pub fn counts(&self) -> Vec<(ListingKind, usize)> {
        vec![
            (ListingKind::Rides, self.rides.len()),
            (ListingKind::Requests, self.requests.len()),
            (ListingKind::Matches, self.matches.len()),
        ]
    }

    /// Rides and requests narrowed by the search box. Matches are untouched.
    pub fn filtered(&self, filter: &ListingFilter) -> Listings {
        if filter.is_empty() {
            return self.clone();
        }
        Listings {
            rides: filter.apply_rides(&self.rides).into_iter().cloned().collect(),
            requests: filter.apply_requests(&self.requests).into_iter().cloned().collect(),
            matches: self.matches.clone(),
        }
    }
}

// ============================================================================
// Personal lists
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct TripLists {
    pub rides: Vec<Ride>,
    pub bookings: Vec<Booking>,
    pub requests: Vec<RideRequest>,
}

impl TripLists {
    pub fn counts(&self) -> Vec<(ListingKind, usize)> {
        vec![
            (ListingKind::MyRides, self.rides.len()),
            (ListingKind::MyBookings, self.bookings.len()),
            (ListingKind::MyRequests, self.requests.len()),
        ]
    }
}

#[derive(Clone)]
pub struct ListingFetcher {
    api: ApiClient,
}

impl ListingFetcher {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Rides, requests and matches fetched concurrently. Matches need a
    /// session and are skipped for anonymous visitors.
    pub async fn marketplace(&self) -> Listings {
        let authenticated = self.api.session().is_authenticated().await;

        let (rides, requests, matches) = tokio::join!(
            guarded(ListingKind::Rides, self.api.list_rides()),
            guarded(ListingKind::Requests, self.api.list_requests()),
            async {
                if authenticated {
                    guarded(ListingKind::Matches, self.api.list_matches()).await
                } else {
                    Vec::new()
                }
            },
        );

        Listings { rides, requests, matches }
    }

    /// Drivers see their published rides; passengers their bookings and requests.
    pub async fn my_trips(&self) -> TripLists {
        let Some(user) = self.api.session().current_user().await else {
            return TripLists::default();
        };

        if user.is_driver() {
            let rides = guarded(ListingKind::MyRides, self.api.my_rides()).await;
            return TripLists { rides, ..Default::default() };
        }

        let (bookings, requests) = tokio::join!(
            guarded(ListingKind::MyBookings, self.api.my_bookings()),
            guarded(ListingKind::MyRequests, self.api.my_requests()),
        );
        TripLists { rides: Vec::new(), bookings, requests }
    }
}
