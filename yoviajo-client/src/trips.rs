use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, RwLock};
use yoviajo_core::{Booking, PenaltyNotice, PenaltyPolicy, Ride};
use yoviajo_shared::ListingRefreshedEvent;

use crate::api::ApiClient;
use crate::dispatcher::Reload;
use crate::error::{ClientError, ClientResult};
use crate::listing::{announce, ListingFetcher, TripLists};
use crate::view::{trip_cards, CardView};

pub struct MyTrips {
    api: ApiClient,
    fetcher: ListingFetcher,
    trips: RwLock<TripLists>,
    events: broadcast::Sender<ListingRefreshedEvent>,
}

impl MyTrips {
    pub fn new(api: ApiClient) -> Self {
        let (events, _) = broadcast::channel(16);
        let fetcher = ListingFetcher::new(api.clone());
        Self { api, fetcher, trips: RwLock::new(TripLists::default()), events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ListingRefreshedEvent> {
        self.events.subscribe()
    }

    pub async fn trips(&self) -> TripLists {
        self.trips.read().await.clone()
    }

    pub async fn cards(&self, now: DateTime<Utc>) -> Vec<CardView> {
        let viewer = self.api.session().viewer().await;
        trip_cards(&*self.trips.read().await, &viewer, now)
    }

    /// Passengers on a ride, without cancelled bookings.
    pub async fn manifest(&self, ride_id: i64) -> ClientResult<Vec<Booking>> {
        let bookings = self.api.ride_bookings(ride_id).await?;
        Ok(bookings.into_iter().filter(|b| !b.is_cancelled()).collect())
    }

    /// Notice for cancelling a ride; only costs reputation if passengers are booked.
    pub async fn ride_cancellation_notice(&self, ride: &Ride, now: DateTime<Utc>) -> ClientResult<PenaltyNotice> {
        let departure = ride
            .departure()
            .ok_or_else(|| ClientError::Invalid(format!("ride {} has no readable departure", ride.id)))?;
        let active = self.manifest(ride.id).await?.len();
        Ok(PenaltyPolicy::evaluate_ride_cancellation(departure, now, active))
    }
}

/// Notice for a passenger cancelling this booking.
pub fn booking_cancellation_notice(booking: &Booking, now: DateTime<Utc>) -> ClientResult<PenaltyNotice> {
    let departure = booking
        .departure()
        .ok_or_else(|| ClientError::Invalid(format!("booking {} has no readable departure", booking.id)))?;
    Ok(PenaltyPolicy::BOOKING_CANCELLATION.evaluate(departure, now))
}

/// Notice shown before reporting the driver of this booking.
pub fn no_show_notice(booking: &Booking, now: DateTime<Utc>) -> ClientResult<PenaltyNotice> {
    let departure = booking
        .departure()
        .ok_or_else(|| ClientError::Invalid(format!("booking {} has no readable departure", booking.id)))?;
    Ok(PenaltyPolicy::NO_SHOW_REPORT.evaluate(departure, now))
}

#[async_trait]
impl Reload for MyTrips {
    async fn reload(&self) -> ListingRefreshedEvent {
        let fresh = self.fetcher.my_trips().await;
        let counts = fresh.counts();
        *self.trips.write().await = fresh;
        announce(&self.events, counts)
    }
}
