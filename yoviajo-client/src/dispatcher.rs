use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};
use yoviajo_core::payloads::{
    Acknowledgement, BookingUpdate, MatchInvite, NewBooking, NewRide, NewRideRequest, PaymentPreference, ReportCreate,
    ReportOutcome, ReportReason, Review, ReviewCreate, RideCancellation,
};
use yoviajo_core::{Booking, Ride, RideRequest};
use yoviajo_shared::ListingRefreshedEvent;

use crate::api::ApiClient;
use crate::error::{ClientError, ClientResult};

/// A view that can re-fetch everything it shows.
#[async_trait]
pub trait Reload: Send + Sync {
    async fn reload(&self) -> ListingRefreshedEvent;
}

#[derive(Debug, Clone)]
pub enum Intent {
    Reserve { ride_id: i64, seats: i32 },
    CancelBooking { booking_id: i64 },
    /// Passenger reporting that the driver of a past trip never came.
    ReportAbsence { booking: Booking },
    Invite(MatchInvite),
    PublishRide(NewRide),
    PublishRequest(NewRideRequest),
    CancelRide { ride_id: i64 },
    DeleteRequest { request_id: i64 },
    Review(ReviewCreate),
}

#[derive(Debug)]
pub enum Outcome {
    /// The booking exists even when the payment link could not be created.
    Reserved { booking: Booking, payment: ClientResult<PaymentPreference> },
    BookingCancelled(Booking),
    Reported(ReportOutcome),
    Invited(Acknowledgement),
    RidePublished(Ride),
    RequestPublished(RideRequest),
    RideCancelled(RideCancellation),
    RequestDeleted,
    Reviewed(Review),
}

/// Read-after-write via full reload: once the backend accepts a mutation,
/// the view that issued it re-fetches all of its lists. Nothing is patched
/// locally, and a failed mutation triggers no reload.
#[derive(Clone)]
pub struct ActionDispatcher {
    api: ApiClient,
}

impl ActionDispatcher {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Run the intent, then reload `view` if the backend accepted it.
    pub async fn dispatch(&self, intent: Intent, view: &dyn Reload) -> ClientResult<Outcome> {
        let outcome = self.execute(intent).await?;
        view.reload().await;
        Ok(outcome)
    }

    /// Bookings listed by the backend carry no driver id, so fall back to
    /// the ride listing, which still includes past rides.
    async fn driver_of(&self, booking: &Booking) -> ClientResult<i64> {
        if let Some(driver_id) = booking.driver_id() {
            return Ok(driver_id);
        }
        self.api
            .list_rides()
            .await?
            .into_iter()
            .find(|ride| ride.id == booking.ride_id)
            .map(|ride| ride.driver_id)
            .ok_or_else(|| ClientError::Invalid(format!("ride {} not found, cannot tell who drove it", booking.ride_id)))
    }

    async fn execute(&self, intent: Intent) -> ClientResult<Outcome> {
        match intent {
            Intent::Reserve { ride_id, seats } => {
                let booking = self.api.create_booking(&NewBooking::new(ride_id, seats)?).await?;
                info!("Booking {} created for ride {} ({} seats)", booking.id, ride_id, seats);

                let payment = self.api.create_payment_preference(booking.id).await;
                if let Err(e) = &payment {
                    warn!("Payment preference for booking {} failed: {}", booking.id, e);
                }
                Ok(Outcome::Reserved { booking, payment })
            }

            Intent::CancelBooking { booking_id } => {
                let booking = self.api.update_booking(booking_id, &BookingUpdate::cancel()).await?;
                info!("Booking {} cancelled", booking_id);
                Ok(Outcome::BookingCancelled(booking))
            }

            Intent::ReportAbsence { booking } => {
                if booking.departure().is_some_and(|dep| dep > Utc::now()) {
                    return Err(ClientError::Invalid("a no-show can only be reported after departure".to_string()));
                }
                let target_user_id = self.driver_of(&booking).await?;

                let report = ReportCreate { ride_id: booking.ride_id, target_user_id, reason: ReportReason::NoShow };
                let outcome = self.api.create_report(&report).await?;
                info!("Reported driver {} for ride {}", target_user_id, booking.ride_id);
                Ok(Outcome::Reported(outcome))
            }

            Intent::Invite(invite) => {
                let ack = self.api.send_invite(&invite).await?;
                info!("Invited user {} (ride {}, request {})", invite.target_user_id, invite.ride_id, invite.request_id);
                Ok(Outcome::Invited(ack))
            }

            Intent::PublishRide(ride) => {
                let ride = self.api.publish_ride(&ride).await?;
                info!("Published ride {}", ride.id);
                Ok(Outcome::RidePublished(ride))
            }

            Intent::PublishRequest(request) => {
                let request = self.api.publish_request(&request).await?;
                info!("Published request {}", request.id);
                Ok(Outcome::RequestPublished(request))
            }

            Intent::CancelRide { ride_id } => {
                let cancellation = self.api.cancel_ride(ride_id).await?;
                info!("Ride {} cancelled (penalty applied: {})", ride_id, cancellation.penalty_applied);
                Ok(Outcome::RideCancelled(cancellation))
            }

            Intent::DeleteRequest { request_id } => {
                self.api.delete_request(request_id).await?;
                info!("Request {} deleted", request_id);
                Ok(Outcome::RequestDeleted)
            }

            Intent::Review(review) => {
                let review = self.api.create_review(&review).await?;
                Ok(Outcome::Reviewed(review))
            }
        }
    }
}
