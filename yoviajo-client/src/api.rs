use reqwest::{multipart, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;
use yoviajo_core::payloads::{
    Acknowledgement, AdminStats, AuditLogEntry, BookingUpdate, Credentials, LoginResponse, MatchInvite, NewBooking,
    NewRide, NewRideRequest, Page, PaymentPreference, PlaceSuggestion, ProfileUpdate, Registration, ReportCreate,
    ReportOutcome, ReversePlace, Review, ReviewCreate, RideCancellation, RoleChoice, VerificationDecision,
};
use yoviajo_core::{Booking, Match, Ride, RideRequest, User};
use yoviajo_shared::{LogoutReason, Masked};

use crate::config::Config;
use crate::error::{ClientError, ClientResult};
use crate::session::SessionManager;

/// Autocomplete queries shorter than this never reach the backend.
pub const MIN_AUTOCOMPLETE_CHARS: usize = 3;

/// Result of `POST /login`.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    LoggedIn(User),
    /// The DNI owns several accounts; retry with one of these roles.
    RoleChoice(RoleChoice),
}

/// A file to upload as the `file` multipart field.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionManager>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, session: Arc<SessionManager>) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url, session })
    }

    pub fn from_config(config: &Config, session: Arc<SessionManager>) -> ClientResult<Self> {
        Self::new(config.api_url(), config.timeout(), session)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// Send with the session's bearer attached. A 401 on a request that
    /// carried a credential ends the session before the error is returned.
    async fn send(&self, method: Method, path: &str, build: impl FnOnce(RequestBuilder) -> RequestBuilder) -> ClientResult<Response> {
        let request_id = Uuid::new_v4();
        let token = self.session.token().await;

        let mut req = self.http.request(method.clone(), self.url(path)).header("x-request-id", request_id.to_string());
        if let Some(token) = &token {
            req = req.bearer_auth(token.expose());
        }
        let req = build(req);

        debug!(%request_id, "{} {}", method, path);
        let resp = req.send().await?;
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED && token.is_some() {
            warn!(%request_id, "{} {} answered 401, ending session", method, path);
            if let Err(e) = self.session.logout(LogoutReason::Unauthorized).await {
                warn!("Failed to clear session after 401: {}", e);
            }
            return Err(ClientError::Unauthorized);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::from_status(status, &body));
        }
        Ok(resp)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        Ok(self.send(Method::GET, path, |r| r).await?.json().await?)
    }

    async fn get_query<T: DeserializeOwned, Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> ClientResult<T> {
        Ok(self.send(Method::GET, path, |r| r.query(query)).await?.json().await?)
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> ClientResult<T> {
        Ok(self.send(Method::POST, path, |r| r.json(body)).await?.json().await?)
    }

    async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> ClientResult<T> {
        Ok(self.send(Method::PATCH, path, |r| r.json(body)).await?.json().await?)
    }

    async fn post_file<T: DeserializeOwned>(&self, path: &str, upload: Upload) -> ClientResult<T> {
        let part = multipart::Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.mime)
            .map_err(|e| ClientError::Invalid(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);
        Ok(self.send(Method::POST, path, |r| r.multipart(form)).await?.json().await?)
    }

    async fn ensure_session(&self) -> ClientResult<()> {
        if self.session.is_authenticated().await {
            Ok(())
        } else {
            Err(ClientError::NotAuthenticated)
        }
    }

    // ========================================================================
    // Auth & profile
    // ========================================================================

    pub async fn register(&self, form: &Registration) -> ClientResult<User> {
        form.validate()?;
        let user: User = self.post("/register", form).await?;
        info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Log in and store the session on success.
    ///
    /// Credential failures come back as `Rejected`, never `Unauthorized`:
    /// there is no session to drop yet.
    pub async fn login(&self, credentials: &Credentials) -> ClientResult<LoginOutcome> {
        let resp = self
            .http
            .post(self.url("/login"))
            .header("x-request-id", Uuid::new_v4().to_string())
            .json(credentials)
            .send()
            .await?;

        match resp.status() {
            StatusCode::MULTIPLE_CHOICES => {
                let choice: RoleChoice = resp.json().await?;
                info!("DNI has {} accounts, role choice required", choice.roles_available.len());
                Ok(LoginOutcome::RoleChoice(choice))
            }
            status if status.is_success() => {
                let body: LoginResponse = resp.json().await?;
                self.session.login(Masked::new(body.access_token), body.user.clone()).await?;
                Ok(LoginOutcome::LoggedIn(body.user))
            }
            status if status.is_client_error() => {
                let body = resp.text().await.unwrap_or_default();
                Err(ClientError::rejected(status, &body))
            }
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(ClientError::from_status(status, &body))
            }
        }
    }

    pub async fn logout(&self) -> ClientResult<()> {
        self.session.logout(LogoutReason::UserRequested).await
    }

    pub async fn me(&self) -> ClientResult<User> {
        self.ensure_session().await?;
        let user: User = self.get("/users/me").await?;
        self.session.update_user(user.clone()).await?;
        Ok(user)
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> ClientResult<User> {
        self.ensure_session().await?;
        let user: User = self.patch("/users/me", update).await?;
        self.session.update_user(user.clone()).await?;
        info!("Profile updated for user {}", user.id);
        Ok(user)
    }

    pub async fn upload_photo(&self, upload: Upload) -> ClientResult<User> {
        self.ensure_session().await?;
        let user: User = self.post_file("/users/me/photo", upload).await?;
        self.session.update_user(user.clone()).await?;
        Ok(user)
    }

    /// Submit an identity document for review.
    pub async fn submit_verification(&self, document: Upload) -> ClientResult<Acknowledgement> {
        self.ensure_session().await?;
        self.post_file("/users/verify", document).await
    }

    // ========================================================================
    // Rides & requests
    // ========================================================================

    pub async fn list_rides(&self) -> ClientResult<Vec<Ride>> {
        self.get("/rides").await
    }

    pub async fn my_rides(&self) -> ClientResult<Vec<Ride>> {
        self.ensure_session().await?;
        self.get("/rides/me").await
    }

    pub async fn publish_ride(&self, ride: &NewRide) -> ClientResult<Ride> {
        self.ensure_session().await?;
        self.post("/rides", ride).await
    }

    pub async fn cancel_ride(&self, ride_id: i64) -> ClientResult<RideCancellation> {
        self.ensure_session().await?;
        Ok(self.send(Method::DELETE, &format!("/rides/{}", ride_id), |r| r).await?.json().await?)
    }

    pub async fn list_requests(&self) -> ClientResult<Vec<RideRequest>> {
        self.get("/requests").await
    }

    pub async fn my_requests(&self) -> ClientResult<Vec<RideRequest>> {
        self.ensure_session().await?;
        self.get("/requests/me").await
    }

    pub async fn publish_request(&self, request: &NewRideRequest) -> ClientResult<RideRequest> {
        self.ensure_session().await?;
        self.post("/requests", request).await
    }

    /// Answers 204 with no body.
    pub async fn delete_request(&self, request_id: i64) -> ClientResult<()> {
        self.ensure_session().await?;
        self.send(Method::DELETE, &format!("/requests/{}", request_id), |r| r).await?;
        Ok(())
    }

    // ========================================================================
    // Matches
    // ========================================================================

    pub async fn list_matches(&self) -> ClientResult<Vec<Match>> {
        self.ensure_session().await?;
        self.get("/matches").await
    }

    pub async fn send_invite(&self, invite: &MatchInvite) -> ClientResult<Acknowledgement> {
        self.ensure_session().await?;
        self.post("/matches/invite", invite).await
    }

    // ========================================================================
    // Bookings, payments, reports, reviews
    // ========================================================================

    pub async fn create_booking(&self, booking: &NewBooking) -> ClientResult<Booking> {
        self.ensure_session().await?;
        self.post("/bookings", booking).await
    }

    pub async fn my_bookings(&self) -> ClientResult<Vec<Booking>> {
        self.ensure_session().await?;
        self.get("/bookings/me").await
    }

    pub async fn ride_bookings(&self, ride_id: i64) -> ClientResult<Vec<Booking>> {
        self.ensure_session().await?;
        self.get(&format!("/bookings/ride/{}", ride_id)).await
    }

    pub async fn update_booking(&self, booking_id: i64, update: &BookingUpdate) -> ClientResult<Booking> {
        self.ensure_session().await?;
        self.patch(&format!("/bookings/{}", booking_id), update).await
    }

    pub async fn create_payment_preference(&self, booking_id: i64) -> ClientResult<PaymentPreference> {
        self.ensure_session().await?;
        self.post(&format!("/payments/create_preference/{}", booking_id), &serde_json::json!({})).await
    }

    pub async fn create_report(&self, report: &ReportCreate) -> ClientResult<ReportOutcome> {
        self.ensure_session().await?;
        self.post("/reports", report).await
    }

    pub async fn create_review(&self, review: &ReviewCreate) -> ClientResult<Review> {
        self.ensure_session().await?;
        self.post("/reviews/", review).await
    }

    pub async fn user_reviews(&self, user_id: i64) -> ClientResult<Vec<Review>> {
        self.get(&format!("/reviews/user/{}", user_id)).await
    }

    // ========================================================================
    // Geocoding
    // ========================================================================

    pub async fn autocomplete(&self, query: &str) -> ClientResult<Vec<PlaceSuggestion>> {
        let query = query.trim();
        if query.chars().count() < MIN_AUTOCOMPLETE_CHARS {
            return Ok(Vec::new());
        }
        self.get_query("/geocode/autocomplete", &[("q", query)]).await
    }

    pub async fn reverse_geocode(&self, lat: f64, lng: f64) -> ClientResult<ReversePlace> {
        self.get_query("/geocode/reverse", &[("lat", lat), ("lng", lng)]).await
    }

    // ========================================================================
    // Admin
    // ========================================================================

    pub async fn admin_stats(&self) -> ClientResult<AdminStats> {
        self.ensure_session().await?;
        self.get("/admin/stats").await
    }

    pub async fn admin_users(&self, page: Page) -> ClientResult<Vec<User>> {
        self.ensure_session().await?;
        self.get_query("/admin/users", &page).await
    }

    pub async fn admin_pending_verifications(&self) -> ClientResult<Vec<User>> {
        self.ensure_session().await?;
        self.get_query("/admin/users", &[("verification_status", "pending")]).await
    }

    pub async fn admin_rides(&self, page: Page) -> ClientResult<Vec<Ride>> {
        self.ensure_session().await?;
        self.get_query("/admin/rides", &page).await
    }

    pub async fn admin_bookings(&self, page: Page) -> ClientResult<Vec<Booking>> {
        self.ensure_session().await?;
        self.get_query("/admin/bookings", &page).await
    }

    pub async fn admin_logs(&self, page: Page) -> ClientResult<Vec<AuditLogEntry>> {
        self.ensure_session().await?;
        self.get_query("/admin/logs", &page).await
    }

    pub async fn admin_verify_user(&self, user_id: i64, decision: VerificationDecision) -> ClientResult<Acknowledgement> {
        self.ensure_session().await?;
        self.post(&format!("/admin/users/{}/verify", user_id), &decision).await
    }
}
