#![allow(dead_code)]

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Extension, Json, Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use yoviajo_client::{ApiClient, FileSessionStore, SessionManager};

const SECRET: &str = "test-secret";

pub const PASSENGER_DNI: &str = "30111222";
pub const DRIVER_DNI: &str = "20999888";
pub const SHARED_DNI: &str = "27000111";
pub const PASSWORD: &str = "secret123";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub id: i64,
    pub role: String,
    pub exp: usize,
}

#[derive(Default)]
pub struct Backend {
    hits: Mutex<HashMap<&'static str, usize>>,
    pub fail_requests: AtomicBool,
    pub revoke_tokens: AtomicBool,
    pub missing_request_ids: AtomicUsize,
    reports: Mutex<Vec<Value>>,
}

impl Backend {
    fn hit(&self, route: &'static str) {
        if let Ok(mut hits) = self.hits.lock() {
            *hits.entry(route).or_default() += 1;
        }
    }

    pub fn hits(&self, route: &'static str) -> usize {
        self.hits.lock().map(|h| h.get(route).copied().unwrap_or(0)).unwrap_or(0)
    }

    pub fn reports(&self) -> Vec<Value> {
        self.reports.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

pub struct TestServer {
    pub base_url: String,
    pub backend: Arc<Backend>,
}

pub async fn spawn_backend() -> TestServer {
    let backend = Arc::new(Backend::default());

    let protected = Router::new()
        .route("/users/me", get(me))
        .route("/rides", post(publish_ride))
        .route("/rides/me", get(my_rides))
        .route("/rides/{id}", delete(cancel_ride))
        .route("/requests", post(publish_request))
        .route("/requests/me", get(my_requests))
        .route("/requests/{id}", delete(delete_request))
        .route("/matches", get(matches))
        .route("/matches/invite", post(invite))
        .route("/bookings", post(create_booking))
        .route("/bookings/me", get(my_bookings))
        .route("/bookings/ride/{id}", get(ride_bookings))
        .route("/bookings/{id}", patch(update_booking))
        .route("/payments/create_preference/{id}", post(create_preference))
        .route("/reports", post(create_report))
        .route("/admin/stats", get(admin_stats))
        .route_layer(middleware::from_fn_with_state(backend.clone(), bearer_auth));

    let public = Router::new()
        .route("/login", post(login))
        .route("/rides", get(rides))
        .route("/requests", get(requests));

    let app = Router::new()
        .nest("/api", public.merge(protected))
        .layer(middleware::from_fn_with_state(backend.clone(), require_request_id))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer { base_url: format!("http://{}/api", addr), backend }
}

pub async fn client_with_store(base_url: &str, session_path: PathBuf) -> ApiClient {
    let session = SessionManager::restore(Box::new(FileSessionStore::new(session_path))).await;
    ApiClient::new(base_url, std::time::Duration::from_secs(5), Arc::new(session)).unwrap()
}

// ============================================================================
// Middleware
// ============================================================================

async fn require_request_id(State(backend): State<Arc<Backend>>, req: Request, next: Next) -> Response {
    if req.headers().get("x-request-id").is_none() {
        backend.missing_request_ids.fetch_add(1, Ordering::SeqCst);
    }
    next.run(req).await
}

async fn bearer_auth(State(backend): State<Arc<Backend>>, mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if backend.revoke_tokens.load(Ordering::SeqCst) {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let data = decode::<Claims>(token, &DecodingKey::from_secret(SECRET.as_bytes()), &Validation::default())
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    req.extensions_mut().insert(data.claims);
    Ok(next.run(req).await)
}

// ============================================================================
// Fixtures
// ============================================================================

fn user_json(id: i64, dni: &str, role: &str) -> Value {
    json!({"id": id, "name": format!("user-{}", id), "dni": dni, "role": role, "reputation_score": 100})
}

fn ride_json(id: i64, hours_ahead: i64) -> Value {
    json!({
        "id": id,
        "origin": "Mendoza",
        "destination": "San Juan",
        "departure_time": (Utc::now() + Duration::hours(hours_ahead)).naive_utc().format("%Y-%m-%dT%H:%M:%S").to_string(),
        "price": 17500,
        "available_seats": 3,
        "driver_id": 10,
        "status": "active",
        "bookings_count": 1
    })
}

fn request_json(id: i64) -> Value {
    json!({
        "id": id, "passenger_id": 20, "origin": "Mendoza", "destination": "San Juan",
        "date": (Utc::now() + Duration::days(3)).format("%Y-%m-%d").to_string()
    })
}

/// Same shape as the real `/bookings` responses: flattened ride fields and
/// `driver_name`, but no driver id.
pub fn booking_json(id: i64, ride_id: i64, status: &str, hours_ahead: i64) -> Value {
    json!({
        "id": id, "ride_id": ride_id, "passenger_id": 20, "seats_booked": 1,
        "status": status, "payment_status": "pending", "fee_amount": 175.0,
        "ride_origin": "Mendoza", "ride_destination": "San Juan",
        "ride_departure_time": (Utc::now() + Duration::hours(hours_ahead)).naive_utc().format("%Y-%m-%dT%H:%M:%S").to_string(),
        "ride_price": 17500.0,
        "driver_name": "user-10"
    })
}

fn issue(id: i64, dni: &str, role: &str) -> String {
    let claims = Claims {
        sub: dni.to_string(),
        id,
        role: role.to_string(),
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"detail": message}))).into_response()
}

// ============================================================================
// Handlers
// ============================================================================

async fn login(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Response {
    backend.hit("login");
    let dni = body["dni"].as_str().unwrap_or_default();
    let role = body["role"].as_str();

    if body["password"].as_str() != Some(PASSWORD) {
        return detail(StatusCode::UNAUTHORIZED, "Contraseña incorrecta");
    }

    let (id, role) = match (dni, role) {
        (PASSENGER_DNI, _) => (20, "P"),
        (DRIVER_DNI, _) => (10, "C"),
        (SHARED_DNI, None) => {
            return (
                StatusCode::MULTIPLE_CHOICES,
                Json(json!({
                    "detail": "Múltiples roles detectados",
                    "roles_available": [{"role": "C", "label": "Conductor"}, {"role": "P", "label": "Pasajero"}]
                })),
            )
                .into_response()
        }
        (SHARED_DNI, Some("C")) => (11, "C"),
        (SHARED_DNI, Some(_)) => (21, "P"),
        _ => return detail(StatusCode::UNAUTHORIZED, "Credenciales incorrectas (DNI no encontrado)"),
    };

    Json(json!({
        "access_token": issue(id, dni, role),
        "token_type": "bearer",
        "user": user_json(id, dni, role)
    }))
    .into_response()
}

async fn me(Extension(claims): Extension<Claims>) -> Json<Value> {
    Json(user_json(claims.id, &claims.sub, &claims.role))
}

async fn rides(State(backend): State<Arc<Backend>>) -> Json<Value> {
    backend.hit("rides");
    // Past rides stay listed.
    Json(json!([ride_json(1, 72), ride_json(2, 10), ride_json(4, -2)]))
}

async fn requests(State(backend): State<Arc<Backend>>) -> Response {
    backend.hit("requests");
    if backend.fail_requests.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    Json(json!([request_json(3)])).into_response()
}

async fn matches(State(backend): State<Arc<Backend>>, Extension(claims): Extension<Claims>) -> Json<Value> {
    backend.hit("matches");
    let kind = if claims.role == "C" { "PASSENGER_FOUND" } else { "RIDE_FOUND" };
    Json(json!([{
        "type": kind,
        "match_score": 95,
        "ride_id": 1,
        "request_id": 3,
        "candidate_user": {"id": 20, "name": "Eva", "age": 30, "reputation": 100, "photo": null},
        "details": {"origin": "Mendoza", "destination": "San Juan", "price": 17500}
    }]))
}

async fn my_rides(State(backend): State<Arc<Backend>>) -> Json<Value> {
    backend.hit("rides/me");
    Json(json!([ride_json(1, 72)]))
}

async fn my_requests(State(backend): State<Arc<Backend>>) -> Json<Value> {
    backend.hit("requests/me");
    Json(json!([request_json(3)]))
}

async fn my_bookings(State(backend): State<Arc<Backend>>) -> Json<Value> {
    backend.hit("bookings/me");
    Json(json!([booking_json(5, 1, "confirmed", 10)]))
}

async fn ride_bookings(Path(ride_id): Path<i64>) -> Json<Value> {
    Json(json!([booking_json(5, ride_id, "confirmed", 10), booking_json(6, ride_id, "cancelled", 10)]))
}

async fn create_booking(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Response {
    backend.hit("bookings");
    let ride_id = body["ride_id"].as_i64().unwrap_or_default();
    if ride_id != 1 && ride_id != 2 && ride_id != 4 {
        return detail(StatusCode::NOT_FOUND, "Viaje no encontrado");
    }
    (StatusCode::CREATED, Json(booking_json(7, ride_id, "awaiting_payment", 10))).into_response()
}

async fn update_booking(State(backend): State<Arc<Backend>>, Path(id): Path<i64>, Json(body): Json<Value>) -> Json<Value> {
    backend.hit("bookings/{id}");
    let status = body["status"].as_str().unwrap_or("confirmed");
    Json(booking_json(id, 1, status, 10))
}

async fn create_preference(Path(id): Path<i64>) -> Json<Value> {
    Json(json!({
        "init_point": format!("https://pay.example/checkout/{}", id),
        "preference_id": format!("pref-{}", id),
        "amount": 1750.0
    }))
}

async fn cancel_ride(Path(_id): Path<i64>) -> Json<Value> {
    Json(json!({"message": "Viaje cancelado", "penalty_applied": true, "new_reputation": 80}))
}

async fn admin_stats(State(backend): State<Arc<Backend>>) -> Json<Value> {
    backend.hit("admin/stats");
    Json(json!({"total_users": 12, "total_rides": 4, "active_rides": 3, "total_bookings": 9, "users_preview": []}))
}

async fn publish_ride(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Response {
    backend.hit("publish ride");
    let mut ride = ride_json(8, 48);
    ride["origin"] = body["origin"].clone();
    ride["destination"] = body["destination"].clone();
    (StatusCode::CREATED, Json(ride)).into_response()
}

async fn publish_request(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Response {
    backend.hit("publish request");
    let mut request = request_json(9);
    request["origin"] = body["origin"].clone();
    request["destination"] = body["destination"].clone();
    (StatusCode::CREATED, Json(request)).into_response()
}

async fn delete_request(State(backend): State<Arc<Backend>>, Path(_id): Path<i64>) -> StatusCode {
    backend.hit("delete request");
    StatusCode::NO_CONTENT
}

async fn invite(State(backend): State<Arc<Backend>>, Json(_body): Json<Value>) -> Json<Value> {
    backend.hit("matches/invite");
    Json(json!({"message": "Invitación enviada"}))
}

async fn create_report(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Response {
    backend.hit("reports");
    if body["target_user_id"].as_i64().is_none() {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "target_user_id requerido");
    }
    if let Ok(mut reports) = backend.reports.lock() {
        reports.push(body);
    }
    Json(json!({"message": "Reporte registrado", "new_target_reputation": 80})).into_response()
}
