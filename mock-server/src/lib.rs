//! In-memory mock of the SnapCar public API.
//!
//! # Design
//! One `Store` behind `Arc<RwLock<..>>` holds the rider, every booking and
//! the outstanding quotes. Every route requires the `token` query parameter.
//! Dispatch is simulated on refresh: an on-demand booking answers `pending`
//! for `polls_before_dispatch` refreshes, then a driver is assigned.
//! Scheduled bookings stay `pending`.

pub mod model;

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{info, warn};

use model::{
    Booking, CancellationFee, ConfirmPrice, CreateBooking, EtaResult, Location, Quote, Rider,
    ServiceClass, SpecialArea, Trip, TripParams,
};

/// Token accepted when none is configured.
pub const DEFAULT_TOKEN: &str = "mock-token";

const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Clone, Debug)]
pub struct MockSettings {
    pub token: String,
    /// Refreshes answered `pending` before an on-demand booking is dispatched.
    pub polls_before_dispatch: u32,
    pub quote_ttl: Duration,
    /// Completed bookings seeded into the history.
    pub history_size: u32,
}

impl Default for MockSettings {
    fn default() -> Self {
        Self {
            token: DEFAULT_TOKEN.to_string(),
            polls_before_dispatch: 2,
            quote_ttl: Duration::minutes(10),
            history_size: 25,
        }
    }
}

impl MockSettings {
    /// Read `SNAPCAR_TOKEN` and `MOCK_POLLS_BEFORE_DISPATCH`.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Ok(token) = std::env::var("SNAPCAR_TOKEN") {
            settings.token = token;
        }
        if let Ok(polls) = std::env::var("MOCK_POLLS_BEFORE_DISPATCH") {
            match polls.parse() {
                Ok(polls) => settings.polls_before_dispatch = polls,
                Err(_) => warn!(value = %polls, "ignoring invalid MOCK_POLLS_BEFORE_DISPATCH"),
            }
        }
        settings
    }
}

struct QuoteRecord {
    quote: Quote,
    service_class: ServiceClass,
    trip: Trip,
}

struct Store {
    rider: Rider,
    bookings: HashMap<String, Booking>,
    quotes: HashMap<String, QuoteRecord>,
}

impl Store {
    fn new(settings: &MockSettings) -> Self {
        let rider = model::rider();
        let bookings = model::past_bookings(&rider, settings.history_size)
            .into_iter()
            .map(|b| (b.id.clone(), b))
            .collect();
        Self {
            rider,
            bookings,
            quotes: HashMap::new(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    settings: Arc<MockSettings>,
    store: Arc<RwLock<Store>>,
}

pub fn app() -> Router {
    app_with(MockSettings::default())
}

pub fn app_with(settings: MockSettings) -> Router {
    let state = AppState {
        store: Arc::new(RwLock::new(Store::new(&settings))),
        settings: Arc::new(settings),
    };
    Router::new()
        .route("/info/eta", get(eta))
        .route("/info/service_classes", get(service_classes))
        .route("/info/meeting_points", get(meeting_points))
        .route("/users/me", get(me))
        .route("/bookings", get(active_bookings).post(create_booking))
        .route("/bookings/history", get(history))
        .route("/bookings/prices", post(flat_prices))
        .route("/bookings/prices/{id}/confirm", post(confirm_price))
        .route("/bookings/{id}", get(get_booking))
        .route("/bookings/{id}/cancel", post(cancel_booking))
        .route("/bookings/{id}/cancellation_price", get(cancellation_price))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, MockSettings::default()).await
}

pub async fn run_with(listener: TcpListener, settings: MockSettings) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(settings)).await
}

// --- errors ---

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

/// Error answered as `{code, message, details?}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: &'static str,
    details: Option<Value>,
}

impl ApiError {
    fn new(status: StatusCode, message: &'static str) -> Self {
        Self {
            status,
            message,
            details: None,
        }
    }

    fn invalid_parameters(fields: Vec<&'static str>) -> Self {
        Self {
            details: Some(Value::from(fields)),
            ..Self::new(StatusCode::UNPROCESSABLE_ENTITY, "invalid_parameters")
        }
    }

    fn booking_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "booking_not_found")
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            details: Some(Value::from(rejection.body_text())),
            ..Self::new(StatusCode::UNPROCESSABLE_ENTITY, "invalid_parameters")
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.status.as_u16(),
            message: self.message,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

// --- auth ---

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Proof that the request carried the configured token.
pub struct Authenticated;

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = Query::<TokenQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(q)| q.token);
        match token {
            Some(token) if token == state.settings.token => Ok(Authenticated),
            _ => {
                warn!(path = parts.uri.path(), "rejected request with invalid token");
                Err(ApiError::new(StatusCode::UNAUTHORIZED, "invalid_token"))
            }
        }
    }
}

// --- validation ---

/// Names of the invalid request fields, in the order they were checked.
#[derive(Default)]
struct Invalid(Vec<&'static str>);

impl Invalid {
    fn check<T>(&mut self, field: &'static str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.0.push(field);
        }
        value
    }

    fn into_error(self) -> ApiError {
        ApiError::invalid_parameters(self.0)
    }
}

fn check_trip(
    invalid: &mut Invalid,
    params: &TripParams,
    rider: &Rider,
    require_end: bool,
) -> Option<Trip> {
    let rider_id = invalid.check(
        "rider_id",
        params.rider_id.as_deref().filter(|id| *id == rider.id),
    );
    let start = invalid.check(
        "start_location",
        params.start_location.clone().filter(Location::is_complete),
    );
    let end = match &params.end_location {
        Some(end) => invalid
            .check("end_location", Some(end.clone()).filter(Location::is_complete))
            .map(Some),
        None if require_end => invalid.check("end_location", None),
        None => Some(None),
    };
    let now = Utc::now().timestamp();
    let date = match params.date {
        Some(date) if date <= now => invalid.check("date", None),
        date => Some(date),
    };
    rider_id?;
    Some(Trip {
        start: start?,
        end: end?,
        planned_start_date: date?,
        nameboard: params.nameboard.unwrap_or(0) != 0,
    })
}

fn check_meeting_point(
    invalid: &mut Invalid,
    id: Option<&str>,
) -> Option<Option<model::MeetingPoint>> {
    match id {
        Some(id) => invalid
            .check("meeting_point_id", model::find_meeting_point(id))
            .map(Some),
        None => Some(None),
    }
}

// --- info ---

#[derive(Deserialize)]
struct Coordinates {
    lat: Option<f64>,
    lng: Option<f64>,
}

impl Coordinates {
    fn require(&self) -> Result<(f64, f64), ApiError> {
        let mut invalid = Invalid::default();
        let lat = invalid.check("lat", self.lat);
        let lng = invalid.check("lng", self.lng);
        lat.zip(lng).ok_or_else(|| invalid.into_error())
    }
}

async fn eta(
    _: Authenticated,
    Query(position): Query<Coordinates>,
) -> Result<Json<Vec<EtaResult>>, ApiError> {
    position.require()?;
    Ok(Json(model::etas()))
}

async fn service_classes(
    _: Authenticated,
    Query(position): Query<Coordinates>,
) -> Result<Json<Vec<ServiceClass>>, ApiError> {
    position.require()?;
    Ok(Json(model::service_classes()))
}

async fn meeting_points(
    _: Authenticated,
    Query(position): Query<Coordinates>,
) -> Result<Json<SpecialArea>, ApiError> {
    let (lat, lng) = position.require()?;
    model::special_area_at(lat, lng)
        .map(Json)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "no_special_area"))
}

async fn me(_: Authenticated, State(state): State<AppState>) -> Json<Rider> {
    Json(state.store.read().await.rider.clone())
}

// --- bookings ---

async fn active_bookings(_: Authenticated, State(state): State<AppState>) -> Json<Vec<Booking>> {
    let store = state.store.read().await;
    let mut active: Vec<Booking> = store
        .bookings
        .values()
        .filter(|b| b.status.is_active())
        .cloned()
        .collect();
    active.sort_by_key(|b| b.creation_date);
    Json(active)
}

#[derive(Deserialize)]
struct Page {
    offset: Option<usize>,
    limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryPage {
    pub total: usize,
    pub offset: usize,
    pub count: usize,
    pub history: Vec<Booking>,
}

async fn history(
    _: Authenticated,
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> Json<HistoryPage> {
    let store = state.store.read().await;
    let mut past: Vec<&Booking> = store
        .bookings
        .values()
        .filter(|b| !b.status.is_active())
        .collect();
    past.sort_by_key(|b| std::cmp::Reverse(b.creation_date));

    let offset = page.offset.unwrap_or(0);
    let limit = page.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let history: Vec<Booking> = past.iter().skip(offset).take(limit).map(|b| (*b).clone()).collect();
    Json(HistoryPage {
        total: past.len(),
        offset,
        count: history.len(),
        history,
    })
}

async fn get_booking(
    _: Authenticated,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Booking>, ApiError> {
    let mut store = state.store.write().await;
    let booking = store.bookings.get_mut(&id).ok_or_else(ApiError::booking_not_found)?;
    if booking.status == model::BookingStatus::Pending && booking.planned_start_date.is_none() {
        booking.refreshes += 1;
        if booking.refreshes > state.settings.polls_before_dispatch {
            booking.dispatch();
            info!(booking_id = %booking.id, "driver dispatched");
        }
    }
    Ok(Json(booking.clone()))
}

async fn create_booking(
    _: Authenticated,
    State(state): State<AppState>,
    payload: Result<Json<CreateBooking>, JsonRejection>,
) -> Result<(StatusCode, Json<Booking>), ApiError> {
    let Json(input) = payload?;
    let mut store = state.store.write().await;

    let mut invalid = Invalid::default();
    let trip = check_trip(&mut invalid, &input.trip, &store.rider, false);
    let service_class = invalid.check(
        "service_class_id",
        input.service_class_id.as_deref().and_then(model::service_class),
    );
    let meeting_point = check_meeting_point(&mut invalid, input.meeting_point_id.as_deref());
    let (Some(trip), Some(service_class), Some(meeting_point)) = (trip, service_class, meeting_point)
    else {
        return Err(invalid.into_error());
    };

    let booking = Booking::new(
        store.rider.clone(),
        service_class,
        trip,
        input.driver_info,
        meeting_point,
    );
    info!(booking_id = %booking.id, scheduled = booking.planned_start_date.is_some(), "booking created");
    store.bookings.insert(booking.id.clone(), booking.clone());
    Ok((StatusCode::CREATED, Json(booking)))
}

async fn flat_prices(
    _: Authenticated,
    State(state): State<AppState>,
    payload: Result<Json<TripParams>, JsonRejection>,
) -> Result<Json<Vec<Quote>>, ApiError> {
    let Json(params) = payload?;
    let mut store = state.store.write().await;

    let mut invalid = Invalid::default();
    let Some(trip) = check_trip(&mut invalid, &params, &store.rider, true) else {
        return Err(invalid.into_error());
    };

    let quotes = model::quotes(&trip, state.settings.quote_ttl);
    let response = quotes.iter().map(|(quote, _)| quote.clone()).collect();
    for (quote, service_class) in quotes {
        let record = QuoteRecord {
            quote,
            service_class,
            trip: trip.clone(),
        };
        store.quotes.insert(record.quote.id.clone(), record);
    }
    Ok(Json(response))
}

async fn confirm_price(
    _: Authenticated,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ConfirmPrice>, JsonRejection>,
) -> Result<(StatusCode, Json<Booking>), ApiError> {
    let Json(input) = payload?;
    let mut store = state.store.write().await;

    let expired = {
        let record = store
            .quotes
            .get(&id)
            .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "price_not_found"))?;
        record.quote.expiry_date <= Utc::now().timestamp()
    };
    if expired {
        store.quotes.remove(&id);
        return Err(ApiError::new(StatusCode::GONE, "price_expired"));
    }

    let mut invalid = Invalid::default();
    let Some(meeting_point) = check_meeting_point(&mut invalid, input.meeting_point_id.as_deref())
    else {
        return Err(invalid.into_error());
    };

    let Some(record) = store.quotes.remove(&id) else {
        return Err(ApiError::new(StatusCode::NOT_FOUND, "price_not_found"));
    };
    let mut booking = Booking::new(
        store.rider.clone(),
        record.service_class,
        record.trip,
        input.driver_info,
        meeting_point,
    );
    booking.booking_price = Some(record.quote);
    info!(booking_id = %booking.id, price_id = %id, "quote confirmed");
    store.bookings.insert(booking.id.clone(), booking.clone());
    Ok((StatusCode::CREATED, Json(booking)))
}

async fn cancel_booking(
    _: Authenticated,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Booking>, ApiError> {
    let mut store = state.store.write().await;
    let booking = store.bookings.get_mut(&id).ok_or_else(ApiError::booking_not_found)?;
    if !booking.status.is_cancellable() {
        return Err(ApiError::new(StatusCode::CONFLICT, "booking_not_cancellable"));
    }
    booking.cancel();
    info!(booking_id = %booking.id, reason = ?booking.cancellation_reason, "booking cancelled");
    Ok(Json(booking.clone()))
}

async fn cancellation_price(
    _: Authenticated,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CancellationFee>, ApiError> {
    let store = state.store.read().await;
    let booking = store.bookings.get(&id).ok_or_else(ApiError::booking_not_found)?;
    if !booking.status.is_cancellable() {
        return Err(ApiError::new(StatusCode::CONFLICT, "booking_not_cancellable"));
    }
    Ok(Json(booking.cancellation_fee()))
}
