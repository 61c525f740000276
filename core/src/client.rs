//! Stateless HTTP request builder and response parser for the SnapCar API.
//!
//! # Design
//! `SnapCarClient` holds only its `Config`. Every endpoint is split into a
//! `build_*` method that validates inputs and produces an `HttpRequest`, and a
//! `parse_*` method that consumes the matching `HttpResponse`. Precondition
//! and configuration failures therefore surface from `build_*`, before any
//! I/O. Responses about an existing booking are merged into the caller's
//! `Booking` in place rather than returned as a new value.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::error::{ApiError, Error};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    Booking, BookingHistory, BookingHistoryPayload, BookingPayload, BookingPrice,
    CancellationFee, ConfirmBooking, ConfirmPrice, EtaResult, EtaResultPayload, Locale,
    Localize, LocationParams, Rider, ServiceClass, ServiceClassPayload, SpecialArea,
    SpecialAreaPayload, TripParameters, DEFAULT_HISTORY_LIMIT,
};

const START_LOCATION_MISSING: &str =
    "You must provide a start location including at least: lat, lng, name and city.";
const END_LOCATION_MISSING: &str =
    "You must provide an end location including at least: lat, lng, name and city.";

/// Synchronous, stateless client for the SnapCar public API.
#[derive(Debug, Clone)]
pub struct SnapCarClient {
    config: Config,
}

impl SnapCarClient {
    pub fn new(config: Config) -> Self {
        let config = Config {
            base_domain: config.base_domain.trim_end_matches('/').to_string(),
            ..config
        };
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replace the token used by requests built from now on.
    pub fn set_token(&mut self, token: Option<String>) {
        self.config.token = token;
    }

    pub fn set_locale(&mut self, locale: &str) {
        self.config.locale = locale.to_string();
    }

    fn locale(&self) -> Locale<'_> {
        self.config.text_locale()
    }

    // -----------------------------------------------------------------------
    // Info
    // -----------------------------------------------------------------------

    pub fn build_eta(&self, lat: f64, lng: f64) -> Result<HttpRequest, Error> {
        self.get("/info/eta", coordinates(lat, lng))
    }

    pub fn parse_eta(&self, response: HttpResponse) -> Result<Vec<EtaResult>, Error> {
        let payload: Vec<EtaResultPayload> = decode(response)?;
        Ok(payload.localize(self.locale()))
    }

    pub fn build_service_classes(&self, lat: f64, lng: f64) -> Result<HttpRequest, Error> {
        self.get("/info/service_classes", coordinates(lat, lng))
    }

    pub fn parse_service_classes(&self, response: HttpResponse) -> Result<Vec<ServiceClass>, Error> {
        let payload: Vec<ServiceClassPayload> = decode(response)?;
        Ok(payload.localize(self.locale()))
    }

    pub fn build_meeting_points(&self, lat: f64, lng: f64) -> Result<HttpRequest, Error> {
        self.get("/info/meeting_points", coordinates(lat, lng))
    }

    /// A position outside any special area comes back as a 404 API error.
    pub fn parse_meeting_points(&self, response: HttpResponse) -> Result<SpecialArea, Error> {
        let payload: SpecialAreaPayload = decode(response)?;
        Ok(payload.localize(self.locale()))
    }

    // -----------------------------------------------------------------------
    // Rider and bookings lookup
    // -----------------------------------------------------------------------

    pub fn build_user(&self) -> Result<HttpRequest, Error> {
        self.get("/users/me", Vec::new())
    }

    pub fn parse_user(&self, response: HttpResponse) -> Result<Rider, Error> {
        decode(response)
    }

    pub fn build_active_bookings(&self) -> Result<HttpRequest, Error> {
        self.get("/bookings", Vec::new())
    }

    pub fn parse_active_bookings(&self, response: HttpResponse) -> Result<Vec<Booking>, Error> {
        let payload: Vec<BookingPayload> = decode(response)?;
        Ok(payload.localize(self.locale()))
    }

    pub fn build_bookings_history(
        &self,
        offset: Option<u32>,
        limit: Option<u32>,
    ) -> Result<HttpRequest, Error> {
        let query = vec![
            ("offset".to_string(), offset.unwrap_or(0).to_string()),
            ("limit".to_string(), limit.unwrap_or(DEFAULT_HISTORY_LIMIT).to_string()),
        ];
        self.get("/bookings/history", query)
    }

    /// `limit` is the page size the request was built with.
    pub fn parse_bookings_history(
        &self,
        response: HttpResponse,
        limit: Option<u32>,
    ) -> Result<BookingHistory, Error> {
        let payload: BookingHistoryPayload = decode(response)?;
        Ok(payload.into_history(limit.unwrap_or(DEFAULT_HISTORY_LIMIT), self.locale()))
    }

    /// Request for the page following `history`.
    pub fn build_next_bookings(&self, history: &BookingHistory) -> Result<HttpRequest, Error> {
        let (offset, limit) = history.next_page()?;
        self.build_bookings_history(Some(offset), Some(limit))
    }

    pub fn build_booking(&self, id: &str) -> Result<HttpRequest, Error> {
        self.get(&format!("/bookings/{id}"), Vec::new())
    }

    pub fn parse_booking(&self, response: HttpResponse) -> Result<Booking, Error> {
        let payload: BookingPayload = decode(response)?;
        Ok(payload.localize(self.locale()))
    }

    // -----------------------------------------------------------------------
    // Booking lifecycle
    // -----------------------------------------------------------------------

    /// `POST /bookings` for a fully described intent.
    pub fn build_confirm(&self, intent: &Booking) -> Result<HttpRequest, Error> {
        let trip = trip_parameters(intent, false)?;
        let service_class = intent.service_class.as_ref().ok_or(Error::invalid(
            "service_class_missing",
            "You must provide the required service class for this booking.",
        ))?;
        let body = ConfirmBooking {
            trip,
            driver_info: intent.driver_info.clone(),
            meeting_point_id: intent.meeting_point.as_ref().map(|m| m.id.clone()),
            service_class_id: service_class.id.clone(),
        };
        self.post("/bookings", &body)
    }

    /// `POST /bookings/prices`: one quote per eligible service class.
    pub fn build_flat_prices(&self, intent: &Booking) -> Result<HttpRequest, Error> {
        let trip = trip_parameters(intent, true)?;
        self.post("/bookings/prices", &trip)
    }

    /// Quotes linked back to `intent`.
    pub fn parse_flat_prices(
        &self,
        response: HttpResponse,
        intent: &Booking,
    ) -> Result<Vec<BookingPrice>, Error> {
        let prices: Vec<BookingPrice> = decode(response)?;
        Ok(prices.into_iter().map(|p| p.quoted_for(intent)).collect())
    }

    /// Confirm `price` on behalf of the intent it was quoted for.
    ///
    /// Only `driver_info` and `meeting_point_id` are sent; the trip itself is
    /// already known to the server through the quote.
    pub fn build_confirm_price(
        &self,
        price: &BookingPrice,
        intent: &Booking,
    ) -> Result<HttpRequest, Error> {
        if !price.matches_intent(intent) {
            return Err(Error::invalid(
                "price_booking_mismatch",
                "This price was quoted for another rider or another pickup time.",
            ));
        }
        self.post(
            &format!("/bookings/prices/{}/confirm", price.id),
            &ConfirmPrice::from_booking(intent),
        )
    }

    pub fn build_refresh(&self, booking: &Booking) -> Result<HttpRequest, Error> {
        let id = booking_id(booking)?;
        self.build_booking(id)
    }

    pub fn build_cancel(&self, booking: &Booking) -> Result<HttpRequest, Error> {
        let id = booking_id(booking)?;
        self.post_empty(&format!("/bookings/{id}/cancel"))
    }

    /// The client does not look at the status: outside the cancellable
    /// window the server answers with an error.
    pub fn build_cancellation_price(&self, booking: &Booking) -> Result<HttpRequest, Error> {
        let id = booking_id(booking)?;
        self.get(&format!("/bookings/{id}/cancellation_price"), Vec::new())
    }

    pub fn parse_cancellation_price(&self, response: HttpResponse) -> Result<CancellationFee, Error> {
        decode(response)
    }

    /// Merge a booking response (confirm, price confirm, refresh, cancel)
    /// into `booking`.
    pub fn parse_booking_update(
        &self,
        response: HttpResponse,
        booking: &mut Booking,
    ) -> Result<(), Error> {
        let payload: BookingPayload = decode(response)?;
        booking.apply(payload, self.locale());
        debug!(booking_id = ?booking.id, status = ?booking.status, "booking updated");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Request plumbing
    // -----------------------------------------------------------------------

    fn request(
        &self,
        method: HttpMethod,
        path: &str,
        mut query: Vec<(String, String)>,
        body: Option<String>,
    ) -> Result<HttpRequest, Error> {
        let token = self.config.token.as_deref().ok_or_else(Error::missing_token)?;
        query.push(("token".to_string(), token.to_string()));

        let mut headers = vec![("accept".to_string(), "application/json".to_string())];
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }

        let request = HttpRequest {
            method,
            url: format!("{}{path}", self.config.base_domain),
            query,
            headers,
            body,
        };
        debug!(method = method.as_str(), url = %request.url, "request built");
        Ok(request)
    }

    fn get(&self, path: &str, query: Vec<(String, String)>) -> Result<HttpRequest, Error> {
        self.request(HttpMethod::Get, path, query, None)
    }

    fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<HttpRequest, Error> {
        let body = serde_json::to_string(body).map_err(|e| Error::Serialization(e.to_string()))?;
        self.request(HttpMethod::Post, path, Vec::new(), Some(body))
    }

    fn post_empty(&self, path: &str) -> Result<HttpRequest, Error> {
        self.request(HttpMethod::Post, path, Vec::new(), None)
    }
}

fn coordinates(lat: f64, lng: f64) -> Vec<(String, String)> {
    vec![
        ("lat".to_string(), lat.to_string()),
        ("lng".to_string(), lng.to_string()),
    ]
}

fn booking_id(booking: &Booking) -> Result<&str, Error> {
    booking.id.as_deref().ok_or(Error::invalid(
        "booking_id_missing",
        "This booking has not been confirmed yet and has no identifier.",
    ))
}

/// Validate and serialize the trip shared by confirmation and quotes.
fn trip_parameters(intent: &Booking, require_end: bool) -> Result<TripParameters, Error> {
    let start_location = intent
        .start_location
        .as_ref()
        .and_then(LocationParams::from_location)
        .ok_or(Error::invalid("start_location_missing", START_LOCATION_MISSING))?;

    let end_location = match &intent.end_location {
        Some(location) => Some(
            LocationParams::from_location(location)
                .ok_or(Error::invalid("end_location_missing", END_LOCATION_MISSING))?,
        ),
        None if require_end => {
            return Err(Error::invalid("end_location_missing", END_LOCATION_MISSING));
        }
        None => None,
    };

    let rider = intent
        .rider
        .as_ref()
        .ok_or(Error::invalid("rider_missing", "You must provide a valid rider."))?;

    Ok(TripParameters {
        rider_id: rider.id.clone(),
        start_location,
        end_location,
        nameboard: intent.nameboard.map(u8::from),
        planned_start_date: intent.planned_start_date.map(|d| d.timestamp()),
    })
}

/// Map non-2xx statuses to `Error::Api`, then deserialize the body.
fn decode<T: DeserializeOwned>(response: HttpResponse) -> Result<T, Error> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(|e| Error::Deserialization(e.to_string()))
}

fn check_status(response: &HttpResponse) -> Result<(), Error> {
    if response.is_success() {
        return Ok(());
    }
    Err(Error::Api(ApiError::from_response(response.status, &response.body)))
}
