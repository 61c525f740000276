use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::fleet::{BillingDocument, Driver, Vehicle, VehiclePayload};
use super::info::{MeetingPoint, MeetingPointPayload, ServiceClass, ServiceClassPayload};
use super::lenient;
use super::locale::Locale;
use super::location::{Location, TimestampedPoint};
use super::rider::Rider;
use super::Localize;
use crate::error::Error;

/// Page size used by the bookings history when the caller gives none.
pub const DEFAULT_HISTORY_LIMIT: u32 = 20;

/// Server-side booking state.
///
/// ```text
/// pending -> going_to_get -> driver_waiting -> on_board -> complete
///    \            \                \
///     +------------+----------------+--> cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    GoingToGet,
    DriverWaiting,
    OnBoard,
    Complete,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl BookingStatus {
    pub fn is_pending(self) -> bool {
        self == BookingStatus::Pending
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Complete | BookingStatus::Cancelled)
    }

    /// States in which the rider may still cancel (possibly for a fee).
    pub fn is_cancellable(self) -> bool {
        matches!(
            self,
            BookingStatus::Pending | BookingStatus::GoingToGet | BookingStatus::DriverWaiting
        )
    }

    /// Whether the platform may move a booking from `self` to `next`.
    ///
    /// Informational only: the client observes transitions, it never
    /// enforces them.
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, GoingToGet)
                | (Pending, Cancelled)
                | (GoingToGet, DriverWaiting)
                | (GoingToGet, Cancelled)
                | (DriverWaiting, OnBoard)
                | (DriverWaiting, Cancelled)
                | (OnBoard, Complete)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationReason {
    RiderCancellation,
    RiderCancellationCharged,
    SystemCancellation,
    SystemCancellationCharged,
    NoDriver,
    #[serde(other)]
    Unknown,
}

/// A booking, from client-side intent to completed ride.
///
/// Built by the caller with the trip parameters, then confirmed through
/// `SnapCarPlatform`. Every operation that receives server data for the
/// booking merges it into the same value with [`Booking::apply`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Booking {
    /// Assigned by the server on confirmation.
    pub id: Option<String>,
    pub rider: Option<Rider>,
    pub service_class: Option<ServiceClass>,
    pub status: Option<BookingStatus>,
    pub timezone: Option<String>,
    /// Absent for on-demand bookings.
    pub planned_start_date: Option<DateTime<Utc>>,
    pub creation_date: Option<DateTime<Utc>>,
    pub driver_arrival_date: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub cancellation_date: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<CancellationReason>,
    pub meeting_point: Option<MeetingPoint>,
    pub start_location: Option<Location>,
    pub end_location: Option<Location>,
    pub nameboard: Option<bool>,
    /// Free text for the driver.
    pub driver_info: Option<String>,
    pub booking_price: Option<BookingPrice>,
    pub billed_amount: Option<f64>,
    pub vat_amount: Option<f64>,
    pub tip: Option<f64>,
    pub route: Vec<TimestampedPoint>,
    pub documents: Vec<BillingDocument>,
    pub vehicle: Option<Vehicle>,
    pub driver: Option<Driver>,
}

impl Booking {
    pub fn new(rider: Rider, start_location: Location) -> Self {
        Self {
            rider: Some(rider),
            start_location: Some(start_location),
            ..Self::default()
        }
    }

    pub fn with_end_location(mut self, location: Location) -> Self {
        self.end_location = Some(location);
        self
    }

    pub fn with_planned_start_date(mut self, date: DateTime<Utc>) -> Self {
        self.planned_start_date = Some(date);
        self
    }

    pub fn with_nameboard(mut self, nameboard: bool) -> Self {
        self.nameboard = Some(nameboard);
        self
    }

    pub fn with_driver_info(mut self, info: &str) -> Self {
        self.driver_info = Some(info.to_string());
        self
    }

    pub fn with_meeting_point(mut self, meeting_point: MeetingPoint) -> Self {
        self.meeting_point = Some(meeting_point);
        self
    }

    pub fn with_service_class(mut self, service_class: ServiceClass) -> Self {
        self.service_class = Some(service_class);
        self
    }

    /// A pickup time was requested; dispatch is left to the platform.
    pub fn is_scheduled(&self) -> bool {
        self.planned_start_date.is_some()
    }

    /// No definitive status observed yet: pending, or never reported.
    pub fn awaiting_dispatch(&self) -> bool {
        self.status.map_or(true, BookingStatus::is_pending)
    }

    /// Merge a server payload: present fields overwrite, absent ones stay.
    pub fn apply(&mut self, payload: BookingPayload, locale: Locale<'_>) {
        set(&mut self.id, payload.id);
        set(&mut self.rider, payload.rider);
        set(&mut self.service_class, payload.service_class.map(|s| s.localize(locale)));
        set(&mut self.status, payload.status);
        set(&mut self.timezone, payload.timezone);
        set(&mut self.planned_start_date, payload.planned_start_date);
        set(&mut self.creation_date, payload.creation_date);
        set(&mut self.driver_arrival_date, payload.driver_arrival_date);
        set(&mut self.start_date, payload.start_date);
        set(&mut self.end_date, payload.end_date);
        set(&mut self.cancellation_date, payload.cancellation_date);
        set(&mut self.cancellation_reason, payload.cancellation_reason);
        set(&mut self.meeting_point, payload.meeting_point.map(|m| m.localize(locale)));
        set(&mut self.start_location, payload.start_location);
        set(&mut self.end_location, payload.end_location);
        set(&mut self.driver_info, payload.driver_info);
        set(&mut self.booking_price, payload.booking_price);
        set(&mut self.billed_amount, payload.billed_amount);
        set(&mut self.vat_amount, payload.vat_amount);
        set(&mut self.tip, payload.tip);
        set(&mut self.vehicle, payload.vehicle.map(|v| v.localize(locale)));
        set(&mut self.driver, payload.driver);
        if let Some(route) = payload.route {
            self.route = route;
        }
        if let Some(documents) = payload.documents {
            self.documents = documents;
        }
    }
}

fn set<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Wire form of a booking.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookingPayload {
    #[serde(deserialize_with = "lenient::opt_id")]
    pub id: Option<String>,
    pub rider: Option<Rider>,
    pub service_class: Option<ServiceClassPayload>,
    pub status: Option<BookingStatus>,
    pub timezone: Option<String>,
    #[serde(deserialize_with = "lenient::opt_epoch")]
    pub planned_start_date: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient::opt_epoch")]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient::opt_epoch")]
    pub driver_arrival_date: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient::opt_epoch")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient::opt_epoch")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient::opt_epoch")]
    pub cancellation_date: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<CancellationReason>,
    pub meeting_point: Option<MeetingPointPayload>,
    pub start_location: Option<Location>,
    pub end_location: Option<Location>,
    pub driver_info: Option<String>,
    pub booking_price: Option<BookingPrice>,
    pub billed_amount: Option<f64>,
    pub vat_amount: Option<f64>,
    pub tip: Option<f64>,
    pub route: Option<Vec<TimestampedPoint>>,
    pub documents: Option<Vec<BillingDocument>>,
    pub vehicle: Option<VehiclePayload>,
    pub driver: Option<Driver>,
}

impl Localize for BookingPayload {
    type Output = Booking;

    fn localize(self, locale: Locale<'_>) -> Booking {
        let mut booking = Booking::default();
        booking.apply(self, locale);
        booking
    }
}

/// What a quote remembers about the intent it was computed for.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteOrigin {
    pub rider_id: String,
    pub planned_start_date: Option<DateTime<Utc>>,
}

/// A time-limited fixed-fare offer for one service class.
///
/// Produced by a flat-price request and consumed by confirming it, which
/// turns the originating intent into a booking.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BookingPrice {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    pub price: Option<f64>,
    /// ISO code, e.g. "EUR".
    pub currency: Option<String>,
    pub formatted_price: Option<String>,
    #[serde(deserialize_with = "lenient::opt_epoch")]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient::opt_id")]
    pub service_class_id: Option<String>,
    #[serde(skip)]
    origin: Option<QuoteOrigin>,
}

impl BookingPrice {
    pub(crate) fn quoted_for(mut self, intent: &Booking) -> Self {
        self.origin = Some(QuoteOrigin {
            rider_id: intent.rider.as_ref().map(|r| r.id.clone()).unwrap_or_default(),
            planned_start_date: intent.planned_start_date,
        });
        self
    }

    /// The intent this quote was computed for, if it came from a quote request.
    pub fn origin(&self) -> Option<&QuoteOrigin> {
        self.origin.as_ref()
    }

    /// Same rider and same pickup time as when the quote was requested.
    pub fn matches_intent(&self, intent: &Booking) -> bool {
        match &self.origin {
            None => true,
            Some(origin) => {
                intent.rider.as_ref().map(|r| r.id.as_str()) == Some(origin.rider_id.as_str())
                    && intent.planned_start_date == origin.planned_start_date
            }
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date.is_some_and(|expiry| expiry <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Fee the rider would pay for cancelling right now.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CancellationFee {
    pub charged: bool,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub formatted_amount: Option<String>,
}

/// One page of past bookings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingHistory {
    pub total: u32,
    pub offset: u32,
    pub count: u32,
    /// Page size the page was requested with.
    pub limit: u32,
    pub history: Vec<Booking>,
}

impl BookingHistory {
    pub fn more_bookings_available(&self) -> bool {
        u64::from(self.offset) + u64::from(self.count) < u64::from(self.total)
    }

    /// `(offset, limit)` of the following page.
    pub fn next_page(&self) -> Result<(u32, u32), Error> {
        if !self.more_bookings_available() {
            return Err(Error::invalid(
                "no_more_bookings",
                "There are no more bookings available in the history. Check more_bookings_available before loading more bookings.",
            ));
        }
        Ok((self.offset.saturating_add(self.limit), self.limit))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookingHistoryPayload {
    #[serde(deserialize_with = "lenient::count")]
    pub total: u32,
    #[serde(deserialize_with = "lenient::count")]
    pub offset: u32,
    #[serde(deserialize_with = "lenient::count")]
    pub count: u32,
    pub history: Vec<BookingPayload>,
}

impl BookingHistoryPayload {
    pub fn into_history(self, limit: u32, locale: Locale<'_>) -> BookingHistory {
        BookingHistory {
            total: self.total,
            offset: self.offset,
            count: self.count,
            limit,
            history: self.history.localize(locale),
        }
    }
}
