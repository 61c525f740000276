//! Wire types and fixture data of the mock API.

use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type Translations = BTreeMap<String, String>;

fn translations(entries: &[(&str, &str)]) -> Translations {
    entries
        .iter()
        .map(|(locale, text)| (locale.to_string(), text.to_string()))
        .collect()
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub name: Option<String>,
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub address: Option<Address>,
}

impl Location {
    pub fn is_complete(&self) -> bool {
        self.lat.is_some()
            && self.lng.is_some()
            && self
                .address
                .as_ref()
                .is_some_and(|a| a.name.is_some() && a.city.is_some())
    }

    fn coordinates(&self) -> (f64, f64) {
        (self.lat.unwrap_or_default(), self.lng.unwrap_or_default())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

// --- requests ---

/// Trip description shared by booking creation and quotes.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TripParams {
    pub rider_id: Option<String>,
    pub start_location: Option<Location>,
    pub end_location: Option<Location>,
    pub nameboard: Option<u8>,
    /// Planned start, epoch seconds.
    pub date: Option<i64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CreateBooking {
    #[serde(flatten)]
    pub trip: TripParams,
    pub service_class_id: Option<String>,
    pub driver_info: Option<String>,
    pub meeting_point_id: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ConfirmPrice {
    pub driver_info: Option<String>,
    pub meeting_point_id: Option<String>,
}

/// A validated trip.
#[derive(Clone, Debug, PartialEq)]
pub struct Trip {
    pub start: Location,
    pub end: Option<Location>,
    pub planned_start_date: Option<i64>,
    pub nameboard: bool,
}

// --- responses ---

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub number: String,
    pub brand: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rider {
    pub id: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub status: String,
    pub payment_method: PaymentMethod,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceClass {
    pub id: String,
    pub name: Translations,
    /// Per-kilometre rate in euros.
    #[serde(skip)]
    pub rate: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeetingPoint {
    pub id: String,
    pub name: Translations,
    pub rdv_point: Translations,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpecialArea {
    pub id: String,
    pub name: Translations,
    pub menu_name: Translations,
    pub selection_required: bool,
    pub area_type: String,
    pub meeting_points: Vec<MeetingPoint>,
    pub meeting_points_nameboard: Vec<MeetingPoint>,
    #[serde(skip)]
    pub center: Option<GeoPoint>,
    #[serde(skip)]
    pub radius_km: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EtaResult {
    pub status: String,
    pub eta: Option<u32>,
    pub service_class: ServiceClass,
}

/// A flat-price quote.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: String,
    pub price: f64,
    pub currency: String,
    pub formatted_price: String,
    pub expiry_date: i64,
    pub service_class_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CancellationFee {
    pub charged: bool,
    pub amount: f64,
    pub currency: String,
    pub formatted_amount: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    GoingToGet,
    DriverWaiting,
    OnBoard,
    Complete,
    Cancelled,
}

impl BookingStatus {
    pub fn is_active(self) -> bool {
        !matches!(self, BookingStatus::Complete | BookingStatus::Cancelled)
    }

    pub fn is_cancellable(self) -> bool {
        matches!(
            self,
            BookingStatus::Pending | BookingStatus::GoingToGet | BookingStatus::DriverWaiting
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationReason {
    RiderCancellation,
    RiderCancellationCharged,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub model: Translations,
    pub color: Translations,
    pub plate_number: String,
    pub position: GeoPoint,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub id: String,
    pub name: String,
    pub phone: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub rider: Rider,
    pub service_class: ServiceClass,
    pub status: BookingStatus,
    pub timezone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_start_date: Option<i64>,
    pub creation_date: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_arrival_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<CancellationReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_point: Option<MeetingPoint>,
    pub start_location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_price: Option<Quote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billed_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<Vehicle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<Driver>,
    /// Refreshes served while pending.
    #[serde(skip)]
    pub refreshes: u32,
}

impl Booking {
    pub fn new(
        rider: Rider,
        service_class: ServiceClass,
        trip: Trip,
        driver_info: Option<String>,
        meeting_point: Option<MeetingPoint>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            rider,
            service_class,
            status: BookingStatus::Pending,
            timezone: "Europe/Paris".to_string(),
            planned_start_date: trip.planned_start_date,
            creation_date: Utc::now().timestamp(),
            driver_arrival_date: None,
            start_date: None,
            end_date: None,
            cancellation_date: None,
            cancellation_reason: None,
            meeting_point,
            start_location: trip.start,
            end_location: trip.end,
            driver_info,
            booking_price: None,
            billed_amount: None,
            vehicle: None,
            driver: None,
            refreshes: 0,
        }
    }

    /// A driver accepted the ride and is heading to the pickup.
    pub fn dispatch(&mut self) {
        let (lat, lng) = self.start_location.coordinates();
        self.status = BookingStatus::GoingToGet;
        self.driver_arrival_date = Some((Utc::now() + Duration::minutes(6)).timestamp());
        self.driver = Some(Driver {
            id: "d-1".to_string(),
            name: "Marc".to_string(),
            phone: "+33600000000".to_string(),
        });
        self.vehicle = Some(Vehicle {
            model: translations(&[("en", "Mercedes E-Class"), ("fr", "Mercedes Classe E")]),
            color: translations(&[("en", "Black"), ("fr", "Noir")]),
            plate_number: "AB-123-CD".to_string(),
            position: GeoPoint {
                lat: lat + 0.01,
                lng: lng + 0.01,
            },
        });
    }

    /// Rider-initiated cancellation; charged once the driver is waiting.
    pub fn cancel(&mut self) {
        let charged = self.status == BookingStatus::DriverWaiting;
        self.status = BookingStatus::Cancelled;
        self.cancellation_date = Some(Utc::now().timestamp());
        self.cancellation_reason = Some(if charged {
            CancellationReason::RiderCancellationCharged
        } else {
            CancellationReason::RiderCancellation
        });
    }

    pub fn cancellation_fee(&self) -> CancellationFee {
        let amount = if self.status == BookingStatus::DriverWaiting {
            CANCELLATION_FEE
        } else {
            0.0
        };
        CancellationFee {
            charged: amount > 0.0,
            amount,
            currency: CURRENCY.to_string(),
            formatted_amount: format_price(amount),
        }
    }
}

// --- fixtures ---

pub const CURRENCY: &str = "EUR";
const BASE_FARE: f64 = 10.0;
const CANCELLATION_FEE: f64 = 10.0;

pub fn rider() -> Rider {
    Rider {
        id: "1".to_string(),
        firstname: "Jane".to_string(),
        lastname: "Doe".to_string(),
        email: "jane.doe@example.com".to_string(),
        status: "booking_allowed".to_string(),
        payment_method: PaymentMethod {
            id: "pm-1".to_string(),
            name: "Personal card".to_string(),
            kind: "credit_card".to_string(),
            number: "XXXXXXXXXXXX4987".to_string(),
            brand: "visa".to_string(),
        },
    }
}

pub fn service_classes() -> Vec<ServiceClass> {
    vec![
        ServiceClass {
            id: "sedan".to_string(),
            name: translations(&[("en", "Sedan"), ("fr", "Berline")]),
            rate: 2.0,
        },
        ServiceClass {
            id: "van".to_string(),
            name: translations(&[("en", "Van"), ("fr", "Van")]),
            rate: 2.6,
        },
        ServiceClass {
            id: "luxury".to_string(),
            name: translations(&[("en", "Luxury"), ("fr", "Luxe")]),
            rate: 3.5,
        },
    ]
}

pub fn service_class(id: &str) -> Option<ServiceClass> {
    service_classes().into_iter().find(|s| s.id == id)
}

fn meeting_point(id: &str, name: (&str, &str), rdv: (&str, &str)) -> MeetingPoint {
    MeetingPoint {
        id: id.to_string(),
        name: translations(&[("en", name.0), ("fr", name.1)]),
        rdv_point: translations(&[("en", rdv.0), ("fr", rdv.1)]),
    }
}

pub fn special_areas() -> Vec<SpecialArea> {
    vec![SpecialArea {
        id: "orly".to_string(),
        name: translations(&[("en", "Orly Airport"), ("fr", "Aéroport d'Orly")]),
        menu_name: translations(&[("en", "Terminal"), ("fr", "Terminal")]),
        selection_required: true,
        area_type: "airport".to_string(),
        meeting_points: vec![
            meeting_point(
                "orly-1",
                ("Orly 1-2-3", "Orly 1-2-3"),
                ("Exit 10, arrivals level", "Sortie 10, niveau arrivées"),
            ),
            meeting_point(
                "orly-4",
                ("Orly 4", "Orly 4"),
                ("Exit A, arrivals level", "Sortie A, niveau arrivées"),
            ),
        ],
        meeting_points_nameboard: vec![meeting_point(
            "orly-1-nameboard",
            ("Orly 1-2-3, meet and greet", "Orly 1-2-3, accueil pancarte"),
            ("Arrival hall, gate B", "Hall d'arrivée, porte B"),
        )],
        center: Some(GeoPoint {
            lat: 48.7262,
            lng: 2.3652,
        }),
        radius_km: 3.0,
    }]
}

pub fn special_area_at(lat: f64, lng: f64) -> Option<SpecialArea> {
    special_areas().into_iter().find(|area| {
        area.center
            .is_some_and(|c| distance_km((c.lat, c.lng), (lat, lng)) <= area.radius_km)
    })
}

pub fn find_meeting_point(id: &str) -> Option<MeetingPoint> {
    special_areas()
        .into_iter()
        .flat_map(|area| area.meeting_points.into_iter().chain(area.meeting_points_nameboard))
        .find(|m| m.id == id)
}

/// ETA per service class: the bigger the car, the longer the wait.
pub fn etas() -> Vec<EtaResult> {
    service_classes()
        .into_iter()
        .zip([300, 540, 0])
        .map(|(service_class, eta)| EtaResult {
            status: if eta > 0 { "ok" } else { "unavailable" }.to_string(),
            eta: (eta > 0).then_some(eta),
            service_class,
        })
        .collect()
}

/// One quote per service class for `trip`, valid for `ttl`.
pub fn quotes(trip: &Trip, ttl: Duration) -> Vec<(Quote, ServiceClass)> {
    let km = trip
        .end
        .as_ref()
        .map_or(0.0, |end| distance_km(trip.start.coordinates(), end.coordinates()));
    let expiry_date = (Utc::now() + ttl).timestamp();
    service_classes()
        .into_iter()
        .map(|service_class| {
            let price = round_cents(BASE_FARE + km * service_class.rate);
            let quote = Quote {
                id: Uuid::new_v4().to_string(),
                price,
                currency: CURRENCY.to_string(),
                formatted_price: format_price(price),
                expiry_date,
                service_class_id: service_class.id.clone(),
            };
            (quote, service_class)
        })
        .collect()
}

/// Completed rides, the most recent first, one per day.
pub fn past_bookings(rider: &Rider, count: u32) -> Vec<Booking> {
    let now = Utc::now();
    let paris = Location {
        lat: Some(48.8566),
        lng: Some(2.3522),
        address: Some(Address {
            name: Some("1 rue de Rivoli".to_string()),
            city: Some("Paris".to_string()),
            postal_code: Some("75001".to_string()),
            country: Some("FR".to_string()),
        }),
    };
    let sedan = service_classes().remove(0);
    (1..=count)
        .map(|day| {
            let start = now - Duration::days(i64::from(day));
            let trip = Trip {
                start: paris.clone(),
                end: None,
                planned_start_date: None,
                nameboard: false,
            };
            let mut booking = Booking::new(rider.clone(), sedan.clone(), trip, None, None);
            booking.status = BookingStatus::Complete;
            booking.creation_date = (start - Duration::minutes(10)).timestamp();
            booking.start_date = Some(start.timestamp());
            booking.end_date = Some((start + Duration::minutes(25)).timestamp());
            booking.billed_amount = Some(42.5);
            booking
        })
        .collect()
}

fn distance_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;
    let (lat1, lng1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lng2) = (to.0.to_radians(), to.1.to_radians());
    let a = ((lat2 - lat1) / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * ((lng2 - lng1) / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

fn format_price(amount: f64) -> String {
    format!("{amount:.2} €")
}
