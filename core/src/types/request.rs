//! Request payloads sent to the booking endpoints.

use serde::Serialize;

use super::booking::Booking;
use super::location::Location;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressParams {
    pub name: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationParams {
    pub lat: f64,
    pub lng: f64,
    pub address: AddressParams,
}

impl LocationParams {
    /// `None` unless the location is fully specified.
    pub fn from_location(location: &Location) -> Option<Self> {
        let address = location.address.as_ref()?;
        Some(Self {
            lat: location.lat?,
            lng: location.lng?,
            address: AddressParams {
                name: address.name.clone()?,
                city: address.city.clone()?,
                postal_code: address.postal_code.clone(),
                country: address.country.clone(),
            },
        })
    }
}

/// Trip description shared by booking creation and flat-price quotes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripParameters {
    pub rider_id: String,
    pub start_location: LocationParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_location: Option<LocationParams>,
    /// 0 or 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nameboard: Option<u8>,
    /// Planned pickup in epoch seconds. Absent means "dispatch now".
    #[serde(rename = "date", skip_serializing_if = "Option::is_none")]
    pub planned_start_date: Option<i64>,
}

/// Body of `POST /bookings`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfirmBooking {
    #[serde(flatten)]
    pub trip: TripParameters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_point_id: Option<String>,
    pub service_class_id: String,
}

/// Body of `POST /bookings/prices/{id}/confirm`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfirmPrice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_point_id: Option<String>,
}

impl ConfirmPrice {
    pub fn from_booking(booking: &Booking) -> Self {
        Self {
            driver_info: booking.driver_info.clone(),
            meeting_point_id: booking.meeting_point.as_ref().map(|m| m.id.clone()),
        }
    }
}
