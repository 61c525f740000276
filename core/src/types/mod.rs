//! Domain entities and their payload mappers.
//!
//! # Design
//! Entities are plain structs. Each one that carries localized text or nested
//! entities has a serde `*Payload` twin with every field optional; the twin is
//! turned into the entity (or merged into an existing one) with the active
//! `Locale`. Entities without localized text deserialize directly.
//!
//! The API is loose about scalar types (ids and counts may arrive as numbers
//! or strings, dates as epoch seconds in either form), so the helpers in
//! `lenient` accept both.

mod booking;
mod fleet;
mod info;
mod locale;
mod location;
mod request;
mod rider;

pub use booking::{
    Booking, BookingHistory, BookingHistoryPayload, BookingPayload, BookingPrice,
    BookingStatus, CancellationFee, CancellationReason, QuoteOrigin, DEFAULT_HISTORY_LIMIT,
};
pub use fleet::{BillingDocument, BillingDocumentType, Driver, Vehicle, VehiclePayload};
pub use info::{
    EtaResult, EtaResultPayload, EtaResultStatus, MeetingPoint, MeetingPointPayload,
    ServiceClass, ServiceClassPayload, SpecialArea, SpecialAreaPayload, SpecialAreaType,
};
pub use locale::{Locale, LocalizedText};
pub use location::{Address, GeoPoint, Location, TimestampedPoint};
pub use request::{AddressParams, ConfirmBooking, ConfirmPrice, LocationParams, TripParameters};
pub use rider::{PaymentMethod, Rider, RiderStatus};

/// Payload → entity conversion that needs the active locale.
pub trait Localize {
    type Output;

    fn localize(self, locale: Locale<'_>) -> Self::Output;
}

impl<P: Localize> Localize for Vec<P> {
    type Output = Vec<P::Output>;

    fn localize(self, locale: Locale<'_>) -> Self::Output {
        self.into_iter().map(|p| p.localize(locale)).collect()
    }
}

pub(crate) mod lenient {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    impl Scalar {
        fn into_string(self) -> String {
            match self {
                Scalar::Text(s) => s,
                Scalar::Integer(n) => n.to_string(),
                Scalar::Float(f) => f.to_string(),
            }
        }

        fn as_i64(&self) -> Option<i64> {
            match self {
                Scalar::Text(s) => s.trim().parse().ok(),
                Scalar::Integer(n) => Some(*n),
                Scalar::Float(f) => Some(f.trunc() as i64),
            }
        }
    }

    pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Scalar::deserialize(d).map(Scalar::into_string)
    }

    pub fn opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(Option::<Scalar>::deserialize(d)?.map(Scalar::into_string))
    }

    pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        let scalar = Scalar::deserialize(d)?;
        scalar
            .as_i64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| serde::de::Error::custom("expected a non-negative integer"))
    }

    pub fn opt_count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        match Option::<Scalar>::deserialize(d)? {
            None => Ok(None),
            Some(scalar) => scalar
                .as_i64()
                .and_then(|n| u32::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom("expected a non-negative integer")),
        }
    }

    pub fn epoch<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let scalar = Scalar::deserialize(d)?;
        scalar
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .ok_or_else(|| serde::de::Error::custom("expected epoch seconds"))
    }

    pub fn opt_epoch<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<Scalar>::deserialize(d)? {
            None => Ok(None),
            Some(scalar) => scalar
                .as_i64()
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom("expected epoch seconds")),
        }
    }
}
