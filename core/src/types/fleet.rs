use serde::Deserialize;

use super::lenient;
use super::locale::{resolve, Locale, LocalizedText};
use super::location::GeoPoint;
use super::Localize;

/// Vehicle assigned to a booking, present once a driver accepted it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vehicle {
    pub model: Option<String>,
    pub color: Option<String>,
    pub position: Option<GeoPoint>,
    pub plate_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VehiclePayload {
    pub model: Option<LocalizedText>,
    pub color: Option<LocalizedText>,
    pub position: Option<GeoPoint>,
    pub plate_number: Option<String>,
}

impl Localize for VehiclePayload {
    type Output = Vehicle;

    fn localize(self, locale: Locale<'_>) -> Vehicle {
        Vehicle {
            model: resolve(self.model, locale),
            color: resolve(self.color, locale),
            position: self.position,
            plate_number: self.plate_number,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Driver {
    #[serde(deserialize_with = "lenient::opt_id")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingDocumentType {
    Bill,
    CreditNote,
    #[serde(other)]
    Unknown,
}

/// Bill or credit note issued for a completed ride.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BillingDocument {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: BillingDocumentType,
}
