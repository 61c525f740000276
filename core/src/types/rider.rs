use serde::Deserialize;

use super::lenient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiderStatus {
    BookingAllowed,
    BookingNotAllowed,
    Suspended,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PaymentMethod {
    #[serde(deserialize_with = "lenient::opt_id")]
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Masked card number, e.g. "XXXXXXXXXXXX4987".
    pub number: Option<String>,
    pub brand: Option<String>,
}

/// The authenticated user, on whose behalf bookings are made.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Rider {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub status: Option<RiderStatus>,
    pub payment_method: Option<PaymentMethod>,
}

impl Rider {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }

    pub fn can_book(&self) -> bool {
        self.status == Some(RiderStatus::BookingAllowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rider_with_payment_method() {
        let rider: Rider = serde_json::from_str(
            r#"{"id":"r1","firstname":"Jane","status":"booking_allowed",
                "payment_method":{"id":7,"type":"card","number":"XXXXXXXXXXXX4987","brand":"VISA"},
                "unknown_field":true}"#,
        )
        .unwrap();
        assert_eq!(rider.id, "r1");
        assert!(rider.can_book());
        let payment = rider.payment_method.unwrap();
        assert_eq!(payment.id.as_deref(), Some("7"));
        assert_eq!(payment.kind.as_deref(), Some("card"));
        assert_eq!(payment.brand.as_deref(), Some("VISA"));
    }

    #[test]
    fn unknown_status_is_tolerated() {
        let rider: Rider = serde_json::from_str(r#"{"id":"r1","status":"vip"}"#).unwrap();
        assert_eq!(rider.status, Some(RiderStatus::Unknown));
        assert!(!rider.can_book());
    }
}
