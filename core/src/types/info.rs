use serde::Deserialize;

use super::lenient;
use super::locale::{resolve, Locale, LocalizedText};
use super::Localize;

/// A category of vehicle that can be booked (sedan, van, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceClass {
    pub id: String,
    pub name: Option<String>,
}

impl ServiceClass {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceClassPayload {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    pub name: Option<LocalizedText>,
}

impl Localize for ServiceClassPayload {
    type Output = ServiceClass;

    fn localize(self, locale: Locale<'_>) -> ServiceClass {
        ServiceClass {
            id: self.id,
            name: resolve(self.name, locale),
        }
    }
}

/// A designated pickup spot inside a special area.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeetingPoint {
    pub id: String,
    pub name: Option<String>,
    /// Instructions to find the rendez-vous point.
    pub rdv_point: Option<String>,
}

impl MeetingPoint {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MeetingPointPayload {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    pub name: Option<LocalizedText>,
    pub rdv_point: Option<LocalizedText>,
}

impl Localize for MeetingPointPayload {
    type Output = MeetingPoint;

    fn localize(self, locale: Locale<'_>) -> MeetingPoint {
        MeetingPoint {
            id: self.id,
            name: resolve(self.name, locale),
            rdv_point: resolve(self.rdv_point, locale),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialAreaType {
    Station,
    Airport,
    Normal,
    #[serde(other)]
    Unknown,
}

/// An airport or station where pickups happen at meeting points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecialArea {
    pub id: String,
    pub name: Option<String>,
    pub menu_name: Option<String>,
    /// A meeting point must be picked when booking from this area.
    pub selection_required: bool,
    pub area_type: Option<SpecialAreaType>,
    pub meeting_points: Vec<MeetingPoint>,
    /// Meeting points available when a nameboard is requested.
    pub meeting_points_nameboard: Vec<MeetingPoint>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SpecialAreaPayload {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    pub name: Option<LocalizedText>,
    pub menu_name: Option<LocalizedText>,
    pub selection_required: Option<bool>,
    pub area_type: Option<SpecialAreaType>,
    pub meeting_points: Vec<MeetingPointPayload>,
    pub meeting_points_nameboard: Vec<MeetingPointPayload>,
}

impl Localize for SpecialAreaPayload {
    type Output = SpecialArea;

    fn localize(self, locale: Locale<'_>) -> SpecialArea {
        SpecialArea {
            id: self.id,
            name: resolve(self.name, locale),
            menu_name: resolve(self.menu_name, locale),
            selection_required: self.selection_required.unwrap_or(false),
            area_type: self.area_type,
            meeting_points: self.meeting_points.localize(locale),
            meeting_points_nameboard: self.meeting_points_nameboard.localize(locale),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EtaResultStatus {
    Ok,
    Unavailable,
    #[serde(other)]
    Unknown,
}

/// Estimated pickup delay for one service class.
#[derive(Debug, Clone, PartialEq)]
pub struct EtaResult {
    pub status: EtaResultStatus,
    /// Seconds until a driver can be there, when available.
    pub eta: Option<u32>,
    pub service_class: Option<ServiceClass>,
}

impl EtaResult {
    pub fn is_available(&self) -> bool {
        self.status == EtaResultStatus::Ok
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EtaResultPayload {
    pub status: EtaResultStatus,
    #[serde(default, deserialize_with = "lenient::opt_count")]
    pub eta: Option<u32>,
    #[serde(default)]
    pub service_class: Option<ServiceClassPayload>,
}

impl Localize for EtaResultPayload {
    type Output = EtaResult;

    fn localize(self, locale: Locale<'_>) -> EtaResult {
        EtaResult {
            status: self.status,
            eta: self.eta,
            service_class: self.service_class.map(|s| s.localize(locale)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EN: Locale<'static> = Locale {
        preferred: "en",
        fallback: "en",
    };

    #[test]
    fn special_area_hydrates_nested_meeting_points() {
        let payload: SpecialAreaPayload = serde_json::from_str(
            r#"{"id":"cdg","name":{"en":"Paris CDG","fr":"Roissy CDG"},"area_type":"airport",
                "selection_required":true,
                "meeting_points":[{"id":"t1","name":{"en":"Terminal 1"},"rdv_point":{"en":"Gate 10"}}],
                "meeting_points_nameboard":[]}"#,
        )
        .unwrap();
        let area = payload.localize(EN);
        assert_eq!(area.name.as_deref(), Some("Paris CDG"));
        assert_eq!(area.area_type, Some(SpecialAreaType::Airport));
        assert!(area.selection_required);
        assert_eq!(area.meeting_points.len(), 1);
        assert_eq!(area.meeting_points[0].rdv_point.as_deref(), Some("Gate 10"));
        assert!(area.meeting_points_nameboard.is_empty());
    }

    #[test]
    fn eta_results_carry_service_class() {
        let payloads: Vec<EtaResultPayload> = serde_json::from_str(
            r#"[{"status":"ok","eta":300,"service_class":{"id":"sedan","name":{"en":"Sedan"}}},
                {"status":"unavailable","service_class":{"id":"van","name":{"en":"Van"}}}]"#,
        )
        .unwrap();
        let results = payloads.localize(EN);
        assert!(results[0].is_available());
        assert_eq!(results[0].eta, Some(300));
        assert_eq!(results[0].service_class.as_ref().unwrap().name.as_deref(), Some("Sedan"));
        assert!(!results[1].is_available());
        assert!(results[1].eta.is_none());
    }
}
