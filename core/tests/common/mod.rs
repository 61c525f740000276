//! Shared fixtures for the platform tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use snapcar_core::{
    Address, Booking, BookingStatus, Config, DispatchObserver, Error, HttpRequest, HttpResponse,
    HttpTransport, Location, PollingCancel, Rider, ServiceClass, SnapCarPlatform, TransportError,
};

pub const TOKEN: &str = "secret";

/// Transport answering from a queue of canned responses and recording
/// every request it receives.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_json(&self, status: u16, body: Value) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }));
        self
    }

    pub fn push_error(&self, error: TransportError) -> &Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let description = format!("{} {}", request.method.as_str(), request.url);
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted response for {description}"))
    }
}

pub fn platform(transport: &Arc<ScriptedTransport>) -> SnapCarPlatform<Arc<ScriptedTransport>> {
    SnapCarPlatform::new(
        Config::default()
            .with_base_domain("https://api.test")
            .with_token(TOKEN),
        Arc::clone(transport),
    )
}

pub fn paris() -> Location {
    Location::new(48.8566, 2.3522, Address::new("1 rue de Rivoli", "Paris", "75001", "FR"))
}

pub fn orly() -> Location {
    Location::new(48.7262, 2.3652, Address::new("Aéroport d'Orly", "Orly", "94390", "FR"))
}

/// On-demand intent, ready to confirm.
pub fn intent() -> Booking {
    Booking::new(Rider::new("r1"), paris()).with_service_class(ServiceClass::new("sedan"))
}

pub fn booking_json(id: &str, status: &str) -> Value {
    serde_json::json!({
        "id": id,
        "status": status,
        "rider": {"id": "r1"},
        "service_class": {"id": "sedan", "name": {"en": "Sedan"}},
        "creation_date": 1_800_000_000,
    })
}

/// Observer that writes every callback down, and optionally cancels
/// polling after a given attempt.
#[derive(Default)]
pub struct Recorder {
    pub events: Vec<String>,
    pub cancel_after: Option<(u32, PollingCancel)>,
}

impl DispatchObserver for Recorder {
    fn dispatch_started(&mut self, booking: &Booking) {
        self.events
            .push(format!("started {}", booking.id.as_deref().unwrap_or("-")));
    }

    fn polled(&mut self, booking: &Booking, attempt: u32) {
        let status = booking.status.map_or("none", status_name);
        self.events.push(format!("polled {attempt} {status}"));
        if let Some((after, cancel)) = &self.cancel_after {
            if *after == attempt {
                cancel.cancel();
            }
        }
    }

    fn poll_failed(&mut self, error: &Error, attempt: u32) {
        self.events.push(format!("failed {attempt} {}", error.key()));
    }
}

fn status_name(status: BookingStatus) -> &'static str {
    match status {
        BookingStatus::Pending => "pending",
        BookingStatus::GoingToGet => "going_to_get",
        BookingStatus::DriverWaiting => "driver_waiting",
        BookingStatus::OnBoard => "on_board",
        BookingStatus::Complete => "complete",
        BookingStatus::Cancelled => "cancelled",
        BookingStatus::Unknown => "unknown",
    }
}
