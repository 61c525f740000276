//! Client SDK for the SnapCar ride-hailing API.
//!
//! # Overview
//! `SnapCarClient` builds `HttpRequest` values and parses `HttpResponse`
//! values without touching the network. `SnapCarPlatform` pairs it with an
//! `HttpTransport` and runs every operation as a future, including the
//! booking confirmation flow that waits for a driver to be dispatched.
//!
//! # Design
//! - Build and parse are split so the I/O boundary stays explicit; any
//!   transport can drive the client, and tests script responses directly.
//! - Bookings are owned by the caller. Lifecycle operations borrow them
//!   mutably, merge server answers into them in place and hand the same
//!   booking back.
//! - Payload DTOs are defined independently from the mock-server crate;
//!   the end-to-end tests catch schema drift.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod platform;
pub mod transport;
pub mod types;
#[cfg(feature = "ureq")]
mod ureq_transport;

pub use client::SnapCarClient;
pub use config::{Config, PollingConfig};
pub use dispatch::{Dispatch, DispatchObserver, PollingCancel};
pub use error::{ApiError, Error};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use platform::SnapCarPlatform;
pub use transport::{HttpTransport, TransportError};
pub use types::{
    Address, Booking, BookingHistory, BookingPrice, BookingStatus, CancellationFee,
    CancellationReason, EtaResult, Location, MeetingPoint, Rider, ServiceClass, SpecialArea,
};
#[cfg(feature = "ureq")]
pub use ureq_transport::UreqTransport;
