//! Async executor for `SnapCarClient` requests.
//!
//! # Design
//! `SnapCarPlatform` pairs the stateless client with an `HttpTransport` and
//! runs build → send → parse for each operation. Every operation is split in
//! two steps: the method itself validates its inputs, checks the token and
//! builds the request synchronously, returning either an error or a future
//! that performs the I/O. Configuration and precondition failures therefore
//! never reach the transport nor the dispatch polling machinery.

use std::future::Future;

use tracing::debug;

use crate::client::SnapCarClient;
use crate::config::{Config, PollingConfig};
use crate::dispatch::Dispatch;
use crate::error::{ApiError, Error};
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::HttpTransport;
use crate::types::{
    Booking, BookingHistory, BookingPrice, CancellationFee, EtaResult, Rider, ServiceClass,
    SpecialArea,
};

/// Entry point of the SDK: every API operation, executed over `T`.
#[derive(Debug)]
pub struct SnapCarPlatform<T> {
    client: SnapCarClient,
    transport: T,
    polling: PollingConfig,
}

impl<T: HttpTransport> SnapCarPlatform<T> {
    pub fn new(config: Config, transport: T) -> Self {
        Self {
            client: SnapCarClient::new(config),
            transport,
            polling: PollingConfig::default(),
        }
    }

    /// Default polling bounds for bookings confirmed through this platform.
    pub fn with_polling(mut self, polling: PollingConfig) -> Self {
        self.polling = polling;
        self
    }

    pub fn client(&self) -> &SnapCarClient {
        &self.client
    }

    /// Token or locale changes apply to operations started afterwards.
    pub fn client_mut(&mut self) -> &mut SnapCarClient {
        &mut self.client
    }

    pub fn polling(&self) -> &PollingConfig {
        &self.polling
    }

    pub(crate) async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        debug!(method = request.method.as_str(), url = %request.url, "sending request");
        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| Error::Api(ApiError::transport(&e)))?;
        debug!(status = response.status, "response received");
        Ok(response)
    }

    // -----------------------------------------------------------------------
    // Read-only queries
    // -----------------------------------------------------------------------

    /// Pickup delay per service class around a position.
    pub fn eta<'a>(
        &'a self,
        lat: f64,
        lng: f64,
    ) -> Result<impl Future<Output = Result<Vec<EtaResult>, Error>> + 'a, Error> {
        let request = self.client.build_eta(lat, lng)?;
        Ok(async move { self.client.parse_eta(self.execute(request).await?) })
    }

    /// Service classes that can be booked from a position.
    pub fn service_classes<'a>(
        &'a self,
        lat: f64,
        lng: f64,
    ) -> Result<impl Future<Output = Result<Vec<ServiceClass>, Error>> + 'a, Error> {
        let request = self.client.build_service_classes(lat, lng)?;
        Ok(async move {
            self.client
                .parse_service_classes(self.execute(request).await?)
        })
    }

    /// Special area around a position. Outside any area this is a 404
    /// (`Error::is_not_found`), not an empty result.
    pub fn meeting_points<'a>(
        &'a self,
        lat: f64,
        lng: f64,
    ) -> Result<impl Future<Output = Result<SpecialArea, Error>> + 'a, Error> {
        let request = self.client.build_meeting_points(lat, lng)?;
        Ok(async move {
            self.client
                .parse_meeting_points(self.execute(request).await?)
        })
    }

    /// The rider the token belongs to.
    pub fn user(&self) -> Result<impl Future<Output = Result<Rider, Error>> + '_, Error> {
        let request = self.client.build_user()?;
        Ok(async move { self.client.parse_user(self.execute(request).await?) })
    }

    pub fn active_bookings(
        &self,
    ) -> Result<impl Future<Output = Result<Vec<Booking>, Error>> + '_, Error> {
        let request = self.client.build_active_bookings()?;
        Ok(async move {
            self.client
                .parse_active_bookings(self.execute(request).await?)
        })
    }

    pub fn bookings_history(
        &self,
        offset: Option<u32>,
        limit: Option<u32>,
    ) -> Result<impl Future<Output = Result<BookingHistory, Error>> + '_, Error> {
        let request = self.client.build_bookings_history(offset, limit)?;
        Ok(async move {
            self.client
                .parse_bookings_history(self.execute(request).await?, limit)
        })
    }

    /// Page after `history`; fails with `no_more_bookings` on the last page.
    pub fn next_bookings<'a>(
        &'a self,
        history: &BookingHistory,
    ) -> Result<impl Future<Output = Result<BookingHistory, Error>> + 'a, Error> {
        let request = self.client.build_next_bookings(history)?;
        let limit = history.limit;
        Ok(async move {
            self.client
                .parse_bookings_history(self.execute(request).await?, Some(limit))
        })
    }

    pub fn booking(
        &self,
        id: &str,
    ) -> Result<impl Future<Output = Result<Booking, Error>> + '_, Error> {
        let request = self.client.build_booking(id)?;
        Ok(async move { self.client.parse_booking(self.execute(request).await?) })
    }

    // -----------------------------------------------------------------------
    // Booking lifecycle
    // -----------------------------------------------------------------------

    /// Submit `intent` as a booking.
    ///
    /// The returned [`Dispatch`] resolves once: right after the server
    /// accepts a scheduled booking, or once a driver is dispatched (or the
    /// booking cancelled) for an on-demand one.
    pub fn confirm<'a>(&'a self, intent: &'a mut Booking) -> Result<Dispatch<'a, T>, Error> {
        let request = self.client.build_confirm(intent)?;
        Ok(Dispatch::new(self, intent, request))
    }

    /// Request one fixed-fare quote per eligible service class.
    pub fn flat_prices<'a>(
        &'a self,
        intent: &'a Booking,
    ) -> Result<impl Future<Output = Result<Vec<BookingPrice>, Error>> + 'a, Error> {
        let request = self.client.build_flat_prices(intent)?;
        Ok(async move {
            let response = self.execute(request).await?;
            self.client.parse_flat_prices(response, intent)
        })
    }

    /// Accept a quote. `intent` is the booking the quote was requested for;
    /// it becomes the confirmed booking, exactly as with [`Self::confirm`].
    pub fn confirm_price<'a>(
        &'a self,
        price: BookingPrice,
        intent: &'a mut Booking,
    ) -> Result<Dispatch<'a, T>, Error> {
        let request = self.client.build_confirm_price(&price, intent)?;
        Ok(Dispatch::new(self, intent, request))
    }

    /// Re-read the booking from the server and merge it in place.
    pub fn refresh<'a>(
        &'a self,
        booking: &'a mut Booking,
    ) -> Result<impl Future<Output = Result<&'a mut Booking, Error>> + 'a, Error> {
        let request = self.client.build_refresh(booking)?;
        Ok(async move {
            let response = self.execute(request).await?;
            self.client.parse_booking_update(response, booking)?;
            Ok(booking)
        })
    }

    /// Cancel the booking; the server's answer is merged in place.
    pub fn cancel<'a>(
        &'a self,
        booking: &'a mut Booking,
    ) -> Result<impl Future<Output = Result<&'a mut Booking, Error>> + 'a, Error> {
        let request = self.client.build_cancel(booking)?;
        Ok(async move {
            let response = self.execute(request).await?;
            self.client.parse_booking_update(response, booking)?;
            Ok(booking)
        })
    }

    /// Fee for cancelling now. Does not modify the booking.
    pub fn cancellation_price<'a>(
        &'a self,
        booking: &Booking,
    ) -> Result<impl Future<Output = Result<CancellationFee, Error>> + 'a, Error> {
        let request = self.client.build_cancellation_price(booking)?;
        Ok(async move {
            self.client
                .parse_cancellation_price(self.execute(request).await?)
        })
    }

    /// One poll: refresh without handing the booking back.
    pub(crate) async fn poll_once(&self, booking: &mut Booking) -> Result<(), Error> {
        let request = self.client.build_refresh(booking)?;
        let response = self.execute(request).await?;
        self.client.parse_booking_update(response, booking)
    }
}
