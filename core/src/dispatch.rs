//! Completion of a booking confirmation.
//!
//! # Design
//! Confirming an intent (directly or through a quote) yields a [`Dispatch`].
//! Awaiting it sends the confirmation, merges the answer into the caller's
//! booking, then settles:
//!
//! - scheduled booking (`planned_start_date` set before the call): the
//!   server's accept or reject is final, no polling;
//! - on-demand booking: `DispatchObserver::dispatch_started` fires once,
//!   then the booking is refreshed every `PollingConfig::interval` until it
//!   leaves `pending`, and the future resolves with that same booking.
//!
//! Polls are strictly sequential: the next delay starts only after the
//! previous refresh completed. A failed refresh is reported to the observer
//! and polling goes on, unless `max_consecutive_failures` says otherwise.
//! If the confirmation request itself fails, the future fails with that
//! error and nothing else happens.

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::PollingConfig;
use crate::error::Error;
use crate::http::HttpRequest;
use crate::platform::SnapCarPlatform;
use crate::transport::HttpTransport;
use crate::types::Booking;

/// Progress callbacks of an on-demand dispatch. All default to no-ops.
pub trait DispatchObserver: Send {
    /// The platform accepted the booking and started looking for a driver.
    /// Fires once, before the first poll.
    fn dispatch_started(&mut self, _booking: &Booking) {}

    /// A poll refreshed the booking. `attempt` counts from 1.
    fn polled(&mut self, _booking: &Booking, _attempt: u32) {}

    /// A poll failed; polling continues unless bounded.
    fn poll_failed(&mut self, _error: &Error, _attempt: u32) {}
}

impl DispatchObserver for () {}

impl<O: DispatchObserver + ?Sized> DispatchObserver for &mut O {
    fn dispatch_started(&mut self, booking: &Booking) {
        (**self).dispatch_started(booking);
    }

    fn polled(&mut self, booking: &Booking, attempt: u32) {
        (**self).polled(booking, attempt);
    }

    fn poll_failed(&mut self, error: &Error, attempt: u32) {
        (**self).poll_failed(error, attempt);
    }
}

struct StartedCallback<F>(F);

impl<F: FnMut(&Booking) + Send> DispatchObserver for StartedCallback<F> {
    fn dispatch_started(&mut self, booking: &Booking) {
        (self.0)(booking);
    }
}

/// Handle that stops dispatch polling.
///
/// Cancellation takes effect between polls: an in-flight refresh completes,
/// then the dispatch settles with `Error::PollingCancelled`.
#[derive(Debug, Clone)]
pub struct PollingCancel {
    sender: Arc<watch::Sender<bool>>,
}

impl Default for PollingCancel {
    fn default() -> Self {
        Self::new()
    }
}

impl PollingCancel {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}

/// A submitted booking confirmation, settled by awaiting it.
#[must_use = "a dispatch does nothing until awaited"]
pub struct Dispatch<'a, T> {
    platform: &'a SnapCarPlatform<T>,
    booking: &'a mut Booking,
    request: HttpRequest,
    scheduled: bool,
    polling: PollingConfig,
    observer: Box<dyn DispatchObserver + 'a>,
    cancel: Option<watch::Receiver<bool>>,
}

impl<'a, T: HttpTransport> Dispatch<'a, T> {
    pub(crate) fn new(
        platform: &'a SnapCarPlatform<T>,
        booking: &'a mut Booking,
        request: HttpRequest,
    ) -> Self {
        // Decided before the request: the server may fill in a start date.
        let scheduled = booking.is_scheduled();
        Self {
            platform,
            booking,
            request,
            scheduled,
            polling: platform.polling().clone(),
            observer: Box::new(()),
            cancel: None,
        }
    }

    /// Settles on the confirmation response alone, without polling.
    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    pub fn observe<O: DispatchObserver + 'a>(mut self, observer: O) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Shorthand for an observer that only cares about the interim signal.
    pub fn on_dispatch_started<F: FnMut(&Booking) + Send + 'a>(self, callback: F) -> Self {
        self.observe(StartedCallback(callback))
    }

    /// Override the platform's polling bounds for this booking.
    pub fn polling(mut self, polling: PollingConfig) -> Self {
        self.polling = polling;
        self
    }

    pub fn cancel_with(mut self, cancel: &PollingCancel) -> Self {
        self.cancel = Some(cancel.subscribe());
        self
    }

    pub async fn run(self) -> Result<&'a mut Booking, Error> {
        let Dispatch {
            platform,
            booking,
            request,
            scheduled,
            polling,
            mut observer,
            mut cancel,
        } = self;

        let response = platform.execute(request).await?;
        platform.client().parse_booking_update(response, booking)?;

        if scheduled {
            info!(booking_id = ?booking.id, status = ?booking.status, "scheduled booking accepted");
            return Ok(booking);
        }

        info!(booking_id = ?booking.id, "booking accepted, waiting for a driver");
        observer.dispatch_started(booking);
        poll_until_dispatched(platform, booking, &polling, observer.as_mut(), cancel.as_mut()).await?;
        Ok(booking)
    }
}

impl<'a, T: HttpTransport> IntoFuture for Dispatch<'a, T> {
    type Output = Result<&'a mut Booking, Error>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send + 'a>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.run())
    }
}

async fn poll_until_dispatched<T, O>(
    platform: &SnapCarPlatform<T>,
    booking: &mut Booking,
    polling: &PollingConfig,
    observer: &mut O,
    mut cancel: Option<&mut watch::Receiver<bool>>,
) -> Result<(), Error>
where
    T: HttpTransport,
    O: DispatchObserver + ?Sized,
{
    let mut attempts = 0u32;
    let mut consecutive_failures = 0u32;
    let mut last_error: Option<Error> = None;

    loop {
        if polling.max_attempts.is_some_and(|max| attempts >= max) {
            warn!(booking_id = ?booking.id, attempts, "dispatch polling exhausted");
            return Err(Error::PollingExhausted {
                attempts,
                last_error: last_error.map(Box::new),
            });
        }

        if wait_or_cancelled(polling.interval, cancel.as_deref_mut()).await {
            info!(booking_id = ?booking.id, attempts, "dispatch polling cancelled");
            return Err(Error::PollingCancelled { attempts });
        }

        attempts += 1;
        match platform.poll_once(booking).await {
            Ok(()) => {
                consecutive_failures = 0;
                last_error = None;
                observer.polled(booking, attempts);
                if !booking.awaiting_dispatch() {
                    info!(booking_id = ?booking.id, status = ?booking.status, attempts, "dispatch settled");
                    return Ok(());
                }
            }
            Err(error) => {
                consecutive_failures += 1;
                warn!(booking_id = ?booking.id, attempt = attempts, %error, "refresh failed, polling again");
                observer.poll_failed(&error, attempts);
                if polling
                    .max_consecutive_failures
                    .is_some_and(|max| consecutive_failures >= max)
                {
                    return Err(Error::PollingExhausted {
                        attempts,
                        last_error: Some(Box::new(error)),
                    });
                }
                last_error = Some(error);
            }
        }
    }
}

/// Sleep for `interval`; `true` if cancelled first.
async fn wait_or_cancelled(interval: Duration, cancel: Option<&mut watch::Receiver<bool>>) -> bool {
    let Some(cancel) = cancel else {
        sleep(interval).await;
        return false;
    };
    tokio::select! {
        biased;
        () = cancelled(cancel) => true,
        () = sleep(interval) => false,
    }
}

async fn cancelled(receiver: &mut watch::Receiver<bool>) {
    loop {
        if *receiver.borrow_and_update() {
            return;
        }
        if receiver.changed().await.is_err() {
            // Every handle dropped: nobody can cancel any more.
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_handle_is_shared_between_clones() {
        let cancel = PollingCancel::new();
        let clone = cancel.clone();
        assert!(!cancel.is_cancelled());
        clone.cancel();
        assert!(cancel.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_without_handle_just_sleeps() {
        let start = tokio::time::Instant::now();
        assert!(!wait_or_cancelled(Duration::from_secs(3), None).await);
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_handle_interrupts_the_wait() {
        let cancel = PollingCancel::new();
        let mut receiver = cancel.subscribe();
        cancel.cancel();
        let start = tokio::time::Instant::now();
        assert!(wait_or_cancelled(Duration::from_secs(3), Some(&mut receiver)).await);
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_handle_lets_the_wait_finish() {
        let cancel = PollingCancel::new();
        let mut receiver = cancel.subscribe();
        drop(cancel);
        assert!(!wait_or_cancelled(Duration::from_secs(3), Some(&mut receiver)).await);
    }
}
