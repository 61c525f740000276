//! Full booking lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port in its own thread and runtime,
//! then drives every platform operation over real HTTP with
//! `UreqTransport`. Catches schema drift between the SDK's payload types
//! and the server's.

mod common;

use std::time::Duration;

use chrono::Utc;
use common::{orly, paris, Recorder};
use mock_server::MockSettings;
use snapcar_core::{
    Booking, BookingStatus, Config, Error, PollingConfig, SnapCarPlatform, UreqTransport,
};

const TOKEN: &str = "e2e-token";

fn start_server(settings: MockSettings) -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with(listener, settings).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn connect(base: &str, token: &str) -> SnapCarPlatform<UreqTransport> {
    let config = Config::default().with_base_domain(base).with_token(token);
    SnapCarPlatform::new(config, UreqTransport::new(Duration::from_secs(5))).with_polling(
        PollingConfig::default()
            .with_interval(Duration::from_millis(10))
            .with_max_attempts(50),
    )
}

#[tokio::test]
async fn booking_lifecycle() {
    // Step 1: start the mock server, dispatching after two pending refreshes.
    let base = start_server(MockSettings {
        token: TOKEN.to_string(),
        polls_before_dispatch: 2,
        ..MockSettings::default()
    });
    let platform = connect(&base, TOKEN);

    // Step 2: rider and catalog.
    let rider = platform.user().unwrap().await.unwrap();
    assert!(rider.can_book());
    assert_eq!(
        rider.payment_method.as_ref().and_then(|p| p.number.as_deref()),
        Some("XXXXXXXXXXXX4987")
    );

    let classes = platform.service_classes(48.8566, 2.3522).unwrap().await.unwrap();
    assert_eq!(classes.len(), 3);
    assert_eq!(classes[0].name.as_deref(), Some("Sedan"));

    let etas = platform.eta(48.8566, 2.3522).unwrap().await.unwrap();
    assert!(etas[0].is_available());
    assert!(!etas[2].is_available());

    // Step 3: meeting points only exist inside a special area.
    let area = platform.meeting_points(48.7262, 2.3652).unwrap().await.unwrap();
    assert!(area.selection_required);
    assert_eq!(area.meeting_points.len(), 2);
    let err = platform.meeting_points(48.8566, 2.3522).unwrap().await.unwrap_err();
    assert!(err.is_not_found());

    // Step 4: on-demand booking, settled once a driver is dispatched.
    let mut booking = Booking::new(rider.clone(), paris())
        .with_service_class(classes[0].clone())
        .with_driver_info("x");
    let mut recorder = Recorder::default();
    let dispatched = platform
        .confirm(&mut booking)
        .unwrap()
        .observe(&mut recorder)
        .await
        .unwrap();
    assert_eq!(dispatched.status, Some(BookingStatus::GoingToGet));
    assert!(dispatched.driver.is_some());
    assert_eq!(
        dispatched.vehicle.as_ref().and_then(|v| v.plate_number.as_deref()),
        Some("AB-123-CD")
    );
    assert_eq!(recorder.events.len(), 4);
    assert!(recorder.events[0].starts_with("started "));
    assert_eq!(recorder.events[3], "polled 3 going_to_get");
    let id = booking.id.clone().unwrap();

    // Step 5: it shows up among active bookings.
    let active = platform.active_bookings().unwrap().await.unwrap();
    assert!(active.iter().any(|b| b.id.as_deref() == Some(id.as_str())));

    // Step 6: free cancellation before the driver waits.
    let fee = platform.cancellation_price(&booking).unwrap().await.unwrap();
    assert!(!fee.charged);
    platform.cancel(&mut booking).unwrap().await.unwrap();
    assert_eq!(booking.status, Some(BookingStatus::Cancelled));
    assert_eq!(booking.driver_info.as_deref(), Some("x"));

    // Step 7: cancelling again is refused by the server.
    let err = platform.cancel(&mut booking).unwrap().await.unwrap_err();
    assert_eq!(err.key(), "booking_not_cancellable");

    // Step 8: flat price from Paris to an Orly meeting point.
    let mut quoted = Booking::new(rider.clone(), paris())
        .with_end_location(orly())
        .with_meeting_point(area.meeting_points[0].clone())
        .with_nameboard(false);
    let prices = platform.flat_prices(&quoted).unwrap().await.unwrap();
    assert_eq!(prices.len(), 3);
    assert!(!prices[0].is_expired());
    let price = prices.into_iter().next().unwrap();
    let price_id = price.id.clone();
    platform
        .confirm_price(price, &mut quoted)
        .unwrap()
        .await
        .unwrap();
    assert_eq!(quoted.status, Some(BookingStatus::GoingToGet));
    assert_eq!(quoted.booking_price.as_ref().map(|p| p.id.clone()), Some(price_id));
    assert_eq!(
        quoted.meeting_point.as_ref().and_then(|m| m.name.as_deref()),
        Some("Orly 1-2-3")
    );

    // Step 9: scheduled booking, accepted without waiting for a driver.
    let tomorrow = Utc::now() + chrono::Duration::days(1);
    let mut scheduled = Booking::new(rider.clone(), paris())
        .with_service_class(classes[1].clone())
        .with_planned_start_date(tomorrow);
    let mut recorder = Recorder::default();
    platform
        .confirm(&mut scheduled)
        .unwrap()
        .observe(&mut recorder)
        .await
        .unwrap();
    assert_eq!(scheduled.status, Some(BookingStatus::Pending));
    assert!(scheduled.id.is_some());
    assert!(recorder.events.is_empty());

    // Step 10: history holds the seeded rides plus the cancelled one.
    let history = platform.bookings_history(None, None).unwrap().await.unwrap();
    assert_eq!((history.total, history.offset, history.count), (26, 0, 20));
    assert!(history.more_bookings_available());
    let last = platform.next_bookings(&history).unwrap().await.unwrap();
    assert_eq!((last.offset, last.count), (20, 6));
    assert!(!last.more_bookings_available());

    // Step 11: server-side validation errors carry their details.
    let mut foreign = Booking::new(snapcar_core::Rider::new("someone-else"), paris())
        .with_service_class(classes[0].clone());
    let err = platform.confirm(&mut foreign).unwrap().await.unwrap_err();
    let Error::Api(api) = err else {
        panic!("expected an API error, got {err:?}");
    };
    assert_eq!(api.code, 422);
    assert_eq!(api.details, Some(serde_json::json!(["rider_id"])));
    assert!(foreign.id.is_none());
}

#[tokio::test]
async fn unknown_token_is_rejected() {
    let base = start_server(MockSettings::default());
    let platform = connect(&base, "not-the-token");

    let err = platform.user().unwrap().await.unwrap_err();

    assert_eq!(err.key(), "invalid_token");
    assert!(matches!(err, Error::Api(ref api) if api.code == 401));
}
