use pairroom_client::{ActiveCount, Route, ServiceResult, SessionConfig, SessionStatus};

use crate::integration::init_tracing;
use crate::utils::{MockDevices, MockRoomService, ROOM, SessionHarness, TOKEN, wait_until};

#[tokio::test]
async fn test_missing_token_goes_to_login() {
    init_tracing();

    let h = SessionHarness::start(SessionConfig::default());
    h.handle.join(ROOM, "").await.expect("Failed to join");

    assert_eq!(h.navigator.routes(), vec![Route::Login]);
    assert_eq!(h.handle.view().status, SessionStatus::NotAuthenticated);
    assert_eq!(h.devices.open_count(), 0, "no device is opened without a token");
    assert_eq!(h.connector.attempts(), 0);
}

#[tokio::test]
async fn test_rejected_token_releases_media() {
    init_tracing();

    let h = SessionHarness::start(SessionConfig::default());
    h.connector.set_unauthorized(true);

    h.handle.join(ROOM, TOKEN).await.expect("Failed to join");

    assert_eq!(h.navigator.routes(), vec![Route::Login]);
    assert_eq!(h.handle.view().status, SessionStatus::NotAuthenticated);
    assert!(
        wait_until(2000, || h.devices.released_count() == 2).await,
        "media acquired during join must be released"
    );
    assert_eq!(h.media.active_count(), ActiveCount::default());
}

#[tokio::test]
async fn test_unauthorized_room_fetch_goes_to_login() {
    init_tracing();

    let h = SessionHarness::start_with(
        SessionConfig::default(),
        MockDevices::new(),
        MockRoomService::with_fetch(ServiceResult::unauthorized()),
    );
    h.handle.join(ROOM, TOKEN).await.expect("Failed to join");

    assert_eq!(h.navigator.routes(), vec![Route::Login]);
    assert_eq!(h.devices.open_count(), 0);
    assert_eq!(h.connector.attempts(), 0);
}

#[tokio::test]
async fn test_missing_room_record_is_shown_not_fatal() {
    init_tracing();

    let h = SessionHarness::start_with(
        SessionConfig::default(),
        MockDevices::new(),
        MockRoomService::with_fetch(ServiceResult::failure("Room not found").with_status(404)),
    );
    h.handle.join(ROOM, TOKEN).await.expect("Failed to join");

    let view = h.handle.view();
    assert_eq!(view.status, SessionStatus::Joined);
    assert_eq!(view.last_error.as_deref(), Some("Room not found"));
    assert!(h.navigator.routes().is_empty());
}
