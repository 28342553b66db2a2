use pairroom_client::{ActiveCount, Route, SessionConfig, SessionError, SessionStatus};
use pairroom_core::{RoomId, RoomPayload};

use crate::integration::init_tracing;
use crate::utils::{MockDevices, MockRoomService, ROOM, SessionHarness, TOKEN, wait_until};

#[tokio::test]
async fn test_join_then_leave_releases_everything() {
    init_tracing();

    let h = SessionHarness::start(SessionConfig::default());
    h.handle.join(ROOM, TOKEN).await.expect("Failed to join");

    let view = h.handle.view();
    assert_eq!(view.status, SessionStatus::Joined);
    assert_eq!(view.name, "Pairing");
    assert_eq!(view.language, "rust");
    assert_eq!(view.code, "fn main() {}");

    assert!(
        wait_until(2000, || h.media.active_count()
            == ActiveCount {
                streams: 1,
                tracks: 2
            })
        .await,
        "local media should be acquired"
    );
    assert_eq!(h.connector.sent_events(), vec!["join"]);

    let connector = h.connector.clone();
    let media = h.media.clone();
    h.navigator.set_probe(move || {
        format!(
            "{:?}/{}",
            connector.sent_events().last(),
            media.active_count().tracks
        )
    });

    h.handle.leave();

    assert!(wait_until(2000, || !h.navigator.navigations().is_empty()).await);
    let navigations = h.navigator.navigations();
    assert_eq!(navigations.len(), 1);
    assert_eq!(navigations[0].route, Route::Dashboard);
    assert_eq!(
        navigations[0].snapshot, "Some(\"leave\")/0",
        "leave sent and media released before navigating"
    );

    assert_eq!(h.media.active_count(), ActiveCount::default());
    assert_eq!(h.devices.released_count(), 2);
    assert_eq!(h.handle.view().status, SessionStatus::Left);
    assert_eq!(h.channel.active_room(), None);
}

#[tokio::test]
async fn test_second_join_is_rejected() {
    init_tracing();

    let h = SessionHarness::start(SessionConfig::default());
    h.handle.join(ROOM, TOKEN).await.expect("Failed to join");

    let result = h.handle.join("room-2", TOKEN).await;
    assert_eq!(result, Err(SessionError::AlreadyJoined(RoomId::from(ROOM))));
}

#[tokio::test]
async fn test_toggle_video_twice_restores_flag() {
    init_tracing();

    let h = SessionHarness::start(SessionConfig::default());
    h.handle.join(ROOM, TOKEN).await.expect("Failed to join");
    assert!(wait_until(2000, || h.handle.view().video_enabled == Some(true)).await);

    let first = h.handle.toggle_video().await.expect("controller stopped");
    assert_eq!(first, Some(false));
    assert_eq!(h.handle.view().video_enabled, Some(false));

    let second = h.handle.toggle_video().await.expect("controller stopped");
    assert_eq!(second, Some(true));
    assert_eq!(h.handle.view().video_enabled, Some(true));

    assert_eq!(h.devices.released_count(), 0, "toggling never releases the camera");
    assert_eq!(h.media.active_count().tracks, 2);
}

#[tokio::test]
async fn test_toggle_without_media_reports_none() {
    init_tracing();

    let h = SessionHarness::start_with(
        SessionConfig::default(),
        MockDevices::denying(),
        MockRoomService::new(),
    );
    h.handle.join(ROOM, TOKEN).await.expect("Failed to join");
    assert!(wait_until(2000, || h.handle.view().video_off).await);

    assert_eq!(h.handle.toggle_audio().await.expect("controller stopped"), None);
    assert_eq!(h.handle.view().status, SessionStatus::Joined);
}

#[tokio::test]
async fn test_media_arriving_after_leave_is_released() {
    init_tracing();

    let devices = MockDevices::gated();
    let h = SessionHarness::start_with(
        SessionConfig::default(),
        devices.clone(),
        MockRoomService::new(),
    );
    h.handle.join(ROOM, TOKEN).await.expect("Failed to join");
    assert!(wait_until(2000, || devices.open_count() == 1).await);

    h.handle.leave();
    assert!(wait_until(2000, || h.handle.view().status == SessionStatus::Left).await);

    devices.release_open();

    assert!(
        wait_until(2000, || devices.released_count() == 2).await,
        "late tracks should be released"
    );
    assert_eq!(h.media.active_count(), ActiveCount::default());
}

#[tokio::test]
async fn test_delete_room_navigates_to_dashboard() {
    init_tracing();

    let h = SessionHarness::start(SessionConfig::default());
    h.handle.join(ROOM, TOKEN).await.expect("Failed to join");

    let result = h.handle.delete_room().await.expect("controller stopped");

    assert!(result.success);
    assert_eq!(h.rooms.delete_calls(), 1);
    assert_eq!(h.navigator.routes(), vec![Route::Dashboard]);
    assert_eq!(h.handle.view().status, SessionStatus::Left);
}

#[tokio::test]
async fn test_failed_delete_keeps_session() {
    init_tracing();

    let h = SessionHarness::start(SessionConfig::default());
    h.rooms
        .set_delete_result(pairroom_client::ServiceResult::failure("Only the owner can delete"));
    h.handle.join(ROOM, TOKEN).await.expect("Failed to join");

    let result = h.handle.delete_room().await.expect("controller stopped");

    assert!(!result.success);
    assert!(h.navigator.routes().is_empty());
    let view = h.handle.view();
    assert_eq!(view.status, SessionStatus::Joined);
    assert_eq!(view.last_error.as_deref(), Some("Only the owner can delete"));
}

#[tokio::test]
async fn test_dropping_last_handle_leaves_without_navigation() {
    init_tracing();

    let h = SessionHarness::start(SessionConfig::default());
    h.handle.join(ROOM, TOKEN).await.expect("Failed to join");
    assert!(wait_until(2000, || h.media.active_count().tracks == 2).await);

    let SessionHarness {
        handle,
        media,
        devices,
        connector,
        navigator,
        ..
    } = h;
    drop(handle);

    assert!(
        wait_until(2000, || connector
            .count_sent(|p| *p == RoomPayload::Leave)
            == 1)
        .await
    );
    assert!(wait_until(2000, || devices.released_count() == 2).await);
    assert_eq!(media.active_count(), ActiveCount::default());
    assert!(navigator.routes().is_empty());
}
