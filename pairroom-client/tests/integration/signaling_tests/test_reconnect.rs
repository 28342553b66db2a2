use pairroom_client::{ConnectionState, SignalingChannel};
use pairroom_core::{RoomId, RoomPayload};
use std::sync::Arc;

use crate::integration::init_tracing;
use crate::utils::{MockConnector, fast_reconnect, wait_until};

#[tokio::test]
async fn test_rejoins_active_room_after_reconnect() {
    init_tracing();

    let connector = MockConnector::new();
    let channel = SignalingChannel::new(Arc::new(connector.clone()), fast_reconnect());
    channel.connect("t").await.expect("Failed to connect");
    channel.join_room(RoomId::from("r1"));

    let first = connector.link(0).expect("first link");
    assert_eq!(first.sent_events(), vec!["join"]);

    first.drop_link();

    assert!(
        wait_until(2000, || connector.link_count() == 2).await,
        "channel should reconnect"
    );
    let second = connector.link(1).expect("second link");
    assert!(wait_until(2000, || !second.sent().is_empty()).await);

    let frames = second.sent();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].room_id, RoomId::from("r1"));
    assert_eq!(frames[0].payload, RoomPayload::Join);
    assert_eq!(channel.connection_state(), ConnectionState::Connected);
}

#[tokio::test]
async fn test_frames_sent_while_down_are_not_queued() {
    init_tracing();

    let connector = MockConnector::new();
    let channel = SignalingChannel::new(Arc::new(connector.clone()), fast_reconnect());
    channel.connect("t").await.expect("Failed to connect");
    channel.join_room(RoomId::from("r1"));

    connector.fail_next(usize::MAX);
    connector.link(0).expect("first link").drop_link();
    assert!(
        wait_until(2000, || channel.connection_state() == ConnectionState::Reconnecting).await
    );

    channel.send(RoomPayload::ChatMessage {
        message: "lost".to_string(),
    });

    connector.fail_next(0);
    assert!(wait_until(2000, || connector.link_count() == 2).await);
    let second = connector.link(1).expect("second link");
    assert!(wait_until(2000, || !second.sent().is_empty()).await);

    assert_eq!(second.sent_events(), vec!["join"]);
}

#[tokio::test]
async fn test_no_rejoin_after_leave() {
    init_tracing();

    let connector = MockConnector::new();
    let channel = SignalingChannel::new(Arc::new(connector.clone()), fast_reconnect());
    channel.connect("t").await.expect("Failed to connect");
    channel.join_room(RoomId::from("r1"));
    channel.leave_room();

    let first = connector.link(0).expect("first link");
    assert_eq!(first.sent_events(), vec!["join", "leave"]);

    first.drop_link();
    assert!(wait_until(2000, || channel.connection_state() == ConnectionState::Connected
        && connector.link_count() == 2)
    .await);

    let second = connector.link(1).expect("second link");
    assert!(second.sent().is_empty());
}
