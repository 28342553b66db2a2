use pairroom_client::SignalingChannel;
use pairroom_core::{RoomId, RoomPayload};
use std::sync::Arc;

use crate::integration::init_tracing;
use crate::utils::{MockConnector, fast_reconnect};

#[tokio::test]
async fn test_send_without_room_is_dropped() {
    init_tracing();

    let connector = MockConnector::new();
    let channel = SignalingChannel::new(Arc::new(connector.clone()), fast_reconnect());
    channel.connect("t").await.expect("Failed to connect");

    channel.send(RoomPayload::ChatMessage {
        message: "nobody hears this".to_string(),
    });
    assert!(connector.sent_frames().is_empty());

    channel.join_room(RoomId::from("r1"));
    channel.send(RoomPayload::ChatMessage {
        message: "hello".to_string(),
    });

    let frames = connector.sent_frames();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1].room_id, RoomId::from("r1"));
    assert_eq!(
        frames[1].payload,
        RoomPayload::ChatMessage {
            message: "hello".to_string()
        }
    );
}

#[tokio::test]
async fn test_join_before_connect_is_sent_on_connect() {
    init_tracing();

    let connector = MockConnector::new();
    let channel = SignalingChannel::new(Arc::new(connector.clone()), fast_reconnect());

    channel.join_room(RoomId::from("r1"));
    assert_eq!(connector.link_count(), 0);

    channel.connect("t").await.expect("Failed to connect");
    assert_eq!(connector.sent_events(), vec!["join"]);
}
