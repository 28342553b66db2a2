use pairroom_client::SignalingChannel;
use pairroom_core::{EventKind, RelayEvent, RelayPayload, RoomId};
use std::sync::{Arc, Mutex};

use crate::integration::init_tracing;
use crate::utils::{MockConnector, fast_reconnect, wait_until};

fn chat(room: &str, text: &str) -> RelayEvent {
    RelayEvent::in_room(
        RoomId::from(room),
        RelayPayload::ChatMessage {
            user_id: "u2".into(),
            username: "bob".to_string(),
            message: text.to_string(),
            timestamp: 1,
        },
    )
}

fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(RelayEvent) + Send + Sync + 'static) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let handler = move |event: RelayEvent| {
        if let RelayPayload::ChatMessage { message, .. } = event.payload {
            sink.lock().unwrap().push(message);
        }
    };
    (seen, handler)
}

#[tokio::test]
async fn test_events_for_other_rooms_are_ignored() {
    init_tracing();

    let connector = MockConnector::new();
    let channel = SignalingChannel::new(Arc::new(connector.clone()), fast_reconnect());
    let (seen, handler) = recorder();
    channel.on(EventKind::ChatMessage, handler);
    channel.connect("t").await.expect("Failed to connect");
    channel.join_room(RoomId::from("r1"));

    let link = connector.latest().expect("link");
    link.push(chat("r2", "elsewhere"));
    link.push(chat("r1", "here"));

    assert!(wait_until(2000, || !seen.lock().unwrap().is_empty()).await);
    channel.leave_room();
    link.push(chat("r1", "after leave"));
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    assert_eq!(*seen.lock().unwrap(), vec!["here".to_string()]);
}

#[tokio::test]
async fn test_handler_is_replaced_and_survives_reconnect() {
    init_tracing();

    let connector = MockConnector::new();
    let channel = SignalingChannel::new(Arc::new(connector.clone()), fast_reconnect());
    let (old_seen, old_handler) = recorder();
    let (new_seen, new_handler) = recorder();
    channel.on(EventKind::ChatMessage, old_handler);
    channel.on(EventKind::ChatMessage, new_handler);
    channel.connect("t").await.expect("Failed to connect");
    channel.join_room(RoomId::from("r1"));

    connector.latest().expect("link").push(chat("r1", "one"));
    assert!(wait_until(2000, || new_seen.lock().unwrap().len() == 1).await);

    connector.latest().expect("link").drop_link();
    assert!(wait_until(2000, || connector.link_count() == 2).await);
    connector.latest().expect("link").push(chat("r1", "two"));

    assert!(wait_until(2000, || new_seen.lock().unwrap().len() == 2).await);
    assert!(old_seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_off_removes_handler() {
    init_tracing();

    let connector = MockConnector::new();
    let channel = SignalingChannel::new(Arc::new(connector.clone()), fast_reconnect());
    let (seen, handler) = recorder();
    channel.on(EventKind::ChatMessage, handler);
    channel.off(EventKind::ChatMessage);
    channel.connect("t").await.expect("Failed to connect");
    channel.join_room(RoomId::from("r1"));

    connector.latest().expect("link").push(chat("r1", "unheard"));
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    assert!(seen.lock().unwrap().is_empty());
}
