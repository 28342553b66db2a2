use pairroom_core::{EventKind, Participant, RelayPayload, RoomId, UserId};

use crate::integration::{create_test_room, init_tracing};
use crate::utils::RoomMember;

#[tokio::test]
async fn test_join_announces_and_syncs() {
    init_tracing();

    let (_manager, room) = create_test_room();
    let mut alice = RoomMember::new(1, "1", "alice");
    let mut bob = RoomMember::new(2, "2", "bob");

    alice.join(&room).await.expect("alice join");
    alice
        .expect(EventKind::SyncCode)
        .await
        .expect("alice should be synced");

    bob.join(&room).await.expect("bob join");

    let announced = alice
        .expect(EventKind::UserJoined)
        .await
        .expect("alice hears bob join");
    assert_eq!(announced.room_id, Some(RoomId::from("room-1")));
    match announced.payload {
        RelayPayload::UserJoined { user, message, .. } => {
            assert_eq!(user, Participant::new("2", "bob"));
            assert_eq!(message, "bob joined the room");
        }
        other => panic!("unexpected payload {:?}", other),
    }

    bob.expect(EventKind::UserJoined)
        .await
        .expect("the joiner hears its own join");
    let sync = bob.expect(EventKind::SyncCode).await.expect("bob synced");
    match sync.payload {
        RelayPayload::SyncCode {
            code,
            language,
            users,
        } => {
            assert_eq!(code, "");
            assert_eq!(language, "javascript");
            assert_eq!(
                users,
                vec![Participant::new("1", "alice"), Participant::new("2", "bob")]
            );
        }
        other => panic!("unexpected payload {:?}", other),
    }
}

#[tokio::test]
async fn test_leave_announces_to_remaining_members() {
    init_tracing();

    let (_manager, room) = create_test_room();
    let mut alice = RoomMember::new(1, "1", "alice");
    let mut bob = RoomMember::new(2, "2", "bob");
    alice.join(&room).await.expect("alice join");
    bob.join(&room).await.expect("bob join");
    bob.expect(EventKind::SyncCode).await.expect("bob synced");

    bob.leave(&room).await.expect("bob leave");

    let left = alice
        .expect(EventKind::UserLeft)
        .await
        .expect("alice hears bob leave");
    match left.payload {
        RelayPayload::UserLeft {
            user_id, message, ..
        } => {
            assert_eq!(user_id, UserId::from("2"));
            assert_eq!(message, "bob left the room");
        }
        other => panic!("unexpected payload {:?}", other),
    }
    assert!(
        bob.drain(50)
            .await
            .iter()
            .all(|e| e.kind() != EventKind::UserLeft),
        "the leaver is no longer a member"
    );
}

#[tokio::test]
async fn test_same_user_on_two_connections_is_listed_once() {
    init_tracing();

    let (_manager, room) = create_test_room();
    let tab_one = RoomMember::new(1, "1", "alice");
    let mut tab_two = RoomMember::new(2, "1", "alice");
    tab_one.join(&room).await.expect("first tab join");
    tab_two.join(&room).await.expect("second tab join");

    let sync = tab_two.expect(EventKind::SyncCode).await.expect("synced");
    match sync.payload {
        RelayPayload::SyncCode { users, .. } => assert_eq!(users.len(), 1),
        other => panic!("unexpected payload {:?}", other),
    }
}

#[tokio::test]
async fn test_vanished_connection_is_dropped_from_room() {
    init_tracing();

    let (_manager, room) = create_test_room();
    let mut alice = RoomMember::new(1, "1", "alice");
    let bob = RoomMember::new(2, "2", "bob");
    let mut carol = RoomMember::new(3, "3", "carol");

    alice.join(&room).await.expect("alice join");
    bob.join(&room).await.expect("bob join");
    alice
        .expect(EventKind::UserJoined)
        .await
        .expect("alice hears her own join");
    alice
        .expect(EventKind::UserJoined)
        .await
        .expect("alice hears bob join");

    // Socket task died without a leave reaching the room
    drop(bob);

    carol.join(&room).await.expect("carol join");

    let left = alice
        .expect(EventKind::UserLeft)
        .await
        .expect("alice hears bob leave");
    match left.payload {
        RelayPayload::UserLeft { user_id, message, .. } => {
            assert_eq!(user_id, UserId::from("2"));
            assert_eq!(message, "bob left the room");
        }
        other => panic!("unexpected payload {:?}", other),
    }

    let sync = carol.expect(EventKind::SyncCode).await.expect("carol synced");
    match sync.payload {
        RelayPayload::SyncCode { users, .. } => assert_eq!(
            users,
            vec![Participant::new("1", "alice"), Participant::new("3", "carol")]
        ),
        other => panic!("unexpected payload {:?}", other),
    }
}
