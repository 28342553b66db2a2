use crate::auth::TokenVerifier;
use crate::room::{ConnectionId, RoomCommand, RoomManager};
use pairroom_core::{Participant, RoomId};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::error;

struct SignalingInner {
    verifier: Arc<dyn TokenVerifier>,
    next_connection: AtomicU64,
}

/// Shared state behind the WebSocket endpoint.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
    rooms: RoomManager,
}

impl SignalingService {
    pub fn new(verifier: Arc<dyn TokenVerifier>, rooms: RoomManager) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                verifier,
                next_connection: AtomicU64::new(1),
            }),
            rooms,
        }
    }

    pub async fn authenticate(&self, token: &str) -> Option<Participant> {
        if token.is_empty() {
            return None;
        }
        self.inner.verifier.verify(token).await
    }

    pub fn rooms(&self) -> &RoomManager {
        &self.rooms
    }

    pub(crate) fn next_connection_id(&self) -> ConnectionId {
        self.inner.next_connection.fetch_add(1, Ordering::Relaxed)
    }

    /// Returns false when the room actor is gone.
    pub(crate) async fn send_to_room(&self, room_id: &RoomId, cmd: RoomCommand) -> bool {
        let sender = self.rooms.get_room_sender(room_id);
        if let Err(e) = sender.send(cmd).await {
            error!("Room {} died: {}", room_id, e);
            return false;
        }
        true
    }
}
