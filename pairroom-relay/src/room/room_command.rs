use pairroom_core::{Participant, RelayEvent, RoomPayload};
use tokio::sync::mpsc;

/// Identifies one WebSocket connection. A user may hold several.
pub type ConnectionId = u64;

/// Where a room writes events for one connection.
pub type Outbox = mpsc::UnboundedSender<RelayEvent>;

/// Commands a room receives from the connections that joined it.
#[derive(Debug)]
pub enum RoomCommand {
    Join {
        conn: ConnectionId,
        user: Participant,
        outbox: Outbox,
    },

    Leave { conn: ConnectionId },

    /// Any room frame other than join/leave, to be applied and fanned out.
    Forward {
        conn: ConnectionId,
        payload: RoomPayload,
    },
}
