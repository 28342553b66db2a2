use anyhow::{Context, Result, bail};
use pairroom_core::{EventKind, Participant, RelayEvent, RoomPayload};
use pairroom_relay::{ConnectionId, RoomCommand};
use std::time::Duration;
use tokio::sync::mpsc;

/// Timeout for a single expected relay event (ms).
pub const EVENT_TIMEOUT_MS: u64 = 2000;

/// A connection talking to a room actor directly, without a socket.
pub struct RoomMember {
    pub conn: ConnectionId,
    pub user: Participant,
    outbox: mpsc::UnboundedSender<RelayEvent>,
    events: mpsc::UnboundedReceiver<RelayEvent>,
}

impl RoomMember {
    pub fn new(conn: ConnectionId, id: &str, username: &str) -> Self {
        let (outbox, events) = mpsc::unbounded_channel();
        Self {
            conn,
            user: Participant::new(id, username),
            outbox,
            events,
        }
    }

    pub async fn join(&self, room: &mpsc::Sender<RoomCommand>) -> Result<()> {
        room.send(RoomCommand::Join {
            conn: self.conn,
            user: self.user.clone(),
            outbox: self.outbox.clone(),
        })
        .await
        .context("Room is gone")
    }

    pub async fn leave(&self, room: &mpsc::Sender<RoomCommand>) -> Result<()> {
        room.send(RoomCommand::Leave { conn: self.conn })
            .await
            .context("Room is gone")
    }

    pub async fn send(&self, room: &mpsc::Sender<RoomCommand>, payload: RoomPayload) -> Result<()> {
        room.send(RoomCommand::Forward {
            conn: self.conn,
            payload,
        })
        .await
        .context("Room is gone")
    }

    /// Waits for the next event of `kind`, skipping others.
    pub async fn expect(&mut self, kind: EventKind) -> Result<RelayEvent> {
        let deadline = tokio::time::Instant::now() + Duration::from_millis(EVENT_TIMEOUT_MS);
        loop {
            let event = tokio::time::timeout_at(deadline, self.events.recv())
                .await
                .with_context(|| format!("Timed out waiting for {:?}", kind))?;
            match event {
                Some(event) if event.kind() == kind => return Ok(event),
                Some(other) => tracing::debug!("[RoomMember] skipping {:?}", other.kind()),
                None => bail!("Event channel closed while waiting for {:?}", kind),
            }
        }
    }

    /// Everything that arrives within `ms`.
    pub async fn drain(&mut self, ms: u64) -> Vec<RelayEvent> {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}
