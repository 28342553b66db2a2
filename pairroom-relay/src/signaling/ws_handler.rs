use crate::room::{ConnectionId, Outbox, RoomCommand};
use crate::signaling::SignalingService;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use pairroom_core::{Participant, RelayEvent, RelayPayload, RoomId, RoomPayload, SignalMessage};
use serde::Deserialize;
use std::collections::HashSet;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    #[serde(default)]
    pub token: Option<String>,
}

/// `GET /ws?token=...`. A missing or rejected token is answered with 401
/// before the upgrade.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(service): State<SignalingService>,
) -> Response {
    let token = params.token.unwrap_or_default();
    let Some(user) = service.authenticate(&token).await else {
        warn!("Rejected WebSocket connection: invalid or missing token");
        return StatusCode::UNAUTHORIZED.into_response();
    };

    ws.on_upgrade(move |socket| handle_socket(socket, user, service))
}

async fn handle_socket(socket: WebSocket, user: Participant, service: SignalingService) {
    let conn = service.next_connection_id();
    info!("User {} connected (connection {})", user.username, conn);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<RelayEvent>();

    let _ = tx.send(RelayEvent::unscoped(RelayPayload::Welcome { user: user.clone() }));

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize relay event: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut connection = Connection {
        id: conn,
        user: user.clone(),
        outbox: tx,
        joined: HashSet::new(),
        service,
    };

    tokio::select! {
        _ = &mut send_task => debug!("Write side of connection {} closed", conn),
        _ = connection.read_frames(&mut receiver) => {}
    }
    send_task.abort();
    connection.leave_all().await;

    info!("User {} disconnected (connection {})", user.username, conn);
}

/// Per-socket state: which rooms this connection has joined.
struct Connection {
    id: ConnectionId,
    user: Participant,
    outbox: Outbox,
    joined: HashSet<RoomId>,
    service: SignalingService,
}

impl Connection {
    async fn read_frames(&mut self, receiver: &mut SplitStream<WebSocket>) {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    if !self.handle_text(&text).await {
                        return;
                    }
                }
                Message::Close(_) => return,
                _ => {}
            }
        }
    }

    /// Returns false once the connection should be dropped.
    async fn handle_text(&mut self, text: &str) -> bool {
        let frame = match serde_json::from_str::<SignalMessage>(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Invalid frame from {}: {}", self.user.username, e);
                self.reply_error("Invalid message");
                return true;
            }
        };
        let SignalMessage { room_id, payload } = frame;
        if room_id.as_str().is_empty() {
            self.reply_error("Room ID is required");
            return true;
        }

        match payload {
            RoomPayload::Join => {
                if !self.joined.insert(room_id.clone()) {
                    debug!("{} re-joined room {}", self.user.username, room_id);
                }
                let cmd = RoomCommand::Join {
                    conn: self.id,
                    user: self.user.clone(),
                    outbox: self.outbox.clone(),
                };
                self.service.send_to_room(&room_id, cmd).await
            }
            RoomPayload::Leave => {
                if !self.joined.remove(&room_id) {
                    debug!("{} left room {} it never joined", self.user.username, room_id);
                    return true;
                }
                let cmd = RoomCommand::Leave { conn: self.id };
                self.service.send_to_room(&room_id, cmd).await
            }
            payload => {
                if !self.joined.contains(&room_id) {
                    warn!(
                        "{} sent {} to room {} without joining",
                        self.user.username,
                        payload.event_name(),
                        room_id
                    );
                    self.reply_error(&format!("Not a member of room {}", room_id));
                    return true;
                }
                let cmd = RoomCommand::Forward {
                    conn: self.id,
                    payload,
                };
                self.service.send_to_room(&room_id, cmd).await
            }
        }
    }

    /// Errors about frames that never reached a room are unscoped.
    fn reply_error(&self, message: &str) {
        let _ = self.outbox.send(RelayEvent::unscoped(RelayPayload::Error {
            message: message.to_owned(),
        }));
    }

    async fn leave_all(&mut self) {
        for room_id in std::mem::take(&mut self.joined) {
            let cmd = RoomCommand::Leave { conn: self.id };
            self.service.send_to_room(&room_id, cmd).await;
        }
    }
}
