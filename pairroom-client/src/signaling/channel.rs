use crate::error::SignalingError;
use crate::signaling::channel_config::{ChannelConfig, ReconnectPolicy};
use crate::signaling::connector::{RelayConnector, RelayLink};
use crate::signaling::signaling_output::SignalingOutput;
use crate::signaling::ws_connector::WsConnector;
use dashmap::DashMap;
use pairroom_core::{
    EventKind, IceCandidate, Participant, RelayEvent, RelayPayload, RoomId, RoomPayload,
    SessionDescription, SignalMessage, UserId,
};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub type EventHandler = Arc<dyn Fn(RelayEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Persistent, room-scoped connection to the signaling relay.
///
/// Cloning shares the same connection. A background supervisor owns the
/// link and reconnects with backoff; the active room is re-joined on every
/// reconnect. Handlers are keyed by event kind and live here, not on the
/// link, so they survive reconnects.
#[derive(Clone)]
pub struct SignalingChannel {
    inner: Arc<ChannelInner>,
}

struct ChannelInner {
    connector: Arc<dyn RelayConnector>,
    reconnect: ReconnectPolicy,
    handlers: DashMap<EventKind, EventHandler>,
    state: Mutex<ChannelState>,
}

#[derive(Default)]
struct ChannelState {
    connection: ConnectionState,
    outgoing: Option<mpsc::UnboundedSender<SignalMessage>>,
    room: Option<RoomId>,
    identity: Option<Participant>,
    supervisor: Option<JoinHandle<()>>,
}

impl SignalingChannel {
    pub fn new(connector: Arc<dyn RelayConnector>, reconnect: ReconnectPolicy) -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                connector,
                reconnect,
                handlers: DashMap::new(),
                state: Mutex::new(ChannelState::default()),
            }),
        }
    }

    pub fn from_config(config: &ChannelConfig) -> Self {
        Self::new(
            Arc::new(WsConnector::new(config.url.clone())),
            config.reconnect.clone(),
        )
    }

    /// Starts the connection supervisor and waits for the first attempt.
    ///
    /// A transient failure is returned but the supervisor keeps retrying;
    /// `Unauthorized` stops it.
    pub async fn connect(&self, token: &str) -> Result<(), SignalingError> {
        let first_attempt = {
            let mut state = self.inner.state.lock();
            if state.supervisor.as_ref().is_some_and(|h| !h.is_finished()) {
                debug!("Signaling supervisor already running");
                return Ok(());
            }
            state.connection = ConnectionState::Connecting;

            let (first_tx, first_rx) = oneshot::channel();
            state.supervisor = Some(tokio::spawn(supervise(
                Arc::downgrade(&self.inner),
                self.inner.connector.clone(),
                self.inner.reconnect.clone(),
                token.to_owned(),
                first_tx,
            )));
            first_rx
        };

        first_attempt.await.unwrap_or(Err(SignalingError::Closed))
    }

    /// Stops the supervisor, drops the link and forgets the room.
    pub fn disconnect(&self) {
        let mut state = self.inner.state.lock();
        if let Some(handle) = state.supervisor.take() {
            handle.abort();
        }
        state.outgoing = None;
        state.room = None;
        state.connection = ConnectionState::Disconnected;
        info!("Signaling channel disconnected");
    }

    pub fn join_room(&self, room_id: RoomId) {
        let mut state = self.inner.state.lock();
        state.room = Some(room_id.clone());
        match (&state.outgoing, state.connection) {
            (Some(tx), ConnectionState::Connected) => {
                info!("Joining room {}", room_id);
                if tx.send(SignalMessage::new(room_id, RoomPayload::Join)).is_err() {
                    warn!("Join not sent: relay link closed");
                }
            }
            _ => info!("Room {} recorded, join is sent once connected", room_id),
        }
    }

    pub fn leave_room(&self) {
        let mut state = self.inner.state.lock();
        let Some(room_id) = state.room.clone() else {
            warn!("leave_room: not in a room");
            return;
        };

        let sent = state.outgoing.as_ref().is_some_and(|tx| {
            tx.send(SignalMessage::new(room_id.clone(), RoomPayload::Leave))
                .is_ok()
        });
        if sent {
            info!("Leaving room {}", room_id);
        } else {
            warn!("Leave for room {} not sent: relay not connected", room_id);
        }
        state.room = None;
    }

    /// Best-effort send to the active room. Dropped, never queued, when
    /// there is no room or no link.
    pub fn send(&self, payload: RoomPayload) {
        let state = self.inner.state.lock();
        let Some(room_id) = state.room.clone() else {
            warn!("Dropping {}: not in a room", payload.event_name());
            return;
        };
        let Some(tx) = state
            .outgoing
            .as_ref()
            .filter(|_| state.connection == ConnectionState::Connected)
        else {
            warn!("Dropping {}: relay not connected", payload.event_name());
            return;
        };

        let event_name = payload.event_name();
        if tx.send(SignalMessage::new(room_id, payload)).is_err() {
            warn!("Dropping {}: relay link closed", event_name);
        }
    }

    /// Registers the handler for `kind`, replacing any previous one.
    pub fn on<F>(&self, kind: EventKind, handler: F)
    where
        F: Fn(RelayEvent) + Send + Sync + 'static,
    {
        self.inner.handlers.insert(kind, Arc::new(handler));
    }

    pub fn off(&self, kind: EventKind) {
        self.inner.handlers.remove(&kind);
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.inner.state.lock().connection
    }

    pub fn active_room(&self) -> Option<RoomId> {
        self.inner.state.lock().room.clone()
    }

    /// Who the relay says we are, once `welcome` has arrived.
    pub fn identity(&self) -> Option<Participant> {
        self.inner.state.lock().identity.clone()
    }
}

impl ChannelInner {
    fn link_up(&self, outgoing: mpsc::UnboundedSender<SignalMessage>) {
        let mut state = self.state.lock();
        state.connection = ConnectionState::Connected;
        if let Some(room_id) = state.room.clone() {
            info!("Rejoining room {} after reconnect", room_id);
            if outgoing.send(SignalMessage::new(room_id, RoomPayload::Join)).is_err() {
                warn!("Rejoin not sent: relay link closed");
            }
        }
        state.outgoing = Some(outgoing);
    }

    fn link_down(&self, next: ConnectionState) {
        let mut state = self.state.lock();
        state.outgoing = None;
        state.connection = next;
    }

    fn dispatch(&self, event: RelayEvent) {
        let kind = event.kind();

        {
            let mut state = self.state.lock();
            if let RelayPayload::Welcome { user } = &event.payload {
                info!("Relay identified us as {} ({})", user.username, user.id);
                state.identity = Some(user.clone());
            }
            if let Some(room_id) = &event.room_id
                && state.room.as_ref() != Some(room_id)
            {
                debug!("Ignoring {:?} for inactive room {}", kind, room_id);
                return;
            }
        }

        // Clone out of the map so the handler may call on/off itself.
        let handler = self.handlers.get(&kind).map(|h| h.value().clone());
        match handler {
            Some(handler) => handler(event),
            None => debug!("No handler for {:?}", kind),
        }
    }
}

impl Drop for ChannelInner {
    fn drop(&mut self) {
        if let Some(handle) = self.state.get_mut().supervisor.take() {
            handle.abort();
        }
    }
}

async fn supervise(
    inner: Weak<ChannelInner>,
    connector: Arc<dyn RelayConnector>,
    policy: ReconnectPolicy,
    token: String,
    first_attempt: oneshot::Sender<Result<(), SignalingError>>,
) {
    let mut first_attempt = Some(first_attempt);
    let mut failures: u32 = 0;
    let mut delay = policy.initial_delay;

    loop {
        match connector.connect(&token).await {
            Ok(RelayLink { outgoing, incoming }) => {
                let Some(channel) = inner.upgrade() else { return };
                failures = 0;
                delay = policy.initial_delay;
                channel.link_up(outgoing);
                drop(channel);
                info!("Connected to relay");
                if let Some(tx) = first_attempt.take() {
                    let _ = tx.send(Ok(()));
                }

                pump(&inner, incoming).await;

                let Some(channel) = inner.upgrade() else { return };
                channel.link_down(ConnectionState::Reconnecting);
                drop(channel);
                warn!("Relay connection lost, reconnecting");
                tokio::time::sleep(policy.initial_delay).await;
            }
            Err(SignalingError::Unauthorized) => {
                error!("Relay rejected the auth token, giving up");
                if let Some(channel) = inner.upgrade() {
                    channel.link_down(ConnectionState::Disconnected);
                }
                if let Some(tx) = first_attempt.take() {
                    let _ = tx.send(Err(SignalingError::Unauthorized));
                }
                return;
            }
            Err(e) => {
                warn!("Relay connect attempt failed: {}", e);
                failures += 1;
                if let Some(tx) = first_attempt.take() {
                    let _ = tx.send(Err(e));
                }
                if policy.max_attempts.is_some_and(|max| failures >= max) {
                    error!("Giving up on relay after {} attempts", failures);
                    if let Some(channel) = inner.upgrade() {
                        channel.link_down(ConnectionState::Disconnected);
                    }
                    return;
                }
                match inner.upgrade() {
                    Some(channel) => channel.link_down(ConnectionState::Reconnecting),
                    None => return,
                }
                tokio::time::sleep(delay).await;
                delay = policy.next_delay(delay);
            }
        }
    }
}

async fn pump(inner: &Weak<ChannelInner>, mut incoming: mpsc::UnboundedReceiver<RelayEvent>) {
    while let Some(event) = incoming.recv().await {
        let Some(channel) = inner.upgrade() else { return };
        channel.dispatch(event);
    }
}

impl SignalingOutput for SignalingChannel {
    fn send_offer(&self, target: &UserId, offer: SessionDescription) {
        self.send(RoomPayload::VideoOffer {
            target_user_id: target.clone(),
            offer,
        });
    }

    fn send_answer(&self, target: &UserId, answer: SessionDescription) {
        self.send(RoomPayload::VideoAnswer {
            target_user_id: target.clone(),
            answer,
        });
    }

    fn send_ice(&self, target: Option<&UserId>, candidate: IceCandidate) {
        self.send(RoomPayload::IceCandidate {
            target_user_id: target.cloned(),
            candidate,
        });
    }
}
