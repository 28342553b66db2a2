use crate::error::{DeviceError, NegotiationError, SessionError, SignalingError};
use crate::media::{MediaResourceManager, MediaStream};
use crate::peer::{NegotiationState, PeerSession, TransportEvent, TransportFactory};
use crate::service::{RoomService, ServiceResult};
use crate::session::handle::RoomSessionHandle;
use crate::session::navigator::{Navigator, Route};
use crate::session::room_view::{RoomView, SessionStatus};
use crate::session::session_command::SessionCommand;
use crate::session::session_config::SessionConfig;
use crate::signaling::{SignalingChannel, SignalingOutput};
use pairroom_core::utils::DEFAULT_LANGUAGE;
use pairroom_core::{
    ChatMessage, EventKind, MediaKind, RelayEvent, RelayPayload, RoomId, RoomPayload, UserId,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Collaborators a room session is wired to.
#[derive(Clone)]
pub struct SessionDeps {
    pub media: Arc<MediaResourceManager>,
    pub channel: SignalingChannel,
    pub transports: Arc<dyn TransportFactory>,
    pub rooms: Arc<dyn RoomService>,
    pub navigator: Arc<dyn Navigator>,
}

/// Owns one room session: local media, the peer session and the relay
/// subscription. Runs as a single task; everything reaches it through
/// `select!`, so its state needs no locks.
pub struct RoomSessionController {
    deps: SessionDeps,
    config: SessionConfig,
    command_rx: mpsc::UnboundedReceiver<SessionCommand>,
    relay_rx: mpsc::UnboundedReceiver<RelayEvent>,
    relay_tx: mpsc::UnboundedSender<RelayEvent>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    transport_tx: mpsc::Sender<TransportEvent>,
    media_rx: mpsc::UnboundedReceiver<MediaReady>,
    media_tx: mpsc::UnboundedSender<MediaReady>,
    service_rx: mpsc::UnboundedReceiver<ServiceReply>,
    service_tx: mpsc::UnboundedSender<ServiceReply>,
    view: watch::Sender<RoomView>,
    /// Bumped on every join and teardown; async results from an older epoch are stale.
    epoch: u64,
    room: Option<ActiveRoom>,
}

struct ActiveRoom {
    id: RoomId,
    token: String,
    local_stream: Option<MediaStream>,
    peer: Option<PeerSession>,
    pending_code: Option<PendingCode>,
    saves_in_flight: usize,
    negotiation_deadline: Option<Instant>,
}

struct PendingCode {
    code: String,
    due: Instant,
}

struct MediaReady {
    epoch: u64,
    result: Result<MediaStream, DeviceError>,
}

/// Room REST calls finish off the loop and report back here.
enum ServiceReply {
    CodeSaved {
        epoch: u64,
        result: ServiceResult<()>,
    },
    RoomDeleted {
        epoch: u64,
        room_id: RoomId,
        result: ServiceResult<()>,
        reply: oneshot::Sender<ServiceResult<()>>,
    },
}

impl RoomSessionController {
    pub fn new(deps: SessionDeps, config: SessionConfig) -> (Self, RoomSessionHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (relay_tx, relay_rx) = mpsc::unbounded_channel();
        let (transport_tx, transport_rx) = mpsc::channel(256);
        let (media_tx, media_rx) = mpsc::unbounded_channel();
        let (service_tx, service_rx) = mpsc::unbounded_channel();
        let (view, view_rx) = watch::channel(RoomView::default());

        let controller = Self {
            deps,
            config,
            command_rx,
            relay_rx,
            relay_tx,
            transport_rx,
            transport_tx,
            media_rx,
            media_tx,
            service_rx,
            service_tx,
            view,
            epoch: 0,
            room: None,
        };
        (controller, RoomSessionHandle::new(command_tx, view_rx))
    }

    /// Starts the controller on the current runtime.
    pub fn spawn(deps: SessionDeps, config: SessionConfig) -> RoomSessionHandle {
        let (controller, handle) = Self::new(deps, config);
        tokio::spawn(controller.run());
        handle
    }

    pub async fn run(mut self) {
        info!("Room session controller started");

        loop {
            let code_due = self
                .room
                .as_ref()
                .and_then(|r| r.pending_code.as_ref().map(|p| p.due));
            let negotiation_due = self.room.as_ref().and_then(|r| r.negotiation_deadline);

            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("All session handles dropped");
                            break;
                        }
                    }
                }

                Some(event) = self.relay_rx.recv() => self.handle_relay_event(event).await,

                Some(event) = self.transport_rx.recv() => self.handle_transport_event(event).await,

                Some(ready) = self.media_rx.recv() => self.handle_media_ready(ready).await,

                Some(reply) = self.service_rx.recv() => self.handle_service_reply(reply),

                _ = sleep_until_deadline(code_due) => self.flush_code(),

                _ = sleep_until_deadline(negotiation_due) => self.negotiation_timed_out().await,
            }
        }

        if self.room.is_some() {
            self.leave(None);
        }
        info!("Room session controller finished");
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Join {
                room_id,
                token,
                reply,
            } => {
                let result = self.join(room_id, token).await;
                let _ = reply.send(result);
            }
            SessionCommand::ToggleAudio { reply } => {
                let _ = reply.send(self.toggle(MediaKind::Audio));
            }
            SessionCommand::ToggleVideo { reply } => {
                let _ = reply.send(self.toggle(MediaKind::Video));
            }
            SessionCommand::EditCode { code } => self.edit_code(code),
            SessionCommand::ChangeLanguage { language } => self.change_language(language),
            SessionCommand::SendChat { text } => self.send_chat(text),
            SessionCommand::Call { target } => {
                self.call(target, false).await;
                self.after_peer_change();
            }
            SessionCommand::Leave => self.leave(Some(Route::Dashboard)),
            SessionCommand::DeleteRoom { reply } => self.delete_room(reply),
        }
    }

    async fn join(&mut self, room_id: RoomId, token: String) -> Result<(), SessionError> {
        if let Some(active) = &self.room {
            return Err(SessionError::AlreadyJoined(active.id.clone()));
        }
        if token.trim().is_empty() {
            info!("No auth token, cannot join room {}", room_id);
            self.enter_not_authenticated();
            return Ok(());
        }

        self.epoch += 1;
        info!("Joining room {}", room_id);
        self.view
            .send_replace(RoomView::joining(room_id.clone(), DEFAULT_LANGUAGE));

        // 1. Room record (failure is shown, not fatal)
        let record = match tokio::time::timeout(
            self.config.join_timeout,
            self.deps.rooms.fetch_room(&room_id, &token),
        )
        .await
        {
            Ok(record) => record,
            Err(_) => ServiceResult::failure("Room service did not respond in time"),
        };
        if record.is_unauthorized() {
            self.enter_not_authenticated();
            return Ok(());
        }
        match record.data {
            Some(record) => self.view.send_modify(|v| {
                v.name = record.name;
                v.description = record.description;
                if let Some(language) = record.language {
                    v.language = language;
                }
                if let Some(code) = record.code {
                    v.code = code;
                }
            }),
            None => {
                let message = record
                    .message
                    .unwrap_or_else(|| "Failed to load room".to_owned());
                warn!("Room {} record unavailable: {}", room_id, message);
                self.view.send_modify(|v| v.last_error = Some(message));
            }
        }

        // 2. Local media, delivered back through media_rx
        self.spawn_acquire(self.epoch);

        // 3. Relay
        self.register_relay_handlers();
        let connected =
            tokio::time::timeout(self.config.join_timeout, self.deps.channel.connect(&token)).await;
        match connected {
            Ok(Ok(())) => {}
            Ok(Err(SignalingError::Unauthorized)) => {
                self.enter_not_authenticated();
                return Ok(());
            }
            Ok(Err(e)) => {
                warn!("Relay unavailable, retrying in the background: {}", e);
                self.view.send_modify(|v| v.last_error = Some(e.to_string()));
            }
            Err(_) => warn!("Relay still connecting, joining in the background"),
        }
        self.deps.channel.join_room(room_id.clone());

        // 4. Peer session
        let peer = self.new_peer_session().await;
        self.room = Some(ActiveRoom {
            id: room_id,
            token,
            local_stream: None,
            peer,
            pending_code: None,
            saves_in_flight: 0,
            negotiation_deadline: None,
        });

        let identity = self.deps.channel.identity();
        self.view.send_modify(|v| {
            v.status = SessionStatus::Joined;
            if identity.is_some() {
                v.local_user = identity;
            }
        });
        self.after_peer_change();
        Ok(())
    }

    fn spawn_acquire(&self, epoch: u64) {
        let media = self.deps.media.clone();
        let tx = self.media_tx.clone();
        let constraints = self.config.constraints;

        tokio::spawn(async move {
            let result = media.acquire(constraints).await;
            if let Err(mpsc::error::SendError(ready)) = tx.send(MediaReady { epoch, result })
                && let Ok(stream) = ready.result
            {
                media.stop_stream(&stream);
            }
        });
    }

    async fn handle_media_ready(&mut self, ready: MediaReady) {
        let current = ready.epoch == self.epoch && self.room.is_some();
        let stream = match ready.result {
            Ok(stream) if !current => {
                info!("Releasing local media that arrived after the session ended");
                self.deps.media.stop_stream(&stream);
                return;
            }
            Ok(stream) => stream,
            Err(e) if !current => {
                debug!("Ignoring stale media failure: {}", e);
                return;
            }
            Err(e) => {
                warn!("Local media unavailable: {}", e);
                self.view.send_modify(|v| {
                    v.video_off = true;
                    v.audio_enabled = None;
                    v.video_enabled = None;
                });
                return;
            }
        };

        info!("Local media ready ({} tracks)", stream.tracks().len());
        let audio = stream.track_of(MediaKind::Audio).map(|t| t.is_enabled());
        let video = stream.track_of(MediaKind::Video).map(|t| t.is_enabled());
        self.view.send_modify(|v| {
            v.audio_enabled = audio;
            v.video_enabled = video;
            v.video_off = video.is_none();
        });

        if let Some(room) = self.room.as_mut() {
            if let Some(peer) = room.peer.as_mut()
                && let Err(e) = peer.attach_local_tracks(stream.tracks()).await
            {
                error!("Failed to attach local tracks: {}", e);
            }
            room.local_stream = Some(stream);
        }
        self.after_peer_change();
    }

    async fn handle_relay_event(&mut self, event: RelayEvent) {
        let Some(room_id) = self.room.as_ref().map(|r| r.id.clone()) else {
            debug!("Ignoring {:?}: no active room", event.kind());
            return;
        };
        if event.room_id.as_ref().is_some_and(|id| *id != room_id) {
            debug!("Ignoring {:?} for another room", event.kind());
            return;
        }

        match event.payload {
            RelayPayload::Welcome { user } => {
                if let Some(peer) = self.peer_mut() {
                    peer.set_local_user(Some(user.id.clone()));
                }
                self.view.send_modify(|v| v.local_user = Some(user));
            }
            RelayPayload::UserJoined { user, message, .. } => {
                info!("{}", message);
                let is_me = self.is_local_user(&user.id);
                let id = user.id.clone();
                self.view.send_modify(|v| v.upsert_participant(user));
                if !is_me && self.config.auto_call {
                    self.call(id, true).await;
                }
            }
            RelayPayload::UserLeft {
                user_id, message, ..
            } => {
                info!("{}", message);
                self.view
                    .send_modify(|v| v.participants.retain(|p| p.id != user_id));
                let partner_left = self
                    .room
                    .as_ref()
                    .and_then(|r| r.peer.as_ref())
                    .and_then(|p| p.remote_user())
                    .is_some_and(|u| *u == user_id);
                if partner_left {
                    info!("Call partner left, resetting peer session");
                    self.reset_peer().await;
                }
            }
            RelayPayload::SyncCode {
                code,
                language,
                users,
            } => {
                debug!("Room state synced ({} participants)", users.len());
                self.view.send_modify(|v| {
                    v.code = code;
                    v.language = language;
                    v.participants = users;
                });
            }
            RelayPayload::CodeUpdate { code, user_id } => {
                if !self.is_local_user(&user_id) {
                    self.view.send_modify(|v| v.code = code);
                }
            }
            RelayPayload::LanguageUpdate {
                language, message, ..
            } => {
                info!("{}", message);
                self.view.send_modify(|v| v.language = language);
            }
            RelayPayload::ChatMessage {
                user_id,
                username,
                message,
                timestamp,
            } => {
                self.view.send_modify(|v| {
                    v.chat.push(ChatMessage {
                        sender: user_id,
                        sender_name: username,
                        text: message,
                        timestamp,
                    })
                });
            }
            RelayPayload::VideoOffer {
                user_id,
                username,
                offer,
            } => {
                info!("Video offer from {}", username);
                if let Some(peer) = self.peer_mut()
                    && let Err(e) = peer.handle_remote_offer(user_id, offer).await
                {
                    error!("Failed to answer offer from {}: {}", username, e);
                }
            }
            RelayPayload::VideoAnswer {
                user_id,
                username,
                answer,
            } => {
                info!("Video answer from {}", username);
                if let Some(peer) = self.peer_mut()
                    && let Err(e) = peer.handle_remote_answer(&user_id, answer).await
                {
                    error!("Failed to apply answer from {}: {}", username, e);
                }
            }
            RelayPayload::IceCandidate { candidate, .. } => {
                if let Some(peer) = self.peer_mut()
                    && let Err(e) = peer.handle_remote_candidate(candidate).await
                {
                    warn!("Failed to add remote ICE candidate: {}", e);
                }
            }
            RelayPayload::Error { message } => {
                warn!("Relay error: {}", message);
                self.view.send_modify(|v| v.last_error = Some(message));
            }
        }

        self.after_peer_change();
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        let Some(peer) = self.peer_mut() else {
            return;
        };
        if event.generation() != peer.generation() {
            debug!(
                "Dropping event from retired transport (generation {})",
                event.generation()
            );
            return;
        }

        match event {
            TransportEvent::CandidateGenerated { candidate, .. } => {
                peer.relay_local_candidate(candidate);
            }
            TransportEvent::RemoteTrack {
                stream_id, kind, ..
            } => {
                if peer.on_remote_track(stream_id, kind) {
                    info!("Call connected");
                }
            }
            TransportEvent::Disconnected { .. } => {
                let state = peer.state();
                if !(state.is_negotiating() || state == NegotiationState::Connected) {
                    return;
                }
                warn!("Peer transport disconnected while {}", state);
                self.reset_peer().await;
            }
        }

        self.after_peer_change();
    }

    async fn call(&mut self, target: UserId, automatic: bool) {
        if self.is_local_user(&target) {
            warn!("Refusing to call ourselves");
            return;
        }
        let Some(peer) = self.peer_mut() else {
            warn!("No peer session, cannot call {}", target);
            return;
        };
        if automatic && (peer.remote_user().is_some() || !peer.state().can_start_call()) {
            debug!("Already negotiating, not calling {}", target);
            return;
        }
        if let Err(e) = peer.start_call(target.clone()).await {
            warn!("Cannot call {}: {}", target, e);
        }
    }

    fn toggle(&mut self, kind: MediaKind) -> Option<bool> {
        let track = self
            .room
            .as_ref()?
            .local_stream
            .as_ref()?
            .track_of(kind)?
            .clone();

        let enabled = !track.is_enabled();
        track.set_enabled(enabled);
        info!("Local {} {}", kind, if enabled { "on" } else { "off" });
        self.view.send_modify(|v| match kind {
            MediaKind::Audio => v.audio_enabled = Some(enabled),
            MediaKind::Video => v.video_enabled = Some(enabled),
        });
        Some(enabled)
    }

    fn edit_code(&mut self, code: String) {
        let Some(room) = self.room.as_mut() else {
            warn!("Code edit outside a room ignored");
            return;
        };
        room.pending_code = Some(PendingCode {
            code: code.clone(),
            due: Instant::now() + self.config.code_debounce,
        });
        self.view.send_modify(|v| {
            v.code = code;
            v.saving = true;
        });
    }

    /// Broadcasts the debounced edit and persists it off the loop.
    fn flush_code(&mut self) {
        let Some(room) = self.room.as_mut() else {
            return;
        };
        let Some(pending) = room.pending_code.take() else {
            return;
        };
        room.saves_in_flight += 1;
        let room_id = room.id.clone();
        let token = room.token.clone();

        debug!("Broadcasting code ({} bytes)", pending.code.len());
        self.deps.channel.send(RoomPayload::CodeChange {
            code: pending.code.clone(),
        });

        let rooms = self.deps.rooms.clone();
        let tx = self.service_tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            let result = rooms.update_room_code(&room_id, &pending.code, &token).await;
            let _ = tx.send(ServiceReply::CodeSaved { epoch, result });
        });
    }

    fn handle_service_reply(&mut self, reply: ServiceReply) {
        match reply {
            ServiceReply::CodeSaved { epoch, result } => self.code_saved(epoch, result),
            ServiceReply::RoomDeleted {
                epoch,
                room_id,
                result,
                reply,
            } => {
                self.room_deleted(epoch, room_id, &result);
                let _ = reply.send(result);
            }
        }
    }

    fn code_saved(&mut self, epoch: u64, saved: ServiceResult<()>) {
        if !saved.success {
            warn!(
                "Failed to save code: {}",
                saved.message.as_deref().unwrap_or("unknown error")
            );
        }
        let Some(room) = self.room.as_mut().filter(|_| epoch == self.epoch) else {
            debug!("Code save finished after the session ended");
            return;
        };
        room.saves_in_flight = room.saves_in_flight.saturating_sub(1);
        let still_saving = room.pending_code.is_some() || room.saves_in_flight > 0;
        self.view.send_modify(|v| {
            v.saving = still_saving;
            if !saved.success {
                v.last_error = saved.message;
            }
        });
    }

    fn change_language(&mut self, language: String) {
        if self.room.is_none() {
            warn!("Language change outside a room ignored");
            return;
        }
        self.view.send_modify(|v| v.language = language.clone());
        self.deps
            .channel
            .send(RoomPayload::LanguageChange { language });
    }

    fn send_chat(&mut self, text: String) {
        if self.room.is_none() {
            warn!("Chat outside a room ignored");
            return;
        }
        if text.trim().is_empty() {
            return;
        }
        self.deps
            .channel
            .send(RoomPayload::ChatMessage { message: text });
    }

    /// Teardown. Hardware goes first so a failing later step can never
    /// leave a camera on.
    fn leave(&mut self, route: Option<Route>) {
        let Some(mut room) = self.room.take() else {
            debug!("leave: no active room");
            return;
        };
        self.epoch += 1;
        info!("Leaving room {}", room.id);

        // 1. Camera and microphone
        self.deps.media.stop_all();
        // 2. Peer connection
        if let Some(peer) = room.peer.as_mut() {
            peer.close();
        }
        // 3. Announce departure
        self.deps.channel.leave_room();
        self.unregister_relay_handlers();
        // 4. Local state
        if room.pending_code.take().is_some() {
            debug!("Dropped unsent code edit");
        }
        drop(room);
        self.view
            .send_replace(RoomView::with_status(SessionStatus::Left));
        // 5. Navigation
        if let Some(route) = route {
            self.deps.navigator.navigate(route);
        }
    }

    fn delete_room(&mut self, reply: oneshot::Sender<ServiceResult<()>>) {
        let Some((room_id, token)) = self.room.as_ref().map(|r| (r.id.clone(), r.token.clone()))
        else {
            let _ = reply.send(ServiceResult::failure("Not in a room"));
            return;
        };

        let rooms = self.deps.rooms.clone();
        let tx = self.service_tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            let result = rooms.delete_room(&room_id, &token).await;
            let _ = tx.send(ServiceReply::RoomDeleted {
                epoch,
                room_id,
                result,
                reply,
            });
        });
    }

    fn room_deleted(&mut self, epoch: u64, room_id: RoomId, result: &ServiceResult<()>) {
        if epoch != self.epoch || self.room.is_none() {
            debug!("Delete of room {} finished after the session ended", room_id);
            return;
        }
        if result.success {
            info!("Room {} deleted", room_id);
            self.leave(Some(Route::Dashboard));
        } else if result.is_unauthorized() {
            self.enter_not_authenticated();
        } else {
            let message = result
                .message
                .clone()
                .unwrap_or_else(|| "Failed to delete room".to_owned());
            warn!("Failed to delete room {}: {}", room_id, message);
            self.view.send_modify(|v| v.last_error = Some(message));
        }
    }

    /// Degraded path for a missing or rejected token: release everything,
    /// then send the user to the login page.
    fn enter_not_authenticated(&mut self) {
        warn!("Not authenticated, releasing session resources");
        self.epoch += 1;
        self.deps.media.stop_all();
        if let Some(mut room) = self.room.take()
            && let Some(peer) = room.peer.as_mut()
        {
            peer.close();
        }
        if self.deps.channel.active_room().is_some() {
            self.deps.channel.leave_room();
        }
        self.unregister_relay_handlers();
        self.view
            .send_replace(RoomView::with_status(SessionStatus::NotAuthenticated));
        self.deps.navigator.navigate(Route::Login);
    }

    async fn negotiation_timed_out(&mut self) {
        let err = NegotiationError::Timeout;
        error!("{}", err);
        self.reset_peer().await;
        self.view.send_modify(|v| v.last_error = Some(err.to_string()));
        self.after_peer_change();
    }

    /// Closes the current peer session and replaces it with a fresh idle
    /// one carrying the local tracks.
    async fn reset_peer(&mut self) {
        let tracks = match self.room.as_mut() {
            Some(room) => {
                if let Some(mut old) = room.peer.take() {
                    old.close();
                }
                room.negotiation_deadline = None;
                room.local_stream
                    .as_ref()
                    .map(|s| s.tracks().to_vec())
                    .unwrap_or_default()
            }
            None => return,
        };

        let mut peer = self.new_peer_session().await;
        if let Some(peer) = peer.as_mut()
            && !tracks.is_empty()
            && let Err(e) = peer.attach_local_tracks(&tracks).await
        {
            error!("Failed to attach local tracks: {}", e);
        }
        if let Some(room) = self.room.as_mut() {
            room.peer = peer;
        }
    }

    async fn new_peer_session(&self) -> Option<PeerSession> {
        let signaling: Arc<dyn SignalingOutput> = Arc::new(self.deps.channel.clone());
        match PeerSession::new(
            self.deps.transports.clone(),
            self.transport_tx.clone(),
            signaling,
        )
        .await
        {
            Ok(mut peer) => {
                peer.set_local_user(self.deps.channel.identity().map(|p| p.id));
                Some(peer)
            }
            Err(e) => {
                error!("Failed to create peer session: {}", e);
                None
            }
        }
    }

    /// Re-arms or clears the negotiation deadline and republishes peer state.
    fn after_peer_change(&mut self) {
        let timeout = self.config.negotiation_timeout;
        let (state, remote_stream) = match self.room.as_mut() {
            Some(room) => {
                let (state, remote_stream) = room
                    .peer
                    .as_ref()
                    .map(|p| (p.state(), p.remote_stream().map(str::to_owned)))
                    .unwrap_or_default();
                match (state.is_negotiating(), room.negotiation_deadline) {
                    (true, None) => room.negotiation_deadline = Some(Instant::now() + timeout),
                    (false, Some(_)) => room.negotiation_deadline = None,
                    _ => {}
                }
                (state, remote_stream)
            }
            None => return,
        };

        self.view.send_if_modified(|v| {
            let changed = v.negotiation != state || v.remote_stream != remote_stream;
            v.negotiation = state;
            v.remote_stream = remote_stream;
            changed
        });
    }

    fn register_relay_handlers(&self) {
        for kind in EventKind::ALL {
            let tx = self.relay_tx.clone();
            self.deps.channel.on(kind, move |event| {
                let _ = tx.send(event);
            });
        }
    }

    fn unregister_relay_handlers(&self) {
        for kind in EventKind::ALL {
            self.deps.channel.off(kind);
        }
    }

    fn is_local_user(&self, id: &UserId) -> bool {
        self.deps
            .channel
            .identity()
            .is_some_and(|me| me.id == *id)
    }

    fn peer_mut(&mut self) -> Option<&mut PeerSession> {
        self.room.as_mut().and_then(|r| r.peer.as_mut())
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
