use crate::error::NegotiationError;
use crate::media::MediaTrack;
use crate::peer::negotiation_state::NegotiationState;
use crate::peer::transport::{PeerTransport, TransportEvent, TransportFactory};
use crate::signaling::SignalingOutput;
use pairroom_core::{IceCandidate, MediaKind, SessionDescription, UserId};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Offer/answer negotiation with a single counterpart.
///
/// Remote ICE candidates that arrive before a remote description is
/// committed are buffered and applied, in arrival order, right after it.
pub struct PeerSession {
    generation: u64,
    state: NegotiationState,
    local_user: Option<UserId>,
    remote_user: Option<UserId>,
    transport: Arc<dyn PeerTransport>,
    factory: Arc<dyn TransportFactory>,
    events: mpsc::Sender<TransportEvent>,
    signaling: Arc<dyn SignalingOutput>,
    local_tracks: Vec<MediaTrack>,
    pending_candidates: Vec<IceCandidate>,
    local_description: Option<SessionDescription>,
    remote_description: Option<SessionDescription>,
    remote_stream: Option<String>,
}

impl PeerSession {
    pub async fn new(
        factory: Arc<dyn TransportFactory>,
        events: mpsc::Sender<TransportEvent>,
        signaling: Arc<dyn SignalingOutput>,
    ) -> Result<Self, NegotiationError> {
        let generation = next_generation();
        let transport = factory.create(generation, events.clone()).await?;
        debug!("Peer session created (generation {})", generation);

        Ok(Self {
            generation,
            state: NegotiationState::Idle,
            local_user: None,
            remote_user: None,
            transport,
            factory,
            events,
            signaling,
            local_tracks: Vec::new(),
            pending_candidates: Vec::new(),
            local_description: None,
            remote_description: None,
            remote_stream: None,
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn remote_user(&self) -> Option<&UserId> {
        self.remote_user.as_ref()
    }

    pub fn remote_stream(&self) -> Option<&str> {
        self.remote_stream.as_deref()
    }

    pub fn local_description(&self) -> Option<&SessionDescription> {
        self.local_description.as_ref()
    }

    pub fn remote_description(&self) -> Option<&SessionDescription> {
        self.remote_description.as_ref()
    }

    pub fn pending_candidate_count(&self) -> usize {
        self.pending_candidates.len()
    }

    pub fn local_tracks(&self) -> &[MediaTrack] {
        &self.local_tracks
    }

    /// Our own id; decides who yields when both sides offer at once.
    pub fn set_local_user(&mut self, user: Option<UserId>) {
        self.local_user = user;
    }

    pub async fn attach_local_tracks(
        &mut self,
        tracks: &[MediaTrack],
    ) -> Result<(), NegotiationError> {
        self.ensure_open("attach local tracks")?;
        for track in tracks {
            self.transport.add_track(track).await?;
            debug!("Attached local {} track '{}'", track.kind(), track.label());
        }
        self.local_tracks.extend(tracks.iter().cloned());
        if self.state == NegotiationState::Idle {
            self.transition(NegotiationState::Gathering);
        }
        Ok(())
    }

    pub async fn start_call(&mut self, target: UserId) -> Result<(), NegotiationError> {
        if !self.state.can_start_call() {
            return Err(NegotiationError::InvalidState {
                state: self.state,
                action: "start a call",
            });
        }

        info!("Calling {}", target);
        self.remote_user = Some(target.clone());
        let offer = self.transport.create_offer().await?;
        self.local_description = Some(offer.clone());
        self.signaling.send_offer(&target, offer);
        self.transition(NegotiationState::OfferSent);
        Ok(())
    }

    /// Applies a remote offer and answers it exactly once, addressed to `from`.
    pub async fn handle_remote_offer(
        &mut self,
        from: UserId,
        offer: SessionDescription,
    ) -> Result<(), NegotiationError> {
        match self.state {
            NegotiationState::Closed => {
                return Err(NegotiationError::InvalidState {
                    state: self.state,
                    action: "accept an offer",
                });
            }
            NegotiationState::OfferSent => {
                if !self.yields_to(&from) {
                    info!("Offer collision with {}: keeping our own offer", from);
                    return Ok(());
                }
                info!("Offer collision with {}: dropping our own offer", from);
                self.reset_transport().await?;
            }
            NegotiationState::Idle | NegotiationState::Gathering => {}
            _ => {
                if let Some(current) = self.remote_user.as_ref().filter(|u| **u != from) {
                    return Err(NegotiationError::Busy {
                        current: current.clone(),
                        other: from,
                    });
                }
            }
        }

        let was_connected = self.state == NegotiationState::Connected;
        self.remote_user = Some(from.clone());
        self.transport.set_remote_description(offer.clone()).await?;
        self.remote_description = Some(offer);
        if !was_connected {
            self.transition(NegotiationState::OfferReceived);
        }
        self.flush_pending_candidates().await;

        let answer = self.transport.create_answer().await?;
        self.local_description = Some(answer.clone());
        self.signaling.send_answer(&from, answer);
        if !was_connected {
            self.transition(NegotiationState::AnswerExchanged);
        }
        Ok(())
    }

    pub async fn handle_remote_answer(
        &mut self,
        from: &UserId,
        answer: SessionDescription,
    ) -> Result<(), NegotiationError> {
        if self.state != NegotiationState::OfferSent {
            return Err(NegotiationError::InvalidState {
                state: self.state,
                action: "accept an answer",
            });
        }
        if let Some(current) = self.remote_user.as_ref().filter(|u| *u != from) {
            return Err(NegotiationError::Busy {
                current: current.clone(),
                other: from.clone(),
            });
        }

        self.transport.set_remote_description(answer.clone()).await?;
        self.remote_description = Some(answer);
        self.flush_pending_candidates().await;
        self.transition(NegotiationState::AnswerExchanged);
        Ok(())
    }

    pub async fn handle_remote_candidate(
        &mut self,
        candidate: IceCandidate,
    ) -> Result<(), NegotiationError> {
        self.ensure_open("add a remote candidate")?;
        if self.remote_description.is_none() {
            self.pending_candidates.push(candidate);
            debug!(
                "Buffered remote ICE candidate ({} pending)",
                self.pending_candidates.len()
            );
            return Ok(());
        }
        self.transport.add_ice_candidate(candidate).await
    }

    /// Relays a locally discovered candidate to the counterpart.
    pub fn relay_local_candidate(&self, candidate: IceCandidate) {
        if self.state == NegotiationState::Closed {
            return;
        }
        self.signaling
            .send_ice(self.remote_user.as_ref(), candidate);
    }

    /// Returns true when this track completed the connection.
    pub fn on_remote_track(&mut self, stream_id: String, kind: MediaKind) -> bool {
        if self.state == NegotiationState::Closed || stream_id.is_empty() {
            return false;
        }
        debug!("Remote {} track on stream {}", kind, stream_id);
        self.remote_stream = Some(stream_id);
        if self.state == NegotiationState::Connected {
            return false;
        }
        self.transition(NegotiationState::Connected);
        true
    }

    /// Reentrant; the transport is released in the background.
    pub fn close(&mut self) {
        if self.state == NegotiationState::Closed {
            return;
        }
        self.transition(NegotiationState::Closed);
        self.pending_candidates.clear();
        self.local_tracks.clear();
        spawn_close(self.transport.clone(), self.generation);
    }

    fn ensure_open(&self, action: &'static str) -> Result<(), NegotiationError> {
        if self.state == NegotiationState::Closed {
            return Err(NegotiationError::InvalidState {
                state: self.state,
                action,
            });
        }
        Ok(())
    }

    /// The lower user id keeps its offer. Without a known identity we yield.
    fn yields_to(&self, remote: &UserId) -> bool {
        match &self.local_user {
            Some(me) => me > remote,
            None => true,
        }
    }

    /// Swaps in a fresh transport, dropping our unanswered offer.
    async fn reset_transport(&mut self) -> Result<(), NegotiationError> {
        let generation = next_generation();
        let transport = self.factory.create(generation, self.events.clone()).await?;
        for track in &self.local_tracks {
            transport.add_track(track).await?;
        }

        let old = std::mem::replace(&mut self.transport, transport);
        spawn_close(old, self.generation);
        self.generation = generation;
        self.local_description = None;
        self.remote_description = None;
        self.remote_user = None;
        self.state = if self.local_tracks.is_empty() {
            NegotiationState::Idle
        } else {
            NegotiationState::Gathering
        };
        Ok(())
    }

    async fn flush_pending_candidates(&mut self) {
        let pending = std::mem::take(&mut self.pending_candidates);
        if pending.is_empty() {
            return;
        }
        debug!("Applying {} buffered ICE candidates", pending.len());
        for candidate in pending {
            if let Err(e) = self.transport.add_ice_candidate(candidate).await {
                warn!("Failed to apply buffered ICE candidate: {}", e);
            }
        }
    }

    fn transition(&mut self, next: NegotiationState) {
        debug!("Negotiation {} -> {}", self.state, next);
        self.state = next;
    }
}

impl Drop for PeerSession {
    fn drop(&mut self) {
        self.close();
    }
}

fn spawn_close(transport: Arc<dyn PeerTransport>, generation: u64) {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        warn!("No runtime to close transport (generation {})", generation);
        return;
    };
    runtime.spawn(async move {
        if let Err(e) = transport.close().await {
            warn!("Failed to close transport (generation {}): {}", generation, e);
        }
    });
}
