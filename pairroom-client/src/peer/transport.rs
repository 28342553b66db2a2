use crate::error::NegotiationError;
use crate::media::MediaTrack;
use async_trait::async_trait;
use pairroom_core::{IceCandidate, MediaKind, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Events a transport pushes to the controller loop. `generation` names the
/// peer session that created the transport, so events from a retired one
/// can be told apart.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Local ICE candidate discovered (trickle).
    CandidateGenerated {
        generation: u64,
        candidate: IceCandidate,
    },
    RemoteTrack {
        generation: u64,
        stream_id: String,
        kind: MediaKind,
    },
    /// Failed, disconnected or closed.
    Disconnected { generation: u64 },
}

impl TransportEvent {
    pub fn generation(&self) -> u64 {
        match self {
            TransportEvent::CandidateGenerated { generation, .. }
            | TransportEvent::RemoteTrack { generation, .. }
            | TransportEvent::Disconnected { generation } => *generation,
        }
    }
}

/// The peer connection itself. `create_offer`/`create_answer` also commit
/// the result as the local description.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn add_track(&self, track: &MediaTrack) -> Result<(), NegotiationError>;

    async fn create_offer(&self) -> Result<SessionDescription, NegotiationError>;

    async fn create_answer(&self) -> Result<SessionDescription, NegotiationError>;

    async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), NegotiationError>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), NegotiationError>;

    /// Stops transceivers and releases the connection.
    async fn close(&self) -> Result<(), NegotiationError>;
}

#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(
        &self,
        generation: u64,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>, NegotiationError>;
}
