use crate::peer::NegotiationState;
use pairroom_core::{RoomId, UserId};
use thiserror::Error;

/// Camera/microphone could not be opened.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeviceError {
    #[error("permission to use the media devices was denied")]
    PermissionDenied,
    #[error("no matching media device was found")]
    NotFound,
    #[error("media device unavailable: {0}")]
    Unavailable(String),
    #[error("capture request asked for neither audio nor video")]
    EmptyConstraints,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignalingError {
    #[error("relay rejected the authentication token")]
    Unauthorized,
    #[error("failed to connect to relay: {0}")]
    Connect(String),
    #[error("signaling channel closed")]
    Closed,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("peer transport error: {0}")]
    Transport(String),
    #[error("cannot {action} while {state}")]
    InvalidState {
        state: NegotiationState,
        action: &'static str,
    },
    #[error("already negotiating with {current}, ignoring {other}")]
    Busy { current: UserId, other: UserId },
    #[error("negotiation did not complete in time")]
    Timeout,
}

impl From<webrtc::Error> for NegotiationError {
    fn from(e: webrtc::Error) -> Self {
        NegotiationError::Transport(e.to_string())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("already in room {0}")]
    AlreadyJoined(RoomId),
    #[error("room session controller has stopped")]
    Stopped,
}
