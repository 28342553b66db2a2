use crate::model::room::RoomId;
use crate::model::user::{Participant, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
}

/// SDP blob in the shape browsers exchange: `{"type": "offer", "sdp": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default)]
    pub sdp_m_line_index: Option<u16>,
}

impl IceCandidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_m_line_index: None,
        }
    }
}

/// Frame a participant sends to the relay. Always scoped to exactly one room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalMessage {
    pub room_id: RoomId,
    #[serde(flatten)]
    pub payload: RoomPayload,
}

impl SignalMessage {
    pub fn new(room_id: RoomId, payload: RoomPayload) -> Self {
        Self { room_id, payload }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum RoomPayload {
    Join,
    Leave,
    VideoOffer {
        target_user_id: UserId,
        offer: SessionDescription,
    },
    VideoAnswer {
        target_user_id: UserId,
        answer: SessionDescription,
    },
    IceCandidate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_user_id: Option<UserId>,
        candidate: IceCandidate,
    },
    CodeChange {
        code: String,
    },
    LanguageChange {
        language: String,
    },
    ChatMessage {
        message: String,
    },
}

impl RoomPayload {
    pub fn event_name(&self) -> &'static str {
        match self {
            RoomPayload::Join => "join",
            RoomPayload::Leave => "leave",
            RoomPayload::VideoOffer { .. } => "video-offer",
            RoomPayload::VideoAnswer { .. } => "video-answer",
            RoomPayload::IceCandidate { .. } => "ice-candidate",
            RoomPayload::CodeChange { .. } => "code-change",
            RoomPayload::LanguageChange { .. } => "language-change",
            RoomPayload::ChatMessage { .. } => "chat-message",
        }
    }
}

/// Frame the relay sends to a participant.
///
/// `room_id` is absent only for connection-level events (`welcome`, and
/// `error` replies to frames that never reached a room).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
    #[serde(flatten)]
    pub payload: RelayPayload,
}

impl RelayEvent {
    pub fn in_room(room_id: RoomId, payload: RelayPayload) -> Self {
        Self {
            room_id: Some(room_id),
            payload,
        }
    }

    pub fn unscoped(payload: RelayPayload) -> Self {
        Self {
            room_id: None,
            payload,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum RelayPayload {
    Welcome {
        user: Participant,
    },
    UserJoined {
        user: Participant,
        message: String,
        timestamp: u64,
    },
    UserLeft {
        user_id: UserId,
        username: String,
        message: String,
        timestamp: u64,
    },
    SyncCode {
        code: String,
        language: String,
        users: Vec<Participant>,
    },
    CodeUpdate {
        code: String,
        user_id: UserId,
    },
    LanguageUpdate {
        language: String,
        username: String,
        message: String,
        timestamp: u64,
    },
    ChatMessage {
        user_id: UserId,
        username: String,
        message: String,
        timestamp: u64,
    },
    VideoOffer {
        user_id: UserId,
        username: String,
        offer: SessionDescription,
    },
    VideoAnswer {
        user_id: UserId,
        username: String,
        answer: SessionDescription,
    },
    IceCandidate {
        user_id: UserId,
        candidate: IceCandidate,
    },
    Error {
        message: String,
    },
}

impl RelayPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            RelayPayload::Welcome { .. } => EventKind::Welcome,
            RelayPayload::UserJoined { .. } => EventKind::UserJoined,
            RelayPayload::UserLeft { .. } => EventKind::UserLeft,
            RelayPayload::SyncCode { .. } => EventKind::SyncCode,
            RelayPayload::CodeUpdate { .. } => EventKind::CodeUpdate,
            RelayPayload::LanguageUpdate { .. } => EventKind::LanguageUpdate,
            RelayPayload::ChatMessage { .. } => EventKind::ChatMessage,
            RelayPayload::VideoOffer { .. } => EventKind::VideoOffer,
            RelayPayload::VideoAnswer { .. } => EventKind::VideoAnswer,
            RelayPayload::IceCandidate { .. } => EventKind::IceCandidate,
            RelayPayload::Error { .. } => EventKind::Error,
        }
    }
}

/// Key under which a participant registers its handler for relay events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Welcome,
    UserJoined,
    UserLeft,
    SyncCode,
    CodeUpdate,
    LanguageUpdate,
    ChatMessage,
    VideoOffer,
    VideoAnswer,
    IceCandidate,
    Error,
}

impl EventKind {
    pub const ALL: [EventKind; 11] = [
        EventKind::Welcome,
        EventKind::UserJoined,
        EventKind::UserLeft,
        EventKind::SyncCode,
        EventKind::CodeUpdate,
        EventKind::LanguageUpdate,
        EventKind::ChatMessage,
        EventKind::VideoOffer,
        EventKind::VideoAnswer,
        EventKind::IceCandidate,
        EventKind::Error,
    ];
}
