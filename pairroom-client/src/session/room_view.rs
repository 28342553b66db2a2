use crate::peer::NegotiationState;
use pairroom_core::{ChatMessage, Participant, RoomId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionStatus {
    #[default]
    Idle,
    Joining,
    Joined,
    NotAuthenticated,
    Left,
}

/// Everything a UI renders for the current room. Published through a
/// `watch` channel by the controller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomView {
    pub status: SessionStatus,
    pub room_id: Option<RoomId>,
    pub name: String,
    pub description: String,
    pub code: String,
    pub language: String,
    /// A code edit is waiting for its debounce to elapse.
    pub saving: bool,
    pub chat: Vec<ChatMessage>,
    pub participants: Vec<Participant>,
    pub local_user: Option<Participant>,
    /// `None` while there is no local track of that kind.
    pub audio_enabled: Option<bool>,
    pub video_enabled: Option<bool>,
    /// Local media could not be acquired.
    pub video_off: bool,
    pub negotiation: NegotiationState,
    pub remote_stream: Option<String>,
    pub last_error: Option<String>,
}

impl RoomView {
    pub(crate) fn joining(room_id: RoomId, language: &str) -> Self {
        Self {
            status: SessionStatus::Joining,
            room_id: Some(room_id),
            language: language.to_owned(),
            ..Default::default()
        }
    }

    pub(crate) fn with_status(status: SessionStatus) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub(crate) fn upsert_participant(&mut self, participant: Participant) {
        match self
            .participants
            .iter_mut()
            .find(|p| p.id == participant.id)
        {
            Some(existing) => *existing = participant,
            None => self.participants.push(participant),
        }
    }
}
