mod chat;
mod media;
mod room;
mod signaling;
mod user;

pub use chat::ChatMessage;
pub use media::{MediaConstraints, MediaKind};
pub use room::{NewRoom, RoomId, RoomRecord};
pub use signaling::{
    EventKind, IceCandidate, IceServerConfig, RelayEvent, RelayPayload, RoomPayload, SdpKind,
    SessionDescription, SignalMessage,
};
pub use user::{Participant, UserId};

/// Database-backed ids arrive as JSON numbers, relay-minted ones as strings.
pub(crate) fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    Ok(match <RawId as serde::Deserialize>::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}
