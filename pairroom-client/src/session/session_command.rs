use crate::error::SessionError;
use crate::service::ServiceResult;
use pairroom_core::{RoomId, UserId};
use tokio::sync::oneshot;

/// Requests from `RoomSessionHandle` to the controller loop.
pub enum SessionCommand {
    Join {
        room_id: RoomId,
        token: String,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    ToggleAudio {
        reply: oneshot::Sender<Option<bool>>,
    },
    ToggleVideo {
        reply: oneshot::Sender<Option<bool>>,
    },
    EditCode {
        code: String,
    },
    ChangeLanguage {
        language: String,
    },
    SendChat {
        text: String,
    },
    Call {
        target: UserId,
    },
    Leave,
    DeleteRoom {
        reply: oneshot::Sender<ServiceResult<()>>,
    },
}
