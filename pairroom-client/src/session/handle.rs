use crate::error::SessionError;
use crate::service::ServiceResult;
use crate::session::room_view::RoomView;
use crate::session::session_command::SessionCommand;
use pairroom_core::{RoomId, UserId};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::warn;

/// Caller-facing side of a room session. Cheap to clone; when the last
/// clone is dropped the controller leaves the room and exits.
#[derive(Clone)]
pub struct RoomSessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    view: watch::Receiver<RoomView>,
}

impl RoomSessionHandle {
    pub(crate) fn new(
        commands: mpsc::UnboundedSender<SessionCommand>,
        view: watch::Receiver<RoomView>,
    ) -> Self {
        Self { commands, view }
    }

    pub async fn join(
        &self,
        room_id: impl Into<RoomId>,
        token: impl Into<String>,
    ) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.request(SessionCommand::Join {
            room_id: room_id.into(),
            token: token.into(),
            reply,
        })?;
        rx.await.map_err(|_| SessionError::Stopped)?
    }

    /// Returns the new enabled flag, or `None` without a local audio track.
    pub async fn toggle_audio(&self) -> Result<Option<bool>, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.request(SessionCommand::ToggleAudio { reply })?;
        rx.await.map_err(|_| SessionError::Stopped)
    }

    pub async fn toggle_video(&self) -> Result<Option<bool>, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.request(SessionCommand::ToggleVideo { reply })?;
        rx.await.map_err(|_| SessionError::Stopped)
    }

    pub fn edit_code(&self, code: impl Into<String>) {
        self.notify(SessionCommand::EditCode { code: code.into() });
    }

    pub fn change_language(&self, language: impl Into<String>) {
        self.notify(SessionCommand::ChangeLanguage {
            language: language.into(),
        });
    }

    pub fn send_chat(&self, text: impl Into<String>) {
        self.notify(SessionCommand::SendChat { text: text.into() });
    }

    pub fn call(&self, target: impl Into<UserId>) {
        self.notify(SessionCommand::Call {
            target: target.into(),
        });
    }

    /// Fire-and-continue: teardown runs on the controller, this returns at once.
    pub fn leave(&self) {
        self.notify(SessionCommand::Leave);
    }

    pub async fn delete_room(&self) -> Result<ServiceResult<()>, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.request(SessionCommand::DeleteRoom { reply })?;
        rx.await.map_err(|_| SessionError::Stopped)
    }

    pub fn view(&self) -> RoomView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RoomView> {
        self.view.clone()
    }

    fn request(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .map_err(|_| SessionError::Stopped)
    }

    fn notify(&self, command: SessionCommand) {
        if self.commands.send(command).is_err() {
            warn!("Room session controller has stopped, command dropped");
        }
    }
}
