mod controller;
mod handle;
mod navigator;
mod room_view;
mod session_command;
mod session_config;

pub use controller::{RoomSessionController, SessionDeps};
pub use handle::RoomSessionHandle;
pub use navigator::{LogNavigator, Navigator, Route};
pub use room_view::{RoomView, SessionStatus};
pub use session_command::SessionCommand;
pub use session_config::SessionConfig;
