pub mod auth;
pub mod relay_config;
pub mod room;
pub mod server;
pub mod signaling;

pub use auth::*;
pub use relay_config::*;
pub use room::*;
pub use server::*;
pub use signaling::*;
