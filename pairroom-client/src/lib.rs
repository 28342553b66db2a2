pub mod error;
pub mod media;
pub mod peer;
pub mod service;
pub mod session;
pub mod signaling;

pub use error::*;
pub use media::*;
pub use peer::*;
pub use service::*;
pub use session::*;
pub use signaling::*;
