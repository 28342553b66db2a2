pub use pairroom_core::model::{Participant, RoomId, UserId};

pub mod model {
    pub use pairroom_core::model::*;
}

pub mod utils {
    pub use pairroom_core::utils::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use pairroom_client::*;
}

#[cfg(feature = "relay")]
pub mod relay {
    pub use pairroom_relay::*;
}
