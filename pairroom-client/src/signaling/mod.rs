mod channel;
mod channel_config;
mod connector;
mod signaling_output;
mod ws_connector;

pub use channel::{ConnectionState, EventHandler, SignalingChannel};
pub use channel_config::{ChannelConfig, ReconnectPolicy};
pub use connector::{RelayConnector, RelayLink};
pub use signaling_output::SignalingOutput;
pub use ws_connector::WsConnector;
