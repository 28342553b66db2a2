mod negotiation_state;
mod peer_session;
mod rtc_transport;
mod transport;
mod transport_config;

pub use negotiation_state::NegotiationState;
pub use peer_session::PeerSession;
pub use rtc_transport::{RtcTransport, RtcTransportFactory};
pub use transport::{PeerTransport, TransportEvent, TransportFactory};
pub use transport_config::TransportConfig;
