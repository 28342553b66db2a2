use crate::error::SignalingError;
use async_trait::async_trait;
use pairroom_core::{RelayEvent, SignalMessage};
use tokio::sync::mpsc;

/// One live connection to the relay.
///
/// Dropping `outgoing` closes the connection; `incoming` yields `None` once
/// the relay side is gone.
pub struct RelayLink {
    pub outgoing: mpsc::UnboundedSender<SignalMessage>,
    pub incoming: mpsc::UnboundedReceiver<RelayEvent>,
}

#[async_trait]
pub trait RelayConnector: Send + Sync + 'static {
    async fn connect(&self, token: &str) -> Result<RelayLink, SignalingError>;
}
