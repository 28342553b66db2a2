use crate::error::SignalingError;
use crate::signaling::connector::{RelayConnector, RelayLink};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use pairroom_core::{RelayEvent, SignalMessage};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, error, warn};
use url::Url;

/// Connects to the relay's WebSocket endpoint, passing the token as `?token=`.
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl RelayConnector for WsConnector {
    async fn connect(&self, token: &str) -> Result<RelayLink, SignalingError> {
        let mut url = Url::parse(&self.url).map_err(|e| SignalingError::Connect(e.to_string()))?;
        url.query_pairs_mut().append_pair("token", token);

        let (ws_stream, _) = match connect_async(url.as_str()).await {
            Ok(pair) => pair,
            Err(WsError::Http(response)) if response.status().as_u16() == 401 => {
                return Err(SignalingError::Unauthorized);
            }
            Err(e) => return Err(SignalingError::Connect(e.to_string())),
        };
        debug!("WebSocket connected to {}", self.url);

        let (mut sender, mut receiver) = ws_stream.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<SignalMessage>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<RelayEvent>();

        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to serialize {} frame: {}", msg.payload.event_name(), e);
                        continue;
                    }
                };
                if sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            let _ = sender.close().await;
        });

        tokio::spawn(async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<RelayEvent>(&text) {
                        Ok(event) => {
                            if in_tx.send(event).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Unparseable relay frame: {}. Text: {}", e, text),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            debug!("Relay stream ended");
        });

        Ok(RelayLink {
            outgoing: out_tx,
            incoming: in_rx,
        })
    }
}
