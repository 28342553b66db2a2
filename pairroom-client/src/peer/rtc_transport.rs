use crate::error::NegotiationError;
use crate::media::MediaTrack;
use crate::peer::transport::{PeerTransport, TransportEvent, TransportFactory};
use crate::peer::transport_config::TransportConfig;
use async_trait::async_trait;
use pairroom_core::{IceCandidate, MediaKind, SdpKind, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// webrtc-rs peer connection. Callbacks are turned into `TransportEvent`s
/// on the controller's channel.
pub struct RtcTransport {
    generation: u64,
    peer_connection: Arc<RTCPeerConnection>,
}

impl RtcTransport {
    pub async fn new(
        generation: u64,
        config: &TransportConfig,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Self, NegotiationError> {
        // 1. Codecs and interceptors (RTCP reports, NACK)
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        // 2. ICE servers (STUN/TURN)
        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        // A. Connection state
        let state_tx = event_tx.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();

                Box::pin(async move {
                    info!("Peer connection state changed (generation {}): {:?}", generation, s);
                    match s {
                        RTCPeerConnectionState::Failed
                        | RTCPeerConnectionState::Disconnected
                        | RTCPeerConnectionState::Closed => {
                            let _ = tx.send(TransportEvent::Disconnected { generation }).await;
                        }
                        _ => {}
                    }
                })
            },
        ));

        // B. Trickle ICE: local candidates go out one by one
        let ice_tx = event_tx.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                };
                let _ = tx
                    .send(TransportEvent::CandidateGenerated {
                        generation,
                        candidate,
                    })
                    .await;
            })
        }));

        // C. Remote media
        let track_tx = event_tx;
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>, _: Arc<RTCRtpReceiver>, _: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();

                Box::pin(async move {
                    let kind = match track.kind() {
                        RTPCodecType::Audio => MediaKind::Audio,
                        _ => MediaKind::Video,
                    };
                    let stream_id = track.stream_id();
                    debug!("Remote {} track on stream '{}'", kind, stream_id);
                    let _ = tx
                        .send(TransportEvent::RemoteTrack {
                            generation,
                            stream_id,
                            kind,
                        })
                        .await;
                })
            },
        ));

        Ok(Self {
            generation,
            peer_connection,
        })
    }
}

#[async_trait]
impl PeerTransport for RtcTransport {
    async fn add_track(&self, track: &MediaTrack) -> Result<(), NegotiationError> {
        let local: Arc<dyn TrackLocal + Send + Sync> = track.rtp_track();
        self.peer_connection.add_track(local).await?;
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription, NegotiationError> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription, NegotiationError> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), NegotiationError> {
        let desc = match description.kind {
            SdpKind::Offer => RTCSessionDescription::offer(description.sdp)?,
            SdpKind::Answer => RTCSessionDescription::answer(description.sdp)?,
        };
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), NegotiationError> {
        self.peer_connection
            .add_ice_candidate(RTCIceCandidateInit {
                candidate: candidate.candidate,
                sdp_mid: candidate.sdp_mid,
                sdp_mline_index: candidate.sdp_m_line_index,
                ..Default::default()
            })
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), NegotiationError> {
        for transceiver in self.peer_connection.get_transceivers().await {
            if let Err(e) = transceiver.stop().await {
                warn!("Failed to stop transceiver: {}", e);
            }
        }
        self.peer_connection.close().await?;
        debug!("Peer connection closed (generation {})", self.generation);
        Ok(())
    }
}

pub struct RtcTransportFactory {
    config: TransportConfig,
}

impl RtcTransportFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl TransportFactory for RtcTransportFactory {
    async fn create(
        &self,
        generation: u64,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>, NegotiationError> {
        let transport = RtcTransport::new(generation, &self.config, events).await?;
        Ok(Arc::new(transport))
    }
}
