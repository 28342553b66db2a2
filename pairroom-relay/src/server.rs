use crate::auth::TokenVerifier;
use crate::relay_config::RelayConfig;
use crate::room::RoomManager;
use crate::signaling::{SignalingService, ws_handler};
use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub fn router(service: SignalingService) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .with_state(service)
}

async fn health() -> &'static str {
    "ok"
}

/// The relay bound to its listener, ready to serve.
pub struct RelayServer {
    listener: TcpListener,
    service: SignalingService,
}

impl RelayServer {
    pub async fn bind(config: &RelayConfig, verifier: Arc<dyn TokenVerifier>) -> Result<Self> {
        let listener = TcpListener::bind(config.bind)
            .await
            .with_context(|| format!("Failed to bind relay to {}", config.bind))?;
        let service = SignalingService::new(verifier, RoomManager::new(&config.default_language));

        Ok(Self { listener, service })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("Relay listener has no local address")
    }

    pub fn service(&self) -> &SignalingService {
        &self.service
    }

    pub async fn run(self) -> Result<()> {
        let addr = self.local_addr()?;
        info!("Signaling relay listening on ws://{}/ws", addr);

        axum::serve(self.listener, router(self.service))
            .await
            .context("Relay server stopped")
    }
}
