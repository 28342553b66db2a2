use anyhow::{Result, bail};
use colored::*;
use pairroom_relay::{RelayConfig, RelayServer, StaticTokens, TokenVerifier, UsernameTokens};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::warn;

pub async fn run(bind: SocketAddr, default_language: String, users: &[String]) -> Result<()> {
    let verifier = build_verifier(users)?;
    let config = RelayConfig {
        bind,
        default_language,
    };

    let server = RelayServer::bind(&config, verifier).await?;
    println!(
        "{} ws://{}/ws",
        "Relay listening on".green().bold(),
        server.local_addr()?
    );
    server.run().await
}

fn build_verifier(users: &[String]) -> Result<Arc<dyn TokenVerifier>> {
    if users.is_empty() {
        warn!("No --user given: every token is accepted as its own username");
        return Ok(Arc::new(UsernameTokens));
    }

    let tokens = StaticTokens::new();
    for entry in users {
        let mut parts = entry.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(token), Some(id), Some(name))
                if !token.is_empty() && !id.is_empty() && !name.is_empty() =>
            {
                tokens.insert(token, pairroom_core::Participant::new(id, name));
            }
            _ => bail!("Invalid --user '{}', expected TOKEN:ID:NAME", entry),
        }
    }
    Ok(Arc::new(tokens))
}
