use async_trait::async_trait;
use dashmap::DashMap;
use pairroom_core::{Participant, UserId};

/// Maps the `?token=` of a connecting socket to the participant it speaks for.
#[async_trait]
pub trait TokenVerifier: Send + Sync + 'static {
    async fn verify(&self, token: &str) -> Option<Participant>;
}

/// Fixed token table, for deployments that hand out tokens out of band.
#[derive(Default)]
pub struct StaticTokens {
    tokens: DashMap<String, Participant>,
}

impl StaticTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, token: impl Into<String>, id: impl Into<UserId>, username: &str) -> Self {
        self.insert(token, Participant::new(id, username));
        self
    }

    pub fn insert(&self, token: impl Into<String>, participant: Participant) {
        self.tokens.insert(token.into(), participant);
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.tokens.remove(token).is_some()
    }
}

#[async_trait]
impl TokenVerifier for StaticTokens {
    async fn verify(&self, token: &str) -> Option<Participant> {
        self.tokens.get(token).map(|p| p.value().clone())
    }
}

/// Development mode: the token is the username and doubles as the user id.
pub struct UsernameTokens;

#[async_trait]
impl TokenVerifier for UsernameTokens {
    async fn verify(&self, token: &str) -> Option<Participant> {
        let name = token.trim();
        if name.is_empty() {
            return None;
        }
        Some(Participant::new(name, name))
    }
}
