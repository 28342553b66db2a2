use pairroom_core::utils::DEFAULT_LANGUAGE;
use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind: SocketAddr,
    /// Language a room reports in `sync-code` until someone changes it.
    pub default_language: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
            default_language: DEFAULT_LANGUAGE.to_owned(),
        }
    }
}
