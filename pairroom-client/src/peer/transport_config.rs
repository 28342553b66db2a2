use pairroom_core::IceServerConfig;
use pairroom_core::utils::{
    DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2, DEFAULT_STUN_ADDR_3, DEFAULT_STUN_ADDR_4,
};

/// WebRTC settings (STUN/TURN).
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig {
                urls: [
                    DEFAULT_STUN_ADDR,
                    DEFAULT_STUN_ADDR_2,
                    DEFAULT_STUN_ADDR_3,
                    DEFAULT_STUN_ADDR_4,
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
                username: None,
                credential: None,
            }],
        }
    }
}
