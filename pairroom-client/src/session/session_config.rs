use pairroom_core::MediaConstraints;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub constraints: MediaConstraints,
    /// Quiet period before a code edit is broadcast and persisted.
    pub code_debounce: Duration,
    /// How long an offer/answer round may take to deliver remote media.
    pub negotiation_timeout: Duration,
    /// Offer to participants that join after us.
    pub auto_call: bool,
    /// Bound on the room fetch and the first relay connect while joining.
    pub join_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            constraints: MediaConstraints::default(),
            code_debounce: Duration::from_secs(1),
            negotiation_timeout: Duration::from_secs(30),
            auto_call: true,
            join_timeout: Duration::from_secs(10),
        }
    }
}
