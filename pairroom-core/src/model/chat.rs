use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

/// One entry of the in-memory chat feed of a room session.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: UserId,
    pub sender_name: String,
    pub text: String,
    pub timestamp: u64,
}
