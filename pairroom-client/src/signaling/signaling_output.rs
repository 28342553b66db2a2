use pairroom_core::{IceCandidate, SessionDescription, UserId};

/// Where a peer session sends its negotiation frames.
pub trait SignalingOutput: Send + Sync {
    fn send_offer(&self, target: &UserId, offer: SessionDescription);

    fn send_answer(&self, target: &UserId, answer: SessionDescription);

    /// `None` addresses everyone else in the room.
    fn send_ice(&self, target: Option<&UserId>, candidate: IceCandidate);
}
