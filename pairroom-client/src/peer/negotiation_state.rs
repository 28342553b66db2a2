use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NegotiationState {
    #[default]
    Idle,
    Gathering,
    OfferSent,
    OfferReceived,
    AnswerExchanged,
    Connected,
    Closed,
}

impl NegotiationState {
    /// An offer/answer round is under way but media has not arrived yet.
    pub fn is_negotiating(self) -> bool {
        matches!(
            self,
            NegotiationState::OfferSent
                | NegotiationState::OfferReceived
                | NegotiationState::AnswerExchanged
        )
    }

    pub fn can_start_call(self) -> bool {
        matches!(self, NegotiationState::Idle | NegotiationState::Gathering)
    }
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NegotiationState::Idle => "idle",
            NegotiationState::Gathering => "gathering",
            NegotiationState::OfferSent => "offer-sent",
            NegotiationState::OfferReceived => "offer-received",
            NegotiationState::AnswerExchanged => "answer-exchanged",
            NegotiationState::Connected => "connected",
            NegotiationState::Closed => "closed",
        };
        f.write_str(name)
    }
}
