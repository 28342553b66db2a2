use pairroom_client::NegotiationState;
use pairroom_core::{SessionDescription, UserId};

use super::{PeerFixture, local_stream};
use crate::integration::init_tracing;
use crate::utils::TransportCall;

#[tokio::test]
async fn test_lower_id_keeps_its_offer() {
    init_tracing();

    let mut fx = PeerFixture::new().await;
    fx.session.set_local_user(Some(UserId::from("alice")));
    fx.session
        .start_call(UserId::from("bob"))
        .await
        .expect("Failed to start call");
    let generation = fx.session.generation();

    fx.session
        .handle_remote_offer(UserId::from("bob"), SessionDescription::offer("v=0"))
        .await
        .expect("Colliding offer should be ignored, not fail");

    assert_eq!(fx.session.state(), NegotiationState::OfferSent);
    assert_eq!(fx.session.generation(), generation);
    assert_eq!(fx.transports.created_count(), 1);
    assert!(fx.signaling.answers().is_empty());
}

#[tokio::test]
async fn test_higher_id_yields_and_answers() {
    init_tracing();

    let mut fx = PeerFixture::new().await;
    let (_media, stream) = local_stream().await;
    fx.session.set_local_user(Some(UserId::from("carol")));
    fx.session
        .attach_local_tracks(stream.tracks())
        .await
        .expect("Failed to attach tracks");
    fx.session
        .start_call(UserId::from("bob"))
        .await
        .expect("Failed to start call");
    let first_generation = fx.session.generation();

    fx.session
        .handle_remote_offer(UserId::from("bob"), SessionDescription::offer("v=0"))
        .await
        .expect("Failed to yield to colliding offer");

    assert_eq!(fx.transports.created_count(), 2);
    assert_ne!(fx.session.generation(), first_generation);
    assert_eq!(fx.session.state(), NegotiationState::AnswerExchanged);

    let answers = fx.signaling.answers();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].0, UserId::from("bob"));

    let fresh = fx.transports.calls_for(fx.session.generation());
    assert_eq!(
        fresh
            .iter()
            .filter(|c| matches!(c, TransportCall::AddTrack(_)))
            .count(),
        2,
        "local tracks carried over to the new transport"
    );
}
