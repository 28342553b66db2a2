use async_trait::async_trait;
use pairroom_client::{MediaTrack, NegotiationError, PeerTransport, TransportEvent, TransportFactory};
use pairroom_core::{IceCandidate, MediaKind, SdpKind, SessionDescription};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    AddTrack(MediaKind),
    CreateOffer,
    CreateAnswer,
    SetRemote(SdpKind),
    AddCandidate(String),
    Close,
}

type CallLog = Arc<Mutex<Vec<(u64, TransportCall)>>>;

/// Records every call made on the transports it creates.
#[derive(Clone)]
pub struct MockTransportFactory {
    inner: Arc<FactoryInner>,
}

struct FactoryInner {
    calls: CallLog,
    created: Mutex<Vec<(u64, mpsc::Sender<TransportEvent>)>>,
    fail_answers: AtomicBool,
}

struct MockTransport {
    generation: u64,
    calls: CallLog,
    fail_answers: bool,
}

impl MockTransport {
    fn record(&self, call: TransportCall) {
        self.calls.lock().unwrap().push((self.generation, call));
    }
}

impl MockTransportFactory {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(FactoryInner {
                calls: Arc::new(Mutex::new(Vec::new())),
                created: Mutex::new(Vec::new()),
                fail_answers: AtomicBool::new(false),
            }),
        }
    }

    /// Transports created from now on fail `create_answer`.
    pub fn failing_answers() -> Self {
        let factory = Self::new();
        factory.inner.fail_answers.store(true, Ordering::SeqCst);
        factory
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.inner
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, c)| c.clone())
            .collect()
    }

    pub fn calls_for(&self, generation: u64) -> Vec<TransportCall> {
        self.inner
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(g, _)| *g == generation)
            .map(|(_, c)| c.clone())
            .collect()
    }

    pub fn created_count(&self) -> usize {
        self.inner.created.lock().unwrap().len()
    }

    pub fn latest_generation(&self) -> Option<u64> {
        self.inner.created.lock().unwrap().last().map(|(g, _)| *g)
    }

    /// Pushes an event as if the newest transport had produced it.
    pub async fn emit_latest<F>(&self, make: F) -> bool
    where
        F: FnOnce(u64) -> TransportEvent,
    {
        let latest = self.inner.created.lock().unwrap().last().cloned();
        match latest {
            Some((generation, tx)) => tx.send(make(generation)).await.is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl TransportFactory for MockTransportFactory {
    async fn create(
        &self,
        generation: u64,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>, NegotiationError> {
        self.inner
            .created
            .lock()
            .unwrap()
            .push((generation, events));
        Ok(Arc::new(MockTransport {
            generation,
            calls: self.inner.calls.clone(),
            fail_answers: self.inner.fail_answers.load(Ordering::SeqCst),
        }))
    }
}

#[async_trait]
impl PeerTransport for MockTransport {
    async fn add_track(&self, track: &MediaTrack) -> Result<(), NegotiationError> {
        self.record(TransportCall::AddTrack(track.kind()));
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription, NegotiationError> {
        self.record(TransportCall::CreateOffer);
        Ok(SessionDescription::offer(format!("offer-{}", self.generation)))
    }

    async fn create_answer(&self) -> Result<SessionDescription, NegotiationError> {
        self.record(TransportCall::CreateAnswer);
        if self.fail_answers {
            return Err(NegotiationError::Transport("answer refused".to_string()));
        }
        Ok(SessionDescription::answer(format!("answer-{}", self.generation)))
    }

    async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), NegotiationError> {
        self.record(TransportCall::SetRemote(description.kind));
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), NegotiationError> {
        self.record(TransportCall::AddCandidate(candidate.candidate));
        Ok(())
    }

    async fn close(&self) -> Result<(), NegotiationError> {
        self.record(TransportCall::Close);
        Ok(())
    }
}
