use pairroom_core::MediaKind;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Live,
    Ended,
}

/// Backend-side handle of an opened camera or microphone.
pub trait DeviceHandle: Send + Sync {
    /// Gives the hardware back. Called at most once per track.
    fn release(&self);
}

type EndCallback = Box<dyn FnOnce() + Send>;

/// Fired by a device backend when the hardware ends a track on its own
/// (unplugged camera, revoked permission). A stop requested by us never fires it.
#[derive(Clone, Default)]
pub struct EndedSignal {
    inner: Arc<EndedInner>,
}

#[derive(Default)]
struct EndedInner {
    fired: AtomicBool,
    callbacks: Mutex<Vec<EndCallback>>,
}

impl EndedSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fire(&self) {
        if self.inner.fired.swap(true, Ordering::SeqCst) {
            return;
        }
        let callbacks = std::mem::take(&mut *self.inner.callbacks.lock());
        for callback in callbacks {
            callback();
        }
    }

    pub fn is_fired(&self) -> bool {
        self.inner.fired.load(Ordering::SeqCst)
    }

    pub(crate) fn subscribe(&self, callback: EndCallback) {
        let mut callbacks = self.inner.callbacks.lock();
        if self.inner.fired.load(Ordering::SeqCst) {
            drop(callbacks);
            callback();
            return;
        }
        callbacks.push(callback);
    }
}

/// One captured audio or video track. Cloning shares the same underlying track.
#[derive(Clone)]
pub struct MediaTrack {
    inner: Arc<TrackInner>,
}

struct TrackInner {
    id: String,
    kind: MediaKind,
    label: String,
    stream_id: String,
    enabled: AtomicBool,
    ended: AtomicBool,
    device: Box<dyn DeviceHandle>,
    rtp: Arc<TrackLocalStaticSample>,
}

impl MediaTrack {
    pub(crate) fn new(
        stream_id: &str,
        kind: MediaKind,
        label: String,
        device: Box<dyn DeviceHandle>,
    ) -> Self {
        let id = Uuid::new_v4().to_string();
        let mime_type = match kind {
            MediaKind::Audio => MIME_TYPE_OPUS,
            MediaKind::Video => MIME_TYPE_VP8,
        };
        let rtp = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: mime_type.to_owned(),
                ..Default::default()
            },
            id.clone(),
            stream_id.to_owned(),
        ));

        Self {
            inner: Arc::new(TrackInner {
                id,
                kind,
                label,
                stream_id: stream_id.to_owned(),
                enabled: AtomicBool::new(true),
                ended: AtomicBool::new(false),
                device,
                rtp,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn kind(&self) -> MediaKind {
        self.inner.kind
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn stream_id(&self) -> &str {
        &self.inner.stream_id
    }

    pub fn ready_state(&self) -> ReadyState {
        if self.inner.ended.load(Ordering::SeqCst) {
            ReadyState::Ended
        } else {
            ReadyState::Live
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::SeqCst)
    }

    /// Mutes or unmutes without giving up the device.
    pub fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Track handed to the peer transport.
    pub fn rtp_track(&self) -> Arc<TrackLocalStaticSample> {
        self.inner.rtp.clone()
    }

    /// Ends the track and releases its device. Returns false if it had already ended.
    pub(crate) fn stop(&self) -> bool {
        if self.inner.ended.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.inner.device.release();
        true
    }

    /// The device went away by itself; nothing left to release.
    pub(crate) fn mark_ended(&self) -> bool {
        !self.inner.ended.swap(true, Ordering::SeqCst)
    }
}

impl fmt::Debug for MediaTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaTrack")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("label", &self.inner.label)
            .field("enabled", &self.is_enabled())
            .field("state", &self.ready_state())
            .finish()
    }
}

/// Tracks captured together by one acquisition.
#[derive(Debug, Clone)]
pub struct MediaStream {
    inner: Arc<StreamInner>,
}

#[derive(Debug)]
struct StreamInner {
    id: String,
    tracks: Vec<MediaTrack>,
}

impl MediaStream {
    pub(crate) fn new(id: String, tracks: Vec<MediaTrack>) -> Self {
        Self {
            inner: Arc::new(StreamInner { id, tracks }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.inner.tracks
    }

    pub fn track_of(&self, kind: MediaKind) -> Option<&MediaTrack> {
        self.inner.tracks.iter().find(|t| t.kind() == kind)
    }

    pub fn has(&self, kind: MediaKind) -> bool {
        self.track_of(kind).is_some()
    }
}
