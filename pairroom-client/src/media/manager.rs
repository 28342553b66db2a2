use crate::error::DeviceError;
use crate::media::devices::MediaDevices;
use crate::media::track::{EndedSignal, MediaStream, MediaTrack, ReadyState};
use dashmap::DashMap;
use pairroom_core::MediaConstraints;
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveCount {
    pub streams: usize,
    pub tracks: usize,
}

/// Process-wide registry of every stream acquired through it.
///
/// Anything registered here is released by `stop_all`, even if the code that
/// asked for it has already forgotten about it.
pub struct MediaResourceManager {
    devices: Arc<dyn MediaDevices>,
    registry: Arc<Registry>,
}

#[derive(Default)]
struct Registry {
    streams: DashMap<String, MediaStream>,
    tracks: DashMap<String, MediaTrack>,
}

impl MediaResourceManager {
    pub fn new(devices: Arc<dyn MediaDevices>) -> Self {
        Self {
            devices,
            registry: Arc::new(Registry::default()),
        }
    }

    /// Opens the requested devices and registers the resulting stream.
    /// Nothing is registered when the backend refuses.
    pub async fn acquire(&self, constraints: MediaConstraints) -> Result<MediaStream, DeviceError> {
        if constraints.is_empty() {
            return Err(DeviceError::EmptyConstraints);
        }

        let captured = self.devices.open(constraints).await?;
        if captured.is_empty() {
            return Err(DeviceError::NotFound);
        }

        let stream_id = Uuid::new_v4().to_string();
        let mut tracks = Vec::with_capacity(captured.len());
        let mut signals = Vec::with_capacity(captured.len());
        for c in captured {
            tracks.push(MediaTrack::new(&stream_id, c.kind, c.label, c.device));
            signals.push(c.ended);
        }

        let stream = MediaStream::new(stream_id.clone(), tracks);
        info!(
            "Registering media stream {} with {} tracks",
            stream_id,
            stream.tracks().len()
        );
        self.registry.streams.insert(stream_id, stream.clone());
        for (track, ended) in stream.tracks().iter().zip(signals) {
            self.registry
                .tracks
                .insert(track.id().to_owned(), track.clone());
            self.register_track_end_listener(track, ended);
        }

        Ok(stream)
    }

    /// Drops a track from the registry when its device ends it externally,
    /// and its stream once no track of it is live.
    fn register_track_end_listener(&self, track: &MediaTrack, ended: EndedSignal) {
        let registry: Weak<Registry> = Arc::downgrade(&self.registry);
        let track = track.clone();
        ended.subscribe(Box::new(move || {
            track.mark_ended();
            if let Some(registry) = registry.upgrade()
                && registry.tracks.remove(track.id()).is_some()
            {
                warn!("{} track '{}' ended by its device", track.kind(), track.label());
                let all_ended = |_: &String, stream: &MediaStream| {
                    stream
                        .tracks()
                        .iter()
                        .all(|t| t.ready_state() == ReadyState::Ended)
                };
                if registry.streams.remove_if(track.stream_id(), all_ended).is_some() {
                    info!("Media stream {} has no live tracks left", track.stream_id());
                }
            }
        }));
    }

    /// Stops every registered stream and track, then forgets them all.
    pub fn stop_all(&self) {
        let streams: Vec<MediaStream> = self
            .registry
            .streams
            .iter()
            .map(|e| e.value().clone())
            .collect();
        let tracks: Vec<MediaTrack> = self
            .registry
            .tracks
            .iter()
            .map(|e| e.value().clone())
            .collect();

        if streams.is_empty() && tracks.is_empty() {
            debug!("stop_all: no active media");
            return;
        }

        info!(
            "Stopping all active media: {} streams, {} tracks",
            streams.len(),
            tracks.len()
        );

        for stream in &streams {
            for track in stream.tracks() {
                if track.stop() {
                    info!("Stopped {} track ({})", track.kind(), track.label());
                }
            }
        }

        // Catches tracks whose stream entry is already gone.
        for track in &tracks {
            if track.stop() {
                info!("Force stopped {} track ({})", track.kind(), track.label());
            }
        }

        self.registry.streams.clear();
        self.registry.tracks.clear();
        info!("All media streams and tracks stopped");
    }

    /// Stops and unregisters a single stream.
    pub fn stop_stream(&self, stream: &MediaStream) {
        for track in stream.tracks() {
            if track.stop() {
                debug!("Stopped {} track ({})", track.kind(), track.label());
            }
            self.registry.tracks.remove(track.id());
        }
        if self.registry.streams.remove(stream.id()).is_some() {
            info!("Released media stream {}", stream.id());
        }
    }

    pub fn active_count(&self) -> ActiveCount {
        ActiveCount {
            streams: self.registry.streams.len(),
            tracks: self.registry.tracks.len(),
        }
    }
}
