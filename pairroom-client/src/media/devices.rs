use crate::error::DeviceError;
use crate::media::track::{DeviceHandle, EndedSignal};
use async_trait::async_trait;
use pairroom_core::{MediaConstraints, MediaKind};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// A track as a capture backend hands it over, before it is registered.
pub struct CapturedTrack {
    pub kind: MediaKind,
    pub label: String,
    pub device: Box<dyn DeviceHandle>,
    pub ended: EndedSignal,
}

/// Capture backend (camera/microphone access).
#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn open(&self, constraints: MediaConstraints) -> Result<Vec<CapturedTrack>, DeviceError>;
}

/// Backend without hardware: a silent microphone and a blank camera.
/// Used by the terminal client so calls negotiate real transceivers.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntheticDevices;

struct SyntheticDevice {
    label: String,
    released: AtomicBool,
}

impl DeviceHandle for SyntheticDevice {
    fn release(&self) {
        if !self.released.swap(true, Ordering::SeqCst) {
            debug!("Released synthetic device '{}'", self.label);
        }
    }
}

#[async_trait]
impl MediaDevices for SyntheticDevices {
    async fn open(&self, constraints: MediaConstraints) -> Result<Vec<CapturedTrack>, DeviceError> {
        let tracks = [
            (MediaKind::Audio, "synthetic microphone"),
            (MediaKind::Video, "synthetic camera"),
        ]
        .into_iter()
        .filter(|(kind, _)| constraints.wants(*kind))
        .map(|(kind, label)| CapturedTrack {
            kind,
            label: label.to_owned(),
            device: Box::new(SyntheticDevice {
                label: label.to_owned(),
                released: AtomicBool::new(false),
            }),
            ended: EndedSignal::new(),
        })
        .collect();

        Ok(tracks)
    }
}
