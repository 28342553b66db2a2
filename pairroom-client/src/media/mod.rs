mod devices;
mod manager;
mod track;

pub use devices::{CapturedTrack, MediaDevices, SyntheticDevices};
pub use manager::{ActiveCount, MediaResourceManager};
pub use track::{DeviceHandle, EndedSignal, MediaStream, MediaTrack, ReadyState};
