//! Channel queues and the playback primitive contract

pub mod channel;
pub mod clip;
pub mod manager;
pub mod recording;
pub mod service;
pub mod simulated;

pub use channel::{Channel, ChannelState};
pub use clip::{ClipHandle, ClipNotifier, PlaybackBackend};
pub use manager::ChannelQueueManager;
pub use recording::RecordingBackend;
pub use service::{QueueHandle, QueueService};
pub use simulated::SimulatedBackend;
