//! Configuration types and defaults

use std::time::Duration;

/// Caller-supplied playback defaults.
///
/// The sample rate and channel count are fallbacks: a track's own codec
/// descriptor overrides them when its fields are present and nonzero.
#[derive(Debug, Clone)]
pub struct PlaybackDefaults {
    /// Fallback sample rate in Hz
    pub sample_rate: u32,
    /// Fallback channel count
    pub channels: u16,
    /// Target buffering latency of the playback output
    pub target_latency: Duration,
    /// Output device name or file path; `None` selects the default device
    pub device: Option<String>,
    /// Logical stream name, used for logging and output stream naming
    pub link_name: String,
}

impl Default for PlaybackDefaults {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 2,
            target_latency: Duration::from_millis(20),
            device: None,
            link_name: "peerplay".to_string(),
        }
    }
}
