//! Media error types
//!
//! Errors raised while reading encoded frames from the transport and while
//! decoding them. Playback-sink faults have their own type in
//! [`crate::playback`] because they travel through the sink's one-shot error
//! signal rather than through return values.

use thiserror::Error;

/// Main error type for transport reads and codec operations
#[derive(Error, Debug)]
pub enum MediaError {
    /// I/O operation failed
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// Reading an encoded frame from the transport failed (non-EOF)
    #[error("Track read failed: {reason}")]
    TrackRead {
        /// Failure reason as reported by the transport
        reason: String,
    },

    /// Decoder construction failed
    #[error("Decoder initialization failed: {codec} - {reason}")]
    DecoderInit {
        /// Codec name
        codec: String,
        /// Failure reason
        reason: String,
    },

    /// Decoding a single frame failed
    #[error("Decoding failed: {codec} - {reason}")]
    DecodeFailed {
        /// Codec name
        codec: String,
        /// Failure reason
        reason: String,
    },

    /// Sample rate not supported by the decoder
    #[error("Unsupported sample rate: {rate}. Opus supports 8000, 12000, 16000, 24000, 48000")]
    UnsupportedSampleRate {
        /// Requested sample rate in Hz
        rate: u32,
    },

    /// Channel count not supported by the decoder
    #[error("Unsupported channel count: {channels}. Opus supports 1 or 2 channels")]
    UnsupportedChannelCount {
        /// Requested channel count
        channels: u16,
    },
}

/// Result type alias for media operations
pub type MediaResult<T> = Result<T, MediaError>;

impl MediaError {
    /// Whether the per-track pipeline may continue after this error.
    ///
    /// Only a single-frame decode failure is recoverable; everything else
    /// terminates the owning track's loop.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, MediaError::DecodeFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_failures_are_recoverable() {
        let err = MediaError::DecodeFailed {
            codec: "opus".to_string(),
            reason: "corrupted payload".to_string(),
        };
        assert!(err.is_recoverable());

        let err = MediaError::TrackRead {
            reason: "connection reset".to_string(),
        };
        assert!(!err.is_recoverable());
    }

    #[test]
    fn error_display() {
        let err = MediaError::UnsupportedChannelCount { channels: 6 };
        assert_eq!(
            err.to_string(),
            "Unsupported channel count: 6. Opus supports 1 or 2 channels"
        );
    }
}
