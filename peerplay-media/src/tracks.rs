//! Track abstractions and media frame types

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::MediaResult;

/// One batch of decoded linear audio, interleaved by channel.
///
/// Ownership transfers to the playback sink on a successful hand-off; the
/// producer must not touch the storage afterwards.
pub type SampleBatch = Vec<i16>;

/// Media kind carried by a track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Audio track
    Audio,
    /// Video track
    Video,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// Negotiated codec identity attached to a remote track
#[derive(Debug, Clone)]
pub struct CodecDescriptor {
    /// Media kind (audio/video)
    pub kind: MediaKind,
    /// Full MIME type, e.g. `audio/opus`
    pub mime_type: String,
    /// Negotiated clock rate in Hz; 0 when the transport left it unset
    pub clock_rate: u32,
    /// Negotiated channel count; 0 when the transport left it unset
    pub channels: u16,
}

impl CodecDescriptor {
    /// Codec name: the trailing segment of the MIME type.
    ///
    /// `audio/opus` resolves to `opus`; a bare name passes through unchanged.
    pub fn codec_name(&self) -> &str {
        self.mime_type
            .rsplit('/')
            .next()
            .unwrap_or(self.mime_type.as_str())
    }
}

/// One encoded media frame as delivered by the transport
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    /// Opaque encoded payload
    pub payload: Bytes,
    /// Transport sequence number
    pub sequence_number: u16,
    /// Media timestamp in clock-rate units
    pub timestamp: u32,
}

/// Read handle for one remote audio track.
///
/// Implemented over the transport library's track object. Frames arrive in
/// transport delivery order; gaps the transport dropped before delivery are
/// invisible here.
#[async_trait]
pub trait RemoteAudioTrack: Send {
    /// Codec identity negotiated for this track
    fn descriptor(&self) -> CodecDescriptor;

    /// Block until the next encoded frame arrives.
    ///
    /// `Ok(None)` signals a clean end of stream. Any `Err` is a fatal
    /// transport read failure for this track.
    async fn read_frame(&mut self) -> MediaResult<Option<EncodedFrame>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_name_strips_mime_prefix() {
        let desc = CodecDescriptor {
            kind: MediaKind::Audio,
            mime_type: "audio/opus".to_string(),
            clock_rate: 48000,
            channels: 2,
        };
        assert_eq!(desc.codec_name(), "opus");
    }

    #[test]
    fn codec_name_passes_bare_names_through() {
        let desc = CodecDescriptor {
            kind: MediaKind::Video,
            mime_type: "rtx".to_string(),
            clock_rate: 90000,
            channels: 0,
        };
        assert_eq!(desc.codec_name(), "rtx");
    }
}
