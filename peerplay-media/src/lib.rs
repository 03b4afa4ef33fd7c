//! # peerplay media
//!
//! Media handling for peerplay: Opus frame decoding, interleaved PCM sample
//! conversion, and playback sinks that carry decoded audio to the host audio
//! output through a bounded intake queue.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod codecs;
pub mod error;
pub mod pcm;
pub mod playback;
pub mod tracks;

// Re-export main types
pub use codecs::{FrameDecoder, OpusFrameDecoder};
pub use error::{MediaError, MediaResult};
pub use pcm::interleaved_to_le_bytes;
pub use playback::{CpalPlaybackSink, PcmFileSink, PlaybackError, PlaybackSink, SinkConfig};
pub use tracks::{CodecDescriptor, EncodedFrame, MediaKind, RemoteAudioTrack, SampleBatch};
