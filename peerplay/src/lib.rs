//! # peerplay
//!
//! peerplay receives one real-time audio stream from a peer media transport,
//! decodes it, and plays it out locally with bounded, backpressure-aware
//! buffering. Session negotiation and transport establishment stay outside;
//! this crate starts where the transport offers tracks.
//!
//! ## How it fits together
//!
//! Offers from the transport flow into [`admission`], which admits exactly the
//! audio/Opus tracks and spawns one independent [`pipeline`] task per admitted
//! track. Each task reads encoded frames in delivery order, decodes them into
//! a reused scratch buffer, copies each frame out into a fresh batch, and
//! hands the batch to a playback sink, racing the hand-off against the sink's
//! one-shot error signal so a failed output can never wedge the reader.
//!
//! ```rust,no_run
//! use peerplay::{route_to_speaker, PlaybackDefaults};
//! use peerplay_media::RemoteAudioTrack;
//! use tokio::sync::mpsc;
//!
//! # async fn example<T: RemoteAudioTrack + 'static>(offers: mpsc::Receiver<T>) {
//! route_to_speaker(offers, PlaybackDefaults::default()).await;
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export media types for easy access
pub use peerplay_media::{
    CodecDescriptor, CpalPlaybackSink, EncodedFrame, FrameDecoder, MediaError, MediaKind,
    MediaResult, OpusFrameDecoder, PcmFileSink, PlaybackError, PlaybackSink, RemoteAudioTrack,
    SampleBatch, SinkConfig,
};

// Public API modules
pub mod admission;
pub mod config;
pub mod pipeline;

// Re-export main API types
pub use admission::{admit, route_to_speaker, route_track_offers, AdmissionDecision, RejectReason};
pub use config::PlaybackDefaults;
pub use pipeline::{play_audio_track, run_track, StreamLayout};
