//! Track admission
//!
//! The transport layer offers tracks as peers start sending; admission
//! decides synchronously which ones enter the pipeline. Only audio tracks
//! carrying the one supported codec are admitted, and each admitted track
//! gets exactly one independent playback task. Decisions are final per offer;
//! rejected tracks are logged and never touched again.

use peerplay_media::{
    CodecDescriptor, CpalPlaybackSink, MediaKind, PlaybackError, PlaybackSink, RemoteAudioTrack,
    SinkConfig,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::PlaybackDefaults;
use crate::pipeline::play_audio_track;

/// The one codec this pipeline decodes
pub const SUPPORTED_AUDIO_CODEC: &str = "opus";

/// Retransmission marker codec; such tracks carry no playable media
pub const RETRANSMISSION_CODEC: &str = "rtx";

/// Outcome of an admission decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// Track enters the pipeline
    Admit,
    /// Track is discarded
    Reject(RejectReason),
}

/// Why a track offer was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Retransmission track, regardless of media kind
    Retransmission,
    /// Audio track with a codec this pipeline does not decode
    UnsupportedCodec,
    /// Not an audio track
    NotAudio,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::Retransmission => write!(f, "retransmission track"),
            RejectReason::UnsupportedCodec => write!(f, "unsupported audio codec"),
            RejectReason::NotAudio => write!(f, "not an audio track"),
        }
    }
}

/// Decide whether a track belongs in the pipeline.
///
/// Codec names compare case-insensitively; `audio/OPUS` and `audio/opus` are
/// the same track kind.
pub fn admit(descriptor: &CodecDescriptor) -> AdmissionDecision {
    let codec_name = descriptor.codec_name();

    if codec_name.eq_ignore_ascii_case(RETRANSMISSION_CODEC) {
        return AdmissionDecision::Reject(RejectReason::Retransmission);
    }

    match descriptor.kind {
        MediaKind::Audio if codec_name.eq_ignore_ascii_case(SUPPORTED_AUDIO_CODEC) => {
            AdmissionDecision::Admit
        }
        MediaKind::Audio => AdmissionDecision::Reject(RejectReason::UnsupportedCodec),
        _ => AdmissionDecision::Reject(RejectReason::NotAudio),
    }
}

/// Consume track offers and spawn one playback task per admitted track.
///
/// Sinks are opened through `open_sink`, once per admitted track, from the
/// resolved sink configuration. Runs until the offer stream closes; failures
/// inside one track's task never affect another's.
pub async fn route_track_offers<T, S, F>(
    mut offers: mpsc::Receiver<T>,
    defaults: PlaybackDefaults,
    open_sink: F,
) where
    T: RemoteAudioTrack + 'static,
    S: PlaybackSink + 'static,
    F: Fn(SinkConfig) -> Result<S, PlaybackError> + Clone + Send + 'static,
{
    while let Some(track) = offers.recv().await {
        let descriptor = track.descriptor();
        match admit(&descriptor) {
            AdmissionDecision::Admit => {
                info!(codec = %descriptor.codec_name(), "track admitted");
                let defaults = defaults.clone();
                let open_sink = open_sink.clone();
                tokio::spawn(async move {
                    play_audio_track(track, &defaults, open_sink).await;
                });
            }
            AdmissionDecision::Reject(reason) => {
                debug!(
                    kind = %descriptor.kind,
                    codec = %descriptor.codec_name(),
                    %reason,
                    "track rejected"
                );
            }
        }
    }
}

/// Route admitted tracks to the default speaker through [`CpalPlaybackSink`].
pub async fn route_to_speaker<T>(offers: mpsc::Receiver<T>, defaults: PlaybackDefaults)
where
    T: RemoteAudioTrack + 'static,
{
    route_track_offers(offers, defaults, CpalPlaybackSink::open).await;
}
