//! Per-track decode-and-forward loop
//!
//! Each admitted track gets one task running [`play_audio_track`]: open a
//! playback sink, build an Opus decoder, then pull encoded frames off the
//! track in delivery order and forward decoded batches into the sink's
//! bounded intake. The hand-off races the sink's one-shot error signal —
//! the intake is bounded, so without the race a wedged sink would block the
//! loop forever and it could never observe the failure.

use peerplay_media::{
    CodecDescriptor, FrameDecoder, OpusFrameDecoder, PlaybackError, PlaybackSink,
    RemoteAudioTrack, SampleBatch, SinkConfig,
};
use tracing::{debug, error, info, warn};

use crate::config::PlaybackDefaults;

/// Longest frame duration Opus defines, used to pre-size the decode scratch
/// buffer.
const MAX_FRAME_DURATION_MS: usize = 120;

/// Effective sample rate and channel count for one track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamLayout {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of interleaved channels
    pub channels: u16,
}

impl StreamLayout {
    /// Resolve the layout for a track: the codec descriptor's fields win over
    /// the caller defaults when present and nonzero.
    pub fn resolve(defaults: &PlaybackDefaults, descriptor: &CodecDescriptor) -> Self {
        Self {
            sample_rate: if descriptor.clock_rate > 0 {
                descriptor.clock_rate
            } else {
                defaults.sample_rate
            },
            channels: if descriptor.channels > 0 {
                descriptor.channels
            } else {
                defaults.channels
            },
        }
    }

    /// Scratch size in samples for the largest decodable frame; degenerate
    /// rates fall back to ~20 ms worth.
    fn scratch_len(&self) -> usize {
        let mut per_channel = self.sample_rate as usize * MAX_FRAME_DURATION_MS / 1000;
        if per_channel == 0 {
            per_channel = self.sample_rate as usize / 50;
        }
        per_channel * self.channels as usize
    }
}

/// Play one admitted audio track until it ends or its sink fails.
///
/// Opens the sink through `open_sink` and builds the Opus decoder for the
/// resolved layout. Setup failures are reported once and abandon the track;
/// there are no retries. On every exit path the sink is torn down before the
/// task returns.
pub async fn play_audio_track<T, S, F>(track: T, defaults: &PlaybackDefaults, open_sink: F)
where
    T: RemoteAudioTrack,
    S: PlaybackSink,
    F: FnOnce(SinkConfig) -> Result<S, PlaybackError>,
{
    let descriptor = track.descriptor();
    let layout = StreamLayout::resolve(defaults, &descriptor);

    let sink_config = SinkConfig {
        device: defaults.device.clone(),
        sample_rate: layout.sample_rate,
        channels: layout.channels,
        target_latency: defaults.target_latency,
        link_name: defaults.link_name.clone(),
    };

    let sink = match open_sink(sink_config) {
        Ok(sink) => sink,
        Err(e) => {
            error!(error = %e, "failed to open playback sink, abandoning track");
            return;
        }
    };

    let decoder = match OpusFrameDecoder::new(layout.sample_rate, layout.channels) {
        Ok(decoder) => decoder,
        Err(e) => {
            error!(error = %e, "failed to create opus decoder, abandoning track");
            let mut sink = sink;
            sink.stop();
            return;
        }
    };

    info!(
        codec = %descriptor.codec_name(),
        rate = layout.sample_rate,
        channels = layout.channels,
        "starting audio playback"
    );

    run_track(track, decoder, sink, layout).await;
}

/// Run the steady-state loop for a track with an already-built decoder and
/// sink, then tear the sink down.
pub async fn run_track<T, D, S>(track: T, decoder: D, mut sink: S, layout: StreamLayout)
where
    T: RemoteAudioTrack,
    D: FrameDecoder,
    S: PlaybackSink,
{
    decode_and_forward(track, decoder, &mut sink, layout).await;
    sink.stop();
}

async fn decode_and_forward<T, D, S>(mut track: T, mut decoder: D, sink: &mut S, layout: StreamLayout)
where
    T: RemoteAudioTrack,
    D: FrameDecoder,
    S: PlaybackSink,
{
    let channels = layout.channels as usize;
    let mut scratch = vec![0i16; layout.scratch_len()];
    let intake = sink.intake();
    let mut errors = sink.error_signal();

    loop {
        let frame = match track.read_frame().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                debug!("track ended");
                return;
            }
            Err(e) => {
                error!(error = %e, "failed to read encoded frame");
                return;
            }
        };

        let sample_count = match decoder.decode(&frame.payload, &mut scratch) {
            Ok(count) => count,
            Err(e) => {
                // Single-frame decode failures are non-fatal.
                warn!(sequence = frame.sequence_number, error = %e, "skipping undecodable frame");
                continue;
            }
        };

        // Copy out before hand-off: the scratch buffer is reused next
        // iteration and must never reach the sink.
        let batch: SampleBatch = scratch[..sample_count * channels].to_vec();

        tokio::select! {
            sent = intake.send(batch) => {
                if sent.is_err() {
                    warn!("sink intake closed, stopping track");
                    return;
                }
            }
            signal = &mut errors => {
                match signal {
                    Ok(e) => error!(error = %e, "playback sink failed"),
                    Err(_) => debug!("playback sink shut down"),
                }
                return;
            }
        }
    }
}
