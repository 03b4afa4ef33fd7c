//! Playback sinks
//!
//! A playback sink owns one live connection to a host audio output. Decoded
//! sample batches enter through a bounded intake queue; fatal faults come back
//! on a one-shot error signal. The decode loop races its hand-off against that
//! signal, so a wedged output can never block a track's pipeline forever.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::pcm::interleaved_to_le_bytes;
use crate::tracks::SampleBatch;

/// Errors that can occur while opening or running a playback sink
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// Device not found or not available
    #[error("Device not found: {device}")]
    DeviceNotFound {
        /// Device name that was not found
        device: String,
    },

    /// Configuration not supported by the output
    #[error("Configuration not supported: {reason}")]
    ConfigurationNotSupported {
        /// Reason why the configuration is not supported
        reason: String,
    },

    /// Output stream error
    #[error("Playback stream error: {reason}")]
    StreamError {
        /// Reason for the stream error
        reason: String,
    },

    /// Hardware error
    #[error("Hardware error: {reason}")]
    HardwareError {
        /// Reason for the hardware error
        reason: String,
    },

    /// I/O failure on a byte-oriented sink target
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },
}

/// Immutable description of one playback target, fixed at sink construction
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Output device name or file path, sink-specific; `None` selects the
    /// default device
    pub device: Option<String>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of interleaved channels
    pub channels: u16,
    /// Target buffering latency of the output
    pub target_latency: Duration,
    /// Logical stream name, used for logging and thread naming
    pub link_name: String,
}

/// Contract every playback sink satisfies.
///
/// One sink handle is active per admitted track, owned and torn down by the
/// track's own task.
pub trait PlaybackSink: Send {
    /// Bounded intake for decoded sample batches.
    ///
    /// The queue depth is fixed when the sink is opened; sending to a full
    /// queue blocks the caller. Ownership of a batch transfers on success.
    fn intake(&self) -> mpsc::Sender<SampleBatch>;

    /// One-shot error signal.
    ///
    /// Fires with at most one error over the sink's lifetime, or resolves
    /// closed-without-error on graceful teardown. Meant to be taken once;
    /// later calls yield a receiver that never fires.
    fn error_signal(&mut self) -> oneshot::Receiver<PlaybackError>;

    /// Tear the sink down and release its resources. Safe to call once; never
    /// reports an error.
    fn stop(&mut self);
}

/// Intake queue depth: one slot per nominal 20 ms frame inside the latency
/// target, clamped to a sane range.
fn intake_depth(config: &SinkConfig) -> usize {
    (config.target_latency.as_millis() as usize / 20).clamp(2, 64)
}

/// Dead receiver for sinks whose error signal was already taken.
fn dead_error_signal() -> oneshot::Receiver<PlaybackError> {
    let (tx, rx) = oneshot::channel();
    // Leaking the sender keeps the receiver pending forever.
    std::mem::forget(tx);
    rx
}

type ErrorSlot = Arc<Mutex<Option<oneshot::Sender<PlaybackError>>>>;

/// Playback sink backed by a CPAL output stream.
///
/// The stream lives on a dedicated playback thread because CPAL streams do
/// not move between threads; an async drain task feeds the intake queue into
/// a bounded sample ring that the device callback consumes. Underruns play
/// silence.
pub struct CpalPlaybackSink {
    intake_tx: mpsc::Sender<SampleBatch>,
    error_rx: Option<oneshot::Receiver<PlaybackError>>,
    stop_tx: Option<std::sync::mpsc::Sender<()>>,
    playback_thread: Option<std::thread::JoinHandle<()>>,
    drain_task: Option<tokio::task::JoinHandle<()>>,
}

impl CpalPlaybackSink {
    /// Open a connection to the host audio output described by `config`.
    ///
    /// Errors here are non-retryable from the pipeline's perspective; the
    /// owning track is abandoned.
    pub fn open(config: SinkConfig) -> Result<Self, PlaybackError> {
        let depth = intake_depth(&config);
        let (intake_tx, mut intake_rx) = mpsc::channel::<SampleBatch>(depth);
        let (error_tx, error_rx) = oneshot::channel();
        let error_slot: ErrorSlot = Arc::new(Mutex::new(Some(error_tx)));

        // Ring sized to a few multiples of the latency target so the drain
        // task, not the device callback, absorbs scheduling jitter.
        let latency_ms = config.target_latency.as_millis().max(20) as usize;
        let ring_capacity =
            (config.sample_rate as usize * config.channels as usize * latency_ms * 4 / 1000)
                .max(1024);
        let ring = Arc::new(Mutex::new(VecDeque::<i16>::with_capacity(ring_capacity)));

        let (setup_tx, setup_rx) = std::sync::mpsc::channel();
        let (stop_tx, stop_rx) = std::sync::mpsc::channel::<()>();

        let thread_config = config.clone();
        let thread_ring = Arc::clone(&ring);
        let thread_errors = Arc::clone(&error_slot);
        let playback_thread = std::thread::Builder::new()
            .name(format!("{}-playback", config.link_name))
            .spawn(move || {
                playback_thread_main(thread_config, thread_ring, thread_errors, setup_tx, stop_rx)
            })
            .map_err(|e| PlaybackError::StreamError {
                reason: format!("Failed to spawn playback thread: {}", e),
            })?;

        // The thread reports exactly once whether the stream came up.
        match setup_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = playback_thread.join();
                return Err(e);
            }
            Err(_) => {
                return Err(PlaybackError::StreamError {
                    reason: "Playback thread exited during setup".to_string(),
                });
            }
        }

        debug!(
            stream = %config.link_name,
            rate = config.sample_rate,
            channels = config.channels,
            "opened cpal playback sink"
        );

        let drain_ring = Arc::clone(&ring);
        let drain_task = tokio::spawn(async move {
            while let Some(batch) = intake_rx.recv().await {
                loop {
                    {
                        let mut ring = drain_ring.lock();
                        if ring.len() + batch.len() <= ring_capacity {
                            ring.extend(batch.iter().copied());
                            break;
                        }
                    }
                    // Ring full: wait for the device callback to make room.
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            }
        });

        Ok(Self {
            intake_tx,
            error_rx: Some(error_rx),
            stop_tx: Some(stop_tx),
            playback_thread: Some(playback_thread),
            drain_task: Some(drain_task),
        })
    }
}

impl PlaybackSink for CpalPlaybackSink {
    fn intake(&self) -> mpsc::Sender<SampleBatch> {
        self.intake_tx.clone()
    }

    fn error_signal(&mut self) -> oneshot::Receiver<PlaybackError> {
        self.error_rx.take().unwrap_or_else(dead_error_signal)
    }

    fn stop(&mut self) {
        // Dropping the stop sender unblocks the playback thread, which drops
        // the stream and releases the device.
        if let Some(stop_tx) = self.stop_tx.take() {
            drop(stop_tx);
        }
        if let Some(thread) = self.playback_thread.take() {
            let _ = thread.join();
        }
        if let Some(task) = self.drain_task.take() {
            task.abort();
        }
    }
}

/// Owns the CPAL stream for one sink's lifetime.
fn playback_thread_main(
    config: SinkConfig,
    ring: Arc<Mutex<VecDeque<i16>>>,
    errors: ErrorSlot,
    setup_tx: std::sync::mpsc::Sender<Result<(), PlaybackError>>,
    stop_rx: std::sync::mpsc::Receiver<()>,
) {
    let stream = match open_output_stream(&config, ring, errors) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = setup_tx.send(Err(e));
            return;
        }
    };

    if setup_tx.send(Ok(())).is_err() {
        return;
    }

    // Park until the sink is stopped; recv errors when the sender drops.
    let _ = stop_rx.recv();
    drop(stream);
    debug!(stream = %config.link_name, "playback stream released");
}

fn open_output_stream(
    config: &SinkConfig,
    ring: Arc<Mutex<VecDeque<i16>>>,
    errors: ErrorSlot,
) -> Result<cpal::Stream, PlaybackError> {
    let host = cpal::default_host();

    let device = if let Some(device_name) = &config.device {
        host.output_devices()
            .map_err(|e| PlaybackError::HardwareError {
                reason: format!("Failed to enumerate devices: {}", e),
            })?
            .find(|d| d.name().map(|n| n == *device_name).unwrap_or(false))
            .ok_or_else(|| PlaybackError::DeviceNotFound {
                device: device_name.clone(),
            })?
    } else {
        host.default_output_device()
            .ok_or_else(|| PlaybackError::DeviceNotFound {
                device: "default output device".to_string(),
            })?
    };

    let supported_config =
        device
            .default_output_config()
            .map_err(|e| PlaybackError::ConfigurationNotSupported {
                reason: format!("Failed to get default output config: {}", e),
            })?;

    let latency_ms = config.target_latency.as_millis().max(1) as u32;
    let buffer_frames = (config.sample_rate / 1000 * latency_ms).max(64);
    let stream_config = cpal::StreamConfig {
        channels: config.channels as cpal::ChannelCount,
        sample_rate: cpal::SampleRate(config.sample_rate),
        buffer_size: cpal::BufferSize::Fixed(buffer_frames),
    };

    let make_err_fn = || {
        let errors = Arc::clone(&errors);
        move |err: cpal::StreamError| {
            // The signal is one-shot; later stream errors are dropped.
            if let Some(tx) = errors.lock().take() {
                let _ = tx.send(PlaybackError::StreamError {
                    reason: err.to_string(),
                });
            }
        }
    };

    let stream = match supported_config.sample_format() {
        cpal::SampleFormat::I16 => device.build_output_stream(
            &stream_config,
            {
                let ring = Arc::clone(&ring);
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    let mut ring = ring.lock();
                    for slot in data.iter_mut() {
                        *slot = ring.pop_front().unwrap_or(0);
                    }
                }
            },
            make_err_fn(),
            None,
        ),
        cpal::SampleFormat::F32 => device.build_output_stream(
            &stream_config,
            {
                let ring = Arc::clone(&ring);
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut ring = ring.lock();
                    for slot in data.iter_mut() {
                        *slot = ring
                            .pop_front()
                            .map(|s| s as f32 / 32767.0)
                            .unwrap_or(0.0);
                    }
                }
            },
            make_err_fn(),
            None,
        ),
        sample_format => {
            return Err(PlaybackError::ConfigurationNotSupported {
                reason: format!("Unsupported sample format: {:?}", sample_format),
            });
        }
    }
    .map_err(|e| PlaybackError::StreamError {
        reason: format!("Failed to build output stream: {}", e),
    })?;

    stream.play().map_err(|e| PlaybackError::StreamError {
        reason: format!("Failed to start stream: {}", e),
    })?;

    Ok(stream)
}

/// Playback sink that appends raw s16le PCM to a file or pipe.
///
/// The `device` field of the config is the output path. Useful for routing
/// decoded audio into byte-oriented tools (`pacat`, `aplay -f S16_LE`).
pub struct PcmFileSink {
    intake_tx: mpsc::Sender<SampleBatch>,
    error_rx: Option<oneshot::Receiver<PlaybackError>>,
}

impl PcmFileSink {
    /// Open the sink, creating (or truncating) the target file.
    pub fn open(config: SinkConfig) -> Result<Self, PlaybackError> {
        let path = config
            .device
            .clone()
            .ok_or_else(|| PlaybackError::ConfigurationNotSupported {
                reason: "PCM file sink requires an output path".to_string(),
            })?;

        let file = std::fs::File::create(&path)?;
        let mut file = tokio::fs::File::from_std(file);

        let depth = intake_depth(&config);
        let (intake_tx, mut intake_rx) = mpsc::channel::<SampleBatch>(depth);
        let (error_tx, error_rx) = oneshot::channel();

        let link_name = config.link_name.clone();
        tokio::spawn(async move {
            let mut error_tx = Some(error_tx);
            while let Some(batch) = intake_rx.recv().await {
                let bytes = interleaved_to_le_bytes(&batch);
                if let Err(e) = file.write_all(&bytes).await {
                    warn!(stream = %link_name, error = %e, "pcm sink write failed");
                    if let Some(tx) = error_tx.take() {
                        let _ = tx.send(PlaybackError::Io { source: e });
                    }
                    return;
                }
            }
            let _ = file.flush().await;
            debug!(stream = %link_name, "pcm sink drained and closed");
        });

        Ok(Self {
            intake_tx,
            error_rx: Some(error_rx),
        })
    }
}

impl PlaybackSink for PcmFileSink {
    fn intake(&self) -> mpsc::Sender<SampleBatch> {
        self.intake_tx.clone()
    }

    fn error_signal(&mut self) -> oneshot::Receiver<PlaybackError> {
        self.error_rx.take().unwrap_or_else(dead_error_signal)
    }

    fn stop(&mut self) {
        // Swap our intake handle for a closed one; the writer drains what is
        // left once every producer clone is gone, then flushes and exits.
        let (closed_tx, _) = mpsc::channel(1);
        self.intake_tx = closed_tx;
    }
}
