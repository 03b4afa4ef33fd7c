//! Shared mocks for pipeline and admission tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use peerplay::{
    CodecDescriptor, EncodedFrame, FrameDecoder, MediaError, MediaKind, MediaResult,
    PlaybackError, PlaybackSink, RemoteAudioTrack, SampleBatch,
};
use tokio::sync::{mpsc, oneshot};

pub fn init_logs() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

pub fn audio_descriptor(mime_type: &str, clock_rate: u32, channels: u16) -> CodecDescriptor {
    CodecDescriptor {
        kind: MediaKind::Audio,
        mime_type: mime_type.to_string(),
        clock_rate,
        channels,
    }
}

pub fn video_descriptor(mime_type: &str) -> CodecDescriptor {
    CodecDescriptor {
        kind: MediaKind::Video,
        mime_type: mime_type.to_string(),
        clock_rate: 90000,
        channels: 0,
    }
}

pub fn frame(seq: u16) -> EncodedFrame {
    EncodedFrame {
        payload: Bytes::from(vec![0xFC; 64]),
        sequence_number: seq,
        timestamp: u32::from(seq) * 960,
    }
}

/// Track that replays a pre-scripted sequence of read results, then EOF.
pub struct ScriptedTrack {
    descriptor: CodecDescriptor,
    results: VecDeque<MediaResult<Option<EncodedFrame>>>,
    reads: Arc<AtomicUsize>,
}

impl ScriptedTrack {
    pub fn new(
        descriptor: CodecDescriptor,
        results: Vec<MediaResult<Option<EncodedFrame>>>,
    ) -> (Self, Arc<AtomicUsize>) {
        let reads = Arc::new(AtomicUsize::new(0));
        (
            Self {
                descriptor,
                results: results.into(),
                reads: Arc::clone(&reads),
            },
            reads,
        )
    }

    pub fn with_frames(descriptor: CodecDescriptor, count: u16) -> (Self, Arc<AtomicUsize>) {
        Self::new(descriptor, (0..count).map(|i| Ok(Some(frame(i)))).collect())
    }
}

#[async_trait]
impl RemoteAudioTrack for ScriptedTrack {
    fn descriptor(&self) -> CodecDescriptor {
        self.descriptor.clone()
    }

    async fn read_frame(&mut self) -> MediaResult<Option<EncodedFrame>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.results.pop_front().unwrap_or(Ok(None))
    }
}

/// Track fed live from a channel; the test decides when the stream ends.
pub struct ChannelTrack {
    descriptor: CodecDescriptor,
    rx: mpsc::Receiver<MediaResult<Option<EncodedFrame>>>,
    reads: Arc<AtomicUsize>,
}

impl ChannelTrack {
    pub fn new(
        descriptor: CodecDescriptor,
    ) -> (
        Self,
        mpsc::Sender<MediaResult<Option<EncodedFrame>>>,
        Arc<AtomicUsize>,
    ) {
        let (tx, rx) = mpsc::channel(32);
        let reads = Arc::new(AtomicUsize::new(0));
        (
            Self {
                descriptor,
                rx,
                reads: Arc::clone(&reads),
            },
            tx,
            reads,
        )
    }
}

#[async_trait]
impl RemoteAudioTrack for ChannelTrack {
    fn descriptor(&self) -> CodecDescriptor {
        self.descriptor.clone()
    }

    async fn read_frame(&mut self) -> MediaResult<Option<EncodedFrame>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.rx.recv().await.unwrap_or(Ok(None))
    }
}

/// Decoder that writes a fixed number of samples per channel, with an
/// optional scripted failure on one call.
pub struct FixedDecoder {
    samples_per_channel: usize,
    channels: usize,
    fail_on_call: Option<usize>,
    calls: usize,
}

impl FixedDecoder {
    pub fn new(samples_per_channel: usize, channels: usize) -> Self {
        Self {
            samples_per_channel,
            channels,
            fail_on_call: None,
            calls: 0,
        }
    }

    pub fn failing_on(samples_per_channel: usize, channels: usize, call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::new(samples_per_channel, channels)
        }
    }
}

impl FrameDecoder for FixedDecoder {
    fn decode(&mut self, _payload: &[u8], pcm: &mut [i16]) -> MediaResult<usize> {
        self.calls += 1;
        if self.fail_on_call == Some(self.calls) {
            return Err(MediaError::DecodeFailed {
                codec: "test".to_string(),
                reason: "scripted failure".to_string(),
            });
        }
        let total = self.samples_per_channel * self.channels;
        for (i, slot) in pcm.iter_mut().take(total).enumerate() {
            *slot = i as i16;
        }
        Ok(self.samples_per_channel)
    }
}

/// Test-side handles of a [`MockSink`].
pub struct MockSinkHandles {
    /// Receiving end of the sink's bounded intake
    pub batches: mpsc::Receiver<SampleBatch>,
    /// Fires the sink's one-shot error signal
    pub fail: oneshot::Sender<PlaybackError>,
    /// How many times `stop` ran
    pub stops: Arc<AtomicUsize>,
}

/// Playback sink double with a bounded intake and scripted error signal.
pub struct MockSink {
    intake_tx: mpsc::Sender<SampleBatch>,
    error_rx: Option<oneshot::Receiver<PlaybackError>>,
    stops: Arc<AtomicUsize>,
}

impl MockSink {
    pub fn with_capacity(capacity: usize) -> (Self, MockSinkHandles) {
        let (intake_tx, batches) = mpsc::channel(capacity);
        let (fail, error_rx) = oneshot::channel();
        let stops = Arc::new(AtomicUsize::new(0));
        (
            Self {
                intake_tx,
                error_rx: Some(error_rx),
                stops: Arc::clone(&stops),
            },
            MockSinkHandles {
                batches,
                fail,
                stops,
            },
        )
    }
}

impl PlaybackSink for MockSink {
    fn intake(&self) -> mpsc::Sender<SampleBatch> {
        self.intake_tx.clone()
    }

    fn error_signal(&mut self) -> oneshot::Receiver<PlaybackError> {
        self.error_rx.take().unwrap_or_else(|| {
            let (tx, rx) = oneshot::channel();
            std::mem::forget(tx);
            rx
        })
    }

    fn stop(&mut self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}
