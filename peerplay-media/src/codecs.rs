//! Codec interfaces and the Opus decode path
//!
//! The pipeline decodes through the [`FrameDecoder`] seam so the loop logic
//! stays independent of the concrete codec; [`OpusFrameDecoder`] is the one
//! supported implementation, backed by `audiopus`.

use audiopus::{coder::Decoder as OpusDecoder, Channels, SampleRate};

use crate::error::{MediaError, MediaResult};

/// Synchronous frame decoder bound to one sample rate and channel count
pub trait FrameDecoder: Send {
    /// Decode one encoded payload into `pcm` (interleaved by channel).
    ///
    /// Returns the number of decoded samples per channel; the decoder writes
    /// at most `pcm.len()` samples in total. A failure here is specific to
    /// this one frame and leaves the decoder usable for the next.
    fn decode(&mut self, payload: &[u8], pcm: &mut [i16]) -> MediaResult<usize>;
}

/// Opus decoder with real audiopus integration
#[derive(Debug)]
pub struct OpusFrameDecoder {
    decoder: OpusDecoder,
}

impl OpusFrameDecoder {
    /// Create an Opus decoder for the given sample rate and channel count.
    ///
    /// Fails for rates and channel counts Opus does not define; this is a
    /// setup failure, fatal to the owning track.
    pub fn new(sample_rate: u32, channels: u16) -> MediaResult<Self> {
        let rate = match sample_rate {
            8000 => SampleRate::Hz8000,
            12000 => SampleRate::Hz12000,
            16000 => SampleRate::Hz16000,
            24000 => SampleRate::Hz24000,
            48000 => SampleRate::Hz48000,
            other => return Err(MediaError::UnsupportedSampleRate { rate: other }),
        };

        let channels = match channels {
            1 => Channels::Mono,
            2 => Channels::Stereo,
            other => return Err(MediaError::UnsupportedChannelCount { channels: other }),
        };

        let decoder = OpusDecoder::new(rate, channels).map_err(|e| MediaError::DecoderInit {
            codec: "opus".to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { decoder })
    }
}

impl FrameDecoder for OpusFrameDecoder {
    fn decode(&mut self, payload: &[u8], pcm: &mut [i16]) -> MediaResult<usize> {
        self.decoder
            .decode(Some(payload), pcm, false)
            .map_err(|e| MediaError::DecodeFailed {
                codec: "opus".to_string(),
                reason: e.to_string(),
            })
    }
}
