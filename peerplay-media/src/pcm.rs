//! Interleaved PCM sample conversion
//!
//! Playback sinks that speak to a byte-oriented host API serialize decoded
//! samples through here. The layout is fixed: little-endian, 2 bytes per
//! sample, no padding.

/// Convert interleaved 16-bit samples to their little-endian byte layout.
///
/// Total for any finite input; the output length is always exactly
/// `2 * samples.len()`.
pub fn interleaved_to_le_bytes(samples: &[i16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}
