//! # Sample Converter
//!
//! Turns interleaved 16-bit signed little-endian PCM into one normalized
//! `f32` plane per channel.
//!
//! Every sample maps to `i16 / 32768.0`, so the output range is
//! `[-1.0, 1.0)`: `-32768` becomes exactly `-1.0` and `+1.0` is never
//! produced. Trailing bytes that do not complete a PCM frame are ignored.

/// Scale factor between a signed 16-bit sample and the unit range.
pub const S16_SCALE: f32 = 32768.0;

/// Bytes per 16-bit sample.
pub const BYTES_PER_SAMPLE: usize = 2;

/// Convert one little-endian sample.
#[inline]
pub fn s16le_to_f32(lo: u8, hi: u8) -> f32 {
    i16::from_le_bytes([lo, hi]) as f32 / S16_SCALE
}

/// Number of whole PCM frames in `len` bytes.
pub fn frames_in(len: usize, channels: usize) -> usize {
    if channels == 0 {
        return 0;
    }
    len / (channels * BYTES_PER_SAMPLE)
}

/// Deinterleave `bytes` into fresh per-channel planes.
///
/// Mono input of `n` bytes yields one plane of `n / 2` samples; stereo yields
/// two planes of `n / 4` samples (left, then right).
pub fn deinterleave(bytes: &[u8], channels: usize) -> Vec<Vec<f32>> {
    let mut planes = vec![Vec::new(); channels];
    deinterleave_into(bytes, &mut planes);
    planes
}

/// Deinterleave `bytes` into `planes`, reusing their allocations.
///
/// The channel count is `planes.len()`. Each plane is cleared first and
/// holds exactly one sample per whole frame afterwards. Returns the frame
/// count.
pub fn deinterleave_into(bytes: &[u8], planes: &mut [Vec<f32>]) -> usize {
    let channels = planes.len();
    let frames = frames_in(bytes.len(), channels);

    for plane in planes.iter_mut() {
        plane.clear();
        plane.reserve(frames);
    }

    if frames == 0 {
        return 0;
    }

    let frame_bytes = channels * BYTES_PER_SAMPLE;
    for frame in bytes[..frames * frame_bytes].chunks_exact(frame_bytes) {
        for (plane, sample) in planes.iter_mut().zip(frame.chunks_exact(BYTES_PER_SAMPLE)) {
            plane.push(s16le_to_f32(sample[0], sample[1]));
        }
    }

    frames
}
