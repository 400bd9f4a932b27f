//! # Sample Format Converter
//!
//! Converts symphonia's decoded buffers into the interleaved 16-bit
//! little-endian PCM the decode loop reads.

use symphonia::core::audio::{AudioBufferRef, SampleBuffer};
use std::collections::VecDeque;

/// Sample converter that renders decoded audio as s16le bytes.
///
/// Symphonia outputs audio in various formats (i16, i24, i32, f32, f64)
/// and planar layout. Everything is converted to interleaved `i16`
/// (saturating for float sources) and appended to a byte queue.
pub struct SampleConverter;

impl SampleConverter {
    /// Append `decoded` to `out` as interleaved s16le bytes.
    ///
    /// Returns the number of frames appended.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let decoded = decoder.decode(&packet)?;
    /// let frames = SampleConverter::append_s16le(decoded, &mut pending);
    /// ```
    pub fn append_s16le(decoded: AudioBufferRef<'_>, out: &mut VecDeque<u8>) -> usize {
        let frames = decoded.frames();
        if frames == 0 {
            return 0;
        }

        let spec = *decoded.spec();
        let mut buffer = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);

        Self::extend_le(buffer.samples(), out);
        frames
    }

    /// Append already-interleaved samples to `out` as little-endian bytes.
    pub fn extend_le(samples: &[i16], out: &mut VecDeque<u8>) {
        out.reserve(samples.len() * 2);
        for sample in samples {
            out.extend(sample.to_le_bytes());
        }
    }
}
