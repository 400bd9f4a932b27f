//! # Core Decode Traits
//!
//! This module defines the seam between the decode pipeline and the bitstream
//! decoder library. The pipeline never touches a codec directly: it asks a
//! [`DecoderLibrary`] for a [`DecoderHandle`], drives it through the probe
//! steps, and then pulls raw 16-bit PCM out of it with [`DecoderHandle::read`].
//!
//! ## Architecture
//!
//! ```text
//! DecoderLibrary ──new_handle──▶ DecoderHandle ──read──▶ s16le bytes ──▶ converter
//!        ▲                              │
//!   LibraryLifecycle             open / format / lock_format / length
//! ```
//!
//! The symphonia-backed implementation lives in [`crate::decoder`]. Tests use
//! counting stubs to observe init / exit / close calls.

use crate::config::DecodeConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

// ============================================================================
// Stream Format Types
// ============================================================================

/// PCM sample encoding reported by the decoder at format query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleEncoding {
    /// 16-bit signed, little-endian. The only encoding the pipeline accepts.
    Signed16,
    /// 24-bit signed
    Signed24,
    /// 32-bit signed
    Signed32,
    /// 32-bit float
    Float32,
    /// Anything else the decoder may name
    Other(String),
}

impl fmt::Display for SampleEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleEncoding::Signed16 => write!(f, "s16le"),
            SampleEncoding::Signed24 => write!(f, "s24"),
            SampleEncoding::Signed32 => write!(f, "s32"),
            SampleEncoding::Float32 => write!(f, "f32"),
            SampleEncoding::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Output format reported by the decoder after open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFormat {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of interleaved channels
    pub channels: u16,
    /// PCM encoding of the bytes returned by `read`
    pub encoding: SampleEncoding,
}

impl StreamFormat {
    pub fn new(sample_rate: u32, channels: u16, encoding: SampleEncoding) -> Self {
        Self {
            sample_rate,
            channels,
            encoding,
        }
    }

    /// 16-bit PCM frame size in bytes (one sample for every channel).
    pub fn frame_bytes(&self) -> usize {
        self.channels as usize * 2
    }
}

/// Immutable description of an opened stream.
///
/// Produced once per successful `open`; `bind` consumes `channels` and
/// `total_samples`, the outlet reports every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Path the stream was opened from
    pub path: String,
    /// 1 (mono) or 2 (stereo)
    pub channels: u16,
    /// Sample rate in Hz, always > 0
    pub sample_rate: u32,
    /// Recommended read size in bytes (the scratch buffer size)
    pub buffer_size: usize,
    /// Samples per encoded frame
    pub samples_per_frame: usize,
    /// Number of encoded frames in the stream
    pub total_frames: u64,
    /// Number of samples per channel in the stream
    pub total_samples: u64,
    /// `total_samples / sample_rate`
    pub duration_secs: f64,
}

impl MediaInfo {
    /// Duration in seconds for a sample count at a given rate.
    pub fn duration_for(total_samples: u64, sample_rate: u32) -> f64 {
        if sample_rate == 0 {
            return 0.0;
        }
        total_samples as f64 / sample_rate as f64
    }

    /// Returns `true` for two-channel streams.
    pub fn is_stereo(&self) -> bool {
        self.channels == 2
    }
}

// ============================================================================
// Read Status
// ============================================================================

/// Outcome of a single [`DecoderHandle::read`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadStatus {
    /// More data may follow
    Ok,
    /// End of stream reached; the bytes returned with this status are the last
    Done,
    /// Mid-stream decoder failure; the bytes returned with this status are valid
    Error(String),
}

impl ReadStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, ReadStatus::Ok)
    }
}

// ============================================================================
// Decoder Library Traits
// ============================================================================

/// Failure reported by a decoder library or handle.
///
/// Carries the decoder's own error text; the probe maps it to the matching
/// [`DecodeError`](crate::DecodeError) variant for the failed step.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DecoderFault(pub String);

impl DecoderFault {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

impl From<std::io::Error> for DecoderFault {
    fn from(err: std::io::Error) -> Self {
        Self(err.to_string())
    }
}

/// A bitstream decoder library with process-wide setup and teardown.
///
/// `init` and `exit` are reference counted by
/// [`LibraryLifecycle`](crate::library::LibraryLifecycle); implementations
/// never see nested calls.
pub trait DecoderLibrary: Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &str;

    /// Process-wide setup, called before the first handle is created.
    fn init(&self) -> Result<(), DecoderFault>;

    /// Process-wide teardown, called after the last lease is released.
    fn exit(&self);

    /// Create a fresh, unopened handle.
    fn new_handle(&self, config: &DecodeConfig) -> Result<Box<dyn DecoderHandle>, DecoderFault>;
}

/// A single decoder instance bound to at most one open stream.
pub trait DecoderHandle: Send {
    /// Open the stream at `path`.
    fn open(&mut self, path: &Path) -> Result<(), DecoderFault>;

    /// Report the output format of the opened stream.
    fn format(&mut self) -> Result<StreamFormat, DecoderFault>;

    /// Pin the output format so later reads stay in it.
    fn lock_format(&mut self, format: &StreamFormat);

    /// Recommended read size in bytes.
    fn output_block_size(&self) -> usize;

    /// Samples per encoded frame.
    fn samples_per_frame(&self) -> usize;

    /// Number of encoded frames, or `None` when unknown.
    fn frame_length(&mut self) -> Option<u64>;

    /// Number of samples per channel, or `None` when unknown.
    fn length(&mut self) -> Option<u64>;

    /// Fill `buf` with interleaved PCM in the locked format.
    ///
    /// Returns the number of bytes written and the stream status after the
    /// read. A return of `0` bytes always ends the decode loop.
    fn read(&mut self, buf: &mut [u8]) -> (usize, ReadStatus);

    /// Close the stream. Calling it on a closed handle is a no-op.
    fn close(&mut self);
}
