//! # Decode Configuration
//!
//! Configuration types for the decode pipeline.

use crate::error::{DecodeError, Result};
use serde::{Deserialize, Serialize};

/// Decode pipeline configuration.
///
/// Controls the scratch buffer size, the redraw after a decode, and the
/// options handed to the decoder library when a handle is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeConfig {
    /// Scratch buffer size in bytes.
    ///
    /// `None` uses the decoder's recommended output block. An override is
    /// rounded down to a whole number of PCM frames.
    ///
    /// Default: `None`.
    #[serde(default)]
    pub scratch_size: Option<usize>,

    /// Whether `decode` asks the host to redraw bound arrays when done.
    ///
    /// Default: true.
    #[serde(default = "default_redraw_after_decode")]
    pub redraw_after_decode: bool,

    /// Whether encoder delay and padding are trimmed (gapless decoding).
    ///
    /// Default: true.
    #[serde(default = "default_enable_gapless")]
    pub enable_gapless: bool,

    /// Whether the decoder verifies decoded audio against stream checksums.
    ///
    /// Default: false.
    #[serde(default)]
    pub verify_decode: bool,

    /// Number of consecutive corrupt packets tolerated before a read fails.
    ///
    /// Default: 10.
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: usize,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            scratch_size: None,
            redraw_after_decode: default_redraw_after_decode(),
            enable_gapless: default_enable_gapless(),
            verify_decode: false,
            max_consecutive_errors: default_max_consecutive_errors(),
        }
    }
}

impl DecodeConfig {
    /// Configuration that rejects damaged streams early.
    ///
    /// - Checksum verification on
    /// - No tolerance for corrupt packets
    pub fn strict() -> Self {
        Self {
            verify_decode: true,
            max_consecutive_errors: 1,
            ..Default::default()
        }
    }

    /// Configuration for batch jobs that redraw once at the end themselves.
    pub fn batch() -> Self {
        Self {
            redraw_after_decode: false,
            ..Default::default()
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.scratch_size == Some(0) {
            return Err(DecodeError::Config("scratch_size must be > 0".to_string()));
        }

        if self.max_consecutive_errors == 0 {
            return Err(DecodeError::Config(
                "max_consecutive_errors must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolve the scratch size for a stream.
    ///
    /// Picks the override or the decoder's recommendation, then rounds down
    /// to a multiple of `frame_bytes`, never below one frame.
    pub fn resolve_scratch_size(&self, recommended: usize, frame_bytes: usize) -> usize {
        let frame_bytes = frame_bytes.max(1);
        let requested = self.scratch_size.unwrap_or(recommended);
        let whole = requested - requested % frame_bytes;
        whole.max(frame_bytes)
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_redraw_after_decode() -> bool {
    true
}

fn default_enable_gapless() -> bool {
    true
}

fn default_max_consecutive_errors() -> usize {
    10
}
