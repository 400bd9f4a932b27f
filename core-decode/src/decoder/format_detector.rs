//! # Format Detection Module
//!
//! Probe hints and track selection for Symphonia's probe system.

use std::path::Path;
use symphonia::core::codecs::{CodecType, CODEC_TYPE_NULL};
use symphonia::core::formats::Track;
use symphonia::core::probe::Hint;
use tracing::debug;

/// Format detector for audio files.
///
/// Generates hints for Symphonia's probe and picks the track to decode.
pub struct FormatDetector;

impl FormatDetector {
    /// Create a probe hint from file path.
    ///
    /// Extracts the file extension and creates a Symphonia `Hint` to guide
    /// format detection.
    ///
    /// ```rust,ignore
    /// let hint = FormatDetector::hint_from_path(Path::new("/audio/loop.mp3"));
    /// // Hint will contain extension "mp3"
    /// ```
    pub fn hint_from_path(path: &Path) -> Hint {
        let mut hint = Hint::new();

        if let Some(extension) = Self::extension_of(path) {
            debug!("Setting probe hint extension: {}", extension);
            hint.with_extension(&extension);
        } else {
            debug!("No file extension found, probe will auto-detect");
        }

        hint
    }

    /// Lower-cased file extension, if any.
    pub fn extension_of(path: &Path) -> Option<String> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .map(|ext| ext.to_ascii_lowercase())
    }

    /// First track carrying a real codec.
    pub fn select_track(tracks: &[Track]) -> Option<&Track> {
        tracks
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
    }

    /// Short codec name for log output.
    pub fn codec_name(codec_type: CodecType) -> &'static str {
        symphonia::default::get_codecs()
            .get_codec(codec_type)
            .map(|descriptor| descriptor.short_name)
            .unwrap_or("unknown")
    }
}
