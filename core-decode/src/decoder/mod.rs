//! # Audio Decoder Module
//!
//! Decoder library backed by the Symphonia library.
//!
//! ## Overview
//!
//! [`SymphoniaLibrary`] implements [`DecoderLibrary`](crate::traits::DecoderLibrary)
//! and hands out [`SymphoniaHandle`]s. Every handle renders the first audio
//! track of a file as interleaved 16-bit little-endian PCM, whatever the
//! source sample format.
//!
//! ## Supported Formats
//!
//! Everything the `symphonia` "all" feature set decodes: MP3 (MPEG-1/2 layers
//! I-III), FLAC, Vorbis, AAC, ALAC, WAV/AIFF PCM, ADPCM.
//!
//! ## Architecture
//!
//! The handle uses Symphonia's three-layer architecture:
//!
//! 1. **MediaSource**: the opened file
//! 2. **FormatReader**: Demultiplexes containers, reads packets
//! 3. **Decoder**: Decodes packets to PCM samples
//!
//! ```text
//! File → MediaSourceStream → FormatReader → Decoder → s16le queue → read()
//! ```
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use core_decode::{DecodeConfig, DecoderHandle, SymphoniaLibrary};
//! use std::path::Path;
//!
//! # fn example() -> core_decode::Result<()> {
//! let lifecycle = SymphoniaLibrary::shared();
//! let lease = lifecycle.acquire()?;
//! let mut handle = lease.new_handle(&DecodeConfig::default())?;
//! handle.open(Path::new("/path/to/loop.mp3")).expect("open");
//!
//! let mut buf = vec![0u8; handle.output_block_size()];
//! let (bytes, status) = handle.read(&mut buf);
//! println!("Read {} bytes ({:?})", bytes, status);
//! # Ok(())
//! # }
//! ```

mod format_detector;
mod sample_converter;
mod symphonia;

pub use self::symphonia::{SymphoniaHandle, SymphoniaLibrary};
pub use format_detector::FormatDetector;
pub use sample_converter::SampleConverter;
