//! # Array Decode Module
//!
//! Decodes compressed audio files into host-owned float arrays.
//!
//! ## Overview
//!
//! This module handles:
//! - Probing a file into [`MediaInfo`] through a [`DecoderLibrary`]
//! - Binding host arrays, sized to the stream, per channel
//! - Converting 16-bit PCM to normalized `f32` ([`converter`])
//! - The decode loop with clamped writes ([`DecodeSession`])
//! - The host-facing [`ArrayDecoder`] object and its outlet messages
//!
//! Production decoding is backed by symphonia ([`SymphoniaLibrary`]).

pub mod binding;
pub mod config;
pub mod converter;
pub mod decoder;
pub mod error;
pub mod library;
pub mod object;
pub mod probe;
pub mod session;
pub mod traits;

pub use binding::{bind_destinations, BindOutcome, DestinationChannel};
pub use config::DecodeConfig;
pub use decoder::{FormatDetector, SampleConverter, SymphoniaHandle, SymphoniaLibrary};
pub use error::{DecodeError, Result};
pub use library::{LibraryLease, LibraryLifecycle};
pub use object::{selectors, ArrayDecoder, OPEN_ERROR_SENTINEL};
pub use probe::{FormatProbe, ProbedStream};
pub use session::{DecodeReport, DecodeSession, SessionState};
pub use traits::{
    DecoderFault, DecoderHandle, DecoderLibrary, MediaInfo, ReadStatus, SampleEncoding,
    StreamFormat,
};
