//! # Format Probe
//!
//! Brings a file from a path to a decoder handle ready to be read.
//!
//! Steps, each failing with its own [`DecodeError`] variant:
//!
//! 1. library initialization (a [`LibraryLease`]) → `Initialization`
//! 2. handle creation → `Allocation`
//! 3. stream open → `Open`
//! 4. format query (16-bit, mono or stereo only) → `FormatQuery`
//! 5. format lock, scratch size, samples per frame
//! 6. frame and sample lengths → `LengthUnknown`
//!
//! A failure at any step closes the handle and releases the lease before the
//! error is returned.

use crate::config::DecodeConfig;
use crate::error::{DecodeError, Result};
use crate::library::{LibraryLease, LibraryLifecycle};
use crate::session::SessionState;
use crate::traits::{DecoderHandle, MediaInfo, ReadStatus, SampleEncoding, StreamFormat};
use core_runtime::logging::strip_path;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// Runs the probe steps against one library with one configuration.
pub struct FormatProbe<'a> {
    lifecycle: &'a Arc<LibraryLifecycle>,
    config: &'a DecodeConfig,
}

impl<'a> FormatProbe<'a> {
    pub fn new(lifecycle: &'a Arc<LibraryLifecycle>, config: &'a DecodeConfig) -> Self {
        Self { lifecycle, config }
    }

    /// Probe `path`, advancing `state` through `Opened`, `FormatKnown` and
    /// `Ready`.
    ///
    /// On error `state` is left at the last step reached; the caller decides
    /// the terminal state.
    #[instrument(skip(self, path, state), fields(file = %strip_path(&path.to_string_lossy())))]
    pub fn run(&self, path: &Path, state: &mut SessionState) -> Result<ProbedStream> {
        let lease = self.lifecycle.acquire()?;

        let mut handle = lease.new_handle(self.config).map_err(|err| {
            error!("Decoder handle allocation failed: {}", err);
            err
        })?;

        match self.describe(handle.as_mut(), path, state) {
            Ok((format, info)) => Ok(ProbedStream {
                scratch_size: info.buffer_size,
                info,
                format,
                handle,
                lease,
                torn_down: false,
            }),
            Err(err) => {
                handle.close();
                drop(lease);
                Err(err)
            }
        }
    }

    fn describe(
        &self,
        handle: &mut dyn DecoderHandle,
        path: &Path,
        state: &mut SessionState,
    ) -> Result<(StreamFormat, MediaInfo)> {
        let path_text = path.display().to_string();

        // Step 3: open
        handle.open(path).map_err(|fault| {
            error!("Trouble opening stream: {}", fault);
            DecodeError::Open {
                path: path_text.clone(),
                reason: fault.to_string(),
            }
        })?;
        *state = SessionState::Opened;
        debug!("Stream opened");

        // Step 4: format query
        let format = handle.format().map_err(|fault| {
            error!("Trouble querying format: {}", fault);
            DecodeError::FormatQuery(fault.to_string())
        })?;
        Self::check_format(&format)?;
        *state = SessionState::FormatKnown;
        debug!(
            sample_rate = format.sample_rate,
            channels = format.channels,
            "Format known"
        );

        // Step 5: lock the output format and size the scratch buffer
        handle.lock_format(&format);
        let buffer_size = self
            .config
            .resolve_scratch_size(handle.output_block_size(), format.frame_bytes());
        let samples_per_frame = handle.samples_per_frame();

        // Step 6: lengths
        let total_frames = handle.frame_length().ok_or_else(|| {
            error!("Trouble querying frame length");
            DecodeError::LengthUnknown("frame length".to_string())
        })?;
        let total_samples = handle.length().ok_or_else(|| {
            error!("Trouble querying sample length");
            DecodeError::LengthUnknown("sample length".to_string())
        })?;

        let info = MediaInfo {
            path: path_text,
            channels: format.channels,
            sample_rate: format.sample_rate,
            buffer_size,
            samples_per_frame,
            total_frames,
            total_samples,
            duration_secs: MediaInfo::duration_for(total_samples, format.sample_rate),
        };

        *state = SessionState::Ready;
        debug!(
            buffer_size,
            total_frames, total_samples, "Stream ready"
        );

        Ok((format, info))
    }

    fn check_format(format: &StreamFormat) -> Result<()> {
        if format.encoding != SampleEncoding::Signed16 {
            error!("Unsupported output encoding: {}", format.encoding);
            return Err(DecodeError::FormatQuery(format!(
                "unsupported encoding {}, only s16le is decoded",
                format.encoding
            )));
        }

        if !(1..=2).contains(&format.channels) {
            error!("Unsupported channel count: {}", format.channels);
            return Err(DecodeError::FormatQuery(format!(
                "unsupported channel count {}, only mono and stereo are decoded",
                format.channels
            )));
        }

        if format.sample_rate == 0 {
            return Err(DecodeError::FormatQuery("sample rate is zero".to_string()));
        }

        Ok(())
    }
}

/// A successfully probed stream: the open handle, its library lease and the
/// stream description.
///
/// Dropping it closes the handle and releases the lease.
pub struct ProbedStream {
    pub info: MediaInfo,
    pub format: StreamFormat,
    pub scratch_size: usize,
    handle: Box<dyn DecoderHandle>,
    lease: LibraryLease,
    torn_down: bool,
}

impl fmt::Debug for ProbedStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbedStream")
            .field("info", &self.info)
            .field("scratch_size", &self.scratch_size)
            .field("torn_down", &self.torn_down)
            .finish()
    }
}

impl ProbedStream {
    /// Read the next block of PCM into `buf`.
    pub fn read(&mut self, buf: &mut [u8]) -> (usize, ReadStatus) {
        if self.torn_down {
            return (0, ReadStatus::Error("stream torn down".to_string()));
        }
        self.handle.read(buf)
    }

    /// Close the handle and release the lease. Idempotent.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.handle.close();
        self.lease.release();
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

impl Drop for ProbedStream {
    fn drop(&mut self) {
        self.teardown();
    }
}
