//! # Array Decoder Object
//!
//! The host-facing decoder: four commands, each one critical section.
//!
//! | Command | Outlet messages |
//! |---------|-----------------|
//! | `open(path)` | `filename`, `channels`, `rate`, `buffer_size`, `len_in_frames`, `len_in_samples`, `len_in_seconds`; or `error -1` |
//! | `bind(left, right)` | `array_length` (only when every required array resolved) |
//! | `decode()` | `decoded_frames` |
//! | `redraw()` | none |
//!
//! Every command also returns a typed value so embedding code does not have
//! to parse outlet messages.
//!
//! Outlet messages and redraw requests are delivered after the command has
//! released the object's state, so a host handler may send further commands
//! to the same object from inside the callback.
//!
//! ## Usage
//!
//! ```ignore
//! use core_decode::ArrayDecoder;
//! use core_runtime::config::CoreConfig;
//!
//! let decoder = ArrayDecoder::new(CoreConfig::builder().build()?)?;
//! let info = decoder.open("/audio/loop.mp3")?;
//! decoder.bind("left", Some("right"));
//! let report = decoder.decode();
//! println!("{} samples in {} reads", report.samples, report.iterations);
//! ```

use crate::binding::{bind_destinations, DestinationChannel};
use crate::config::DecodeConfig;
use crate::decoder::SymphoniaLibrary;
use crate::error::Result;
use crate::library::LibraryLifecycle;
use crate::probe::FormatProbe;
use crate::session::{DecodeReport, DecodeSession, SessionState};
use crate::traits::MediaInfo;
use bridge_traits::{ArrayHandle, OutletValue};
use core_runtime::config::CoreConfig;
use core_runtime::logging::strip_path;
use parking_lot::Mutex;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Sentinel value emitted under `error` when `open` fails.
pub const OPEN_ERROR_SENTINEL: f64 = -1.0;

/// Outlet selectors.
pub mod selectors {
    pub const FILENAME: &str = "filename";
    pub const CHANNELS: &str = "channels";
    pub const RATE: &str = "rate";
    pub const BUFFER_SIZE: &str = "buffer_size";
    pub const LEN_IN_FRAMES: &str = "len_in_frames";
    pub const LEN_IN_SAMPLES: &str = "len_in_samples";
    pub const LEN_IN_SECONDS: &str = "len_in_seconds";
    pub const ARRAY_LENGTH: &str = "array_length";
    pub const DECODED_FRAMES: &str = "decoded_frames";
    pub const ERROR: &str = "error";
}

/// Everything a command may touch, guarded as one unit.
#[derive(Debug, Default)]
struct DecoderState {
    session: DecodeSession,
    info: Option<MediaInfo>,
    channels: Vec<DestinationChannel>,
}

/// Host effects of one command, collected under the state lock.
#[derive(Debug, Default)]
struct Outbox {
    messages: Vec<(&'static str, OutletValue)>,
    redraws: Vec<ArrayHandle>,
}

impl Outbox {
    fn float(&mut self, selector: &'static str, value: f64) {
        self.messages.push((selector, OutletValue::Float(value)));
    }

    fn symbol(&mut self, selector: &'static str, value: &str) {
        self.messages
            .push((selector, OutletValue::Symbol(value.to_string())));
    }

    fn media_info(&mut self, info: &MediaInfo) {
        self.symbol(selectors::FILENAME, &info.path);
        self.float(selectors::CHANNELS, f64::from(info.channels));
        self.float(selectors::RATE, f64::from(info.sample_rate));
        self.float(selectors::BUFFER_SIZE, info.buffer_size as f64);
        self.float(selectors::LEN_IN_FRAMES, info.total_frames as f64);
        self.float(selectors::LEN_IN_SAMPLES, info.total_samples as f64);
        self.float(selectors::LEN_IN_SECONDS, info.duration_secs);
    }

    fn redraw(&mut self, channels: &[DestinationChannel]) {
        self.redraws
            .extend(channels.iter().filter_map(DestinationChannel::handle).cloned());
    }
}

/// Decodes a compressed audio file into host arrays.
pub struct ArrayDecoder {
    config: CoreConfig,
    decode_config: DecodeConfig,
    lifecycle: Arc<LibraryLifecycle>,
    state: Mutex<DecoderState>,
}

impl fmt::Debug for ArrayDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayDecoder")
            .field("object_name", &self.config.object_name)
            .field("decode_config", &self.decode_config)
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}

impl ArrayDecoder {
    /// Decoder backed by the shared symphonia library with default settings.
    pub fn new(config: CoreConfig) -> Result<Self> {
        Self::with_library(config, DecodeConfig::default(), SymphoniaLibrary::shared())
    }

    /// Decoder backed by the shared symphonia library.
    pub fn with_config(config: CoreConfig, decode_config: DecodeConfig) -> Result<Self> {
        Self::with_library(config, decode_config, SymphoniaLibrary::shared())
    }

    /// Decoder backed by any library lifecycle.
    pub fn with_library(
        config: CoreConfig,
        decode_config: DecodeConfig,
        lifecycle: Arc<LibraryLifecycle>,
    ) -> Result<Self> {
        decode_config.validate()?;

        Ok(Self {
            config,
            decode_config,
            lifecycle,
            state: Mutex::new(DecoderState::default()),
        })
    }

    /// Open and probe `path`.
    ///
    /// The previous stream and all bindings are released first, whatever the
    /// outcome. On failure `error -1` is emitted and the error returned.
    pub fn open(&self, path: impl AsRef<Path>) -> Result<MediaInfo> {
        self.open_path(path.as_ref())
    }

    #[instrument(skip_all, fields(object = %self.config.object_name, file = %strip_path(&path.to_string_lossy())))]
    fn open_path(&self, path: &Path) -> Result<MediaInfo> {
        let mut outbox = Outbox::default();
        let opened = self.open_locked(path, &mut outbox);
        self.deliver(outbox);
        opened
    }

    fn open_locked(&self, path: &Path, outbox: &mut Outbox) -> Result<MediaInfo> {
        let mut state = self.state.lock();
        state.info = None;
        state.channels.clear();

        let probe = FormatProbe::new(&self.lifecycle, &self.decode_config);
        match state.session.open(&probe, path) {
            Ok(info) => {
                info!(
                    channels = info.channels,
                    sample_rate = info.sample_rate,
                    total_samples = info.total_samples,
                    "File opened"
                );
                outbox.media_info(&info);
                state.info = Some(info.clone());
                Ok(info)
            }
            Err(err) => {
                if err.is_fatal() {
                    outbox.float(selectors::ERROR, OPEN_ERROR_SENTINEL);
                }
                Err(err)
            }
        }
    }

    /// Bind host arrays to the decoded channels.
    ///
    /// `right` is only used for stereo streams. Returns the length of the
    /// left array when every required array was bound; nothing is emitted
    /// otherwise.
    #[instrument(skip(self), fields(object = %self.config.object_name))]
    pub fn bind(&self, left: &str, right: Option<&str>) -> Option<usize> {
        let mut outbox = Outbox::default();
        let reported = self.bind_locked(left, right, &mut outbox);
        self.deliver(outbox);
        reported
    }

    fn bind_locked(&self, left: &str, right: Option<&str>, outbox: &mut Outbox) -> Option<usize> {
        let mut state = self.state.lock();

        let Some(info) = state.info.as_ref() else {
            warn!("Bind requested before a file was opened");
            return None;
        };

        let mut names = vec![left];
        names.extend(right);

        let outcome = bind_destinations(
            self.config.array_store.as_ref(),
            &names,
            info.channels,
            info.total_samples,
        );
        let reported = outcome.reported_length();
        state.channels = outcome.channels;

        if let Some(len) = reported {
            outbox.float(selectors::ARRAY_LENGTH, len as f64);
        }

        reported
    }

    /// Decode the open stream into the bound arrays.
    ///
    /// Emits `decoded_frames` with the iteration count and, unless disabled
    /// in [`DecodeConfig`], redraws the bound arrays.
    #[instrument(skip(self), fields(object = %self.config.object_name))]
    pub fn decode(&self) -> DecodeReport {
        let mut outbox = Outbox::default();
        let report = {
            let mut state = self.state.lock();
            let state = &mut *state;

            let report = state
                .session
                .decode(self.config.array_store.as_ref(), &state.channels);

            outbox.float(selectors::DECODED_FRAMES, report.iterations as f64);
            if self.decode_config.redraw_after_decode {
                outbox.redraw(&state.channels);
            }
            report
        };

        self.deliver(outbox);
        report
    }

    /// Ask the host to refresh every bound array.
    #[instrument(skip(self), fields(object = %self.config.object_name))]
    pub fn redraw(&self) {
        let mut outbox = Outbox::default();
        outbox.redraw(&self.state.lock().channels);
        self.deliver(outbox);
    }

    /// Hand collected messages and redraws to the host. Must run unlocked.
    fn deliver(&self, outbox: Outbox) {
        for (selector, value) in outbox.messages {
            self.config.outlet.emit(selector, value);
        }
        for handle in &outbox.redraws {
            self.config.array_store.redraw(handle);
        }
    }

    /// Description of the last successfully opened file.
    pub fn media_info(&self) -> Option<MediaInfo> {
        self.state.lock().info.clone()
    }

    pub fn session_state(&self) -> SessionState {
        self.state.lock().session.state()
    }

    /// Current destinations, in channel order.
    pub fn channels(&self) -> Vec<DestinationChannel> {
        self.state.lock().channels.clone()
    }

    pub fn object_name(&self) -> &str {
        &self.config.object_name
    }
}

impl Drop for ArrayDecoder {
    fn drop(&mut self) {
        self.state.get_mut().session.teardown();
    }
}
