//! # Decode Session
//!
//! Owns the probed stream of one decoder object and runs the decode loop.
//!
//! ## States
//!
//! ```text
//! Uninitialized → Opened → FormatKnown → Ready → Decoding → Closed
//!        └──────────┴──────────┴──────────┴────────┴──→ Errored
//! ```
//!
//! `Closed` and `Errored` are terminal for the stream; a new `open` starts a
//! fresh pass from `Uninitialized`.
//!
//! ## Decode loop
//!
//! Each iteration reads one scratch buffer, converts it to per-channel
//! floats, and writes frame `i` (counted across iterations) of every bound
//! channel to slot `min(i, capacity - 1)`. The loop ends on a zero-byte read
//! or any status other than [`ReadStatus::Ok`]. Writes past the end of an
//! array are clamped to its last slot, so the last slot ends up holding the
//! last decoded sample.

use crate::binding::DestinationChannel;
use crate::converter;
use crate::error::Result;
use crate::probe::{FormatProbe, ProbedStream};
use crate::traits::{MediaInfo, ReadStatus};
use bridge_traits::{ArrayHandle, ArrayStore};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

/// Lifecycle state of a [`DecodeSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Nothing opened yet
    Uninitialized,
    /// Stream opened, format not yet known
    Opened,
    /// Format queried and accepted
    FormatKnown,
    /// Lengths known, ready to decode
    Ready,
    /// Decode loop running
    Decoding,
    /// Stream released
    Closed,
    /// Open failed, everything released
    Errored,
}

impl SessionState {
    /// Returns `true` if no stream is held in this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Errored)
    }

    /// Returns `true` if the session can be decoded.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Summary of one decode run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeReport {
    /// Read iterations, including the final one
    pub iterations: u64,
    /// Frames (samples per channel) produced by the decoder
    pub samples: u64,
    /// Bytes produced by the decoder
    pub bytes: u64,
    /// Writes clamped to the last slot of an array
    pub overruns: u64,
    /// Channels that stopped receiving writes after a host failure
    pub disabled_channels: Vec<usize>,
    /// Status of the last read
    pub final_status: ReadStatus,
}

impl DecodeReport {
    fn empty() -> Self {
        Self {
            iterations: 0,
            samples: 0,
            bytes: 0,
            overruns: 0,
            disabled_channels: Vec::new(),
            final_status: ReadStatus::Ok,
        }
    }

    /// Report for a decode request with no open stream: a single empty read.
    pub fn idle() -> Self {
        Self {
            iterations: 1,
            final_status: ReadStatus::Done,
            ..Self::empty()
        }
    }

    /// Returns `true` if the stream ended with a decoder error.
    pub fn ended_with_error(&self) -> bool {
        matches!(self.final_status, ReadStatus::Error(_))
    }
}

/// Decoder handle, lease and scratch buffer of one decoder object.
#[derive(Debug)]
pub struct DecodeSession {
    state: SessionState,
    stream: Option<ProbedStream>,
}

impl Default for DecodeSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Uninitialized,
            stream: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Description of the open stream, if any.
    pub fn info(&self) -> Option<&MediaInfo> {
        self.stream.as_ref().map(|stream| &stream.info)
    }

    /// Open `path`, releasing whatever was open before.
    pub fn open(&mut self, probe: &FormatProbe<'_>, path: &Path) -> Result<MediaInfo> {
        self.teardown();
        self.state = SessionState::Uninitialized;

        match probe.run(path, &mut self.state) {
            Ok(stream) => {
                let info = stream.info.clone();
                self.stream = Some(stream);
                Ok(info)
            }
            Err(err) => {
                self.state = SessionState::Errored;
                Err(err)
            }
        }
    }

    /// Run the decode loop into `channels`, then release the stream.
    ///
    /// Without an open stream nothing is written and a single empty
    /// iteration is reported.
    pub fn decode(
        &mut self,
        store: &dyn ArrayStore,
        channels: &[DestinationChannel],
    ) -> DecodeReport {
        if !self.state.is_ready() {
            debug!(state = ?self.state, "Decode requested without an open stream");
            return DecodeReport::idle();
        }
        let Some(stream) = self.stream.as_mut() else {
            return DecodeReport::idle();
        };

        self.state = SessionState::Decoding;
        let report = run_decode_loop(stream, store, channels);
        self.teardown();
        report
    }

    /// Release the handle and the library lease. Idempotent.
    pub fn teardown(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.teardown();
            debug!("Session torn down");
        }

        if self.state != SessionState::Uninitialized && !self.state.is_terminal() {
            self.state = SessionState::Closed;
        }
    }
}

/// Write state for one destination during a run.
struct ChannelWriter<'a> {
    index: usize,
    handle: Option<&'a ArrayHandle>,
    capacity: usize,
}

impl<'a> ChannelWriter<'a> {
    fn new(index: usize, channel: &'a DestinationChannel) -> Self {
        Self {
            index,
            handle: channel.handle(),
            capacity: channel.capacity(),
        }
    }

    /// Write `plane` as frames `start..`, clamped to the last slot.
    ///
    /// Returns the number of clamped writes.
    fn write_block(
        &mut self,
        store: &dyn ArrayStore,
        start: usize,
        plane: &[f32],
        report: &mut DecodeReport,
    ) -> u64 {
        let Some(handle) = self.handle else {
            return 0;
        };
        let Some(&last) = plane.last() else {
            return 0;
        };
        if self.capacity == 0 {
            return 0;
        }

        let in_bounds = self.capacity.saturating_sub(start).min(plane.len());
        let clamped = plane.len() - in_bounds;

        let written = write_clamped(
            store,
            handle,
            start,
            &plane[..in_bounds],
            clamped,
            last,
            self.capacity,
        );
        if let Err(err) = written {
            warn!(
                channel = self.index,
                array = %handle.name,
                "Host write failed, channel disabled for this run: {}",
                err
            );
            self.handle = None;
            report.disabled_channels.push(self.index);
            return 0;
        }

        clamped as u64
    }
}

fn write_clamped(
    store: &dyn ArrayStore,
    handle: &ArrayHandle,
    start: usize,
    in_bounds: &[f32],
    clamped: usize,
    last: f32,
    capacity: usize,
) -> bridge_traits::error::Result<()> {
    if !in_bounds.is_empty() {
        store.write_run(handle, start, in_bounds)?;
    }
    if clamped > 0 {
        store.write(handle, capacity - 1, last)?;
    }
    Ok(())
}

fn run_decode_loop(
    stream: &mut ProbedStream,
    store: &dyn ArrayStore,
    channels: &[DestinationChannel],
) -> DecodeReport {
    let channel_count = stream.info.channels as usize;
    let mut scratch = vec![0u8; stream.scratch_size];
    let mut planes: Vec<Vec<f32>> = vec![Vec::new(); channel_count];
    let mut writers: Vec<ChannelWriter<'_>> = channels
        .iter()
        .take(channel_count)
        .enumerate()
        .map(|(index, channel)| ChannelWriter::new(index, channel))
        .collect();

    let mut report = DecodeReport::empty();
    let mut frame_index: usize = 0;

    loop {
        let (produced, status) = stream.read(&mut scratch);
        let produced = produced.min(scratch.len());
        let frames = converter::deinterleave_into(&scratch[..produced], &mut planes);

        for (writer, plane) in writers.iter_mut().zip(&planes) {
            let clamped = writer.write_block(store, frame_index, plane, &mut report);
            if clamped > 0 && report.overruns == 0 {
                warn!(
                    channel = writer.index,
                    capacity = writer.capacity,
                    frame = frame_index,
                    "Decoded stream is longer than the array, clamping to last slot"
                );
            }
            report.overruns += clamped;
        }

        frame_index += frames;
        report.iterations += 1;
        report.samples += frames as u64;
        report.bytes += produced as u64;

        if produced == 0 || !status.is_ok() {
            if let ReadStatus::Error(text) = &status {
                warn!("Decoder stopped with error: {}", text);
            }
            report.final_status = status;
            break;
        }
    }

    info!(
        iterations = report.iterations,
        samples = report.samples,
        overruns = report.overruns,
        "Decode finished"
    );

    report
}
