//! Shared test fixtures: a counting stub decoder library, WAV files and
//! tagged MP3 files.

#![allow(dead_code)]

use core_decode::{
    DecodeConfig, DecoderFault, DecoderHandle, DecoderLibrary, LibraryLifecycle, ReadStatus,
    SampleEncoding, StreamFormat,
};
use parking_lot::Mutex;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ============================================================================
// Stub Decoder Library
// ============================================================================

/// Step at which the stub library fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Nothing,
    Init,
    Allocate,
    Open,
    Format,
}

/// What a stub handle decodes.
#[derive(Debug, Clone)]
pub struct StubStream {
    pub format: StreamFormat,
    pub pcm: Vec<u8>,
    pub block_size: usize,
    pub samples_per_frame: usize,
    pub frame_length: Option<u64>,
    pub length: Option<u64>,
    /// Reads that succeed before every further read fails
    pub error_after: Option<usize>,
}

impl StubStream {
    /// Stream whose lengths match `samples` exactly.
    pub fn new(channels: u16, rate: u32, samples: &[i16], block_size: usize) -> Self {
        let frames = samples.len() as u64 / channels as u64;
        Self {
            format: StreamFormat::new(rate, channels, SampleEncoding::Signed16),
            pcm: le_bytes(samples),
            block_size,
            samples_per_frame: 1152,
            frame_length: Some(frames.div_ceil(1152)),
            length: Some(frames),
            error_after: None,
        }
    }

    pub fn with_length(mut self, length: Option<u64>) -> Self {
        self.length = length;
        self
    }

    pub fn with_frame_length(mut self, frame_length: Option<u64>) -> Self {
        self.frame_length = frame_length;
        self
    }

    pub fn with_encoding(mut self, encoding: SampleEncoding) -> Self {
        self.format.encoding = encoding;
        self
    }

    pub fn with_error_after(mut self, reads: usize) -> Self {
        self.error_after = Some(reads);
        self
    }
}

/// Call counters shared by the library and its handles.
#[derive(Debug, Default)]
pub struct Counters {
    pub inits: AtomicUsize,
    pub exits: AtomicUsize,
    pub handles: AtomicUsize,
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
}

impl Counters {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

pub struct StubLibrary {
    pub counters: Arc<Counters>,
    stream: Mutex<StubStream>,
    fail_at: Mutex<FailAt>,
}

impl StubLibrary {
    pub fn new(stream: StubStream) -> Arc<Self> {
        Arc::new(Self {
            counters: Arc::new(Counters::default()),
            stream: Mutex::new(stream),
            fail_at: Mutex::new(FailAt::Nothing),
        })
    }

    pub fn lifecycle(self: &Arc<Self>) -> Arc<LibraryLifecycle> {
        LibraryLifecycle::new(self.clone())
    }

    pub fn fail_at(&self, step: FailAt) {
        *self.fail_at.lock() = step;
    }

    pub fn set_stream(&self, stream: StubStream) {
        *self.stream.lock() = stream;
    }

    pub fn inits(&self) -> usize {
        Counters::get(&self.counters.inits)
    }

    pub fn exits(&self) -> usize {
        Counters::get(&self.counters.exits)
    }

    pub fn handles(&self) -> usize {
        Counters::get(&self.counters.handles)
    }

    pub fn opens(&self) -> usize {
        Counters::get(&self.counters.opens)
    }

    pub fn closes(&self) -> usize {
        Counters::get(&self.counters.closes)
    }
}

impl DecoderLibrary for StubLibrary {
    fn name(&self) -> &str {
        "stub"
    }

    fn init(&self) -> Result<(), DecoderFault> {
        if *self.fail_at.lock() == FailAt::Init {
            return Err(DecoderFault::new("init refused"));
        }
        self.counters.inits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn exit(&self) {
        self.counters.exits.fetch_add(1, Ordering::SeqCst);
    }

    fn new_handle(&self, _config: &DecodeConfig) -> Result<Box<dyn DecoderHandle>, DecoderFault> {
        let fail_at = *self.fail_at.lock();
        if fail_at == FailAt::Allocate {
            return Err(DecoderFault::new("no handles left"));
        }
        self.counters.handles.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(StubHandle {
            counters: self.counters.clone(),
            stream: self.stream.lock().clone(),
            fail_at,
            opened: false,
            cursor: 0,
            reads: 0,
        }))
    }
}

pub struct StubHandle {
    counters: Arc<Counters>,
    stream: StubStream,
    fail_at: FailAt,
    opened: bool,
    cursor: usize,
    reads: usize,
}

impl DecoderHandle for StubHandle {
    fn open(&mut self, path: &Path) -> Result<(), DecoderFault> {
        if self.fail_at == FailAt::Open {
            return Err(DecoderFault::new(format!("{} not found", path.display())));
        }
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        self.opened = true;
        Ok(())
    }

    fn format(&mut self) -> Result<StreamFormat, DecoderFault> {
        if self.fail_at == FailAt::Format {
            return Err(DecoderFault::new("no format"));
        }
        Ok(self.stream.format.clone())
    }

    fn lock_format(&mut self, _format: &StreamFormat) {}

    fn output_block_size(&self) -> usize {
        self.stream.block_size
    }

    fn samples_per_frame(&self) -> usize {
        self.stream.samples_per_frame
    }

    fn frame_length(&mut self) -> Option<u64> {
        self.stream.frame_length
    }

    fn length(&mut self) -> Option<u64> {
        self.stream.length
    }

    fn read(&mut self, buf: &mut [u8]) -> (usize, ReadStatus) {
        if !self.opened {
            return (0, ReadStatus::Error("not open".to_string()));
        }

        self.reads += 1;
        if let Some(limit) = self.stream.error_after {
            if self.reads > limit {
                return (0, ReadStatus::Error("corrupt frame".to_string()));
            }
        }

        let remaining = self.stream.pcm.len() - self.cursor;
        let n = buf.len().min(remaining);
        buf[..n].copy_from_slice(&self.stream.pcm[self.cursor..self.cursor + n]);
        self.cursor += n;

        if self.cursor >= self.stream.pcm.len() {
            (n, ReadStatus::Done)
        } else {
            (n, ReadStatus::Ok)
        }
    }

    fn close(&mut self) {
        if self.opened {
            self.opened = false;
            self.counters.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

// ============================================================================
// PCM and WAV Fixtures
// ============================================================================

pub fn le_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// Deterministic test signal covering the full i16 range.
pub fn ramp(len: usize) -> Vec<i16> {
    (0..len)
        .map(|i| ((i as i64 * 7919) % 65536 - 32768) as i16)
        .collect()
}

/// Canonical 16-bit PCM WAV file.
pub fn wav_bytes(samples: &[i16], channels: u16, rate: u32) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let block_align = channels * 2;
    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&rate.to_le_bytes());
    out.extend_from_slice(&(rate * block_align as u32).to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(&le_bytes(samples));
    out
}

pub fn write_wav(samples: &[i16], channels: u16, rate: u32) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("decode-")
        .suffix(".wav")
        .tempfile()
        .expect("create temp wav");
    file.write_all(&wav_bytes(samples, channels, rate))
        .expect("write temp wav");
    file.flush().expect("flush temp wav");
    file
}

// ============================================================================
// MP3 Fixtures
// ============================================================================

/// MPEG-1 Layer III, 128 kbit/s, 48 kHz, mono, no CRC.
const MP3_HEADER: [u8; 4] = [0xFF, 0xFB, 0x94, 0xC0];
/// 144 * 128000 / 48000
const MP3_FRAME_LEN: usize = 384;
const MP3_SIDE_INFO_LEN: usize = 17;
pub const MP3_SAMPLES_PER_FRAME: u64 = 1152;
pub const MP3_SAMPLE_RATE: u32 = 48000;

/// Silent MP3 of `frames` audio frames, led by a Xing "Info" frame whose
/// LAME extension records the encoder `delay` and `padding` in samples.
///
/// `delay` must be at least 529 and `padding + 529` below 4096.
pub fn tagged_mp3_bytes(frames: u32, delay: u32, padding: u32) -> Vec<u8> {
    let mut tag = Vec::new();
    tag.extend_from_slice(b"Info");
    tag.extend_from_slice(&1u32.to_be_bytes()); // frame count only
    tag.extend_from_slice(&frames.to_be_bytes());
    tag.extend_from_slice(b"Lavf58.76");
    tag.extend_from_slice(&[0; 2]); // revision, lowpass
    tag.extend_from_slice(&[0; 8]); // peak, radio and audiophile gain
    tag.extend_from_slice(&[0; 2]); // encoding flags, abr
    let trim = ((delay - 529) << 12) | (padding + 529);
    tag.extend_from_slice(&trim.to_be_bytes()[1..]);

    let mut out = silent_mp3_frame();
    let start = MP3_HEADER.len() + MP3_SIDE_INFO_LEN;
    out[start..start + tag.len()].copy_from_slice(&tag);

    for _ in 0..frames {
        out.extend_from_slice(&silent_mp3_frame());
    }
    out
}

/// Header followed by zeroed side info and main data.
fn silent_mp3_frame() -> Vec<u8> {
    let mut frame = vec![0u8; MP3_FRAME_LEN];
    frame[..MP3_HEADER.len()].copy_from_slice(&MP3_HEADER);
    frame
}

pub fn write_tagged_mp3(frames: u32, delay: u32, padding: u32) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("decode-")
        .suffix(".mp3")
        .tempfile()
        .expect("create temp mp3");
    file.write_all(&tagged_mp3_bytes(frames, delay, padding))
        .expect("write temp mp3");
    file.flush().expect("flush temp mp3");
    file
}
