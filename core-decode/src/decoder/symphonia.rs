//! # Symphonia Decoder Implementation
//!
//! Decoder library and handle backed by the Symphonia library.

use crate::config::DecodeConfig;
use crate::decoder::format_detector::FormatDetector;
use crate::decoder::sample_converter::SampleConverter;
use crate::library::LibraryLifecycle;
use crate::traits::{
    DecoderFault, DecoderHandle, DecoderLibrary, ReadStatus, SampleEncoding, StreamFormat,
};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use tracing::{debug, error, info, instrument, warn};

/// Frames per packet assumed when the container does not say.
const DEFAULT_FRAMES_PER_PACKET: usize = 1152;

static SHARED: OnceLock<Arc<LibraryLifecycle>> = OnceLock::new();

/// The Symphonia decoder library.
///
/// Symphonia keeps no global state of its own; `init` only warms up the
/// format and codec registries so the first open does not pay for it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaLibrary;

impl SymphoniaLibrary {
    /// Process-wide lifecycle shared by every decoder object.
    pub fn shared() -> Arc<LibraryLifecycle> {
        SHARED
            .get_or_init(|| LibraryLifecycle::new(Arc::new(SymphoniaLibrary)))
            .clone()
    }
}

impl DecoderLibrary for SymphoniaLibrary {
    fn name(&self) -> &str {
        "symphonia"
    }

    fn init(&self) -> Result<(), DecoderFault> {
        let _ = symphonia::default::get_probe();
        let _ = symphonia::default::get_codecs();
        Ok(())
    }

    fn exit(&self) {
        debug!("Symphonia library released");
    }

    fn new_handle(&self, config: &DecodeConfig) -> Result<Box<dyn DecoderHandle>, DecoderFault> {
        Ok(Box::new(SymphoniaHandle::new(config)))
    }
}

/// Options copied from [`DecodeConfig`] when the handle is created.
#[derive(Debug, Clone, Copy)]
struct HandleOptions {
    enable_gapless: bool,
    verify: bool,
    max_consecutive_errors: usize,
}

/// Symphonia decoder handle implementing [`DecoderHandle`].
///
/// Decoded packets are rendered to s16le and queued; `read` drains the queue
/// into the caller's buffer and decodes more packets on demand. After filling
/// a buffer the handle looks one packet ahead so the read that delivers the
/// last bytes already reports [`ReadStatus::Done`].
pub struct SymphoniaHandle {
    options: HandleOptions,
    stream: Option<OpenStream>,
}

/// Per-file decode pipeline state.
struct OpenStream {
    /// Format reader (demuxer) - owns the media source stream
    format_reader: Box<dyn FormatReader>,

    /// Audio decoder
    decoder: Box<dyn Decoder>,

    /// Selected track ID
    track_id: u32,

    /// Parameters known from the container
    sample_rate: Option<u32>,
    channels: Option<u16>,
    n_frames: Option<u64>,
    frames_per_packet: usize,
    delay: u64,
    padding: u64,

    /// Format pinned by `lock_format`
    locked: Option<StreamFormat>,

    /// Decoded bytes not yet handed to the caller
    pending: VecDeque<u8>,

    /// Position in decoded frames
    position_frames: u64,

    /// End-of-stream flag
    eof: bool,

    /// Error met while looking ahead, reported on the next read
    fault: Option<String>,

    /// Original path (for error reporting)
    source_info: String,
}

impl SymphoniaHandle {
    pub fn new(config: &DecodeConfig) -> Self {
        Self {
            options: HandleOptions {
                enable_gapless: config.enable_gapless,
                verify: config.verify_decode,
                max_consecutive_errors: config.max_consecutive_errors.max(1),
            },
            stream: None,
        }
    }

    fn stream_mut(&mut self) -> Result<&mut OpenStream, DecoderFault> {
        self.stream
            .as_mut()
            .ok_or_else(|| DecoderFault::new("no stream open"))
    }
}

impl DecoderHandle for SymphoniaHandle {
    #[instrument(skip(self, path), fields(path = %path.display()))]
    fn open(&mut self, path: &Path) -> Result<(), DecoderFault> {
        self.close();

        // Step 1: Open media source
        let file = std::fs::File::open(path).map_err(|e| {
            error!("Failed to open file {:?}: {}", path, e);
            DecoderFault::from(e)
        })?;

        let hint = FormatDetector::hint_from_path(path);
        let media_source = Box::new(file) as Box<dyn MediaSource>;
        let mss = MediaSourceStream::new(media_source, Default::default());

        // Step 2: Probe format
        let format_options = FormatOptions {
            enable_gapless: self.options.enable_gapless,
            ..Default::default()
        };
        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &format_options, &MetadataOptions::default())
            .map_err(|e| {
                error!("Format probe failed: {}", e);
                DecoderFault::new(format!("Failed to probe format: {}", e))
            })?;

        let format_reader = probed.format;

        // Step 3: Find first audio track with a supported codec
        let track = FormatDetector::select_track(format_reader.tracks()).ok_or_else(|| {
            error!("No supported audio tracks found");
            DecoderFault::new("No supported audio tracks")
        })?;

        let track_id = track.id;
        let params = track.codec_params.clone();
        debug!(
            track_id,
            codec = FormatDetector::codec_name(params.codec),
            "Selected track"
        );

        // Step 4: Create codec decoder
        let decoder_options = DecoderOptions {
            verify: self.options.verify,
        };
        let decoder = symphonia::default::get_codecs()
            .make(&params, &decoder_options)
            .map_err(|e| {
                error!("Failed to create decoder: {}", e);
                DecoderFault::new(format!("Failed to create codec decoder: {}", e))
            })?;

        // Channels might not be known until first decode (especially for AAC/M4A)
        let channels = params.channels.map(|ch| ch.count() as u16);
        let frames_per_packet = params
            .max_frames_per_packet
            .and_then(|n| usize::try_from(n).ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_FRAMES_PER_PACKET);

        info!(
            sample_rate = ?params.sample_rate,
            channels = ?channels,
            n_frames = ?params.n_frames,
            "Stream opened"
        );

        self.stream = Some(OpenStream {
            format_reader,
            decoder,
            track_id,
            sample_rate: params.sample_rate,
            channels,
            n_frames: params.n_frames,
            frames_per_packet,
            delay: params.delay.map(u64::from).unwrap_or(0),
            padding: params.padding.map(u64::from).unwrap_or(0),
            locked: None,
            pending: VecDeque::new(),
            position_frames: 0,
            eof: false,
            fault: None,
            source_info: path.display().to_string(),
        });

        Ok(())
    }

    fn format(&mut self) -> Result<StreamFormat, DecoderFault> {
        let max_errors = self.options.max_consecutive_errors;
        let stream = self.stream_mut()?;

        if stream.sample_rate.is_none() || stream.channels.is_none() {
            debug!("Container parameters incomplete, decoding first packet");
            stream.decode_next_packet(max_errors).map_err(DecoderFault::new)?;
        }

        match (stream.sample_rate, stream.channels) {
            (Some(rate), Some(channels)) if rate > 0 && channels > 0 => Ok(StreamFormat::new(
                rate,
                channels,
                SampleEncoding::Signed16,
            )),
            _ => Err(DecoderFault::new(format!(
                "Cannot determine output format of {}",
                stream.source_info
            ))),
        }
    }

    fn lock_format(&mut self, format: &StreamFormat) {
        if let Some(stream) = self.stream.as_mut() {
            stream.locked = Some(format.clone());
        }
    }

    fn output_block_size(&self) -> usize {
        let (frames, channels) = match &self.stream {
            Some(stream) => (
                stream.frames_per_packet,
                stream.channels.unwrap_or(2) as usize,
            ),
            None => (DEFAULT_FRAMES_PER_PACKET, 2),
        };
        frames * channels * 2
    }

    fn samples_per_frame(&self) -> usize {
        self.stream
            .as_ref()
            .map(|stream| stream.frames_per_packet)
            .unwrap_or(DEFAULT_FRAMES_PER_PACKET)
    }

    fn frame_length(&mut self) -> Option<u64> {
        let stream = self.stream.as_ref()?;
        let per_packet = stream.frames_per_packet as u64;
        Some(stream.encoded_frames(self.options.enable_gapless)?.div_ceil(per_packet))
    }

    /// Samples per channel the reads will produce. With gapless decoding the
    /// demuxer has already trimmed delay and padding from this count.
    fn length(&mut self) -> Option<u64> {
        self.stream.as_ref()?.n_frames
    }

    fn read(&mut self, buf: &mut [u8]) -> (usize, ReadStatus) {
        let max_errors = self.options.max_consecutive_errors;
        let stream = match self.stream.as_mut() {
            Some(stream) => stream,
            None => return (0, ReadStatus::Error("no stream open".to_string())),
        };

        if stream.pending.is_empty() {
            if let Some(fault) = stream.fault.take() {
                return (0, ReadStatus::Error(fault));
            }
        }

        let mut written = 0;
        loop {
            let take = (buf.len() - written).min(stream.pending.len());
            for (dst, src) in buf[written..written + take]
                .iter_mut()
                .zip(stream.pending.drain(..take))
            {
                *dst = src;
            }
            written += take;

            if written == buf.len() {
                break;
            }

            if stream.eof {
                return (written, ReadStatus::Done);
            }

            match stream.decode_next_packet(max_errors) {
                Ok(true) => continue,
                Ok(false) => return (written, ReadStatus::Done),
                Err(text) => return (written, ReadStatus::Error(text)),
            }
        }

        // Buffer is full: look ahead so the last read reports Done
        if stream.pending.is_empty() && !stream.eof {
            match stream.decode_next_packet(max_errors) {
                Ok(_) => {}
                Err(text) => stream.fault = Some(text),
            }
        }

        if stream.eof && stream.pending.is_empty() {
            (written, ReadStatus::Done)
        } else {
            (written, ReadStatus::Ok)
        }
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            debug!(
                source = %stream.source_info,
                frames = stream.position_frames,
                "Stream closed"
            );
        }
    }
}

impl OpenStream {
    /// Sample count of the stream as encoded, delay and padding included.
    fn encoded_frames(&self, gapless: bool) -> Option<u64> {
        let total = self.n_frames?;
        if gapless {
            Some(total + self.delay + self.padding)
        } else {
            Some(total)
        }
    }

    /// Read and decode the next packet into `pending`.
    ///
    /// Skips corrupted packets and continues decoding, only failing on
    /// unrecoverable errors.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` - Decoded audio was queued
    /// - `Ok(false)` - End of stream reached
    /// - `Err(text)` - Unrecoverable error
    fn decode_next_packet(&mut self, max_errors: usize) -> Result<bool, String> {
        if self.eof {
            return Ok(false);
        }

        let mut consecutive_errors = 0;

        loop {
            let packet = match self.format_reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    debug!("Reached end of stream at {} frames", self.position_frames);
                    self.eof = true;
                    return Ok(false);
                }
                Err(SymphoniaError::ResetRequired) => {
                    warn!("Track list changed mid-stream");
                    self.eof = true;
                    return Err("Track list changed, reset required".to_string());
                }
                Err(SymphoniaError::IoError(e)) => {
                    consecutive_errors += 1;
                    warn!(
                        "I/O error reading packet (attempt {}/{}): {}",
                        consecutive_errors, max_errors, e
                    );

                    if consecutive_errors >= max_errors {
                        error!("Too many consecutive I/O errors, giving up");
                        self.eof = true;
                        return Err(format!("Stream I/O failure: {}", e));
                    }

                    continue;
                }
                Err(e) => {
                    error!("Fatal format reader error: {}", e);
                    self.eof = true;
                    return Err(format!("Failed to read packet: {}", e));
                }
            };

            // Consume any new metadata that was read with this packet
            while !self.format_reader.metadata().is_latest() {
                self.format_reader.metadata().pop();
            }

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    let decoded_channels = spec.channels.count() as u16;

                    if let Some(locked) = &self.locked {
                        if locked.channels != decoded_channels || locked.sample_rate != spec.rate {
                            error!(
                                "Output format changed from {}Hz/{}ch to {}Hz/{}ch",
                                locked.sample_rate, locked.channels, spec.rate, decoded_channels
                            );
                            self.eof = true;
                            return Err("Output format changed mid-stream".to_string());
                        }
                    } else {
                        self.sample_rate = Some(spec.rate);
                        self.channels = Some(decoded_channels);
                    }

                    let frames = SampleConverter::append_s16le(decoded, &mut self.pending);
                    self.position_frames += frames as u64;
                    return Ok(true);
                }
                Err(SymphoniaError::IoError(err)) => {
                    consecutive_errors += 1;
                    warn!(
                        "Skipping corrupted packet (I/O error, attempt {}/{}): {}",
                        consecutive_errors, max_errors, err
                    );

                    if consecutive_errors >= max_errors {
                        error!("Too many consecutive decode errors, stream may be corrupted");
                        self.eof = true;
                        return Err(format!(
                            "Stream corruption after {} failed packets",
                            max_errors
                        ));
                    }

                    continue;
                }
                Err(SymphoniaError::DecodeError(err)) => {
                    consecutive_errors += 1;
                    warn!(
                        "Skipping packet with decode error (attempt {}/{}): {}",
                        consecutive_errors, max_errors, err
                    );

                    if consecutive_errors >= max_errors {
                        error!("Too many consecutive decode errors, codec may be incompatible");
                        self.eof = true;
                        return Err(format!(
                            "Decoder failure after {} failed packets: {}",
                            max_errors, err
                        ));
                    }

                    continue;
                }
                Err(e) => {
                    error!("Fatal decode error: {}", e);
                    self.eof = true;
                    return Err(format!("Failed to decode packet: {}", e));
                }
            }
        }
    }
}
