//! Host-facing decoder object: outlet messages, bindings and teardown.

mod common;

use bridge_desktop::{MemoryArrayStore, RecordingOutlet};
use bridge_traits::{HostOutlet, OutletValue};
use common::{ramp, FailAt, StubLibrary, StubStream};
use core_decode::{selectors, ArrayDecoder, DecodeConfig, DecodeError, SessionState};
use core_runtime::config::CoreConfig;
use mockall::mock;
use std::sync::{mpsc, Arc, OnceLock, Weak};
use std::thread;
use std::time::Duration;

struct Fixture {
    library: Arc<StubLibrary>,
    store: Arc<MemoryArrayStore>,
    outlet: Arc<RecordingOutlet>,
    decoder: ArrayDecoder,
}

fn fixture(stream: StubStream, decode_config: DecodeConfig) -> Fixture {
    let library = StubLibrary::new(stream);
    let store = Arc::new(MemoryArrayStore::new());
    let outlet = Arc::new(RecordingOutlet::new());

    let config = CoreConfig::builder()
        .object_name("decoder~")
        .array_store(store.clone())
        .outlet(outlet.clone())
        .build()
        .unwrap();
    let decoder = ArrayDecoder::with_library(config, decode_config, library.lifecycle()).unwrap();

    Fixture {
        library,
        store,
        outlet,
        decoder,
    }
}

fn stereo_fixture() -> Fixture {
    let mut interleaved = Vec::new();
    for i in 0..1000i16 {
        interleaved.push(i);
        interleaved.push(i / 2);
    }
    fixture(
        StubStream::new(2, 48000, &interleaved, 4 * 100),
        DecodeConfig::default(),
    )
}

fn float(value: f64) -> OutletValue {
    OutletValue::Float(value)
}

#[test]
fn test_open_reports_media_info_in_order() {
    let f = fixture(
        StubStream::new(1, 44100, &vec![0i16; 44100], 2304),
        DecodeConfig::default(),
    );

    let info = f.decoder.open("audio/tone.mp3").unwrap();

    let selectors: Vec<String> = f.outlet.messages().into_iter().map(|(s, _)| s).collect();
    assert_eq!(
        selectors,
        vec![
            "filename",
            "channels",
            "rate",
            "buffer_size",
            "len_in_frames",
            "len_in_samples",
            "len_in_seconds",
        ]
    );
    assert_eq!(
        f.outlet.last(selectors::FILENAME),
        Some(OutletValue::Symbol("audio/tone.mp3".to_string()))
    );
    assert_eq!(f.outlet.last(selectors::CHANNELS), Some(float(1.0)));
    assert_eq!(f.outlet.last(selectors::RATE), Some(float(44100.0)));
    assert_eq!(f.outlet.last(selectors::BUFFER_SIZE), Some(float(2304.0)));
    assert_eq!(f.outlet.last(selectors::LEN_IN_FRAMES), Some(float(39.0)));
    assert_eq!(f.outlet.last(selectors::LEN_IN_SAMPLES), Some(float(44100.0)));
    assert_eq!(f.outlet.last(selectors::LEN_IN_SECONDS), Some(float(1.0)));

    assert_eq!(f.decoder.media_info(), Some(info));
    assert_eq!(f.decoder.session_state(), SessionState::Ready);
}

#[test]
fn test_open_failure_emits_sentinel_only() {
    let f = stereo_fixture();
    f.library.fail_at(FailAt::Open);

    let err = f.decoder.open("missing.mp3").unwrap_err();

    assert!(matches!(err, DecodeError::Open { .. }));
    assert_eq!(f.outlet.messages(), vec![("error".to_string(), float(-1.0))]);
    assert!(f.decoder.media_info().is_none());
    assert_eq!(f.decoder.session_state(), SessionState::Errored);
    assert_eq!(f.library.inits(), f.library.exits());
}

mock! {
    pub Outlet {}

    impl HostOutlet for Outlet {
        fn emit(&self, selector: &str, value: OutletValue);
    }
}

#[test]
fn test_failed_open_then_clean_reopen() {
    let mut outlet = MockOutlet::new();
    outlet
        .expect_emit()
        .withf(|selector, value| selector.to_string() == "error" && *value == float(-1.0))
        .times(1)
        .return_const(());
    outlet
        .expect_emit()
        .withf(|selector, _| selector.to_string() != "error")
        .times(7)
        .return_const(());

    let library = StubLibrary::new(StubStream::new(1, 8000, &ramp(800), 200));
    let config = CoreConfig::builder()
        .array_store(Arc::new(MemoryArrayStore::new()))
        .outlet(Arc::new(outlet))
        .build()
        .unwrap();
    let decoder =
        ArrayDecoder::with_library(config, DecodeConfig::default(), library.lifecycle()).unwrap();

    library.fail_at(FailAt::Open);
    assert!(decoder.open("nope.mp3").is_err());

    library.fail_at(FailAt::Nothing);
    let info = decoder.open("yes.mp3").unwrap();
    assert_eq!(info.total_samples, 800);
}

#[test]
fn test_bind_before_open_does_nothing() {
    let f = stereo_fixture();
    f.store.create("l", 3);

    assert_eq!(f.decoder.bind("l", None), None);
    assert!(f.outlet.messages().is_empty());
    assert_eq!(f.store.len_of("l"), Some(3));
}

#[test]
fn test_bind_reports_array_length() {
    let f = stereo_fixture();
    f.store.create("l", 1);
    f.store.create("r", 1);
    f.decoder.open("stereo.mp3").unwrap();
    f.outlet.clear();

    assert_eq!(f.decoder.bind("l", Some("r")), Some(1000));

    assert_eq!(f.outlet.messages(), vec![("array_length".to_string(), float(1000.0))]);
    assert_eq!(f.store.len_of("r"), Some(1000));
    assert!(f.decoder.channels().iter().all(|c| c.is_bound()));
}

#[test]
fn test_incomplete_bind_is_silent() {
    let f = stereo_fixture();
    f.store.create("l", 1);
    f.decoder.open("stereo.mp3").unwrap();
    f.outlet.clear();

    assert_eq!(f.decoder.bind("l", Some("missing")), None);

    assert_eq!(f.outlet.count(selectors::ARRAY_LENGTH), 0);
    let channels = f.decoder.channels();
    assert!(channels[0].is_bound());
    assert!(!channels[1].is_bound());
}

#[test]
fn test_decode_fills_arrays_and_redraws() {
    let f = stereo_fixture();
    f.store.create("l", 1);
    f.store.create("r", 1);
    f.decoder.open("stereo.mp3").unwrap();
    f.decoder.bind("l", Some("r"));

    let report = f.decoder.decode();

    // 4000 bytes in 400-byte reads
    assert_eq!(report.iterations, 10);
    assert_eq!(f.outlet.last(selectors::DECODED_FRAMES), Some(float(10.0)));
    let left = f.store.snapshot("l").unwrap();
    let right = f.store.snapshot("r").unwrap();
    assert_eq!(left[999], 999.0 / 32768.0);
    assert_eq!(right[999], 499.0 / 32768.0);
    assert_eq!(f.store.redraw_count("l"), 1);
    assert_eq!(f.store.redraw_count("r"), 1);
    assert_eq!(f.decoder.session_state(), SessionState::Closed);

    f.decoder.redraw();
    assert_eq!(f.store.redraw_count("l"), 2);
}

#[test]
fn test_batch_config_skips_redraw() {
    let f = fixture(
        StubStream::new(1, 8000, &ramp(100), 50),
        DecodeConfig::batch(),
    );
    f.store.create("l", 1);
    f.decoder.open("mono.mp3").unwrap();
    f.decoder.bind("l", None);

    f.decoder.decode();

    assert_eq!(f.store.redraw_count("l"), 0);
}

#[test]
fn test_decode_without_open_reports_one_iteration() {
    let f = stereo_fixture();

    let report = f.decoder.decode();

    assert_eq!(report.iterations, 1);
    assert_eq!(f.outlet.messages(), vec![("decoded_frames".to_string(), float(1.0))]);
}

#[test]
fn test_reopen_releases_previous_stream_once() {
    let f = stereo_fixture();
    f.store.create("l", 1);
    f.store.create("r", 1);

    f.decoder.open("first.mp3").unwrap();
    f.decoder.bind("l", Some("r"));
    f.decoder.open("second.mp3").unwrap();

    assert_eq!(f.library.closes(), 1);
    assert_eq!(f.library.exits(), 1);
    assert_eq!(f.library.inits(), 2);
    assert!(f.decoder.channels().is_empty());

    let library = f.library.clone();
    drop(f);
    assert_eq!(library.closes(), 2);
    assert_eq!(library.exits(), 2);
}

#[test]
fn test_open_after_decode_starts_fresh() {
    let f = stereo_fixture();
    f.store.create("l", 1);
    f.store.create("r", 1);
    f.decoder.open("first.mp3").unwrap();
    f.decoder.bind("l", Some("r"));
    f.decoder.decode();

    f.decoder.open("again.mp3").unwrap();

    assert_eq!(f.decoder.session_state(), SessionState::Ready);
    assert_eq!(f.library.closes(), 1);
    assert_eq!(f.library.opens(), 2);
}

#[test]
fn test_invalid_decode_config_rejected() {
    let library = StubLibrary::new(StubStream::new(1, 8000, &[], 2));
    let config = CoreConfig::builder()
        .array_store(Arc::new(MemoryArrayStore::new()))
        .outlet(Arc::new(RecordingOutlet::new()))
        .build()
        .unwrap();
    let decode_config = DecodeConfig {
        scratch_size: Some(0),
        ..Default::default()
    };

    let err = ArrayDecoder::with_library(config, decode_config, library.lifecycle()).unwrap_err();
    assert!(matches!(err, DecodeError::Config(_)));
}

/// Outlet wired back into its own decoder, the way a patch routes an outlet
/// into the object's inlet.
struct LoopbackOutlet {
    recorded: RecordingOutlet,
    decoder: OnceLock<Weak<ArrayDecoder>>,
    trigger: &'static str,
    command: fn(&ArrayDecoder),
}

impl HostOutlet for LoopbackOutlet {
    fn emit(&self, selector: &str, value: OutletValue) {
        self.recorded.emit(selector, value);
        if selector == self.trigger {
            if let Some(decoder) = self.decoder.get().and_then(Weak::upgrade) {
                (self.command)(&decoder);
            }
        }
    }
}

fn loopback_decoder(
    trigger: &'static str,
    command: fn(&ArrayDecoder),
) -> (Arc<ArrayDecoder>, Arc<LoopbackOutlet>, Arc<MemoryArrayStore>) {
    let library = StubLibrary::new(StubStream::new(1, 8000, &ramp(800), 200));
    let store = Arc::new(MemoryArrayStore::new());
    store.create("table", 1);
    let outlet = Arc::new(LoopbackOutlet {
        recorded: RecordingOutlet::new(),
        decoder: OnceLock::new(),
        trigger,
        command,
    });

    let config = CoreConfig::builder()
        .array_store(store.clone())
        .outlet(outlet.clone())
        .build()
        .unwrap();
    let decoder = Arc::new(
        ArrayDecoder::with_library(config, DecodeConfig::default(), library.lifecycle()).unwrap(),
    );
    outlet.decoder.set(Arc::downgrade(&decoder)).unwrap();

    (decoder, outlet, store)
}

/// Runs `job` on its own thread and fails the test if it never returns.
fn within_deadline<T: Send + 'static>(job: impl FnOnce() -> T + Send + 'static) -> T {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(job());
    });
    rx.recv_timeout(Duration::from_secs(5))
        .expect("command did not return, object locked against its own outlet")
}

#[test]
fn test_outlet_handler_can_bind_during_open() {
    let (decoder, outlet, store) = loopback_decoder(selectors::LEN_IN_SECONDS, |decoder| {
        decoder.bind("table", None);
    });

    let opening = decoder.clone();
    let info = within_deadline(move || opening.open("loop.mp3")).unwrap();

    assert_eq!(info.total_samples, 800);
    let names: Vec<String> = outlet
        .recorded
        .messages()
        .into_iter()
        .map(|(s, _)| s)
        .collect();
    assert_eq!(names.len(), 8);
    assert_eq!(names[6], "len_in_seconds");
    assert_eq!(names[7], "array_length");
    assert_eq!(outlet.recorded.last(selectors::ARRAY_LENGTH), Some(float(800.0)));
    assert_eq!(store.len_of("table"), Some(800));
    assert!(decoder.channels()[0].is_bound());
}

#[test]
fn test_outlet_handler_can_redraw_during_decode() {
    let (decoder, outlet, store) = loopback_decoder(selectors::DECODED_FRAMES, |decoder| {
        decoder.redraw();
    });
    decoder.open("loop.mp3").unwrap();
    decoder.bind("table", None);

    let decoding = decoder.clone();
    let report = within_deadline(move || decoding.decode());

    assert_eq!(report.samples, 800);
    assert_eq!(outlet.recorded.count(selectors::DECODED_FRAMES), 1);
    // one from the handler, one after the decode
    assert_eq!(store.redraw_count("table"), 2);
}
