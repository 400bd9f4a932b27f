//! # Logging
//!
//! One global `tracing` subscriber per process, shared by every decoder
//! object: an [`EnvFilter`], a stderr formatter ([`LogFormat`]) and an
//! optional [`LoggerSinkLayer`] that copies events to the host console.
//!
//! The default filter lets the decoder crates through at
//! [`LoggingConfig::level`] and holds symphonia at `warn`.
//!
//! ```ignore
//! use bridge_traits::logging::{ConsoleLogger, LogLevel};
//! use core_runtime::logging::{init_logging, LoggingConfig};
//! use std::sync::Arc;
//!
//! init_logging(
//!     LoggingConfig::default()
//!         .with_format("compact".parse()?)
//!         .with_level(LogLevel::Debug)
//!         .with_logger_sink(Arc::new(ConsoleLogger::default())),
//! )?;
//! ```

use crate::error::{Error, Result};

use bridge_traits::logging::{LogEntry, LogLevel, LoggerSink};

use std::fmt;
use std::io;
use std::str::FromStr;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    filter::EnvFilter,
    fmt::format::FmtSpan,
    layer::{Context, Layered, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
    Layer, Registry,
};

/// Crates whose events pass the default filter at the configured level.
const DECODER_TARGETS: &[&str] = &["core_runtime", "core_decode", "bridge_desktop", "outlet"];

/// Level applied to the audio backend when no custom filter is set.
const BACKEND_DIRECTIVE: &str = "symphonia=warn";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line human-readable output with colors
    Pretty,
    /// One JSON object per event
    Json,
    /// Single-line output
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

impl FromStr for LogFormat {
    type Err = Error;

    /// Parses the format names hosts put in their settings files.
    fn from_str(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            other => Err(Error::Logging(format!("unknown log format '{}'", other))),
        }
    }
}

/// Logging configuration
#[derive(Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Level for the decoder crates; the backend stays at `warn`
    pub level: LogLevel,
    /// Replaces the default directives entirely (e.g. "core_decode=trace,symphonia=debug")
    pub filter: Option<String>,
    /// Host console receiving a copy of every event
    pub logger_sink: Option<Arc<dyn LoggerSink>>,
    /// Report command spans (`open`, `bind`, `decode`) as they are entered
    pub enable_spans: bool,
    pub display_target: bool,
    pub display_thread_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            filter: None,
            logger_sink: None,
            enable_spans: true,
            display_target: true,
            display_thread_info: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    pub fn with_spans(mut self, enable: bool) -> Self {
        self.enable_spans = enable;
        self
    }

    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }

    pub fn with_thread_info(mut self, display: bool) -> Self {
        self.display_thread_info = display;
        self
    }
}

/// Install the global subscriber.
///
/// Call once per process, before the first decoder object is created.
///
/// # Errors
///
/// - [`Error::Logging`] if the filter does not parse
/// - [`Error::Logging`] if a global subscriber is already installed
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(output_layer(&config))
        .with(LoggerSinkLayer::new(config.logger_sink.clone()))
        .try_init()
        .map_err(|e| Error::Logging(format!("subscriber already installed: {}", e)))
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let directives = match &config.filter {
        Some(custom) => custom.clone(),
        None => DECODER_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, config.level.as_str()))
            .chain(std::iter::once(BACKEND_DIRECTIVE.to_string()))
            .collect::<Vec<_>>()
            .join(","),
    };

    EnvFilter::try_new(&directives)
        .map_err(|e| Error::Logging(format!("invalid filter '{}': {}", directives, e)))
}

type FilteredRegistry = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<FilteredRegistry> + Send + Sync>;

/// Formatting layer for the configured [`LogFormat`], writing to stderr.
fn output_layer(config: &LoggingConfig) -> BoxedLayer {
    let base = tracing_subscriber::fmt::layer()
        .with_target(config.display_target)
        .with_thread_ids(config.display_thread_info)
        .with_thread_names(config.display_thread_info)
        .with_writer(io::stderr);

    let spans = if config.enable_spans {
        FmtSpan::ACTIVE
    } else {
        FmtSpan::NONE
    };

    match config.format {
        LogFormat::Pretty => base.pretty().with_span_events(spans).boxed(),
        LogFormat::Json => base
            .json()
            .flatten_event(true)
            .with_current_span(config.enable_spans)
            .with_span_list(config.enable_spans)
            .boxed(),
        LogFormat::Compact => base.compact().boxed(),
    }
}

/// Layer that mirrors events to a host [`LoggerSink`].
///
/// Entries carry the event message, its fields, and the chain of enclosing
/// span names (outermost first, joined by `:`) as `span_id`.
pub struct LoggerSinkLayer {
    sink: Option<Arc<dyn LoggerSink>>,
}

impl LoggerSinkLayer {
    pub fn new(sink: Option<Arc<dyn LoggerSink>>) -> Self {
        Self { sink }
    }
}

impl<S> Layer<S> for LoggerSinkLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let Some(sink) = self.sink.as_ref() else {
            return;
        };

        let metadata = event.metadata();
        let level = log_level_of(metadata.level());
        if level < sink.min_level() {
            return;
        }

        let mut fields = SinkVisitor::default();
        event.record(&mut fields);

        let message = fields.message.take().unwrap_or_else(|| metadata.name().to_string());
        let mut entry = fields
            .values
            .into_iter()
            .fold(LogEntry::new(level, metadata.target(), message), |entry, (key, value)| {
                entry.with_field(key, value)
            });

        if let Some(scope) = ctx.event_scope(event) {
            let names: Vec<&str> = scope.from_root().map(|span| span.name()).collect();
            entry = entry.with_span_id(names.join(":"));
        }

        if let Err(err) = sink.log(entry) {
            eprintln!("LoggerSink error: {}", err);
        }
    }
}

#[derive(Default)]
struct SinkVisitor {
    message: Option<String>,
    values: Vec<(String, String)>,
}

impl SinkVisitor {
    fn push(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            name => self.values.push((name.to_string(), value)),
        }
    }
}

impl Visit for SinkVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.push(field, value.to_string());
    }

    // Numbers and bools arrive here too; their Debug form is their plain text.
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field, format!("{:?}", value));
    }
}

fn log_level_of(level: &Level) -> LogLevel {
    match *level {
        Level::TRACE => LogLevel::Trace,
        Level::DEBUG => LogLevel::Debug,
        Level::INFO => LogLevel::Info,
        Level::WARN => LogLevel::Warn,
        Level::ERROR => LogLevel::Error,
    }
}

/// Last component of a `/` or `\\` separated path.
///
/// File paths are logged through this so host directory layouts stay out of
/// log output:
///
/// ```ignore
/// info!(file = %strip_path("/Users/ana/Samples/kick.wav"), "Opening file");
/// // file="kick.wav"
/// ```
pub fn strip_path(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as SinkResult;
    use std::sync::Mutex;

    #[test]
    fn test_defaults_follow_build_profile() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert!(config.filter.is_none());
        assert!(config.enable_spans);
        assert_eq!(config.format == LogFormat::Pretty, cfg!(debug_assertions));
    }

    #[test]
    fn test_strip_path_keeps_basename() {
        assert_eq!(strip_path("/srv/loops/break.aiff"), "break.aiff");
        assert_eq!(strip_path("E:\\Takes\\vox_03.flac"), "vox_03.flac");
        assert_eq!(strip_path("mixed/dir\\name.ogg"), "name.ogg");
        assert_eq!(strip_path("plain.mp3"), "plain.mp3");
        assert_eq!(strip_path("trailing/"), "");
    }

    #[test]
    fn test_build_filter() {
        let config = LoggingConfig::default().with_level(LogLevel::Debug);
        let filter = build_filter(&config).unwrap();
        let rendered = filter.to_string();
        assert!(rendered.contains("core_decode=debug"));
        assert!(rendered.contains("symphonia=warn"));
    }

    #[test]
    fn test_build_custom_filter() {
        let config = LoggingConfig::default().with_filter("core_decode=trace,symphonia=error");
        let filter = build_filter(&config).unwrap();
        assert!(filter.to_string().contains("core_decode=trace"));
    }

    #[test]
    fn test_build_invalid_filter() {
        let config = LoggingConfig::default().with_filter("core_decode=[");
        assert!(matches!(build_filter(&config), Err(Error::Logging(_))));
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" Compact ".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert_eq!("PRETTY".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!(matches!("xml".parse::<LogFormat>(), Err(Error::Logging(_))));
    }

    #[test]
    fn test_sink_entry_carries_span_chain() {
        let sink = Arc::new(TestLoggerSink::default());
        let trait_sink: Arc<dyn LoggerSink> = sink.clone();
        let subscriber = tracing_subscriber::registry().with(LoggerSinkLayer::new(Some(trait_sink)));
        let _guard = tracing::subscriber::set_default(subscriber);

        let open = tracing::info_span!("open");
        let _open = open.enter();
        let probe = tracing::info_span!("probe");
        let _probe = probe.enter();
        tracing::warn!(channels = 3u64, "unsupported layout");

        let entries = sink.entries.lock().unwrap();
        assert_eq!(entries[0].span_id.as_deref(), Some("open:probe"));
        assert_eq!(entries[0].fields.get("channels"), Some(&"3".to_string()));
    }

    #[test]
    fn test_logger_sink_layer_forwards_event() {
        let sink = Arc::new(TestLoggerSink::default());
        let trait_sink: Arc<dyn LoggerSink> = sink.clone();
        let layer = LoggerSinkLayer::new(Some(trait_sink));
        let subscriber = tracing_subscriber::registry().with(layer);
        let _guard = tracing::subscriber::set_default(subscriber);

        tracing::error!(target: "core_decode::probe", file = "song.mp3", "open failed");

        let entries = sink.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.level, LogLevel::Error);
        assert_eq!(entry.target, "core_decode::probe");
        assert_eq!(entry.message, "open failed");
        assert_eq!(entry.fields.get("file"), Some(&"song.mp3".to_string()));
    }

    #[test]
    fn test_logger_sink_layer_respects_min_level() {
        let sink = Arc::new(TestLoggerSink::default());
        let trait_sink: Arc<dyn LoggerSink> = sink.clone();
        let subscriber = tracing_subscriber::registry().with(LoggerSinkLayer::new(Some(trait_sink)));
        let _guard = tracing::subscriber::set_default(subscriber);

        tracing::debug!("too chatty");
        tracing::warn!("kept");

        let entries = sink.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "kept");
    }

    #[derive(Default)]
    struct TestLoggerSink {
        entries: Mutex<Vec<LogEntry>>,
    }

    impl LoggerSink for TestLoggerSink {
        fn log(&self, entry: LogEntry) -> SinkResult<()> {
            self.entries.lock().unwrap().push(entry);
            Ok(())
        }

        fn min_level(&self) -> LogLevel {
            LogLevel::Info
        }
    }
}
