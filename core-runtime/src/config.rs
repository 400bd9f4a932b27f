//! # Core Configuration Module
//!
//! Provides configuration management for decoder objects.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the host bridges every decoder object needs. It
//! enforces fail-fast validation so a missing capability is reported when the
//! object is created, not halfway through a decode.
//!
//! ## Required Dependencies
//!
//! - `ArrayStore` - Host arrays the decoded audio is written into
//! - `HostOutlet` - Where command results (`channels`, `array_length`, ...) go
//!
//! ## Optional Dependencies
//!
//! - `LoggerSink` - Mirror of the log stream into the host console
//!
//! When the `desktop-shims` feature is enabled, an in-memory array store and
//! a tracing-backed outlet are injected automatically if not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .object_name("reader~ 1")
//!     .array_store(Arc::new(MyTableStore::new()))
//!     .outlet(Arc::new(MyOutlet::new()))
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ## Error Handling
//!
//! The builder validates all required dependencies and provides actionable
//! error messages when capabilities are missing.

use crate::error::{Error, Result};
use bridge_traits::{ArrayStore, HostOutlet, LoggerSink};
use std::sync::Arc;

const DEFAULT_OBJECT_NAME: &str = "decoder";

/// Core configuration for a decoder object.
///
/// This struct holds the host bridges and the label used in log output.
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Label identifying the object in log output
    pub object_name: String,

    /// Host arrays receiving decoded audio (required)
    pub array_store: Arc<dyn ArrayStore>,

    /// Host message sink for command results (required)
    pub outlet: Arc<dyn HostOutlet>,

    /// Host console mirror for log events (optional)
    pub logger_sink: Option<Arc<dyn LoggerSink>>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("object_name", &self.object_name)
            .field("array_store", &"ArrayStore { ... }")
            .field("outlet", &"HostOutlet { ... }")
            .field(
                "logger_sink",
                &self.logger_sink.as_ref().map(|_| "LoggerSink { ... }"),
            )
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Object name is not blank
    pub fn validate(&self) -> Result<()> {
        if self.object_name.trim().is_empty() {
            return Err(Error::Config("Object name cannot be empty".to_string()));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn array_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "ArrayStore".to_string(),
        message: "ArrayStore implementation is required to receive decoded audio. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default MemoryArrayStore. \
                 Embedded: inject an adapter over the host's named tables."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn outlet_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HostOutlet".to_string(),
        message: "HostOutlet implementation is required to report command results. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default TracingOutlet. \
                 Embedded: inject an adapter over the host's message outlet."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_array_store() -> Result<Arc<dyn ArrayStore>> {
    use bridge_desktop::MemoryArrayStore;

    let store: Arc<dyn ArrayStore> = Arc::new(MemoryArrayStore::new());
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_array_store() -> Result<Arc<dyn ArrayStore>> {
    Err(array_store_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_outlet() -> Result<Arc<dyn HostOutlet>> {
    use bridge_desktop::TracingOutlet;

    let outlet: Arc<dyn HostOutlet> = Arc::new(TracingOutlet);
    Ok(outlet)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_outlet() -> Result<Arc<dyn HostOutlet>> {
    Err(outlet_missing_error())
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Use this builder to incrementally set configuration options and then
/// call [`build()`](CoreConfigBuilder::build) to create the final config.
#[derive(Default)]
pub struct CoreConfigBuilder {
    object_name: Option<String>,
    array_store: Option<Arc<dyn ArrayStore>>,
    outlet: Option<Arc<dyn HostOutlet>>,
    logger_sink: Option<Arc<dyn LoggerSink>>,
}

impl CoreConfigBuilder {
    /// Sets the label used for this object in log output.
    ///
    /// Defaults to `"decoder"`.
    pub fn object_name(mut self, name: impl Into<String>) -> Self {
        self.object_name = Some(name.into());
        self
    }

    /// Sets the host array store.
    pub fn array_store(mut self, store: Arc<dyn ArrayStore>) -> Self {
        self.array_store = Some(store);
        self
    }

    /// Sets the host outlet.
    pub fn outlet(mut self, outlet: Arc<dyn HostOutlet>) -> Self {
        self.outlet = Some(outlet);
        self
    }

    /// Sets the logger sink mirrored by the logging layer.
    pub fn logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CoreConfig)` on success, or an error if:
    /// - Required bridges are missing (ArrayStore, HostOutlet) and no
    ///   desktop defaults are available
    /// - Configuration values are invalid
    pub fn build(self) -> Result<CoreConfig> {
        let array_store = match self.array_store {
            Some(store) => store,
            None => provide_default_array_store()?,
        };

        let outlet = match self.outlet {
            Some(outlet) => outlet,
            None => provide_default_outlet()?,
        };

        let config = CoreConfig {
            object_name: self
                .object_name
                .unwrap_or_else(|| DEFAULT_OBJECT_NAME.to_string()),
            array_store,
            outlet,
            logger_sink: self.logger_sink,
        };

        config.validate()?;

        Ok(config)
    }
}
