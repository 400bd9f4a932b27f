//! # Host Bridge Traits
//!
//! Capability traits that every host embedding the decoder must implement.
//!
//! ## Overview
//!
//! This crate defines the contract between the decode core and the host
//! application. Each trait is a capability the core requires but whose
//! implementation belongs to the host: the core never allocates host arrays,
//! never formats host messages, and never writes to the host console
//! directly.
//!
//! ## Traits
//!
//! - [`ArrayStore`](arrays::ArrayStore) - Named float arrays: resolve, resize, write, redraw
//! - [`HostOutlet`](outlet::HostOutlet) - Named result messages (`selector value`)
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to the host console
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is
//! missing:
//!
//! ```ignore
//! use core_runtime::error::Error;
//!
//! let array_store = config.array_store
//!     .ok_or_else(|| Error::CapabilityMissing {
//!         capability: "ArrayStore".to_string(),
//!         message: "No array store provided. \
//!                  Desktop: enable the desktop-shims feature. \
//!                  Embedded: inject the host's table adapter.".to_string()
//!     })?;
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert host errors into it and keep the array name in the error
//! so the core can log something actionable.
//!
//! ## Thread Safety
//!
//! Bridge traits require `Send + Sync` on native targets (see
//! [`platform`]) so one store or outlet can back several decoder objects.

pub mod arrays;
pub mod error;
pub mod logging;
pub mod outlet;
pub mod platform;

pub use error::BridgeError;

pub use arrays::{ArrayHandle, ArrayStore};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use outlet::{HostOutlet, OutletValue};
