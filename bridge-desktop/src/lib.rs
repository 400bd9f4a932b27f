//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop hosts and tests.
//!
//! ## Overview
//!
//! - `ArrayStore` as [`MemoryArrayStore`]: named arrays in process memory,
//!   with resize-invalidated handles
//! - `HostOutlet` as [`RecordingOutlet`] (keeps messages for inspection) or
//!   [`TracingOutlet`] (reports messages as log events)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{MemoryArrayStore, RecordingOutlet};
//! use std::sync::Arc;
//!
//! let arrays = Arc::new(MemoryArrayStore::new());
//! arrays.create("left", 1);
//! let outlet = Arc::new(RecordingOutlet::new());
//!
//! // Use in core configuration
//! ```

mod arrays;
mod outlet;

pub use arrays::MemoryArrayStore;
pub use outlet::{RecordingOutlet, TracingOutlet};
