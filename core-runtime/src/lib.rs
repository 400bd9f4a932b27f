//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for decoder objects:
//! - Logging and tracing infrastructure
//! - Configuration management (host bridges)
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the decode crate depends on.
//! It establishes the logging conventions and the fail-fast wiring of host
//! capabilities used throughout the system.

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
