//! Workspace facade crate.
//!
//! Re-exports the decoder (`core-decode`) and its runtime (`core-runtime`) so
//! a host can depend on `array-decoder-workspace` alone. The `desktop-shims`
//! feature (on by default) provides in-memory arrays and a tracing outlet
//! when the host injects none.

pub use core_decode as decode;
pub use core_runtime as runtime;

pub use core_decode::{ArrayDecoder, DecodeConfig, DecodeError, MediaInfo};
pub use core_runtime::config::CoreConfig;
