//! Host messaging bridge.
//!
//! Results produced by the core are reported back to the host as named
//! messages: a selector (`"channels"`, `"array_length"`, `"error"`, ...)
//! followed by a single atom. How those messages are delivered (a patcher
//! outlet, a UI callback, a log line) is up to the host implementation.

use crate::platform::PlatformSendSync;
use std::fmt;

/// Single atom carried by an outlet message.
#[derive(Debug, Clone, PartialEq)]
pub enum OutletValue {
    /// Numeric payload
    Float(f64),
    /// Symbolic payload (file names, array names)
    Symbol(String),
}

impl OutletValue {
    /// Returns the numeric payload, if any.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            OutletValue::Float(value) => Some(*value),
            OutletValue::Symbol(_) => None,
        }
    }

    /// Returns the symbolic payload, if any.
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            OutletValue::Float(_) => None,
            OutletValue::Symbol(value) => Some(value),
        }
    }
}

impl fmt::Display for OutletValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutletValue::Float(value) => write!(f, "{}", value),
            OutletValue::Symbol(value) => f.write_str(value),
        }
    }
}

/// Message sink provided by the host.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::outlet::{HostOutlet, OutletValue};
///
/// fn report_rate(outlet: &dyn HostOutlet, rate: u32) {
///     outlet.emit_float("rate", rate as f64);
/// }
/// ```
pub trait HostOutlet: PlatformSendSync {
    /// Deliver one `selector value` message to the host.
    fn emit(&self, selector: &str, value: OutletValue);

    fn emit_float(&self, selector: &str, value: f64) {
        self.emit(selector, OutletValue::Float(value));
    }

    fn emit_symbol(&self, selector: &str, value: &str) {
        self.emit(selector, OutletValue::Symbol(value.to_string()));
    }
}
