//! Outlet implementations for desktop hosts and tests

use bridge_traits::outlet::{HostOutlet, OutletValue};
use parking_lot::Mutex;
use tracing::info;

/// Outlet that keeps every message in order.
///
/// Useful for tests and for hosts that poll results after a command.
#[derive(Debug, Default)]
pub struct RecordingOutlet {
    messages: Mutex<Vec<(String, OutletValue)>>,
}

impl RecordingOutlet {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages received so far.
    pub fn messages(&self) -> Vec<(String, OutletValue)> {
        self.messages.lock().clone()
    }

    /// Values emitted under `selector`, oldest first.
    pub fn values(&self, selector: &str) -> Vec<OutletValue> {
        self.messages
            .lock()
            .iter()
            .filter(|(name, _)| name == selector)
            .map(|(_, value)| value.clone())
            .collect()
    }

    /// Most recent value emitted under `selector`.
    pub fn last(&self, selector: &str) -> Option<OutletValue> {
        self.messages
            .lock()
            .iter()
            .rev()
            .find(|(name, _)| name == selector)
            .map(|(_, value)| value.clone())
    }

    /// Number of messages emitted under `selector`.
    pub fn count(&self, selector: &str) -> usize {
        self.messages
            .lock()
            .iter()
            .filter(|(name, _)| name == selector)
            .count()
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

impl HostOutlet for RecordingOutlet {
    fn emit(&self, selector: &str, value: OutletValue) {
        self.messages.lock().push((selector.to_string(), value));
    }
}

/// Outlet that reports every message as an `info` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingOutlet;

impl HostOutlet for TracingOutlet {
    fn emit(&self, selector: &str, value: OutletValue) {
        info!(target: "outlet", selector, value = %value, "Outlet message");
    }
}
