//! # Destination Binding
//!
//! Connects each decoded channel to a host array sized to the stream.
//!
//! For every required channel the array is resolved by name, resized to
//! exactly `total_samples`, and resolved again, since a resize may move the
//! array and invalidate the first handle. Binding stops at the first array
//! that cannot be resolved: that channel and all later ones stay unbound.

use crate::error::{DecodeError, Result};
use bridge_traits::{ArrayHandle, ArrayStore};
use tracing::{debug, warn};

/// One decoded channel's destination (0 = left / mono, 1 = right).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationChannel {
    name: String,
    handle: Option<ArrayHandle>,
}

impl DestinationChannel {
    pub fn unbound(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handle: None,
        }
    }

    fn bound(name: impl Into<String>, handle: ArrayHandle) -> Self {
        Self {
            name: name.into(),
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle for writes, `None` when unbound.
    pub fn handle(&self) -> Option<&ArrayHandle> {
        self.handle.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.handle.is_some()
    }

    /// Writable length; `0` when unbound.
    pub fn capacity(&self) -> usize {
        self.handle.as_ref().map(ArrayHandle::len).unwrap_or(0)
    }

    pub fn unbind(&mut self) {
        self.handle = None;
    }
}

/// Result of a bind request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindOutcome {
    /// One entry per required channel, in channel order
    pub channels: Vec<DestinationChannel>,
    /// `true` when every required array was resolved
    pub complete: bool,
}

impl BindOutcome {
    /// Length of channel 0 after resizing; reported only for complete binds.
    pub fn reported_length(&self) -> Option<usize> {
        if !self.complete {
            return None;
        }
        self.channels.first().map(DestinationChannel::capacity)
    }
}

/// Bind `names` to the first `channels` decoded channels.
///
/// Missing names count as unresolvable arrays. Host resize failures are
/// logged and leave the channel unbound.
pub fn bind_destinations(
    store: &dyn ArrayStore,
    names: &[&str],
    channels: u16,
    total_samples: u64,
) -> BindOutcome {
    let required = channels as usize;
    let mut bound = Vec::with_capacity(required);
    let mut complete = true;

    for index in 0..required {
        let name = names.get(index).copied().unwrap_or("");

        if !complete {
            bound.push(DestinationChannel::unbound(name));
            continue;
        }

        match bind_one(store, name, total_samples) {
            Ok(channel) => {
                debug!(
                    channel = index,
                    array = name,
                    len = channel.capacity(),
                    "Channel bound"
                );
                bound.push(channel);
            }
            Err(err) => {
                warn!(channel = index, "Binding stopped: {}", err);
                complete = false;
                bound.push(DestinationChannel::unbound(name));
            }
        }
    }

    BindOutcome {
        channels: bound,
        complete,
    }
}

/// Resolve, resize, re-resolve.
fn bind_one(store: &dyn ArrayStore, name: &str, total_samples: u64) -> Result<DestinationChannel> {
    if name.is_empty() {
        return Err(DecodeError::Bind {
            name: name.to_string(),
            reason: "no array name given".to_string(),
        });
    }

    let handle = store.resolve(name).ok_or_else(|| DecodeError::Bind {
        name: name.to_string(),
        reason: "array not found".to_string(),
    })?;

    let len = usize::try_from(total_samples).map_err(|_| DecodeError::Bind {
        name: name.to_string(),
        reason: format!("{} samples do not fit in memory", total_samples),
    })?;

    store.resize(&handle, len).map_err(|err| DecodeError::Bind {
        name: name.to_string(),
        reason: format!("resize failed: {}", err),
    })?;

    let handle = store.resolve(name).ok_or_else(|| DecodeError::Bind {
        name: name.to_string(),
        reason: "array vanished after resize".to_string(),
    })?;

    if handle.is_empty() {
        debug!(array = name, "Array is empty after resize, no writes will reach it");
        return Ok(DestinationChannel::unbound(name));
    }

    Ok(DestinationChannel::bound(name, handle))
}
