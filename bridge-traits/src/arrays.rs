//! Host Array Storage Abstractions
//!
//! Provides the platform-agnostic trait through which the core reaches the
//! named float arrays owned by the host (patcher tables, waveform views, plot
//! buffers, ...).
//!
//! The core never sees host storage layout. It resolves a name to an
//! [`ArrayHandle`], asks the host to resize, and writes single values or runs
//! of values through the handle. Allocation, relocation and redraw machinery
//! stay on the host side.

use crate::{error::Result, platform::PlatformSendSync};

/// Resolved reference to a host array.
///
/// A handle describes the array as it was when it was resolved. Hosts that
/// relocate storage on resize bump the array's generation; writes through a
/// handle carrying an older generation fail with
/// [`BridgeError::StaleHandle`](crate::error::BridgeError::StaleHandle).
/// Always resolve again after [`ArrayStore::resize`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayHandle {
    /// Host-side array name
    pub name: String,
    /// Storage generation the handle was resolved against
    pub generation: u64,
    /// Number of `f32` slots at resolve time
    pub len: usize,
}

impl ArrayHandle {
    pub fn new(name: impl Into<String>, generation: u64, len: usize) -> Self {
        Self {
            name: name.into(),
            generation,
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Named float array storage owned by the host.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::arrays::ArrayStore;
///
/// fn fill_silence(store: &dyn ArrayStore, name: &str, len: usize) -> Result<()> {
///     let handle = store.resolve(name).ok_or_else(|| BridgeError::ArrayNotFound(name.into()))?;
///     store.resize(&handle, len)?;
///     let handle = store.resolve(name).ok_or_else(|| BridgeError::ArrayNotFound(name.into()))?;
///     store.write_run(&handle, 0, &vec![0.0; len])?;
///     store.redraw(&handle);
///     Ok(())
/// }
/// ```
pub trait ArrayStore: PlatformSendSync {
    /// Look up an array by name.
    ///
    /// Returns `None` when the host has no array with that name.
    fn resolve(&self, name: &str) -> Option<ArrayHandle>;

    /// Resize the array to exactly `len` slots.
    ///
    /// Existing handles to the array may become stale.
    fn resize(&self, handle: &ArrayHandle, len: usize) -> Result<()>;

    /// Store a single value at `index`.
    fn write(&self, handle: &ArrayHandle, index: usize, value: f32) -> Result<()>;

    /// Store consecutive values starting at `start`.
    ///
    /// Hosts with contiguous storage should override this to copy in one go.
    fn write_run(&self, handle: &ArrayHandle, start: usize, values: &[f32]) -> Result<()> {
        for (offset, value) in values.iter().enumerate() {
            self.write(handle, start + offset, *value)?;
        }
        Ok(())
    }

    /// Ask the host to refresh whatever displays or consumes the array.
    fn redraw(&self, handle: &ArrayHandle);
}
