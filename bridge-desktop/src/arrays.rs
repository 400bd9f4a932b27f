//! In-memory array store
//!
//! Reference [`ArrayStore`] for desktop hosts and tests. Arrays live in a
//! name-keyed map; every resize reallocates the backing `Vec` and bumps the
//! array's generation, so writes through a handle resolved before the resize
//! are rejected the same way a relocating host would invalidate raw pointers.

use bridge_traits::{
    arrays::{ArrayHandle, ArrayStore},
    error::{BridgeError, Result},
};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, trace};

#[derive(Debug, Default)]
struct StoredArray {
    data: Vec<f32>,
    generation: u64,
    redraws: usize,
}

/// Name-keyed float arrays held in process memory.
///
/// - Arrays must be created with [`MemoryArrayStore::create`] before they
///   can be resolved
/// - Resizing zero-fills new slots and invalidates existing handles
/// - Redraw requests are counted so tests can observe them
#[derive(Debug, Default)]
pub struct MemoryArrayStore {
    arrays: RwLock<HashMap<String, StoredArray>>,
}

impl MemoryArrayStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or replace) an array of `len` zeroed slots.
    pub fn create(&self, name: impl Into<String>, len: usize) {
        let name = name.into();
        debug!(array = %name, len, "Created array");
        self.arrays.write().insert(
            name,
            StoredArray {
                data: vec![0.0; len],
                ..Default::default()
            },
        );
    }

    /// Remove an array; later resolves of `name` fail.
    pub fn remove(&self, name: &str) -> bool {
        self.arrays.write().remove(name).is_some()
    }

    /// Copy of the array contents.
    pub fn snapshot(&self, name: &str) -> Option<Vec<f32>> {
        self.arrays.read().get(name).map(|array| array.data.clone())
    }

    /// Current length of the array.
    pub fn len_of(&self, name: &str) -> Option<usize> {
        self.arrays.read().get(name).map(|array| array.data.len())
    }

    /// Number of redraw requests received for the array.
    pub fn redraw_count(&self, name: &str) -> usize {
        self.arrays
            .read()
            .get(name)
            .map(|array| array.redraws)
            .unwrap_or(0)
    }

    fn check_generation(handle: &ArrayHandle, array: &StoredArray) -> Result<()> {
        if handle.generation != array.generation {
            return Err(BridgeError::StaleHandle {
                name: handle.name.clone(),
                held: handle.generation,
                current: array.generation,
            });
        }
        Ok(())
    }
}

impl ArrayStore for MemoryArrayStore {
    fn resolve(&self, name: &str) -> Option<ArrayHandle> {
        self.arrays
            .read()
            .get(name)
            .map(|array| ArrayHandle::new(name, array.generation, array.data.len()))
    }

    fn resize(&self, handle: &ArrayHandle, len: usize) -> Result<()> {
        let mut arrays = self.arrays.write();
        let array = arrays
            .get_mut(&handle.name)
            .ok_or_else(|| BridgeError::ArrayNotFound(handle.name.clone()))?;

        // Fresh allocation, like a host that relocates storage on resize.
        let mut data = vec![0.0; len];
        let keep = len.min(array.data.len());
        data[..keep].copy_from_slice(&array.data[..keep]);
        array.data = data;
        array.generation += 1;

        debug!(array = %handle.name, len, generation = array.generation, "Resized array");
        Ok(())
    }

    fn write(&self, handle: &ArrayHandle, index: usize, value: f32) -> Result<()> {
        let mut arrays = self.arrays.write();
        let array = arrays
            .get_mut(&handle.name)
            .ok_or_else(|| BridgeError::ArrayNotFound(handle.name.clone()))?;
        Self::check_generation(handle, array)?;

        let len = array.data.len();
        let slot = array
            .data
            .get_mut(index)
            .ok_or_else(|| BridgeError::OutOfBounds {
                name: handle.name.clone(),
                index,
                len,
            })?;
        *slot = value;
        Ok(())
    }

    fn write_run(&self, handle: &ArrayHandle, start: usize, values: &[f32]) -> Result<()> {
        let mut arrays = self.arrays.write();
        let array = arrays
            .get_mut(&handle.name)
            .ok_or_else(|| BridgeError::ArrayNotFound(handle.name.clone()))?;
        Self::check_generation(handle, array)?;

        let len = array.data.len();
        let end = start + values.len();
        if end > len {
            return Err(BridgeError::OutOfBounds {
                name: handle.name.clone(),
                index: end - 1,
                len,
            });
        }
        array.data[start..end].copy_from_slice(values);
        Ok(())
    }

    fn redraw(&self, handle: &ArrayHandle) {
        if let Some(array) = self.arrays.write().get_mut(&handle.name) {
            array.redraws += 1;
            trace!(array = %handle.name, "Redraw requested");
        }
    }
}
