//! # Decoder Library Lifecycle
//!
//! Reference-counted process-wide setup for a [`DecoderLibrary`].
//!
//! The first [`LibraryLifecycle::acquire`] calls `init`, the release of the
//! last live [`LibraryLease`] calls `exit`. Decoder objects hold one lease per
//! open stream, so re-opening on one object or running several objects side
//! by side never double-initializes or prematurely tears down the library.

use crate::config::DecodeConfig;
use crate::error::{DecodeError, Result};
use crate::traits::{DecoderHandle, DecoderLibrary};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

/// Shared init/exit bookkeeping around one decoder library.
pub struct LibraryLifecycle {
    library: Arc<dyn DecoderLibrary>,
    leases: Mutex<usize>,
}

impl fmt::Debug for LibraryLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryLifecycle")
            .field("library", &self.library.name())
            .field("leases", &*self.leases.lock())
            .finish()
    }
}

impl LibraryLifecycle {
    pub fn new(library: Arc<dyn DecoderLibrary>) -> Arc<Self> {
        Arc::new(Self {
            library,
            leases: Mutex::new(0),
        })
    }

    /// Take a lease, initializing the library if none is live.
    pub fn acquire(self: &Arc<Self>) -> Result<LibraryLease> {
        let mut leases = self.leases.lock();

        if *leases == 0 {
            self.library.init().map_err(|fault| {
                error!(library = self.library.name(), "Library init failed: {}", fault);
                DecodeError::Initialization(fault.to_string())
            })?;
            debug!(library = self.library.name(), "Library initialized");
        }

        *leases += 1;

        Ok(LibraryLease {
            lifecycle: Arc::clone(self),
            released: false,
        })
    }

    /// Number of live leases.
    pub fn active_leases(&self) -> usize {
        *self.leases.lock()
    }

    pub fn library_name(&self) -> &str {
        self.library.name()
    }

    fn release_one(&self) {
        let mut leases = self.leases.lock();
        if *leases == 0 {
            return;
        }

        *leases -= 1;
        if *leases == 0 {
            self.library.exit();
            debug!(library = self.library.name(), "Library released");
        }
    }
}

/// A live claim on an initialized library.
///
/// Released explicitly with [`release`](Self::release) or on drop, whichever
/// comes first.
pub struct LibraryLease {
    lifecycle: Arc<LibraryLifecycle>,
    released: bool,
}

impl fmt::Debug for LibraryLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryLease")
            .field("library", &self.lifecycle.library_name())
            .field("released", &self.released)
            .finish()
    }
}

impl LibraryLease {
    /// Create a decoder handle from the leased library.
    pub fn new_handle(&self, config: &DecodeConfig) -> Result<Box<dyn DecoderHandle>> {
        self.lifecycle
            .library
            .new_handle(config)
            .map_err(|fault| DecodeError::Allocation(fault.to_string()))
    }

    /// Give the lease back. Idempotent.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.lifecycle.release_one();
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Drop for LibraryLease {
    fn drop(&mut self) {
        self.release();
    }
}
