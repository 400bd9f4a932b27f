use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Array not found: {0}")]
    ArrayNotFound(String),

    #[error("Stale handle for array '{name}' (generation {held}, current {current})")]
    StaleHandle {
        name: String,
        held: u64,
        current: u64,
    },

    #[error("Index {index} out of bounds for array '{name}' of length {len}")]
    OutOfBounds {
        name: String,
        index: usize,
        len: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
