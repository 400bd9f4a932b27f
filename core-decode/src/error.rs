//! # Decode Error Types
//!
//! Error types for the open / bind / decode pipeline.

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Errors that can occur while probing, binding or decoding.
#[derive(Error, Debug)]
pub enum DecodeError {
    // ========================================================================
    // Probe Errors
    // ========================================================================
    /// The decoder library could not be initialized.
    #[error("Decoder library initialization failed: {0}")]
    Initialization(String),

    /// A decoder handle could not be created.
    #[error("Decoder handle allocation failed: {0}")]
    Allocation(String),

    /// The stream could not be opened.
    #[error("Failed to open {path}: {reason}")]
    Open { path: String, reason: String },

    /// The stream format could not be queried or is not supported.
    #[error("Format query failed: {0}")]
    FormatQuery(String),

    /// The decoder could not report the stream length.
    #[error("Stream length unknown: {0}")]
    LengthUnknown(String),

    // ========================================================================
    // Binding Errors
    // ========================================================================
    /// A destination array could not be bound.
    #[error("Cannot bind array '{name}': {reason}")]
    Bind { name: String, reason: String },

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Host bridge call failed.
    #[error("Host error: {0}")]
    Host(#[from] BridgeError),

    /// Invalid decode configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl DecodeError {
    /// Returns `true` if this error aborts the command and tears the session down.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DecodeError::Bind { .. } | DecodeError::Host(_))
    }
}

/// Result type for decode operations.
pub type Result<T> = std::result::Result<T, DecodeError>;
