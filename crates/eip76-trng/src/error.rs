//! Error types for TRNG driver operations

use thiserror::Error;

/// Result type alias for TRNG operations
pub type Result<T> = std::result::Result<T, TrngError>;

/// Errors that can occur during TRNG operations
#[derive(Debug, Error)]
pub enum TrngError {
    /// Mapping the register window failed
    #[error("Cannot map TRNG register window at {phys_base:#x}: {reason}")]
    Map {
        /// Physical base address that was requested
        phys_base: usize,
        /// Reason for failure
        reason: String,
    },

    /// The READY bit never rose despite FRO recovery
    #[error("TRNG stalled: not ready after {timeout_ms}ms")]
    Stalled {
        /// How long the driver polled before giving up
        timeout_ms: u64,
    },

    /// I/O error during device access
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },
}

impl TrngError {
    /// Create a mapping failure error
    pub fn map_failed(phys_base: usize, reason: impl Into<String>) -> Self {
        Self::Map {
            phys_base,
            reason: reason.into(),
        }
    }

    /// Create a stall error from the configured poll timeout
    pub fn stalled(timeout: std::time::Duration) -> Self {
        Self::Stalled {
            timeout_ms: timeout.as_millis() as u64,
        }
    }
}
