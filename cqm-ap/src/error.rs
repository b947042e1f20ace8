//! Error types for cqm-ap
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for cqm-ap
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Playback primitive failed to start a clip
    #[error("Playback error: {0}")]
    Playback(String),

    /// The queue service task is no longer running
    #[error("Queue service stopped")]
    ServiceStopped,

    /// Invalid request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Errors from the common crate
    #[error(transparent)]
    Common(#[from] cqm_common::Error),
}

/// Convenience Result type using cqm-ap Error
pub type Result<T> = std::result::Result<T, Error>;
