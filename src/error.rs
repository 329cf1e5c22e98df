//! Error types shared across the crate.
//!
//! Playback itself never fails: out-of-range seeks and steps are clamped and
//! playing an empty timeline is a no-op. These errors cover the edges where
//! a caller hands us something we cannot use.

use thiserror::Error;

/// Errors from slot management.
#[derive(Debug, Error, PartialEq)]
pub enum SlotError {
    /// Slot index past the last slot.
    #[error("Slot {index} out of range (max {max})")]
    OutOfRange { index: usize, max: usize },
}

/// Errors reported by a stream transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection could not be established.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection dropped while streaming.
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Subscribing to the configured topic failed.
    #[error("Subscription failed: {0}")]
    Subscription(String),

    /// Operation requires a connection.
    #[error("Not connected")]
    NotConnected,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from loading frame data.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The input contained no usable frames.
    #[error("No valid data found in input")]
    NoFrames,

    /// The input format was not recognised.
    #[error("Unknown input format")]
    UnknownFormat,

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TransportResult<T> = Result<T, TransportError>;
