//! Error taxonomy for the scan pipeline.
//!
//! Tier misses and remote failures are recovered inside the pipeline and drive
//! state transitions; only [`ScanError`] is returned to callers, for requests
//! the pipeline refuses outright.

use thiserror::Error;

/// Why a camera session could not start or continue
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraAccessError {
    /// The user or platform refused camera access
    #[error("camera permission denied")]
    PermissionDenied,
    /// No camera is attached
    #[error("no camera device found")]
    DeviceNotFound,
    /// Another application holds the camera
    #[error("camera is in use by another application")]
    DeviceBusy,
    /// Any other platform failure
    #[error("camera failure: {0}")]
    Other(String),
}

/// Failure of the network-bound decoder
#[derive(Debug, Error)]
pub enum RemoteServiceError {
    /// Connection, TLS or timeout failure
    #[error("remote decoder unreachable: {0}")]
    Transport(String),
    /// Non-2xx response
    #[error("remote decoder returned HTTP {0}")]
    Status(u16),
    /// Response parsed but carried no decoded text
    #[error("remote decoder found no QR code")]
    MissingData,
    /// Response body was not the expected JSON shape
    #[error("remote decoder response malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The scan was cancelled before the request went out
    #[error("remote decoding cancelled")]
    Cancelled,
}

/// A decoder tier found nothing. Expected; triggers escalation.
#[derive(Debug, Error)]
pub enum DecodeMiss {
    /// The decoder ran and saw no symbol
    #[error("no QR code found")]
    NotFound,
    /// The image could not be read by this decoder
    #[error("image unreadable: {0}")]
    Unreadable(String),
    /// The remote decoder failed
    #[error(transparent)]
    Remote(#[from] RemoteServiceError),
}

/// Requests the pipeline refuses
#[derive(Debug, Error)]
pub enum ScanError {
    /// The input failed validation; no decoder ran
    #[error("validation failed: {0}")]
    Validation(String),
    /// A scan is already in progress; reset first
    #[error("a scan session is already active ({0})")]
    SessionActive(&'static str),
    /// The operation does not apply in the current state
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        /// Requested operation
        action: &'static str,
        /// Current state name
        state: &'static str,
    },
    /// The camera could not be acquired
    #[error(transparent)]
    Camera(#[from] CameraAccessError),
}
