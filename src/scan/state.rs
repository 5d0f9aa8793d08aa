//! Scan states, failure kinds and the per-session record.

use super::camera::CameraSubscription;
use super::messages;
use crate::error::CameraAccessError;
use crate::models::ImageFile;
use std::fmt;

/// Where the scanned image comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionMode {
    /// Continuous camera frames
    Camera,
    /// A single uploaded or opened file
    File,
}

/// Label of a decoder tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecoderTier {
    /// Local image decoder
    Primary,
    /// Local rasterize-and-matrix-decode fallback
    Secondary,
    /// Network-bound decoder
    Remote,
}

impl DecoderTier {
    /// Short lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            DecoderTier::Primary => "primary",
            DecoderTier::Secondary => "secondary",
            DecoderTier::Remote => "remote",
        }
    }
}

impl fmt::Display for DecoderTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last error a session observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A tier found nothing
    DecodeMiss(DecoderTier),
    /// Camera acquisition or streaming failed
    CameraAccess(CameraAccessError),
    /// The remote decoder failed; carries the rendered error
    RemoteService(String),
}

/// Why a session ended in [`ScanState::Failed`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Every tier ran and missed
    Exhausted {
        /// Tiers attempted, in order
        tried: Vec<DecoderTier>,
    },
    /// The user refused remote decoding
    ConsentDeclined,
    /// The camera session broke
    Camera(CameraAccessError),
}

/// Terminal failure with its user-facing copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFailure {
    /// Cause
    pub kind: FailureKind,
    /// Message to show the user
    pub message: String,
}

impl ScanFailure {
    pub(crate) fn new(kind: FailureKind) -> Self {
        let message = match &kind {
            FailureKind::Exhausted { tried } => messages::exhausted(tried),
            FailureKind::ConsentDeclined => messages::CONSENT_DECLINED.to_string(),
            FailureKind::Camera(err) => messages::camera_error(err).to_string(),
        };
        Self { kind, message }
    }
}

/// Pipeline state. `Success` and `Failed` hold until [`reset`](super::ScanPipeline::reset).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    /// No session
    Idle,
    /// Camera acquired, frames being tested
    CameraActive,
    /// A file tier is running
    FileDecoding(DecoderTier),
    /// Local tiers missed; waiting for the user to allow remote decoding
    AwaitingFallbackConsent {
        /// Service the image would be sent to
        service: String,
    },
    /// Scanned text
    Success(String),
    /// Terminal failure
    Failed(ScanFailure),
}

impl ScanState {
    /// Stable state name for logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            ScanState::Idle => "idle",
            ScanState::CameraActive => "camera active",
            ScanState::FileDecoding(DecoderTier::Primary) => "decoding (primary)",
            ScanState::FileDecoding(DecoderTier::Secondary) => "decoding (secondary)",
            ScanState::FileDecoding(DecoderTier::Remote) => "decoding (remote)",
            ScanState::AwaitingFallbackConsent { .. } => "awaiting consent",
            ScanState::Success(_) => "succeeded",
            ScanState::Failed(_) => "failed",
        }
    }

    /// True for `Success` and `Failed`
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanState::Success(_) | ScanState::Failed(_))
    }
}

/// Transient per-scan state, owned by the pipeline and dropped on reset.
/// Dropping a session releases its camera.
#[derive(Debug)]
pub struct ScanSession {
    /// Camera or file
    pub acquisition_mode: AcquisitionMode,
    /// Tier currently or last attempted
    pub attempt: Option<DecoderTier>,
    /// Scanned text once successful
    pub raw_result: Option<String>,
    /// Most recent error observed
    pub last_error: Option<ErrorKind>,
    pub(crate) image: Option<ImageFile>,
    pub(crate) pending_tier: Option<usize>,
    pub(crate) tried: Vec<DecoderTier>,
    pub(crate) camera: Option<CameraSubscription>,
    pub(crate) frames_missed: usize,
}

impl ScanSession {
    pub(crate) fn new(acquisition_mode: AcquisitionMode) -> Self {
        Self {
            acquisition_mode,
            attempt: None,
            raw_result: None,
            last_error: None,
            image: None,
            pending_tier: None,
            tried: Vec::new(),
            camera: None,
            frames_missed: 0,
        }
    }

    /// Tiers run so far, in order
    pub fn tried(&self) -> &[DecoderTier] {
        &self.tried
    }

    /// Camera frames tested without a hit
    pub fn frames_missed(&self) -> usize {
        self.frames_missed
    }
}
