//! Acquisition of the raw scanned string.
//!
//! Two sources feed the pipeline:
//! - Camera: a cancellable frame subscription tested frame by frame
//! - File: a cascade of decoder tiers of increasing cost, with a consent gate
//!   before any tier that sends the image off-device

/// Camera subscription, frame and matrix decoder capabilities
pub mod camera;
/// User-facing copy for prompts and failures
pub mod messages;
/// The scan state machine
pub mod pipeline;
/// Remote decode service tier
pub mod remote;
/// Session and state types
pub mod state;
/// Decoder tier capability and the on-device tiers
pub mod tier;

pub use camera::{
    CameraSource, CameraSubscription, CancelToken, FrameDecoder, FrameStream, MatrixDecoder,
    MatrixFrameDecoder,
};
pub use pipeline::ScanPipeline;
pub use remote::{HttpTransport, RemoteReply, RemoteTier, RemoteTransport};
pub use state::{
    AcquisitionMode, DecoderTier, ErrorKind, FailureKind, ScanFailure, ScanSession, ScanState,
};
pub use tier::{
    DecoderEntry, ImageDecoder, PrimaryTier, RasterTier, TierDecoder, standard_local_tiers,
};
