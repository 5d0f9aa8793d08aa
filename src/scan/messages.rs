//! User-facing copy for the scan flow.

use super::state::DecoderTier;
use crate::error::CameraAccessError;

/// Shown when the user refuses remote decoding
pub const CONSENT_DECLINED: &str = "Remote decoding was declined, so the image never left this device. \
No QR code could be read locally; try again with a clearer image.";

/// Consent prompt naming the service and stating the image will be uploaded
pub fn consent_prompt(service: &str) -> String {
    format!(
        "The on-device decoders could not read this image. Send it to {service} for decoding? \
The image will be uploaded and leave this device."
    )
}

/// Apologetic copy once every tier has missed
pub fn exhausted(tried: &[DecoderTier]) -> String {
    let names: Vec<&str> = tried.iter().map(DecoderTier::as_str).collect();
    format!(
        "Sorry, we couldn't read a QR code from this image. All {} decoders were tried ({}). \
Please try again with a clearer, well-lit image.",
        tried.len(),
        names.join(", ")
    )
}

/// One message per camera failure cause
pub fn camera_error(err: &CameraAccessError) -> &'static str {
    match err {
        CameraAccessError::PermissionDenied => {
            "Camera access was denied. Allow camera permission in your settings and try again."
        }
        CameraAccessError::DeviceNotFound => "No camera was found on this device.",
        CameraAccessError::DeviceBusy => {
            "The camera is being used by another application. Close it and try again."
        }
        CameraAccessError::Other(_) => "The camera stopped unexpectedly. Please try again.",
    }
}
