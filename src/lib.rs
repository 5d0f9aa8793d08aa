//! QR payload toolkit
//!
//! Turns structured data (Wi-Fi credentials, contact cards, payment requests, ...)
//! into canonical QR payload text, classifies scanned text back into structured
//! form, and drives the acquisition of scanned text from a camera or an image
//! file through a tiered decoder cascade, reading symbols on-device first.
//!
//! ```
//! use qr_payload::{FieldSet, PayloadType};
//!
//! let fields = FieldSet::new()
//!     .with("ssid", "HomeNet")
//!     .with("password", "secret123")
//!     .with("encryption", "WPA");
//! let payload = qr_payload::encode(PayloadType::Wifi, &fields);
//! assert_eq!(payload, "WIFI:T:WPA;S:HomeNet;P:secret123;;");
//!
//! let decoded = qr_payload::classify(&payload);
//! assert_eq!(decoded.payload_type, Some(PayloadType::Wifi));
//! ```

#![warn(missing_docs)]

/// Scanned text to structured result
pub mod classifier;
/// Remote decoder settings
pub mod config;
/// Structured fields to payload text
pub mod encoder;
/// Error taxonomy
pub mod error;
/// History-recording collaborator
pub mod history;
/// Core data structures (PayloadType, FieldSet, DecodedResult, images)
pub mod models;
/// Display formatting of classification results
pub mod presenter;
/// Camera and file acquisition pipeline
pub mod scan;
/// On-device QR symbol reader
pub mod symbol;
/// Utility functions (percent-encoding, grayscale, binarization)
pub mod utils;

pub use classifier::PayloadClassifier;
pub use config::RemoteConfig;
pub use encoder::{EscapePolicy, PayloadEncoder};
pub use error::{CameraAccessError, DecodeMiss, RemoteServiceError, ScanError};
pub use models::{BitMatrix, DecodedResult, Encryption, FieldSet, ImageFile, PayloadType, Raster};
pub use presenter::{Presentation, ResultPresenter};
pub use scan::{ScanPipeline, ScanState};
pub use symbol::SymbolReader;

/// Encode with the default (compatible) escape policy
pub fn encode(payload_type: PayloadType, fields: &FieldSet) -> String {
    PayloadEncoder::new().encode(payload_type, fields)
}

/// Classify scanned text
pub fn classify(raw: &str) -> DecodedResult {
    PayloadClassifier::new().classify(raw)
}

/// Classify and format scanned text for display
pub fn present(raw: &str) -> Presentation {
    ResultPresenter::new().present(&classify(raw))
}
