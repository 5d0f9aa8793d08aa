//! Core data structures shared by the codecs and the scan pipeline.

pub mod decoded;
pub mod fields;
pub mod image_file;
pub mod matrix;
pub mod payload_type;
pub mod raster;

pub use decoded::DecodedResult;
pub use fields::FieldSet;
pub use image_file::ImageFile;
pub use matrix::BitMatrix;
pub use payload_type::{Encryption, PayloadType};
pub use raster::Raster;
