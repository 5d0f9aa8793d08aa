//! Helpers shared by the codecs and the scan pipeline:
//! - Percent-encoding for URI components
//! - Grayscale conversion (RGB/RGBA to luminance)
//! - Binarization (Otsu's method, block-adaptive and fixed threshold)

pub mod binarization;
pub mod grayscale;
pub mod percent;
