//! Decoded pixel buffers and their binarization.

use super::BitMatrix;
use crate::utils::binarization::{adaptive_binarize, otsu_binarize};
use crate::utils::grayscale::rgb_to_grayscale;

/// Decoded pixel buffer, packed RGB, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
    /// `width * height * 3` bytes
    pub rgb: Vec<u8>,
}

impl Raster {
    /// Wrap an existing RGB buffer
    pub fn new(width: usize, height: usize, rgb: Vec<u8>) -> Self {
        Self { width, height, rgb }
    }

    /// Decode an encoded image (PNG, JPEG, ...) into RGB pixels
    pub fn decode(encoded: &[u8]) -> Result<Self, image::ImageError> {
        let rgb = image::load_from_memory(encoded)?.to_rgb8();
        let (width, height) = rgb.dimensions();
        Ok(Self::new(width as usize, height as usize, rgb.into_raw()))
    }

    /// Luminance plane
    pub fn grayscale(&self) -> Vec<u8> {
        rgb_to_grayscale(&self.rgb, self.width, self.height)
    }

    /// Otsu-binarized dark/light matrix
    pub fn binarize(&self) -> BitMatrix {
        otsu_binarize(&self.grayscale(), self.width, self.height)
    }

    /// Block-adaptive dark/light matrix, for unevenly lit captures
    pub fn binarize_adaptive(&self) -> BitMatrix {
        adaptive_binarize(&self.grayscale(), self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgb, RgbImage};
    use std::io::Cursor;

    #[test]
    fn test_decode_png_and_binarize() {
        let img = RgbImage::from_fn(4, 2, |x, _| {
            if x < 2 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        });
        let mut encoded = Cursor::new(Vec::new());
        img.write_to(&mut encoded, ImageOutputFormat::Png).unwrap();

        let raster = Raster::decode(encoded.get_ref()).unwrap();
        assert_eq!((raster.width, raster.height), (4, 2));

        let binary = raster.binarize();
        assert!(binary.get(0, 0));
        assert!(binary.get(1, 1));
        assert!(!binary.get(3, 0));
        assert_eq!(binary.count_dark(), 4);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(Raster::decode(b"definitely not an image").is_err());
    }
}
