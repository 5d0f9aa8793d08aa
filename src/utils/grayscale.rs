//! Luminance conversion for rasterized images and camera frames.
//!
//! Y = 0.299*R + 0.587*G + 0.114*B, computed as (76*R + 150*G + 29*B) >> 8.
//! Rows are converted in parallel with rayon.

use rayon::prelude::*;

const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((COEF_R * r as u32 + COEF_G * g as u32 + COEF_B * b as u32) >> 8).min(255) as u8
}

fn to_grayscale(pixels: &[u8], width: usize, height: usize, channels: usize) -> Vec<u8> {
    let mut gray = vec![0u8; width * height];
    if width == 0 || pixels.len() < width * height * channels {
        return gray;
    }
    gray.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        let src = &pixels[y * width * channels..(y + 1) * width * channels];
        for (dst, px) in row.iter_mut().zip(src.chunks_exact(channels)) {
            *dst = luma(px[0], px[1], px[2]);
        }
    });
    gray
}

/// Convert packed RGB (3 bytes per pixel) to grayscale.
/// A buffer shorter than `width * height * 3` yields an all-black image.
pub fn rgb_to_grayscale(rgb: &[u8], width: usize, height: usize) -> Vec<u8> {
    to_grayscale(rgb, width, height, 3)
}

/// Convert packed RGBA (4 bytes per pixel) to grayscale, ignoring alpha
pub fn rgba_to_grayscale(rgba: &[u8], width: usize, height: usize) -> Vec<u8> {
    to_grayscale(rgba, width, height, 4)
}
