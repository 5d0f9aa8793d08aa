//! Global (Otsu, fixed) and block-adaptive thresholding of luminance planes.

use crate::models::BitMatrix;

/// Block side for adaptive thresholding, in pixels
const BLOCK: usize = 8;
/// Blocks with less contrast than this are treated as flat
const MIN_DYNAMIC_RANGE: u32 = 24;
/// Images narrower or shorter than this fall back to Otsu
const MIN_ADAPTIVE_SIDE: usize = 5 * BLOCK;

/// Binarize with Otsu's global threshold. Pixels darker than the threshold are set.
pub fn otsu_binarize(gray: &[u8], width: usize, height: usize) -> BitMatrix {
    threshold_binarize(gray, width, height, otsu_threshold(gray))
}

/// Otsu's threshold: maximizes between-class variance over the histogram.
/// A single-intensity image has no split and yields 0, so nothing is dark.
pub fn otsu_threshold(gray: &[u8]) -> u8 {
    let mut histogram = [0u64; 256];
    for &pixel in gray {
        histogram[pixel as usize] += 1;
    }

    let total = gray.len() as f64;
    let weighted_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    // Running sums over intensities strictly below the candidate threshold
    let mut below_count = 0.0f64;
    let mut below_sum = 0.0f64;
    let mut best_variance = 0.0f64;
    let mut best = 0u8;

    for threshold in 0..256usize {
        if threshold > 0 {
            below_count += histogram[threshold - 1] as f64;
            below_sum += (threshold - 1) as f64 * histogram[threshold - 1] as f64;
        }
        let above_count = total - below_count;
        if below_count == 0.0 || above_count == 0.0 {
            continue;
        }
        let mean_below = below_sum / below_count;
        let mean_above = (weighted_total - below_sum) / above_count;
        let variance =
            (below_count / total) * (above_count / total) * (mean_below - mean_above).powi(2);
        if variance > best_variance {
            best_variance = variance;
            best = threshold as u8;
        }
    }

    best
}

/// Binarize with a fixed threshold
pub fn threshold_binarize(gray: &[u8], width: usize, height: usize, threshold: u8) -> BitMatrix {
    let mut binary = BitMatrix::new(width, height);
    for (idx, &pixel) in gray.iter().take(width * height).enumerate() {
        if pixel < threshold {
            binary.set(idx % width, idx / width, true);
        }
    }
    binary
}

/// Binarize against local block averages so uneven lighting keeps both classes.
///
/// Each 8x8 block gets an average; flat blocks borrow their neighbours' level.
/// A pixel is dark when at or below the mean of the 5x5 block neighbourhood
/// around its block. Small images use [`otsu_binarize`].
pub fn adaptive_binarize(gray: &[u8], width: usize, height: usize) -> BitMatrix {
    if width < MIN_ADAPTIVE_SIDE || height < MIN_ADAPTIVE_SIDE || gray.len() < width * height {
        return otsu_binarize(gray, width, height);
    }

    let blocks_wide = width.div_ceil(BLOCK);
    let blocks_high = height.div_ceil(BLOCK);
    let mut averages = vec![0u32; blocks_wide * blocks_high];

    for by in 0..blocks_high {
        for bx in 0..blocks_wide {
            let (mut lo, mut hi, mut sum, mut count) = (u32::MAX, 0u32, 0u32, 0u32);
            for y in by * BLOCK..((by + 1) * BLOCK).min(height) {
                for &pixel in &gray[y * width + bx * BLOCK..y * width + ((bx + 1) * BLOCK).min(width)] {
                    let pixel = u32::from(pixel);
                    lo = lo.min(pixel);
                    hi = hi.max(pixel);
                    sum += pixel;
                    count += 1;
                }
            }

            let mut average = sum / count;
            if hi - lo <= MIN_DYNAMIC_RANGE {
                // Flat block: assume background unless the neighbours say otherwise
                average = lo / 2;
                if by > 0 && bx > 0 {
                    let neighbours = (averages[(by - 1) * blocks_wide + bx]
                        + 2 * averages[by * blocks_wide + bx - 1]
                        + averages[(by - 1) * blocks_wide + bx - 1])
                        / 4;
                    if lo < neighbours {
                        average = neighbours;
                    }
                }
            }
            averages[by * blocks_wide + bx] = average;
        }
    }

    let mut binary = BitMatrix::new(width, height);
    for by in 0..blocks_high {
        for bx in 0..blocks_wide {
            let (mut sum, mut count) = (0u32, 0u32);
            for ny in by.saturating_sub(2)..(by + 3).min(blocks_high) {
                for nx in bx.saturating_sub(2)..(bx + 3).min(blocks_wide) {
                    sum += averages[ny * blocks_wide + nx];
                    count += 1;
                }
            }
            let threshold = sum / count;

            for y in by * BLOCK..((by + 1) * BLOCK).min(height) {
                for x in bx * BLOCK..((bx + 1) * BLOCK).min(width) {
                    if u32::from(gray[y * width + x]) <= threshold {
                        binary.set(x, y, true);
                    }
                }
            }
        }
    }
    binary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_binarize() {
        let gray = vec![100, 150, 200, 50];
        let binary = threshold_binarize(&gray, 2, 2, 128);
        assert!(binary.get(0, 0));
        assert!(!binary.get(1, 0));
        assert!(!binary.get(0, 1));
        assert!(binary.get(1, 1));
    }

    #[test]
    fn test_otsu_binarize() {
        let mut gray = vec![50u8; 50];
        gray.extend(vec![200u8; 50]);

        let threshold = otsu_threshold(&gray);
        assert!(threshold > 50 && threshold <= 200);

        let binary = otsu_binarize(&gray, 10, 10);
        assert!(binary.get(0, 0));
        assert!(!binary.get(0, 7));
        assert_eq!(binary.count_dark(), 50);
    }

    /// Dark bars on a left-to-right gradient from 255 down to 55
    fn shaded_bars(width: usize, height: usize) -> Vec<u8> {
        let mut gray = Vec::with_capacity(width * height);
        for _ in 0..height {
            for x in 0..width {
                let base = 255 - 200 * x / (width - 1);
                let value = if (x / 4) % 2 == 0 { base / 4 } else { base };
                gray.push(value as u8);
            }
        }
        gray
    }

    #[test]
    fn test_adaptive_survives_shading() {
        let (width, height) = (128, 48);
        let gray = shaded_bars(width, height);

        let adaptive = adaptive_binarize(&gray, width, height);
        for x in 0..width {
            assert_eq!(adaptive.get(x, 20), (x / 4) % 2 == 0, "column {x}");
        }

        // A single global threshold loses the light bars on the dim side
        let global = otsu_binarize(&gray, width, height);
        let wrong = (0..width)
            .filter(|&x| global.get(x, 20) != ((x / 4) % 2 == 0))
            .count();
        assert!(wrong > 0);
    }

    #[test]
    fn test_adaptive_small_image_uses_otsu() {
        let mut gray = vec![50u8; 50];
        gray.extend(vec![200u8; 50]);
        assert_eq!(adaptive_binarize(&gray, 10, 10), otsu_binarize(&gray, 10, 10));
    }

    #[test]
    fn test_adaptive_flat_image_stays_light() {
        let gray = vec![180u8; 64 * 64];
        assert_eq!(adaptive_binarize(&gray, 64, 64).count_dark(), 0);
    }

    #[test]
    fn test_uniform_image_stays_light() {
        let gray = vec![90u8; 16];
        let binary = otsu_binarize(&gray, 4, 4);
        assert_eq!(binary.count_dark(), 0);
    }
}
