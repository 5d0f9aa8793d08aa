//! Finder pattern detection on a binarized image.
//!
//! Rows are scanned for dark/light/dark/light/dark runs in a 1:1:3:1:1 ratio.
//! Each horizontal hit is confirmed with a vertical cross-check through its
//! centre, and confirmations of the same pattern on nearby rows are merged.

use crate::models::BitMatrix;

/// Centre and module size of a detected finder pattern, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FinderPattern {
    pub x: f64,
    pub y: f64,
    pub module: f64,
    /// Rows that confirmed this pattern
    pub hits: usize,
}

impl FinderPattern {
    pub(crate) fn distance(&self, other: &FinderPattern) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Run lengths within half a module of 1:1:3:1:1
fn ratio_ok(runs: &[usize; 5]) -> bool {
    let total: usize = runs.iter().sum();
    if total < 7 {
        return false;
    }
    let unit = total as f64 / 7.0;
    let tolerance = unit / 2.0;
    let near = |run: usize, expected: f64, slack: f64| (run as f64 - expected).abs() < slack;
    near(runs[0], unit, tolerance)
        && near(runs[1], unit, tolerance)
        && near(runs[2], 3.0 * unit, 3.0 * tolerance)
        && near(runs[3], unit, tolerance)
        && near(runs[4], unit, tolerance)
}

/// Confirm a horizontal hit vertically. Returns the vertical centre and extent.
fn cross_check(image: &BitMatrix, centre_x: f64, row: usize, horizontal: usize) -> Option<(f64, usize)> {
    let x = centre_x.floor() as usize;
    if !image.get(x, row) {
        return None;
    }

    let mut runs = [0usize; 5];
    let mut y = row as isize;
    for (slot, dark) in [(2, true), (1, false), (0, true)] {
        while y >= 0 && image.get(x, y as usize) == dark {
            runs[slot] += 1;
            y -= 1;
        }
    }

    let height = image.height();
    let mut y = row + 1;
    for (slot, dark) in [(2, true), (3, false), (4, true)] {
        while y < height && image.get(x, y) == dark {
            runs[slot] += 1;
            y += 1;
        }
    }

    if !ratio_ok(&runs) {
        return None;
    }
    let vertical: usize = runs.iter().sum();
    if vertical.abs_diff(horizontal) * 2 >= horizontal {
        return None;
    }
    let centre = y as f64 - runs[4] as f64 - runs[3] as f64 - runs[2] as f64 / 2.0;
    Some((centre, vertical))
}

/// Finder candidates confirmed on at least two rows, most confirmed first
pub(crate) fn find_patterns(image: &BitMatrix) -> Vec<FinderPattern> {
    let (width, height) = (image.width(), image.height());
    let mut candidates: Vec<FinderPattern> = Vec::new();
    if width == 0 {
        return candidates;
    }

    for row in 0..height {
        let mut runs = [0usize; 5];
        let mut closed = 0usize;
        let mut current = image.get(0, row);
        let mut start = 0usize;

        // The row end closes the last run
        for x in 1..=width {
            let pixel = if x < width { image.get(x, row) } else { !current };
            if pixel == current {
                continue;
            }
            runs.rotate_left(1);
            runs[4] = x - start;
            closed += 1;
            let closed_dark = current;
            start = x;
            current = pixel;

            if closed < 5 || !closed_dark || !ratio_ok(&runs) {
                continue;
            }
            let horizontal: usize = runs.iter().sum();
            let centre_x = x as f64 - runs[4] as f64 - runs[3] as f64 - runs[2] as f64 / 2.0;
            let Some((centre_y, vertical)) = cross_check(image, centre_x, row, horizontal) else {
                continue;
            };
            let module = (horizontal + vertical) as f64 / 14.0;
            merge(&mut candidates, centre_x, centre_y, module);
        }
    }

    candidates.retain(|c| c.hits >= 2);
    candidates.sort_by(|a, b| b.hits.cmp(&a.hits));
    candidates
}

fn merge(candidates: &mut Vec<FinderPattern>, x: f64, y: f64, module: f64) {
    let near = candidates
        .iter_mut()
        .find(|c| (c.x - x).abs() <= module * 2.0 && (c.y - y).abs() <= module * 2.0);
    match near {
        Some(c) => {
            let k = c.hits as f64;
            c.x = (c.x * k + x) / (k + 1.0);
            c.y = (c.y * k + y) / (k + 1.0);
            c.module = (c.module * k + module) / (k + 1.0);
            c.hits += 1;
        }
        None => candidates.push(FinderPattern {
            x,
            y,
            module,
            hits: 1,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A lone 7x7 finder at `scale` pixels per module with a 1-module margin
    fn finder_image(scale: usize) -> BitMatrix {
        let side = 9 * scale;
        let mut image = BitMatrix::new(side, side);
        for y in 0..side {
            for x in 0..side {
                let (mx, my) = (x / scale, y / scale);
                if !(1..=7).contains(&mx) || !(1..=7).contains(&my) {
                    continue;
                }
                let ring = (mx as isize - 4).abs().max((my as isize - 4).abs());
                image.set(x, y, ring != 2);
            }
        }
        image
    }

    #[test]
    fn test_ratio() {
        assert!(ratio_ok(&[1, 1, 3, 1, 1]));
        assert!(ratio_ok(&[4, 4, 12, 4, 4]));
        assert!(ratio_ok(&[3, 5, 11, 4, 4]));
        assert!(!ratio_ok(&[1, 1, 1, 1, 1]));
        assert!(!ratio_ok(&[4, 4, 4, 4, 12]));
    }

    #[test]
    fn test_single_finder_located() {
        for scale in [1usize, 3, 5] {
            let patterns = find_patterns(&finder_image(scale));
            assert_eq!(patterns.len(), 1, "scale {scale}");
            let centre = 4.5 * scale as f64;
            assert!((patterns[0].x - centre).abs() < 1.0);
            assert!((patterns[0].y - centre).abs() < 1.0);
            assert!((patterns[0].module - scale as f64).abs() < 0.5);
            assert_eq!(patterns[0].hits, 3 * scale);
        }
    }

    #[test]
    fn test_blank_image_has_no_patterns() {
        assert!(find_patterns(&BitMatrix::new(30, 30)).is_empty());
        assert!(find_patterns(&BitMatrix::default()).is_empty());
    }
}
