//! Symbol geometry from three finder centres: orientation, version estimate
//! and module sampling.

use super::finder::FinderPattern;
use super::layout::symbol_size;
use crate::models::BitMatrix;

/// Finder centres in symbol orientation
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Corners {
    pub top_left: FinderPattern,
    pub top_right: FinderPattern,
    pub bottom_left: FinderPattern,
}

impl Corners {
    /// The pattern opposite the longest side is top-left; the winding of the
    /// other two separates top-right from bottom-left.
    pub(crate) fn order(a: FinderPattern, b: FinderPattern, c: FinderPattern) -> Self {
        let (ab, bc, ac) = (a.distance(&b), b.distance(&c), a.distance(&c));
        let (top_left, p1, p2) = if bc >= ab && bc >= ac {
            (a, b, c)
        } else if ac >= ab && ac >= bc {
            (b, a, c)
        } else {
            (c, a, b)
        };

        let cross = (p1.x - top_left.x) * (p2.y - top_left.y) - (p1.y - top_left.y) * (p2.x - top_left.x);
        let (top_right, bottom_left) = if cross > 0.0 { (p1, p2) } else { (p2, p1) };
        Self {
            top_left,
            top_right,
            bottom_left,
        }
    }

    /// Versions worth sampling, nearest estimate first
    pub(crate) fn candidate_versions(&self) -> Vec<u8> {
        let module = (self.top_left.module + self.top_right.module + self.bottom_left.module) / 3.0;
        if module <= 0.0 {
            return Vec::new();
        }
        let across = (self.top_left.distance(&self.top_right)
            + self.top_left.distance(&self.bottom_left))
            / 2.0;
        let modules = across / module + 7.0;
        let estimate = ((modules - 17.0) / 4.0).round() as i64;
        [estimate, estimate - 1, estimate + 1]
            .into_iter()
            .filter(|v| (1..=40).contains(v))
            .map(|v| v as u8)
            .collect()
    }

    /// Sample a `version` grid on the affine frame spanned by the finder centres.
    /// Samples outside the image are light.
    pub(crate) fn sample(&self, image: &BitMatrix, version: u8) -> BitMatrix {
        let size = symbol_size(version);
        let span = (size - 7) as f64;
        let origin = &self.top_left;
        let ux = (
            (self.top_right.x - origin.x) / span,
            (self.top_right.y - origin.y) / span,
        );
        let uy = (
            (self.bottom_left.x - origin.x) / span,
            (self.bottom_left.y - origin.y) / span,
        );

        let mut grid = BitMatrix::new(size, size);
        for my in 0..size {
            for mx in 0..size {
                // Finder centres sit 3.5 modules in; module centres at +0.5
                let (fx, fy) = (mx as f64 - 3.0, my as f64 - 3.0);
                let px = (origin.x + fx * ux.0 + fy * uy.0).floor();
                let py = (origin.y + fx * ux.1 + fy * uy.1).floor();
                if px >= 0.0 && py >= 0.0 && image.get(px as usize, py as usize) {
                    grid.set(mx, my, true);
                }
            }
        }
        grid
    }
}
