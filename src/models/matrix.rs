//! Packed dark/light grids shared by binarization and symbol reading.

/// Packed black/white pixel grid produced by binarization; `true` = dark
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMatrix {
    width: usize,
    height: usize,
    words: Vec<u64>,
}

impl BitMatrix {
    /// Create an all-light matrix
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            words: vec![0; (width * height).div_ceil(64)],
        }
    }

    /// Matrix width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Matrix height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    fn locate(&self, x: usize, y: usize) -> Option<(usize, u64)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = y * self.width + x;
        Some((index / 64, 1u64 << (index % 64)))
    }

    /// Bit at (x, y); out-of-range reads are light
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.locate(x, y)
            .map(|(word, mask)| self.words[word] & mask != 0)
            .unwrap_or(false)
    }

    /// Set bit at (x, y); out-of-range writes are ignored
    pub fn set(&mut self, x: usize, y: usize, dark: bool) {
        if let Some((word, mask)) = self.locate(x, y) {
            if dark {
                self.words[word] |= mask;
            } else {
                self.words[word] &= !mask;
            }
        }
    }

    /// Number of dark pixels
    pub fn count_dark(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Copy with every pixel flipped, for light-on-dark symbols
    pub fn inverted(&self) -> Self {
        let mut inverted = self.clone();
        for word in &mut inverted.words {
            *word = !*word;
        }
        let used = (self.width * self.height) % 64;
        if used != 0 {
            if let Some(last) = inverted.words.last_mut() {
                *last &= (1u64 << used) - 1;
            }
        }
        inverted
    }

    /// Fraction of dark pixels, 0.0 for an empty matrix
    pub fn dark_ratio(&self) -> f64 {
        let total = self.width * self.height;
        if total == 0 {
            0.0
        } else {
            self.count_dark() as f64 / total as f64
        }
    }
}

impl Default for BitMatrix {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut matrix = BitMatrix::new(9, 9);
        matrix.set(3, 4, true);
        matrix.set(8, 8, true);
        assert!(matrix.get(3, 4));
        assert!(matrix.get(8, 8));
        assert!(!matrix.get(4, 3));
        assert_eq!(matrix.count_dark(), 2);

        matrix.set(3, 4, false);
        assert!(!matrix.get(3, 4));
        assert_eq!(matrix.count_dark(), 1);
    }

    #[test]
    fn test_inverted() {
        let mut matrix = BitMatrix::new(5, 3);
        matrix.set(0, 0, true);
        matrix.set(4, 2, true);
        let inverted = matrix.inverted();
        assert_eq!(inverted.count_dark(), 13);
        assert!(!inverted.get(0, 0));
        assert!(inverted.get(1, 0));
        assert_eq!(inverted.inverted(), matrix);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut matrix = BitMatrix::new(8, 8);
        matrix.set(10, 10, true);
        assert!(!matrix.get(10, 10));
        assert_eq!(matrix.count_dark(), 0);
        assert_eq!(BitMatrix::default().dark_ratio(), 0.0);
    }
}
