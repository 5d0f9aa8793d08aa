//! Module layout of a symbol: which modules are function patterns, the eight
//! data masks and the two-column zigzag that carries the codewords.

use crate::models::BitMatrix;

/// Function module mask for one version; set = function module, not data
pub(crate) struct FunctionMask {
    mask: BitMatrix,
}

impl FunctionMask {
    pub(crate) fn new(version: u8) -> Self {
        let size = symbol_size(version);
        let mut mask = BitMatrix::new(size, size);

        // Finders with separators and the format areas beside them
        mark(&mut mask, 0, 0, 9, 9);
        mark(&mut mask, size - 8, 0, 8, 9);
        mark(&mut mask, 0, size - 8, 9, 8);

        for i in 0..size {
            mask.set(6, i, true);
            mask.set(i, 6, true);
        }

        let centres = alignment_positions(version);
        let last = centres.len().saturating_sub(1);
        for (i, &cy) in centres.iter().enumerate() {
            for (j, &cx) in centres.iter().enumerate() {
                let on_finder = (i == 0 && j == 0) || (i == 0 && j == last) || (i == last && j == 0);
                if !on_finder {
                    mark(&mut mask, cx - 2, cy - 2, 5, 5);
                }
            }
        }

        if version >= 7 {
            mark(&mut mask, size - 11, 0, 3, 6);
            mark(&mut mask, 0, size - 11, 6, 3);
        }

        Self { mask }
    }

    pub(crate) fn is_function(&self, x: usize, y: usize) -> bool {
        self.mask.get(x, y)
    }
}

fn mark(mask: &mut BitMatrix, x0: usize, y0: usize, width: usize, height: usize) {
    for y in y0..y0 + height {
        for x in x0..x0 + width {
            mask.set(x, y, true);
        }
    }
}

/// Modules per side
pub(crate) fn symbol_size(version: u8) -> usize {
    version as usize * 4 + 17
}

/// Alignment pattern centre coordinates, ascending
pub(crate) fn alignment_positions(version: u8) -> Vec<usize> {
    if version < 2 {
        return Vec::new();
    }
    let v = version as usize;
    let count = v / 7 + 2;
    let step = if v == 32 {
        26
    } else {
        (v * 4 + count * 2 + 1) / (count * 2 - 2) * 2
    };
    let size = symbol_size(version);
    let mut positions: Vec<usize> = (0..count - 1).map(|i| size - 7 - i * step).collect();
    positions.push(6);
    positions.sort_unstable();
    positions
}

/// Whether mask pattern `mask` flips the module at column `x`, row `y`
pub(crate) fn mask_bit(mask: u8, x: usize, y: usize) -> bool {
    match mask {
        0 => (x + y) % 2 == 0,
        1 => y % 2 == 0,
        2 => x % 3 == 0,
        3 => (x + y) % 3 == 0,
        4 => (x / 3 + y / 2) % 2 == 0,
        5 => x * y % 2 + x * y % 3 == 0,
        6 => (x * y % 2 + x * y % 3) % 2 == 0,
        _ => ((x + y) % 2 + x * y % 3) % 2 == 0,
    }
}

/// Unmask the data modules in zigzag order and pack them MSB-first.
/// Remainder bits that do not fill a codeword are dropped.
pub(crate) fn read_codewords(grid: &BitMatrix, version: u8, mask: u8) -> Vec<u8> {
    let size = grid.width();
    let function = FunctionMask::new(version);
    let mut codewords = Vec::with_capacity(size * size / 8);
    let mut current = 0u8;
    let mut filled = 0;

    let mut right = size - 1;
    loop {
        if right == 6 {
            right = 5;
        }
        let upward = (right + 1) & 2 == 0;
        for vert in 0..size {
            let y = if upward { size - 1 - vert } else { vert };
            for x in [right, right - 1] {
                if function.is_function(x, y) {
                    continue;
                }
                current = (current << 1) | u8::from(grid.get(x, y) ^ mask_bit(mask, x, y));
                filled += 1;
                if filled == 8 {
                    codewords.push(current);
                    current = 0;
                    filled = 0;
                }
            }
        }
        if right < 2 {
            break;
        }
        right -= 2;
    }
    codewords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_positions() {
        assert!(alignment_positions(1).is_empty());
        assert_eq!(alignment_positions(2), vec![6, 18]);
        assert_eq!(alignment_positions(7), vec![6, 22, 38]);
        assert_eq!(alignment_positions(32), vec![6, 34, 60, 86, 112, 138]);
        assert_eq!(alignment_positions(40), vec![6, 30, 58, 86, 114, 142, 170]);
    }

    #[test]
    fn test_data_module_counts() {
        // Raw codewords per version: 26, 44, 196, 3706
        for (version, codewords) in [(1u8, 26usize), (2, 44), (7, 196), (40, 3706)] {
            let size = symbol_size(version);
            let function = FunctionMask::new(version);
            let data = (0..size)
                .flat_map(|y| (0..size).map(move |x| (x, y)))
                .filter(|&(x, y)| !function.is_function(x, y))
                .count();
            assert_eq!(data / 8, codewords, "version {version}");
        }
    }

    #[test]
    fn test_mask_patterns() {
        assert!(mask_bit(0, 0, 0));
        assert!(!mask_bit(0, 1, 0));
        assert!(mask_bit(1, 5, 2));
        assert!(mask_bit(2, 3, 1));
        assert!(!mask_bit(3, 1, 1));
        assert!(mask_bit(4, 2, 1));
        assert!(mask_bit(5, 6, 1));
        assert!(mask_bit(6, 1, 1));
        assert!(!mask_bit(7, 1, 1));
    }

    #[test]
    fn test_blank_grid_reads_mask_pattern() {
        let grid = BitMatrix::new(21, 21);
        let codewords = read_codewords(&grid, 1, 1);
        assert_eq!(codewords.len(), 26);
        // Mask 1 darkens even rows; the first codeword spans rows 20..=17 of columns 20, 19
        assert_eq!(codewords[0], 0b1100_1100);
    }
}
