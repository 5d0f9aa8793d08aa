//! Format and version information: the BCH-protected metadata around the finders.
//!
//! Both are stored twice. Each copy is matched against every valid codeword and
//! the nearest one wins when it is within 3 bit errors.

use crate::models::BitMatrix;

/// Error correction level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcLevel {
    /// ~7% recovery
    Low,
    /// ~15% recovery
    Medium,
    /// ~25% recovery
    Quartile,
    /// ~30% recovery
    High,
}

impl EcLevel {
    /// Decode the two level bits of the format word
    fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0b01 => EcLevel::Low,
            0b00 => EcLevel::Medium,
            0b11 => EcLevel::Quartile,
            _ => EcLevel::High,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// Level and mask read from the format area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    /// Error correction level
    pub ec_level: EcLevel,
    /// Data mask pattern, 0..=7
    pub mask: u8,
}

const FORMAT_XOR: u32 = 0x5412;
const MAX_BIT_ERRORS: u32 = 3;

/// 15-bit masked format codeword for 5 data bits
pub(crate) fn format_codeword(data: u32) -> u32 {
    let mut rem = data;
    for _ in 0..10 {
        rem = (rem << 1) ^ ((rem >> 9) * 0x537);
    }
    ((data << 10) | (rem & 0x3FF)) ^ FORMAT_XOR
}

/// 18-bit version codeword
pub(crate) fn version_codeword(version: u32) -> u32 {
    let mut rem = version;
    for _ in 0..12 {
        rem = (rem << 1) ^ ((rem >> 11) * 0x1F25);
    }
    (version << 12) | (rem & 0xFFF)
}

/// Read both format copies and pick the nearest valid codeword
pub(crate) fn read_format(grid: &BitMatrix) -> Option<FormatInfo> {
    let size = grid.width();
    if size < 21 {
        return None;
    }

    let mut first = 0u32;
    let mut second = 0u32;
    for i in 0..15 {
        let (x1, y1) = match i {
            0..=5 => (8, i),
            6 => (8, 7),
            7 => (8, 8),
            8 => (7, 8),
            _ => (14 - i, 8),
        };
        let (x2, y2) = if i < 8 {
            (size - 1 - i, 8)
        } else {
            (8, size - 15 + i)
        };
        if grid.get(x1, y1) {
            first |= 1 << i;
        }
        if grid.get(x2, y2) {
            second |= 1 << i;
        }
    }

    (0..32u32)
        .flat_map(|data| {
            let codeword = format_codeword(data);
            [first, second].map(|read| ((codeword ^ read).count_ones(), data))
        })
        .min_by_key(|&(distance, _)| distance)
        .filter(|&(distance, _)| distance <= MAX_BIT_ERRORS)
        .map(|(_, data)| FormatInfo {
            ec_level: EcLevel::from_bits(data >> 3),
            mask: (data & 0b111) as u8,
        })
}

/// Read the version blocks of a version 7+ symbol
pub(crate) fn read_version(grid: &BitMatrix) -> Option<u8> {
    let size = grid.width();
    if size < 45 {
        return None;
    }

    let mut upper_right = 0u32;
    let mut lower_left = 0u32;
    for i in 0..18 {
        let (along, across) = (size - 11 + i % 3, i / 3);
        if grid.get(along, across) {
            upper_right |= 1 << i;
        }
        if grid.get(across, along) {
            lower_left |= 1 << i;
        }
    }

    (7..=40u32)
        .flat_map(|version| {
            let codeword = version_codeword(version);
            [upper_right, lower_left].map(|read| ((codeword ^ read).count_ones(), version))
        })
        .min_by_key(|&(distance, _)| distance)
        .filter(|&(distance, _)| distance <= MAX_BIT_ERRORS)
        .map(|(_, version)| version as u8)
}
