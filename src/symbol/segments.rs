//! Data segment decoding: numeric, alphanumeric and byte modes, with ECI,
//! structured append and FNC1 headers skipped.

use tracing::trace;

const ALPHANUMERIC: &[u8; 45] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

/// MSB-first reader over corrected data codewords
pub(crate) struct BitReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> BitReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() * 8 - self.position
    }

    /// Next `count` bits (at most 32), or `None` past the end
    pub(crate) fn read(&mut self, count: usize) -> Option<u32> {
        if count > 32 || count > self.remaining() {
            return None;
        }
        let mut value = 0u32;
        for _ in 0..count {
            let byte = self.bytes[self.position / 8];
            let bit = (byte >> (7 - self.position % 8)) & 1;
            value = (value << 1) | u32::from(bit);
            self.position += 1;
        }
        Some(value)
    }
}

/// Decode the segment stream into text. UTF-8 when valid, Latin-1 otherwise.
///
/// Kanji and unknown modes, truncated segments and out-of-range digit groups
/// all yield `None`, as does a stream with no content.
pub(crate) fn decode_segments(data: &[u8], version: u8) -> Option<String> {
    let mut reader = BitReader::new(data);
    let group = match version {
        0..=9 => 0,
        10..=26 => 1,
        _ => 2,
    };
    let mut out = Vec::new();

    while reader.remaining() >= 4 {
        match reader.read(4)? {
            0 => break,
            1 => read_numeric(&mut reader, [10, 12, 14][group], &mut out)?,
            2 => read_alphanumeric(&mut reader, [9, 11, 13][group], &mut out)?,
            4 => {
                let count = reader.read([8, 16, 16][group])?;
                for _ in 0..count {
                    out.push(reader.read(8)? as u8);
                }
            }
            7 => {
                // ECI designator: 1, 2 or 3 bytes; the payload is read as-is
                let first = reader.read(8)?;
                if first & 0x80 != 0 {
                    reader.read(8)?;
                }
                if first & 0xC0 == 0xC0 {
                    reader.read(8)?;
                }
            }
            3 => {
                reader.read(16)?;
            }
            5 => {}
            9 => {
                reader.read(8)?;
            }
            mode => {
                trace!(mode, "unsupported segment mode");
                return None;
            }
        }
    }

    if out.is_empty() {
        return None;
    }
    Some(match String::from_utf8(out) {
        Ok(text) => text,
        Err(err) => err.into_bytes().into_iter().map(char::from).collect(),
    })
}

fn read_numeric(reader: &mut BitReader<'_>, count_bits: usize, out: &mut Vec<u8>) -> Option<()> {
    let mut count = reader.read(count_bits)?;
    while count >= 3 {
        let value = reader.read(10)?;
        if value > 999 {
            return None;
        }
        out.extend_from_slice(format!("{value:03}").as_bytes());
        count -= 3;
    }
    match count {
        2 => {
            let value = reader.read(7)?;
            if value > 99 {
                return None;
            }
            out.extend_from_slice(format!("{value:02}").as_bytes());
        }
        1 => {
            let value = reader.read(4)?;
            if value > 9 {
                return None;
            }
            out.extend_from_slice(format!("{value}").as_bytes());
        }
        _ => {}
    }
    Some(())
}

fn read_alphanumeric(
    reader: &mut BitReader<'_>,
    count_bits: usize,
    out: &mut Vec<u8>,
) -> Option<()> {
    let mut count = reader.read(count_bits)?;
    while count >= 2 {
        let value = reader.read(11)? as usize;
        if value >= 45 * 45 {
            return None;
        }
        out.push(ALPHANUMERIC[value / 45]);
        out.push(ALPHANUMERIC[value % 45]);
        count -= 2;
    }
    if count == 1 {
        let value = reader.read(6)? as usize;
        out.push(*ALPHANUMERIC.get(value)?);
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pack `(value, width)` fields MSB-first
    fn pack(fields: &[(u32, usize)]) -> Vec<u8> {
        let mut bits = Vec::new();
        for &(value, width) in fields {
            for k in (0..width).rev() {
                bits.push((value >> k) & 1 == 1);
            }
        }
        bits.chunks(8)
            .map(|chunk| {
                chunk
                    .iter()
                    .enumerate()
                    .fold(0u8, |acc, (i, &bit)| acc | (u8::from(bit) << (7 - i)))
            })
            .collect()
    }

    #[test]
    fn test_bit_reader() {
        let mut reader = BitReader::new(&[0b1010_0000, 0xFF]);
        assert_eq!(reader.read(3), Some(0b101));
        assert_eq!(reader.remaining(), 13);
        assert_eq!(reader.read(13), Some(0b0_0000_1111_1111));
        assert_eq!(reader.read(1), None);
    }

    #[test]
    fn test_numeric_segment() {
        let data = pack(&[(1, 4), (8, 10), (12, 10), (345, 10), (67, 7), (0, 4)]);
        assert_eq!(decode_segments(&data, 1).as_deref(), Some("01234567"));
    }

    #[test]
    fn test_alphanumeric_segment() {
        // "AC-3": (10*45+12), (41*45+3)
        let data = pack(&[(2, 4), (4, 9), (462, 11), (1848, 11), (0, 4)]);
        assert_eq!(decode_segments(&data, 1).as_deref(), Some("AC-3"));
    }

    #[test]
    fn test_mixed_segments_with_eci() {
        let data = pack(&[
            (7, 4),
            (26, 8),
            (4, 4),
            (3, 8),
            (0xC3, 8),
            (0xA9, 8),
            (b'!' as u32, 8),
            (1, 4),
            (1, 10),
            (7, 4),
            (0, 4),
        ]);
        assert_eq!(decode_segments(&data, 1).as_deref(), Some("é!7"));
    }

    #[test]
    fn test_latin1_fallback() {
        let data = pack(&[(4, 4), (2, 8), (0xE9, 8), (b'a' as u32, 8), (0, 4)]);
        assert_eq!(decode_segments(&data, 1).as_deref(), Some("éa"));
    }

    #[test]
    fn test_long_byte_count_for_large_versions() {
        let data = pack(&[(4, 4), (1, 16), (b'z' as u32, 8), (0, 4)]);
        assert_eq!(decode_segments(&data, 10).as_deref(), Some("z"));
    }

    #[test]
    fn test_rejected_streams() {
        // Kanji
        assert_eq!(decode_segments(&pack(&[(8, 4), (1, 8), (0, 13)]), 1), None);
        // Numeric group out of range
        assert_eq!(decode_segments(&pack(&[(1, 4), (3, 10), (1000, 10)]), 1), None);
        // Byte count past the end
        assert_eq!(decode_segments(&pack(&[(4, 4), (9, 8), (0x41, 8)]), 1), None);
        // Terminator only
        assert_eq!(decode_segments(&[0x00, 0xEC], 1), None);
    }
}
