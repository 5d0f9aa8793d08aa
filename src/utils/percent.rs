//! Percent-encoding with URI-component rules: everything except
//! `A-Z a-z 0-9 - _ . ! ~ * ' ( )` is escaped as UTF-8 `%XX` triplets.

use thiserror::Error;

/// Malformed percent-encoded input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PercentError {
    /// `%` not followed by two hex digits
    #[error("truncated or invalid escape at byte {0}")]
    BadEscape(usize),
    /// Escapes decode to invalid UTF-8
    #[error("decoded bytes are not valid UTF-8")]
    InvalidUtf8,
}

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')')
}

/// Escape a string as a URI component
pub fn encode_component(input: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(input.len());
    for &b in input.as_bytes() {
        if is_unreserved(b) {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0F) as usize] as char);
        }
    }
    out
}

/// Reverse [`encode_component`]. `+` is left as-is.
pub fn decode_component(input: &str) -> Result<String, PercentError> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = bytes.get(i + 1).and_then(|b| (*b as char).to_digit(16));
            let lo = bytes.get(i + 2).and_then(|b| (*b as char).to_digit(16));
            match (hi, lo) {
                (Some(hi), Some(lo)) => out.push((hi * 16 + lo) as u8),
                _ => return Err(PercentError::BadEscape(i)),
            }
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| PercentError::InvalidUtf8)
}
