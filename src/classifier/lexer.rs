//! Tokenizing helpers shared by the payload grammars: prefix matching,
//! escape-aware splitting and key/value pairs.

use super::GrammarError;
use crate::utils::percent::decode_component;

/// Case-insensitive ASCII prefix strip
pub(super) fn strip_prefix_ci<'a>(input: &'a str, prefix: &str) -> Option<&'a str> {
    let head = input.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &input[prefix.len()..])
}

/// Split on `delim` where it is not preceded by a backslash escape.
/// Escapes are kept in the pieces; see [`unescape`].
pub(super) fn split_unescaped(input: &str, delim: char) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == delim {
            pieces.push(&input[start..i]);
            start = i + c.len_utf8();
        }
    }
    pieces.push(&input[start..]);
    pieces
}

/// Resolve backslash escapes: `\n` and `\N` become a line feed, `\x` becomes `x`
pub(super) fn unescape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Iterate `key=value` pairs of a query string, percent-decoding values
pub(super) fn query_pairs(query: &str) -> Result<Vec<(String, String)>, GrammarError> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            Ok((key.to_ascii_lowercase(), decode_component(value)?))
        })
        .collect()
}

/// First value for `key` among decoded query pairs, `""` when absent
pub(super) fn query_value(pairs: &[(String, String)], key: &str) -> String {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
        .unwrap_or_default()
}

/// Lines of a line-oriented record with RFC 2425 folding undone
pub(super) fn unfolded_lines(input: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in input.split('\n') {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        match (line.strip_prefix(' ').or_else(|| line.strip_prefix('\t')), lines.last_mut()) {
            (Some(rest), Some(previous)) => previous.push_str(rest),
            _ => lines.push(line.to_string()),
        }
    }
    lines
}

/// Split a content line into upper-cased property name (parameters dropped) and value
pub(super) fn property(line: &str) -> Option<(String, &str)> {
    let (head, value) = line.split_once(':')?;
    let name = head.split(';').next().unwrap_or(head);
    Some((name.trim().to_ascii_uppercase(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_unescaped() {
        assert_eq!(split_unescaped(r"a\;b;c", ';'), vec![r"a\;b", "c"]);
        assert_eq!(split_unescaped("T:WPA;;", ';'), vec!["T:WPA", "", ""]);
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"Cafe\;Guest"), "Cafe;Guest");
        assert_eq!(unescape(r"line\nnext"), "line\nnext");
        assert_eq!(unescape(r"trailing\"), r"trailing\");
    }

    #[test]
    fn test_unfolded_lines() {
        let lines = unfolded_lines("BEGIN:VCARD\r\nNOTE:long\r\n  tail\r\nEND:VCARD");
        assert_eq!(lines, vec!["BEGIN:VCARD", "NOTE:long tail", "END:VCARD"]);
    }

    #[test]
    fn test_query_pairs() {
        let pairs = query_pairs("pa=a%40b&PN=Tea%20Stall&am=").unwrap();
        assert_eq!(query_value(&pairs, "pn"), "Tea Stall");
        assert_eq!(query_value(&pairs, "am"), "");
        assert_eq!(query_value(&pairs, "cu"), "");
        assert!(query_pairs("pn=%E0").is_err());
    }

    #[test]
    fn test_strip_prefix_ci() {
        assert_eq!(strip_prefix_ci("SmsTo:1", "smsto:"), Some("1"));
        assert_eq!(strip_prefix_ci("tel", "tel:"), None);
        assert_eq!(strip_prefix_ci("é", "ab"), None);
    }
}
