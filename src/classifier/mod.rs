//! Scanned text to a structured [`DecodedResult`].
//!
//! Grammars are tried most specific first. A grammar whose marker is present
//! but whose body fails to parse is skipped, never surfaced: classification is
//! total and returns [`DecodedResult::unrecognized`] when nothing fits.

mod grammars;
mod lexer;

use crate::models::{DecodedResult, PayloadType};
use crate::utils::percent::PercentError;
use grammars::MatchResult;
use thiserror::Error;

/// Why a grammar rejected input that carried its marker
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// Percent-escape could not be decoded
    #[error(transparent)]
    Percent(#[from] PercentError),
    /// A mandatory component is absent
    #[error("missing {0}")]
    MissingField(&'static str),
    /// Numeric component could not be parsed
    #[error("not a number: {0}")]
    BadNumber(String),
    /// Numeric component outside its domain
    #[error("{0} out of range")]
    OutOfRange(&'static str),
}

type Matcher = fn(&str) -> MatchResult;

const MATCHERS: [(PayloadType, Matcher); 10] = [
    (PayloadType::Wifi, grammars::wifi),
    (PayloadType::VCard, grammars::vcard),
    (PayloadType::Event, grammars::event),
    (PayloadType::Email, grammars::email),
    (PayloadType::Sms, grammars::sms),
    (PayloadType::Phone, grammars::phone),
    (PayloadType::Geo, grammars::geo),
    (PayloadType::Bitcoin, grammars::bitcoin),
    (PayloadType::Upi, grammars::upi),
    (PayloadType::Url, grammars::url),
];

/// Stateless payload classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadClassifier;

impl PayloadClassifier {
    /// Create a classifier
    pub fn new() -> Self {
        Self
    }

    /// Classify `raw`. Never fails; unknown input yields the unrecognized sentinel.
    pub fn classify(&self, raw: &str) -> DecodedResult {
        for (payload_type, matcher) in MATCHERS {
            match matcher(raw) {
                Ok(Some(result)) => {
                    tracing::debug!(%payload_type, "classified scanned payload");
                    return result;
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::trace!(%payload_type, error = %err, "grammar marker present but body rejected");
                }
            }
        }
        tracing::debug!(len = raw.len(), "no payload grammar matched");
        DecodedResult::unrecognized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(raw: &str) -> DecodedResult {
        PayloadClassifier::new().classify(raw)
    }

    #[test]
    fn test_phone() {
        let result = classify("tel:+911234567890");
        assert_eq!(result.payload_type, Some(PayloadType::Phone));
        assert_eq!(result.details.len(), 1);
        assert_eq!(result.detail("phone"), Some("+911234567890"));
    }

    #[test]
    fn test_plain_text_is_unrecognized() {
        let result = classify("not a qr payload at all");
        assert_eq!(result, DecodedResult::unrecognized());
        assert!(result.details.is_empty());
    }

    #[test]
    fn test_empty_and_garbage() {
        assert!(!classify("").is_recognized());
        assert!(!classify("\u{0}\u{1}\u{fffd}\u{7f}").is_recognized());
    }

    #[test]
    fn test_rejected_grammar_falls_through() {
        // geo marker with an out-of-range latitude and no other grammar
        assert!(!classify("geo:123,45").is_recognized());
        // malformed mailto escape is not an e-mail, and not a URL either
        assert!(!classify("mailto:x@y.z?subject=%zz").is_recognized());
    }

    #[test]
    fn test_upi_is_not_mistaken_for_url() {
        let result = classify("upi://pay?pa=shop@upi&pn=Tea%20Stall&am=20&cu=INR");
        assert_eq!(result.payload_type, Some(PayloadType::Upi));
        assert_eq!(result.detail("name"), Some("Tea Stall"));
    }

    #[test]
    fn test_url() {
        let result = classify("https://example.com");
        assert_eq!(result.payload_type, Some(PayloadType::Url));
        assert_eq!(result.detail("url"), Some("https://example.com"));
    }
}
