//! Classification output.

use super::PayloadType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Structured reading of a scanned payload.
///
/// `payload_type == None` is the "unrecognized" sentinel; its `details` map is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedResult {
    /// Matched grammar, if any
    #[serde(rename = "type")]
    pub payload_type: Option<PayloadType>,
    /// Extracted fields keyed by field name, in the type's field order
    pub details: IndexMap<String, String>,
}

impl DecodedResult {
    /// Sentinel for input no grammar matched
    pub fn unrecognized() -> Self {
        Self::default()
    }

    /// Build a result for `payload_type` from `(key, value)` pairs
    pub fn new<I, K, V>(payload_type: PayloadType, details: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            payload_type: Some(payload_type),
            details: details
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// True when a grammar matched
    pub fn is_recognized(&self) -> bool {
        self.payload_type.is_some()
    }

    /// Detail value for `key`, if present
    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_type_key() {
        let result = DecodedResult::new(PayloadType::Phone, [("phone", "+1")]);
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"type":"phone","details":{"phone":"+1"}}"#);

        let none = serde_json::to_string(&DecodedResult::unrecognized()).unwrap();
        assert_eq!(none, r#"{"type":null,"details":{}}"#);
    }
}
