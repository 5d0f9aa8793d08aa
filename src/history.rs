//! History-recording collaborator. The core only appends; storage is the host's concern.

use crate::encoder::PayloadEncoder;
use crate::models::{DecodedResult, FieldSet, PayloadType};
use std::sync::{Arc, Mutex};

/// One appended record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEntry {
    /// A payload was generated from a form
    Generated {
        /// Encoded type
        payload_type: PayloadType,
        /// Payload text handed to the symbol renderer
        payload: String,
    },
    /// A symbol was scanned successfully
    Scanned {
        /// Raw scanned text
        raw: String,
        /// Classification of `raw`
        result: DecodedResult,
    },
}

/// Fire-and-forget append target
pub trait HistorySink {
    /// Record `entry`. Failures are the sink's to handle; nothing propagates back.
    fn append(&self, entry: HistoryEntry);
}

impl<T: HistorySink + ?Sized> HistorySink for Arc<T> {
    fn append(&self, entry: HistoryEntry) {
        (**self).append(entry)
    }
}

/// In-process sink, useful for hosts without persistence and for tests
#[derive(Debug, Default)]
pub struct MemoryHistory {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl MemoryHistory {
    /// Empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded entries, oldest first
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl HistorySink for MemoryHistory {
    fn append(&self, entry: HistoryEntry) {
        match self.entries.lock() {
            Ok(mut guard) => guard.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }
}

/// Encode a payload and record the generation once
pub fn record_generation(
    sink: &dyn HistorySink,
    encoder: &PayloadEncoder,
    payload_type: PayloadType,
    fields: &FieldSet,
) -> String {
    let payload = encoder.encode(payload_type, fields);
    sink.append(HistoryEntry::Generated {
        payload_type,
        payload: payload.clone(),
    });
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_generation_appends_once() {
        let history = MemoryHistory::new();
        let fields = FieldSet::new().with("phone", "+1555");
        let payload = record_generation(&history, &PayloadEncoder::new(), PayloadType::Phone, &fields);

        assert_eq!(payload, "tel:+1555");
        assert_eq!(
            history.entries(),
            vec![HistoryEntry::Generated {
                payload_type: PayloadType::Phone,
                payload: "tel:+1555".to_string(),
            }]
        );
    }
}
