//! Append-only notification log.

use chrono::Utc;
use rfp_types::{BlockHeight, EventRecord, Notification, Result};

/// The engine's audit trail. Sequence numbers are gap-free from 0.
#[derive(Debug, Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `notification` and return its sequence number.
    pub fn emit(&mut self, height: BlockHeight, notification: Notification) -> u64 {
        let seq = self.records.len() as u64;
        tracing::debug!(seq, height = %height, event = %notification, "Notification emitted");
        self.records.push(EventRecord {
            seq,
            height,
            recorded_at: Utc::now(),
            notification,
        });
        seq
    }

    #[must_use]
    pub fn all(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records with `seq >= from`.
    #[must_use]
    pub fn since(&self, from: u64) -> &[EventRecord] {
        let start = usize::try_from(from)
            .unwrap_or(usize::MAX)
            .min(self.records.len());
        &self.records[start..]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Export the whole log as a JSON array.
    ///
    /// # Errors
    /// Returns `Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.records)?)
    }
}
