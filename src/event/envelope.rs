//! Envelope unwrapping: event data to replay payload.

use crate::event::CloudEvent;
use crate::replay::ReplayError;

/// Position of the encoded replay record in the payload list.
pub const RECORD_SLOT: usize = 1;

/// Ordered string payload carried by a replay event.
///
/// Producers send a JSON list of strings and put the encoded
/// [`ReplayRecord`](crate::replay::ReplayRecord) in the second element. The
/// positional layout is kept for wire compatibility; callers go through
/// [`ReplayPayload::record_text`] instead of indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayPayload {
    entries: Vec<String>,
}

impl ReplayPayload {
    /// Decode the event data, failing unless it is a list of at least
    /// `RECORD_SLOT + 1` strings.
    pub fn from_event(event: &CloudEvent) -> Result<Self, ReplayError> {
        let entries: Vec<String> = event
            .data_as()
            .map_err(|e| ReplayError::Decode(format!("event data is not a list of strings: {e}")))?;
        Self::from_entries(entries)
    }

    pub fn from_entries(entries: Vec<String>) -> Result<Self, ReplayError> {
        if entries.len() <= RECORD_SLOT {
            return Err(ReplayError::Decode(format!(
                "event data has {} entries, expected at least {}",
                entries.len(),
                RECORD_SLOT + 1
            )));
        }
        Ok(Self { entries })
    }

    /// The JSON text of the replay record.
    pub fn record_text(&self) -> &str {
        &self.entries[RECORD_SLOT]
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}
