//! Replay record: the JSON object wrapping a buffered request.

use crate::replay::ReplayError;
use serde::{Deserialize, Serialize};

/// A buffered request as written by the producer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayRecord {
    /// Correlation identifier.
    #[serde(default)]
    pub id: String,
    /// Raw HTTP/1.x request text.
    #[serde(default)]
    pub request: String,
}

impl ReplayRecord {
    pub fn new(id: impl Into<String>, request: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            request: request.into(),
        }
    }

    /// Decode a record from its JSON text.
    pub fn decode(text: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Encode the record as JSON text.
    pub fn encode(&self) -> Result<String, ReplayError> {
        Ok(serde_json::to_string(self)?)
    }
}
