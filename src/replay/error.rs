//! Replay failure taxonomy.

use thiserror::Error;

/// Why an event could not be replayed. Each variant names the stage that
/// failed; no stage retries or recovers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    /// The event payload or the replay record could not be decoded.
    #[error("error decoding replay payload: {0}")]
    Decode(String),

    /// The buffered request text is not a well-formed HTTP/1.x request.
    #[error("problem reading request: {0}")]
    Parse(String),

    /// The absolute URL rebuilt from host and target is invalid.
    #[error("problem building url: {0}")]
    Url(String),

    /// The outbound call failed at the transport level.
    #[error("problem calling url: {0}")]
    Dispatch(String),
}

impl ReplayError {
    /// Short stage name for logs.
    pub fn stage(&self) -> &'static str {
        match self {
            ReplayError::Decode(_) => "decode",
            ReplayError::Parse(_) => "parse",
            ReplayError::Url(_) => "url",
            ReplayError::Dispatch(_) => "dispatch",
        }
    }

    /// Whether redelivering the same event would fail the same way.
    pub fn is_permanent(&self) -> bool {
        !matches!(self, ReplayError::Dispatch(_))
    }
}

impl From<serde_json::Error> for ReplayError {
    fn from(err: serde_json::Error) -> Self {
        ReplayError::Decode(err.to_string())
    }
}
