//! CloudEvent model.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Spec versions the receiver understands.
pub const SUPPORTED_SPEC_VERSIONS: &[&str] = &["1.0", "0.3"];

/// A CloudEvent as delivered by the eventing transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudEvent {
    /// Spec version (`1.0` or `0.3`).
    pub specversion: String,
    /// Event identifier, unique per source.
    pub id: String,
    /// Event source URI reference.
    pub source: String,
    /// Event type.
    #[serde(rename = "type")]
    pub ty: String,
    /// Media type of `data`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacontenttype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataschema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Event payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Base64 payload of structured-mode events. Kept verbatim, never decoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_base64: Option<String>,
    /// Extension attributes.
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl CloudEvent {
    /// Create a 1.0 event with no data.
    pub fn new(id: impl Into<String>, source: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            specversion: "1.0".to_string(),
            id: id.into(),
            source: source.into(),
            ty: ty.into(),
            datacontenttype: None,
            dataschema: None,
            subject: None,
            time: None,
            data: None,
            data_base64: None,
            extensions: Map::new(),
        }
    }

    /// Set a JSON payload.
    pub fn with_data(mut self, data: Value) -> Self {
        self.datacontenttype = Some("application/json".to_string());
        self.data = Some(data);
        self
    }

    /// Set an extension attribute.
    pub fn with_extension(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extensions.insert(name.into(), value.into());
        self
    }

    /// Decode the payload into `T`.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match (&self.data, &self.data_base64) {
            (Some(data), _) => T::deserialize(data),
            (None, Some(_)) => Err(serde::de::Error::custom(
                "base64 encoded data is not supported",
            )),
            (None, None) => Err(serde::de::Error::custom("event has no data")),
        }
    }
}
