//! CloudEvents HTTP protocol binding (structured and binary content modes).

use crate::event::{CloudEvent, SUPPORTED_SPEC_VERSIONS};
use bytes::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::HeaderMap;
use serde_json::Value;
use std::borrow::Cow;
use thiserror::Error;

/// Media type of a structured-mode event.
pub const STRUCTURED_CONTENT_TYPE: &str = "application/cloudevents+json";
/// Media type of a batched structured-mode request.
pub const BATCH_CONTENT_TYPE: &str = "application/cloudevents-batch+json";

const HEADER_PREFIX: &str = "ce-";

/// Errors raised while turning an HTTP request into a [`CloudEvent`].
#[derive(Debug, Error)]
pub enum EventError {
    #[error("missing required attribute: {0}")]
    MissingAttribute(&'static str),

    #[error("unsupported spec version: {0}")]
    UnsupportedSpecVersion(String),

    #[error("batched events are not supported")]
    BatchNotSupported,

    #[error("invalid header value for {0}")]
    InvalidHeader(String),

    #[error("invalid structured event: {0}")]
    InvalidStructured(#[source] serde_json::Error),

    #[error("invalid event data: {0}")]
    InvalidData(#[source] serde_json::Error),
}

/// Decode an event from request headers and body, picking the content mode
/// from `Content-Type`.
pub fn from_http(headers: &HeaderMap, body: Bytes) -> Result<CloudEvent, EventError> {
    let content_type = match headers.get(CONTENT_TYPE) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| EventError::InvalidHeader(CONTENT_TYPE.to_string()))?,
        ),
        None => None,
    };

    match content_type.map(media_type) {
        Some(STRUCTURED_CONTENT_TYPE) => from_structured(&body),
        Some(BATCH_CONTENT_TYPE) => Err(EventError::BatchNotSupported),
        _ => from_binary(headers, content_type, body),
    }
}

fn from_structured(body: &[u8]) -> Result<CloudEvent, EventError> {
    let event: CloudEvent = serde_json::from_slice(body).map_err(EventError::InvalidStructured)?;
    check_spec_version(&event.specversion)?;
    Ok(event)
}

fn from_binary(
    headers: &HeaderMap,
    content_type: Option<&str>,
    body: Bytes,
) -> Result<CloudEvent, EventError> {
    let specversion = required(headers, "specversion")?;
    check_spec_version(&specversion)?;

    let mut event = CloudEvent::new(
        required(headers, "id")?,
        required(headers, "source")?,
        required(headers, "type")?,
    );
    event.specversion = specversion;
    event.datacontenttype = content_type.map(str::to_string);

    for (name, value) in headers {
        let Some(attribute) = name.as_str().strip_prefix(HEADER_PREFIX) else {
            continue;
        };
        let value = attribute_value(name.as_str(), value)?;
        match attribute {
            "id" | "source" | "type" | "specversion" => {}
            "dataschema" => event.dataschema = Some(value),
            "subject" => event.subject = Some(value),
            "time" => event.time = Some(value),
            ext => {
                event.extensions.insert(ext.to_string(), Value::String(value));
            }
        }
    }

    if !body.is_empty() {
        let data = if content_type.map_or(true, is_json) {
            serde_json::from_slice(&body).map_err(EventError::InvalidData)?
        } else {
            Value::String(String::from_utf8_lossy(&body).into_owned())
        };
        event.data = Some(data);
    }

    Ok(event)
}

fn required(headers: &HeaderMap, attribute: &'static str) -> Result<String, EventError> {
    let name = format!("{HEADER_PREFIX}{attribute}");
    let value = headers
        .get(name.as_str())
        .ok_or(EventError::MissingAttribute(attribute))?;
    attribute_value(&name, value)
}

/// Binary-mode attribute values are percent-encoded on the wire.
fn attribute_value(name: &str, value: &HeaderValue) -> Result<String, EventError> {
    let raw = value
        .to_str()
        .map_err(|_| EventError::InvalidHeader(name.to_string()))?;
    urlencoding::decode(raw)
        .map(Cow::into_owned)
        .map_err(|_| EventError::InvalidHeader(name.to_string()))
}

fn check_spec_version(version: &str) -> Result<(), EventError> {
    if SUPPORTED_SPEC_VERSIONS.contains(&version) {
        Ok(())
    } else {
        Err(EventError::UnsupportedSpecVersion(version.to_string()))
    }
}

/// Strip parameters such as `; charset=utf-8`.
fn media_type(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or_default().trim()
}

fn is_json(content_type: &str) -> bool {
    let media = media_type(content_type);
    media == "application/json" || media == "text/json" || media.ends_with("+json")
}
