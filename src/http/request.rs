//! Parsed form of a buffered HTTP request.

use bytes::Bytes;
use hyper::header::HOST;
use hyper::http::request::Parts;
use hyper::http::Extensions;
use hyper::{HeaderMap, Method, Uri, Version};

/// An HTTP request recovered from its wire text.
///
/// `target` holds the request-target exactly as it appeared on the request
/// line until the request is repaired; after that `target` is empty and
/// `url` carries the absolute URL used for sending.
#[derive(Debug)]
pub struct ReplayRequest {
    /// HTTP method.
    pub method: Method,
    /// Request-target (path and query).
    pub target: String,
    /// Original host, from an absolute-form target or the `Host` header.
    pub host: String,
    /// Protocol version from the request line.
    pub version: Version,
    /// Headers, duplicates and order preserved.
    pub headers: HeaderMap,
    /// Parser extensions; carries the original header-name casing.
    pub extensions: Extensions,
    /// Decoded body (chunked framing removed).
    pub body: Bytes,
    /// Absolute URL, set once the request is repaired.
    pub url: Option<Uri>,
}

impl ReplayRequest {
    /// Build from parsed request parts and the collected body.
    pub fn from_parts(parts: Parts, body: Bytes) -> Self {
        let host = parts
            .uri
            .authority()
            .map(|authority| authority.to_string())
            .or_else(|| {
                parts
                    .headers
                    .get(HOST)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string)
            })
            .unwrap_or_default();

        let target = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        Self {
            method: parts.method,
            target,
            host,
            version: parts.version,
            headers: parts.headers,
            extensions: parts.extensions,
            body,
            url: None,
        }
    }

    /// Get a header value as text.
    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).and_then(|value| value.to_str().ok())
    }

    /// Get the body as text if present.
    pub fn text(&self) -> Option<String> {
        if self.body.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&self.body).to_string())
        }
    }

    /// Whether the request has been given an absolute URL.
    pub fn is_repaired(&self) -> bool {
        self.url.is_some() && self.target.is_empty()
    }
}
