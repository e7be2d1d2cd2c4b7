//! Request deserializer: raw HTTP/1.x text to [`ReplayRequest`].
//!
//! The text is fed through hyper's HTTP/1 server codec over an in-memory
//! duplex stream, so request-line validation, header parsing and body
//! framing (`Content-Length` or chunked) follow the same rules as a live
//! connection.

use crate::http::ReplayRequest;
use crate::replay::ReplayError;
use bytes::Bytes;
use http_body_util::{BodyExt, Empty, Limited};
use hyper::body::Incoming;
use hyper::http::request::Parts;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::{TokioIo, TokioTimer};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;
use tokio::sync::oneshot;
use tracing::trace;

const DUPLEX_CAPACITY: usize = 64 * 1024;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Parse one complete HTTP/1.x request from `raw`.
///
/// Only the first request is read; anything after it is ignored. Bodies
/// larger than `max_body_size` are rejected.
pub async fn parse_request(raw: &[u8], max_body_size: usize) -> Result<ReplayRequest, ReplayError> {
    if raw.is_empty() {
        return Err(ReplayError::Parse("request text is empty".to_string()));
    }

    let (mut writer, reader) = tokio::io::duplex(DUPLEX_CAPACITY);
    let (tx, mut rx) = oneshot::channel::<(Parts, Bytes)>();
    let slot = Arc::new(Mutex::new(Some(tx)));

    let service = service_fn(move |req: Request<Incoming>| {
        let slot = slot.clone();
        async move {
            let (parts, body) = req.into_parts();
            let body = Limited::new(body, max_body_size).collect().await?.to_bytes();
            let sender = slot.lock().ok().and_then(|mut guard| guard.take());
            if let Some(sender) = sender {
                if sender.send((parts, body)).is_err() {
                    trace!("Parsed request arrived after the caller stopped waiting");
                }
            }
            Ok::<_, BoxError>(Response::new(Empty::<Bytes>::new()))
        }
    });

    let mut builder = http1::Builder::new();
    builder
        .keep_alive(false)
        .half_close(true)
        .preserve_header_case(true)
        .timer(TokioTimer::new());
    let connection: Pin<Box<dyn Future<Output = hyper::Result<()>> + Send + '_>> =
        Box::pin(builder.serve_connection(TokioIo::new(reader), service));

    let feed = async move {
        writer.write_all(raw).await?;
        writer.shutdown().await?;
        // Keep the stream open so the codec can still write its reply.
        Ok::<_, std::io::Error>(writer)
    };

    let (served, fed) = tokio::join!(connection, feed);

    match rx.try_recv() {
        Ok((parts, body)) => {
            trace!(method = %parts.method, uri = %parts.uri, body_len = body.len(), "Parsed buffered request");
            Ok(ReplayRequest::from_parts(parts, body))
        }
        Err(_) => {
            let reason = match (served, fed) {
                (Err(err), _) => error_chain(&err),
                (Ok(()), Err(err)) => err.to_string(),
                (Ok(()), Ok(_)) => "missing request line".to_string(),
            };
            Err(ReplayError::Parse(reason))
        }
    }
}

/// Render an error with its sources, outermost first.
pub(crate) fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::{Method, Version};
    use tokio_test::assert_err;

    const LIMIT: usize = 1024 * 1024;

    #[tokio::test]
    async fn test_parse_get_with_query() {
        let raw = "GET /foo?x=1 HTTP/1.1\r\nHost: example.com\r\nPrefer: respond-async\r\n\r\n";

        let request = parse_request(raw.as_bytes(), LIMIT).await.unwrap();

        assert_eq!(request.method, Method::GET);
        assert_eq!(request.target, "/foo?x=1");
        assert_eq!(request.host, "example.com");
        assert_eq!(request.version, Version::HTTP_11);
        assert_eq!(request.get_header("prefer"), Some("respond-async"));
        assert!(request.body.is_empty());
    }

    #[tokio::test]
    async fn test_parse_content_length_body() {
        let raw = "POST /orders HTTP/1.1\r\nHost: shop.local\r\nContent-Type: application/json\r\nContent-Length: 13\r\n\r\n{\"qty\": 1234}";

        let request = parse_request(raw.as_bytes(), LIMIT).await.unwrap();

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.body, Bytes::from_static(b"{\"qty\": 1234}"));
        assert_eq!(request.get_header("content-type"), Some("application/json"));
    }

    #[tokio::test]
    async fn test_parse_chunked_body() {
        let raw = "PUT /upload HTTP/1.1\r\nHost: files.local\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n";

        let request = parse_request(raw.as_bytes(), LIMIT).await.unwrap();

        assert_eq!(request.method, Method::PUT);
        assert_eq!(request.text(), Some("hello world".to_string()));
    }

    #[tokio::test]
    async fn test_parse_keeps_duplicate_headers_in_order() {
        let raw = "GET / HTTP/1.1\r\nHost: a.local\r\nX-Tag: one\r\nX-Tag: two\r\n\r\n";

        let request = parse_request(raw.as_bytes(), LIMIT).await.unwrap();

        let tags: Vec<_> = request.headers.get_all("x-tag").iter().collect();
        assert_eq!(tags, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_parse_http10() {
        let raw = "GET /legacy HTTP/1.0\r\nHost: old.local\r\n\r\n";

        let request = parse_request(raw.as_bytes(), LIMIT).await.unwrap();
        assert_eq!(request.version, Version::HTTP_10);
    }

    #[tokio::test]
    async fn test_parse_empty_text() {
        let err = assert_err!(parse_request(b"", LIMIT).await);
        assert!(matches!(err, ReplayError::Parse(_)));
    }

    #[tokio::test]
    async fn test_parse_garbage() {
        let err = assert_err!(parse_request(b"this is not http\r\n\r\n", LIMIT).await);
        assert!(matches!(err, ReplayError::Parse(_)));
    }

    #[tokio::test]
    async fn test_parse_unterminated_headers() {
        let raw = "GET / HTTP/1.1\r\nHost: example.com\r\n";

        let err = assert_err!(parse_request(raw.as_bytes(), LIMIT).await);
        assert!(matches!(err, ReplayError::Parse(_)));
    }

    #[tokio::test]
    async fn test_parse_truncated_body() {
        let raw = "POST / HTTP/1.1\r\nHost: example.com\r\nContent-Length: 10\r\n\r\nabc";

        let err = assert_err!(parse_request(raw.as_bytes(), LIMIT).await);
        assert!(matches!(err, ReplayError::Parse(_)));
    }

    #[tokio::test]
    async fn test_parse_body_over_limit() {
        let raw = "POST / HTTP/1.1\r\nHost: example.com\r\nContent-Length: 8\r\n\r\n12345678";

        let err = assert_err!(parse_request(raw.as_bytes(), 4).await);
        assert!(matches!(err, ReplayError::Parse(_)));
    }

    #[tokio::test]
    async fn test_parse_large_body_beyond_duplex_capacity() {
        let body = "x".repeat(DUPLEX_CAPACITY * 2);
        let raw = format!(
            "POST /bulk HTTP/1.1\r\nHost: bulk.local\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );

        let request = parse_request(raw.as_bytes(), LIMIT).await.unwrap();
        assert_eq!(request.body.len(), body.len());
    }
}
