//! Request repair: absolute URL reconstruction and header policy.

use crate::http::ReplayRequest;
use crate::replay::ReplayError;
use hyper::header::{HeaderName, TRANSFER_ENCODING};
use hyper::http::uri::{Authority, PathAndQuery};
use hyper::{HeaderMap, Uri};
use tracing::debug;

/// Asks the downstream service for deferred processing. Replays must run
/// synchronously downstream, so it is never forwarded.
pub const PREFER: HeaderName = HeaderName::from_static("prefer");

/// Make a parsed request sendable: set its absolute URL, clear the
/// request-target, and drop headers that must not be replayed.
pub fn repair(request: &mut ReplayRequest) -> Result<(), ReplayError> {
    let url = absolute_url(&request.host, &request.target)?;
    debug!(%url, "Rebuilt absolute url");

    request.url = Some(url);
    request.target.clear();
    strip_headers(&mut request.headers);
    Ok(())
}

/// Build `http://<host><target>`.
///
/// `host` must be a bare authority: no userinfo and none of `/`, `?` or `#`.
/// The returned URI has exactly `host` as its authority and `target` as its
/// path and query, byte for byte.
pub fn absolute_url(host: &str, target: &str) -> Result<Uri, ReplayError> {
    if host.is_empty() {
        return Err(ReplayError::Url("request has no host".to_string()));
    }

    let authority = host
        .parse::<Authority>()
        .map_err(|e| ReplayError::Url(format!("invalid host {host:?}: {e}")))?;
    if authority.as_str().contains('@') {
        return Err(ReplayError::Url(format!("host {host:?} must not carry userinfo")));
    }

    let raw = format!("http://{host}{target}");
    let parsed = url::Url::parse(&raw).map_err(|e| ReplayError::Url(format!("{raw}: {e}")))?;
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(ReplayError::Url(format!("{raw}: empty host")));
    }

    let uri = raw
        .parse::<Uri>()
        .map_err(|e| ReplayError::Url(format!("{raw}: {e}")))?;

    // Anything that moved between authority and path changes the destination.
    let same_authority = uri.authority().map(Authority::as_str) == Some(host);
    let same_target = uri.path_and_query().map(PathAndQuery::as_str) == Some(target);
    if !same_authority || !same_target {
        return Err(ReplayError::Url(format!(
            "{raw}: does not split back into host {host:?} and target {target:?}"
        )));
    }

    Ok(uri)
}

/// Remove `Prefer`, and `Transfer-Encoding` since the body is already
/// decoded and the client frames it again by length.
pub fn strip_headers(headers: &mut HeaderMap) {
    headers.remove(PREFER);
    headers.remove(TRANSFER_ENCODING);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::parse_request;

    async fn parsed(raw: &str) -> ReplayRequest {
        parse_request(raw.as_bytes(), 1024).await.unwrap()
    }

    #[tokio::test]
    async fn test_repair_builds_url_and_drops_prefer() {
        let mut request =
            parsed("GET /foo?x=1 HTTP/1.1\r\nHost: example.com\r\nPrefer: respond-async\r\n\r\n").await;

        repair(&mut request).unwrap();

        assert_eq!(request.url.as_ref().unwrap().to_string(), "http://example.com/foo?x=1");
        assert!(request.target.is_empty());
        assert!(request.is_repaired());
        assert!(request.headers.get("prefer").is_none());
        assert_eq!(request.get_header("host"), Some("example.com"));
    }

    #[tokio::test]
    async fn test_repair_drops_every_prefer_value_in_any_case() {
        let mut request = parsed(
            "GET / HTTP/1.1\r\nHost: example.com\r\nPREFER: respond-async\r\npReFeR: wait=5\r\nX-Keep: yes\r\n\r\n",
        )
        .await;

        repair(&mut request).unwrap();

        assert_eq!(request.headers.get_all(PREFER).iter().count(), 0);
        assert_eq!(request.get_header("x-keep"), Some("yes"));
    }

    #[tokio::test]
    async fn test_repair_drops_transfer_encoding() {
        let mut request = parsed(
            "POST / HTTP/1.1\r\nHost: example.com\r\nTransfer-Encoding: chunked\r\n\r\n3\r\nabc\r\n0\r\n\r\n",
        )
        .await;

        repair(&mut request).unwrap();

        assert!(request.headers.get(TRANSFER_ENCODING).is_none());
        assert_eq!(request.text(), Some("abc".to_string()));
    }

    #[test]
    fn test_absolute_url_keeps_port_and_path() {
        let url = absolute_url("127.0.0.1:9090", "/a/b%20c?q=1&r=2").unwrap();
        assert_eq!(url.to_string(), "http://127.0.0.1:9090/a/b%20c?q=1&r=2");
        assert_eq!(url.port_u16(), Some(9090));
    }

    #[test]
    fn test_absolute_url_empty_host() {
        assert!(matches!(absolute_url("", "/"), Err(ReplayError::Url(_))));
    }

    #[test]
    fn test_absolute_url_invalid_host() {
        assert!(matches!(absolute_url("exa mple.com", "/"), Err(ReplayError::Url(_))));
        assert!(matches!(absolute_url("example.com:notaport", "/"), Err(ReplayError::Url(_))));
        assert!(matches!(absolute_url("user@example.com", "/"), Err(ReplayError::Url(_))));
        assert!(matches!(absolute_url("user:pw@example.com", "/"), Err(ReplayError::Url(_))));
    }

    #[test]
    fn test_absolute_url_rejects_host_with_path_query_or_fragment() {
        for host in ["example.com/evil", "example.com?x", "example.com#frag", "example.com:80/"] {
            let err = absolute_url(host, "/foo?x=1").unwrap_err();
            assert!(matches!(err, ReplayError::Url(_)), "host {host:?} gave {err:?}");
        }
    }

    #[test]
    fn test_absolute_url_rejects_target_that_is_not_a_path() {
        assert!(matches!(absolute_url("example.com", "foo"), Err(ReplayError::Url(_))));
        assert!(matches!(absolute_url("example.com", "/a#b"), Err(ReplayError::Url(_))));
    }

    #[tokio::test]
    async fn test_repair_rejects_host_header_with_path() {
        let mut request = parsed("GET /foo?x=1 HTTP/1.1\r\nHost: example.com/evil\r\n\r\n").await;

        let err = repair(&mut request).unwrap_err();
        assert!(matches!(err, ReplayError::Url(_)));
        assert!(request.url.is_none());
        assert_eq!(request.target, "/foo?x=1");
    }

    #[tokio::test]
    async fn test_repair_without_host_fails() {
        let mut request = parsed("GET / HTTP/1.0\r\n\r\n").await;

        let err = repair(&mut request).unwrap_err();
        assert!(matches!(err, ReplayError::Url(_)));
        assert!(request.url.is_none());
    }
}
