//! Receiver replies returned to the eventing transport.

use crate::replay::ReplayError;
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};

/// Build a plain-text reply.
pub fn text(status: StatusCode, body: impl Into<String>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body.into())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    response
}

/// Acknowledge a delivered event.
pub fn accepted() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::ACCEPTED;
    response
}

impl ReplayError {
    /// Status used to nack an event that failed with this error.
    ///
    /// Malformed events fail the same way on every redelivery, so they get a
    /// client error; transport failures get a gateway error so the sender
    /// may retry.
    pub fn status(&self) -> StatusCode {
        match self {
            ReplayError::Decode(_) | ReplayError::Parse(_) | ReplayError::Url(_) => {
                StatusCode::BAD_REQUEST
            }
            ReplayError::Dispatch(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<ReplayError> for Response<Full<Bytes>> {
    fn from(err: ReplayError) -> Self {
        text(err.status(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(ReplayError::Decode("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ReplayError::Parse("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ReplayError::Url("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ReplayError::Dispatch("x".into()).status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_error_into_response() {
        let response: Response<Full<Bytes>> = ReplayError::Url("no host".into()).into();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&body).contains("no host"));
    }
}
