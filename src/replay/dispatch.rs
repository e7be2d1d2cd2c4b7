//! Outbound dispatch of repaired requests.

use crate::http::ReplayRequest;
use crate::replay::parse::error_chain;
use crate::replay::ReplayError;
use crate::runtime::ReplayConfig;
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Request, StatusCode};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use std::time::Duration;
use tracing::debug;

/// What came back from a delivered request. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Status returned by the downstream service.
    pub status: StatusCode,
}

/// Sends repaired requests to their destination.
///
/// Implementations must treat any HTTP status as delivered; only transport
/// failures are errors.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Send the request and discard the response.
    async fn dispatch(&self, request: ReplayRequest) -> Result<DispatchOutcome, ReplayError>;
}

/// Pooled HTTP/1 dispatcher with a mandatory per-call timeout.
///
/// Dropping the future returned by [`Dispatcher::dispatch`] aborts the call
/// and releases its connection.
#[derive(Clone)]
pub struct HttpDispatcher {
    client: Client<HttpConnector, Full<Bytes>>,
    timeout: Duration,
}

impl HttpDispatcher {
    /// Create a dispatcher from the runtime configuration.
    pub fn new(config: &ReplayConfig) -> Self {
        Self::with_timeouts(config.dispatch_timeout(), config.pool_idle_timeout())
    }

    /// Create a dispatcher with explicit timeouts.
    pub fn with_timeouts(timeout: Duration, pool_idle_timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(pool_idle_timeout)
            .pool_timer(TokioTimer::new())
            .http1_preserve_header_case(true)
            .build_http();
        Self { client, timeout }
    }

    /// Upper bound on one outbound call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Dispatcher for HttpDispatcher {
    async fn dispatch(&self, request: ReplayRequest) -> Result<DispatchOutcome, ReplayError> {
        let ReplayRequest {
            method,
            version,
            headers,
            extensions,
            body,
            url,
            ..
        } = request;
        let url = url.ok_or_else(|| ReplayError::Url("request was not repaired".to_string()))?;

        let mut outbound = Request::new(Full::new(body));
        *outbound.method_mut() = method;
        *outbound.uri_mut() = url;
        *outbound.version_mut() = version;
        *outbound.headers_mut() = headers;
        *outbound.extensions_mut() = extensions;

        let response = tokio::time::timeout(self.timeout, self.client.request(outbound))
            .await
            .map_err(|_| ReplayError::Dispatch(format!("timed out after {:?}", self.timeout)))?
            .map_err(|e| ReplayError::Dispatch(error_chain(&e)))?;

        let status = response.status();
        debug!(%status, "Downstream responded, discarding body");
        drop(response);

        Ok(DispatchOutcome { status })
    }
}
