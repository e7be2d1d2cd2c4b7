//! Event receiver HTTP server.

use crate::event;
use crate::http::response;
use crate::replay::{HttpDispatcher, ReplayHandler};
use crate::runtime::ReplayConfig;
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::{TokioIo, TokioTimer};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Receives CloudEvents over HTTP and replays the requests they carry.
///
/// Each connection is served on its own task. Events are independent: the
/// only state shared between them is the handler's connection pool.
pub struct ReplayServer {
    /// Server configuration.
    config: Arc<ReplayConfig>,
    /// Replay pipeline.
    handler: Arc<ReplayHandler>,
}

impl ReplayServer {
    /// Create a server that dispatches through a pooled HTTP client.
    pub fn new(config: ReplayConfig) -> Self {
        let dispatcher = Arc::new(HttpDispatcher::new(&config));
        let handler = ReplayHandler::new(dispatcher).max_body_size(config.max_body_size);
        Self::with_handler(config, handler)
    }

    /// Create a server around an existing handler.
    pub fn with_handler(config: ReplayConfig, handler: ReplayHandler) -> Self {
        Self {
            config: Arc::new(config),
            handler: Arc::new(handler),
        }
    }

    /// Bind the configured address and serve until an accept error.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr: SocketAddr = self.config.bind_addr().parse()?;
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }

    /// Serve connections accepted from `listener`.
    pub async fn serve(
        self,
        listener: TcpListener,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!("Replay receiver listening on {}", listener.local_addr()?);

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);

            let handler = self.handler.clone();
            let config = self.config.clone();

            tokio::task::spawn(async move {
                let service = service_fn(move |req| {
                    let handler = handler.clone();
                    let config = config.clone();
                    async move { handle_request(req, handler, config, remote_addr).await }
                });

                if let Err(err) = http1::Builder::new()
                    .timer(TokioTimer::new())
                    .serve_connection(io, service)
                    .await
                {
                    error!("Error serving connection: {:?}", err);
                }
            });
        }
    }
}

/// Handle one delivery attempt from the eventing transport.
async fn handle_request(
    req: Request<Incoming>,
    handler: Arc<ReplayHandler>,
    config: Arc<ReplayConfig>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    debug!("Handling request: {} {} from {}", method, path, remote_addr);

    if config.enable_health && path == "/_health" {
        return Ok(response::text(StatusCode::OK, "OK"));
    }

    if method != Method::POST {
        return Ok(response::text(
            StatusCode::METHOD_NOT_ALLOWED,
            "events must be delivered with POST",
        ));
    }

    let (parts, body) = req.into_parts();
    let body = match Limited::new(body, config.max_body_size).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            warn!("Event from {} exceeds {} bytes", remote_addr, config.max_body_size);
            return Ok(response::text(StatusCode::PAYLOAD_TOO_LARGE, err.to_string()));
        }
        Err(err) => {
            warn!("Failed to read event body from {}: {}", remote_addr, err);
            return Ok(response::text(StatusCode::BAD_REQUEST, err.to_string()));
        }
    };

    let event = match event::from_http(&parts.headers, body) {
        Ok(event) => event,
        Err(err) => {
            warn!("Rejecting malformed event from {}: {}", remote_addr, err);
            return Ok(response::text(StatusCode::BAD_REQUEST, err.to_string()));
        }
    };

    match handler.consume_event(&event).await {
        Ok(_) => Ok(response::accepted()),
        Err(err) => {
            if err.is_permanent() {
                warn!(event_id = %event.id, stage = err.stage(), "Dropping event: {}", err);
            } else {
                error!(event_id = %event.id, stage = err.stage(), "Replay failed: {}", err);
            }
            Ok(err.into())
        }
    }
}
