//! # replay-consumer - Buffered HTTP Call Replay
//!
//! Receives CloudEvents that carry a serialized HTTP request, rebuilds the
//! request and sends it to its original destination. Together with a
//! producer that captures requests into events, this turns a synchronous
//! HTTP call into one that is buffered by the eventing layer and executed
//! later.
//!
//! ## Architecture
//!
//! ```text
//!  eventing transport
//!         │  POST (CloudEvent, binary or structured mode)
//!         ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │                        ReplayServer                           │
//! │   event::from_http ──▶ ReplayHandler::consume_event           │
//! │                         │                                     │
//! │   ReplayPayload ──▶ ReplayRecord ──▶ parse_request ──▶ repair │
//! │    (unwrap)          (decode)         (deserialize)     │     │
//! │                                                         ▼     │
//! │                                          Dispatcher::dispatch │
//! └─────────────────────────────────────────────────────────┼─────┘
//!                                                           ▼
//!                                          http://<Host><target>
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use replay_consumer::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let config = ReplayConfig::from_env()?;
//!     config.validate()?;
//!
//!     ReplayServer::new(config).run().await
//! }
//! ```
//!
//! ## Delivery semantics
//!
//! The handler acknowledges an event (`202`) once the downstream service
//! answered, whatever its status. Malformed events are rejected with `400`
//! and transport failures with `502`; redelivery is up to the eventing
//! layer. The response body is never read.

pub mod event;
pub mod http;
pub mod replay;
pub mod runtime;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::event::{CloudEvent, ReplayPayload};
    pub use crate::http::ReplayRequest;
    pub use crate::replay::{
        DispatchOutcome, Dispatcher, HttpDispatcher, ReplayError, ReplayHandler, ReplayRecord,
    };
    pub use crate::runtime::{ReplayConfig, ReplayServer};
    pub use async_trait::async_trait;
}

// Re-export for convenience
pub use event::CloudEvent;
pub use replay::{ReplayError, ReplayHandler, ReplayRecord};
pub use runtime::{ReplayConfig, ReplayServer};
