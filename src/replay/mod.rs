//! Replay of buffered HTTP requests.

mod dispatch;
mod error;
mod handler;
mod parse;
mod record;
mod repair;

pub use dispatch::{DispatchOutcome, Dispatcher, HttpDispatcher};
pub use error::ReplayError;
pub use handler::{ReplayHandler, DEFAULT_MAX_BODY_SIZE};
pub use parse::parse_request;
pub use record::ReplayRecord;
pub use repair::{absolute_url, repair, strip_headers, PREFER};
