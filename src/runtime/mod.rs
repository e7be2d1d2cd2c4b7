//! Receiver runtime: configuration and the HTTP server that accepts events.

mod config;
mod server;

pub use config::{ConfigError, ReplayConfig};
pub use server::ReplayServer;
