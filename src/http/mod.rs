//! HTTP types shared by the receiver and the replay pipeline.

mod request;
pub mod response;

pub use request::ReplayRequest;
