//! Inbound events: the CloudEvent model, its HTTP binding, and the
//! replay payload it carries.

mod binding;
mod cloud_event;
mod envelope;

pub use binding::{from_http, EventError, BATCH_CONTENT_TYPE, STRUCTURED_CONTENT_TYPE};
pub use cloud_event::{CloudEvent, SUPPORTED_SPEC_VERSIONS};
pub use envelope::{ReplayPayload, RECORD_SLOT};
