//! The replay pipeline: unwrap, deserialize, repair, dispatch.

use crate::event::{CloudEvent, ReplayPayload};
use crate::replay::{parse_request, repair, DispatchOutcome, Dispatcher, ReplayError, ReplayRecord};
use std::sync::Arc;
use tracing::{field, info, info_span, Instrument, Span};

/// Default upper bound on a replayed request body.
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Replays buffered requests carried by events.
///
/// Holds no per-event state; one handler serves concurrent events.
#[derive(Clone)]
pub struct ReplayHandler {
    dispatcher: Arc<dyn Dispatcher>,
    max_body_size: usize,
}

impl ReplayHandler {
    /// Create a handler sending through `dispatcher`.
    pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            dispatcher,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Set the largest body accepted in a buffered request.
    pub fn max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    /// Replay the request carried by `event`.
    ///
    /// Issues at most one outbound call. Errors name the stage that failed
    /// and are returned without retrying.
    pub async fn consume_event(&self, event: &CloudEvent) -> Result<DispatchOutcome, ReplayError> {
        let span = info_span!("replay", event_id = %event.id, record_id = field::Empty);
        self.replay(event).instrument(span).await
    }

    async fn replay(&self, event: &CloudEvent) -> Result<DispatchOutcome, ReplayError> {
        let payload = ReplayPayload::from_event(event)?;
        let record = ReplayRecord::decode(payload.record_text())?;
        Span::current().record("record_id", record.id.as_str());

        let mut request = parse_request(record.request.as_bytes(), self.max_body_size).await?;
        repair(&mut request)?;

        let method = request.method.clone();
        let url = request
            .url
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();

        let outcome = self.dispatcher.dispatch(request).await?;
        info!(%method, %url, status = %outcome.status, "Replayed buffered request");
        Ok(outcome)
    }
}
