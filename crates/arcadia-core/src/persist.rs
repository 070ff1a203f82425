// ── Persistence seam ──
//
// The core is agnostic to what durability looks like: a transactional
// database, a write-ahead log, or nothing at all. Whatever it is, it sees
// each transition as one unit, *before* the in-memory state is touched.
// If the sink fails, the transition is aborted whole — record and machine
// both keep their pre-state.

use crate::event::LifecycleEvent;

/// Error returned by a sink. Wrapped into
/// [`CoreError::Persistence`](crate::CoreError::Persistence) by the managers.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct SinkError(pub String);

impl SinkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Destination for committed transitions.
///
/// Called inside the machine's exclusive section, so implementations never
/// see two transitions for the same machine concurrently. A returned error
/// aborts the transition before any in-memory mutation.
pub trait TransitionSink: Send + Sync {
    fn commit(&self, event: &LifecycleEvent) -> Result<(), SinkError>;
}

/// Sink for purely in-memory deployments. Accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl TransitionSink for NullSink {
    fn commit(&self, _event: &LifecycleEvent) -> Result<(), SinkError> {
        Ok(())
    }
}
