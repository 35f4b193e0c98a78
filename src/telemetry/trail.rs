use std::sync::{Mutex, MutexGuard};

use super::{RequestTelemetry, TelemetrySink};

/// In-memory telemetry recorder.
///
/// # Example
///
/// ```
/// use scoring_api::telemetry::{MemorySink, RequestTelemetry, TelemetrySink};
///
/// let sink = MemorySink::new();
/// sink.record(&RequestTelemetry::new("r1").with_nclients(2));
///
/// assert_eq!(sink.len(), 1);
/// assert_eq!(sink.events()[0].nclients(), Some(2));
/// ```
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<RequestTelemetry>>,
}

impl MemorySink {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<RequestTelemetry>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of the recorded events, oldest first.
    pub fn events(&self) -> Vec<RequestTelemetry> {
        self.guard().clone()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.guard().len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    /// Drops every recorded event.
    pub fn clear(&self) {
        self.guard().clear();
    }
}

impl TelemetrySink for MemorySink {
    fn record(&self, event: &RequestTelemetry) {
        self.guard().push(event.clone());
    }
}
