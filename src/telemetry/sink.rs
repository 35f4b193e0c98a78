use super::RequestTelemetry;

/// Destination for per-request telemetry.
pub trait TelemetrySink: Send + Sync {
    /// Records one completed request.
    fn record(&self, event: &RequestTelemetry);
}

/// Emits each record as a structured `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn record(&self, event: &RequestTelemetry) {
        tracing::info!(
            target: "scoring_api::telemetry",
            request_id = %event.request_id(),
            method = ?event.method(),
            status = event.status().code(),
            has = ?event.has(),
            nclients = ?event.nclients(),
            "request completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::MemorySink;

    #[test]
    fn sinks_are_object_safe() {
        let sinks: Vec<Box<dyn TelemetrySink>> =
            vec![Box::new(TracingSink), Box::new(MemorySink::new())];
        let event = RequestTelemetry::new("r1").with_method("online_score");

        for sink in &sinks {
            sink.record(&event);
        }
    }
}
