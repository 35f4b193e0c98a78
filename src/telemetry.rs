//! Per-request telemetry.
//!
//! The dispatcher returns a [`RequestTelemetry`] record next to every
//! response instead of mutating a shared context. Callers hand it to a
//! [`TelemetrySink`]:
//! - [`TracingSink`]: one structured log line per request
//! - [`MemorySink`]: in-memory recorder for tests and inspection
//!
//! Records hold only metadata: field names, counts, status. Never argument
//! values or tokens.

mod event;
mod sink;
mod trail;

pub use event::RequestTelemetry;
pub use sink::{TelemetrySink, TracingSink};
pub use trail::MemorySink;
