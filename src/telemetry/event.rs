use std::fmt;

use crate::error::Status;

/// What one request did, without any of its values.
///
/// # Example
///
/// ```
/// use scoring_api::error::Status;
/// use scoring_api::telemetry::RequestTelemetry;
///
/// let event = RequestTelemetry::new("4f2a")
///     .with_method("clients_interests")
///     .with_has(vec!["client_ids", "date"])
///     .with_nclients(3)
///     .with_status(Status::Ok);
///
/// assert_eq!(event.nclients(), Some(3));
/// assert_eq!(event.has(), &["client_ids", "date"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTelemetry {
    request_id: String,
    method: Option<String>,
    has: Vec<&'static str>,
    nclients: Option<usize>,
    status: Status,
}

impl RequestTelemetry {
    /// Starts a record for `request_id` with status 200.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            method: None,
            has: Vec::new(),
            nclients: None,
            status: Status::Ok,
        }
    }

    /// Sets the requested method name.
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Sets the payload fields that were present.
    pub fn with_has(mut self, has: Vec<&'static str>) -> Self {
        self.has = has;
        self
    }

    /// Sets the number of requested client ids.
    pub fn with_nclients(mut self, nclients: usize) -> Self {
        self.nclients = Some(nclients);
        self
    }

    /// Sets the outcome status.
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub(crate) fn record_method(&mut self, method: &str) {
        self.method = Some(method.to_string());
    }

    pub(crate) fn record_has(&mut self, has: &[&'static str]) {
        self.has = has.to_vec();
    }

    pub(crate) fn record_nclients(&mut self, nclients: usize) {
        self.nclients = Some(nclients);
    }

    pub(crate) fn record_status(&mut self, status: Status) {
        self.status = status;
    }

    /// Request id.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Requested method name, if the envelope got that far.
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// Payload fields present in `arguments`, in declaration order.
    pub fn has(&self) -> &[&'static str] {
        &self.has
    }

    /// Client ids requested; only set for `clients_interests`.
    pub fn nclients(&self) -> Option<usize> {
        self.nclients
    }

    /// Outcome status.
    pub fn status(&self) -> Status {
        self.status
    }
}

impl fmt::Display for RequestTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "request_id={} method={} status={} has=[{}]",
            self.request_id,
            self.method.as_deref().unwrap_or("-"),
            self.status.code(),
            self.has.join(",")
        )?;
        if let Some(n) = self.nclients {
            write!(f, " nclients={n}")?;
        }
        Ok(())
    }
}
