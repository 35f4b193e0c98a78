//! Request dispatch.
//!
//! One request runs through a fixed pipeline:
//!
//! ```text
//! parse envelope -> validate envelope -> authenticate -> resolve method
//!     -> validate payload -> execute -> respond
//! ```
//!
//! Each stage maps its failure to one [`ApiError`]; the first failure ends
//! the request.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use serde_json::{json, Map, Value};

use crate::auth::Authenticator;
use crate::context::Ctx;
use crate::error::{ApiError, Status};
use crate::payload::{ClientsInterestsRequest, OnlineScoreRequest, Payload};
use crate::record::Validated;
use crate::request::MethodRequest;
use crate::scoring::{self, ADMIN_SCORE};
use crate::store::Store;
use crate::telemetry::RequestTelemetry;
use crate::Tainted;

/// Methods served by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `online_score`
    OnlineScore,
    /// `clients_interests`
    ClientsInterests,
}

impl Method {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OnlineScore => OnlineScoreRequest::METHOD,
            Self::ClientsInterests => ClientsInterestsRequest::METHOD,
        }
    }
}

impl FromStr for Method {
    type Err = ApiError;

    /// Unknown names are invalid requests, not a separate not-found status.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        [Self::OnlineScore, Self::ClientsInterests]
            .into_iter()
            .find(|method| method.as_str() == name)
            .ok_or_else(|| ApiError::InvalidRequest(format!("unknown method: {name}")))
    }
}

/// Result of one dispatched request: status, response body and telemetry.
#[derive(Debug, Clone)]
pub struct Outcome {
    status: Status,
    body: Value,
    telemetry: RequestTelemetry,
}

impl Outcome {
    fn ok(response: Value, mut telemetry: RequestTelemetry) -> Self {
        telemetry.record_status(Status::Ok);
        Self {
            status: Status::Ok,
            body: json!({"response": response, "code": Status::Ok.code()}),
            telemetry,
        }
    }

    /// Builds the failure body for `err`.
    pub fn error(err: &ApiError, mut telemetry: RequestTelemetry) -> Self {
        let status = err.status();
        telemetry.record_status(status);
        Self {
            status,
            body: json!({"error": err.to_string(), "code": status.code()}),
            telemetry,
        }
    }

    /// Outcome status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// JSON response body.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Side-channel record of what the request did.
    pub fn telemetry(&self) -> &RequestTelemetry {
        &self.telemetry
    }

    /// Splits into parts.
    pub fn into_parts(self) -> (Status, Value, RequestTelemetry) {
        (self.status, self.body, self.telemetry)
    }
}

/// Routes authenticated requests to the scoring methods.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use scoring_api::{Authenticator, Dispatcher, Tainted};
/// use scoring_api::error::Status;
/// use scoring_api::store::MemoryStore;
/// use serde_json::json;
///
/// let dispatcher = Dispatcher::new(
///     Arc::new(MemoryStore::new()),
///     Authenticator::default(),
///     Duration::from_secs(3600),
/// );
///
/// let outcome = dispatcher.method_handler("req-1", Tainted::new(json!({
///     "login": "h&f", "token": "wrong", "method": "online_score", "arguments": {}
/// })));
///
/// assert_eq!(outcome.status(), Status::Forbidden);
/// assert_eq!(outcome.body()["error"], "Forbidden");
/// ```
pub struct Dispatcher {
    store: Arc<dyn Store>,
    auth: Authenticator,
    cache_ttl: Duration,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("auth", &self.auth)
            .field("cache_ttl", &self.cache_ttl)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher over `store`.
    pub fn new(store: Arc<dyn Store>, auth: Authenticator, cache_ttl: Duration) -> Self {
        Self {
            store,
            auth,
            cache_ttl,
        }
    }

    /// Handles one request body against the local clock.
    pub fn method_handler(&self, request_id: &str, body: Tainted<Value>) -> Outcome {
        self.method_handler_at(request_id, body, Local::now())
    }

    /// Handles one request body, checking admin tokens against `now`.
    pub fn method_handler_at<Tz: TimeZone>(
        &self,
        request_id: &str,
        body: Tainted<Value>,
        now: DateTime<Tz>,
    ) -> Outcome
    where
        Tz::Offset: std::fmt::Display,
    {
        let mut telemetry = RequestTelemetry::new(request_id);
        match self.run(request_id, body, now, &mut telemetry) {
            Ok(response) => Outcome::ok(response, telemetry),
            Err(err) => {
                if let Some(detail) = err.detail() {
                    tracing::error!(request_id, error = %detail, "method failed");
                } else {
                    tracing::info!(
                        request_id,
                        status = err.status().code(),
                        error = %err,
                        "request rejected"
                    );
                }
                Outcome::error(&err, telemetry)
            }
        }
    }

    fn run<Tz: TimeZone>(
        &self,
        request_id: &str,
        body: Tainted<Value>,
        now: DateTime<Tz>,
        telemetry: &mut RequestTelemetry,
    ) -> Result<Value, ApiError>
    where
        Tz::Offset: std::fmt::Display,
    {
        // Anything but an object is an empty envelope.
        let envelope = body.map(|value| match value {
            Value::Object(map) => map,
            _ => Map::new(),
        });
        let request = MethodRequest::validate(envelope)?.into_inner();
        telemetry.record_method(request.method());

        let ctx = Ctx::new(request_id, request).authenticate(&self.auth, now)?;
        let method: Method = ctx.request().method().parse()?;
        let is_admin = ctx.is_admin(&self.auth);
        ctx.log().debug(format_args!(
            "dispatching {} for {}",
            method.as_str(),
            ctx.request().login()
        ));
        let arguments = ctx.into_request().into_arguments();

        match method {
            Method::OnlineScore => {
                let payload = OnlineScoreRequest::validate(arguments)?.into_inner();
                telemetry.record_has(payload.has());
                if is_admin {
                    return Ok(json!({"score": ADMIN_SCORE}));
                }
                let score = scoring::get_score(self.store.as_ref(), &payload, self.cache_ttl);
                Ok(json!({"score": score}))
            }
            Method::ClientsInterests => {
                let payload = ClientsInterestsRequest::validate(arguments)?.into_inner();
                telemetry.record_has(payload.has());
                telemetry.record_nclients(payload.nclients());
                let interests = scoring::clients_interests(self.store.as_ref(), &payload)?;
                Ok(Value::Object(interests))
            }
        }
    }
}
