//! Request adapter for mapping HTTP requests to dispatcher input.

use serde_json::Value;

use crate::error::ApiError;
use crate::Tainted;

/// Header carrying the request id in both directions.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Framework-independent view of one inbound request.
///
/// Holds only owned data so any HTTP stack can build one.
///
/// # Examples
///
/// ```
/// use scoring_api::web::RequestAdapter;
///
/// let adapter = RequestAdapter::new(Some("abc123"), br#"{"login": "h&f"}"#.to_vec());
/// assert_eq!(adapter.request_id(), "abc123");
/// assert!(adapter.into_body().is_ok());
///
/// let generated = RequestAdapter::new(None, Vec::new());
/// assert_eq!(generated.request_id().len(), 32);
/// assert!(generated.into_body().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct RequestAdapter {
    request_id: String,
    body: Vec<u8>,
}

impl RequestAdapter {
    /// Builds an adapter from the raw `x-request-id` header value and body.
    ///
    /// A missing or blank header gets a fresh UUIDv4 in simple hex form.
    pub fn new(request_id_header: Option<&str>, body: Vec<u8>) -> Self {
        let request_id = request_id_header
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
        Self { request_id, body }
    }

    /// The request id.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Parses the body as JSON.
    ///
    /// # Errors
    ///
    /// [`ApiError::BadRequest`] for an empty or unparseable body.
    pub fn into_body(self) -> Result<Tainted<Value>, ApiError> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Err(ApiError::BadRequest);
        }
        serde_json::from_slice(&self.body)
            .map(Tainted::new)
            .map_err(|err| {
                tracing::debug!(request_id = %self.request_id, error = %err, "unparseable body");
                ApiError::BadRequest
            })
    }
}
