//! Error and status types shared by validation, dispatch and transport.

use std::fmt;

use crate::store::StoreError;

/// Aggregate failure of one record validation pass.
///
/// A record collects every field failure before raising, so one response
/// reports all violations. Missing fields take priority over bad fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Required fields absent, null, or empty on non-nullable fields.
    #[error("required fields missing: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    /// Supplied values that failed their rule, with the rule's message.
    #[error("bad fields: {}", bad_fields(.0))]
    BadFields(Vec<(&'static str, String)>),
    /// None of the alternative field pairs is fully present.
    #[error("at least one of these field pairs is required: {}", field_pairs(.0))]
    MissingFieldPairs(Vec<(&'static str, &'static str)>),
}

fn bad_fields(fields: &[(&'static str, String)]) -> String {
    fields
        .iter()
        .map(|(name, message)| format!("{name} ({message})"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn field_pairs(pairs: &[(&'static str, &'static str)]) -> String {
    pairs
        .iter()
        .map(|(a, b)| format!("({a}, {b})"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Outcome status of a dispatched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// 200
    Ok,
    /// 400: unparseable body.
    BadRequest,
    /// 403: authentication failed.
    Forbidden,
    /// 404: unknown route.
    NotFound,
    /// 405: unsupported verb on a known route.
    MethodNotAllowed,
    /// 422: validation failed.
    InvalidRequest,
    /// 500
    InternalError,
}

impl Status {
    /// Numeric HTTP-equivalent code.
    pub fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::BadRequest => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
            Self::InvalidRequest => 422,
            Self::InternalError => 500,
        }
    }

    /// Standard reason phrase.
    pub fn reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::BadRequest => "Bad Request",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Not Found",
            Self::MethodNotAllowed => "Method Not Allowed",
            Self::InvalidRequest => "Unprocessable Entity",
            Self::InternalError => "Internal Server Error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

/// Errors surfaced at the API boundary.
///
/// `Forbidden` and `Internal` never carry caller-visible detail; the internal
/// cause is kept for logging only.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Body could not be parsed as JSON.
    #[error("Bad Request")]
    BadRequest,

    /// Token mismatch.
    #[error("Forbidden")]
    Forbidden,

    /// Unknown route.
    #[error("Not Found")]
    NotFound,

    /// Unsupported verb on a known route.
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    /// Envelope or payload failed validation, or the method is unknown.
    #[error("{0}")]
    InvalidRequest(String),

    /// Unexpected fault while executing a method.
    #[error("Internal Server Error")]
    Internal(String),
}

impl ApiError {
    /// Status for this error.
    pub fn status(&self) -> Status {
        match self {
            Self::BadRequest => Status::BadRequest,
            Self::Forbidden => Status::Forbidden,
            Self::NotFound => Status::NotFound,
            Self::MethodNotAllowed => Status::MethodNotAllowed,
            Self::InvalidRequest(_) => Status::InvalidRequest,
            Self::Internal(_) => Status::InternalError,
        }
    }

    /// Internal cause, for logs only.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Internal(detail) => Some(detail),
            _ => None,
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::InvalidRequest(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
