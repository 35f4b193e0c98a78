use chrono::{DateTime, TimeZone};

use crate::auth::{check_auth, Authenticator};
use crate::error::ApiError;
use crate::logging::RequestLog;
use crate::request::MethodRequest;
use crate::state::{Authed, Unauthed};

/// Per-request execution context.
///
/// `Ctx<S>` owns the validated envelope and is generic over its
/// authentication state:
///
/// ```text
/// Ctx<Unauthed> --authenticate--> Ctx<Authed>
/// ```
///
/// Only `Ctx<Authed>` releases the envelope's arguments, so a payload can
/// never be validated or executed for a caller whose token was not checked.
#[derive(Debug)]
pub struct Ctx<S = Authed> {
    request_id: String,
    request: MethodRequest,
    _state: S,
}

impl<S> Ctx<S> {
    /// Request id of this context.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// The validated envelope.
    pub fn request(&self) -> &MethodRequest {
        &self.request
    }

    /// Logger bound to this context's request id.
    pub fn log(&self) -> RequestLog<'_> {
        RequestLog::new(&self.request_id)
    }
}

impl Ctx<Unauthed> {
    /// Wraps a validated envelope whose token has not been checked yet.
    pub fn new(request_id: impl Into<String>, request: MethodRequest) -> Self {
        Self {
            request_id: request_id.into(),
            request,
            _state: Unauthed::new(),
        }
    }

    /// Checks the envelope's token at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Forbidden`] on a token mismatch. The error carries
    /// no detail about which part of the token was wrong.
    pub fn authenticate<Tz: TimeZone>(
        self,
        auth: &Authenticator,
        now: DateTime<Tz>,
    ) -> Result<Ctx<Authed>, ApiError>
    where
        Tz::Offset: std::fmt::Display,
    {
        if !check_auth(auth, &self.request, now) {
            self.log().warn(format_args!(
                "authentication failed for login {:?}",
                self.request.login()
            ));
            return Err(ApiError::Forbidden);
        }

        Ok(Ctx {
            request_id: self.request_id,
            request: self.request,
            _state: Authed::new(),
        })
    }
}

impl Ctx<Authed> {
    /// Whether the authenticated caller is the privileged login.
    pub fn is_admin(&self, auth: &Authenticator) -> bool {
        self.request.is_admin(auth.admin_login())
    }

    /// Consumes the context, returning its envelope for payload validation.
    pub fn into_request(self) -> MethodRequest {
        self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Validated;
    use crate::Tainted;
    use chrono::Utc;
    use serde_json::json;

    fn unauthed(login: &str, token: &str) -> Ctx<Unauthed> {
        let body = json!({
            "account": "horns&hoofs", "login": login, "token": token,
            "method": "online_score", "arguments": {"phone": "79175002040"}
        });
        let request = MethodRequest::validate(Tainted::new(body.as_object().cloned().unwrap()))
            .unwrap()
            .into_inner();
        Ctx::new("req-1", request)
    }

    #[test]
    fn matching_token_authenticates() {
        let auth = Authenticator::default();
        let now = Utc::now();
        let token = auth.expected_token(Some("horns&hoofs"), "h&f", now);

        let ctx = unauthed("h&f", token.expose_secret())
            .authenticate(&auth, now)
            .unwrap();

        assert_eq!(ctx.request_id(), "req-1");
        assert!(!ctx.is_admin(&auth));
        assert_eq!(ctx.into_request().method(), "online_score");
    }

    #[test]
    fn wrong_token_is_forbidden() {
        let auth = Authenticator::default();
        let err = unauthed("h&f", "sdd").authenticate(&auth, Utc::now()).unwrap_err();

        assert!(matches!(err, ApiError::Forbidden));
        assert_eq!(err.to_string(), "Forbidden");
    }

    #[test]
    fn admin_context_is_flagged() {
        let auth = Authenticator::default();
        let now = Utc::now();
        let token = auth.expected_token(None, "admin", now);

        let ctx = unauthed("admin", token.expose_secret())
            .authenticate(&auth, now)
            .unwrap();

        assert!(ctx.is_admin(&auth));
    }

    #[test]
    fn log_is_bound_to_request_id() {
        let ctx = unauthed("h&f", "");
        assert_eq!(ctx.log().request_id(), "req-1");
    }
}
