//! The authenticated request envelope.

use once_cell::sync::Lazy;
use serde_json::{Map, Value};

use crate::field::{CharField, DictField, Field, FieldValue};
use crate::record::{Record, Schema, Validated};
use crate::{Secret, Tainted};

static SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::new()
        .field("account", Field::optional(CharField))
        .field("login", Field::required(CharField))
        .field("token", Field::required(CharField))
        .field("arguments", Field::required(DictField))
        .field("method", Field::required(CharField))
});

/// Outer request wrapper: who is calling, their token, and which method
/// to run with which arguments.
///
/// Envelope fields are verified; `arguments` stays [`Tainted`] because it is
/// validated later against the chosen method's payload schema.
///
/// # Examples
///
/// ```
/// use scoring_api::{MethodRequest, Tainted};
/// use scoring_api::record::Validated;
/// use serde_json::json;
///
/// let body = json!({
///     "account": "horns&hoofs",
///     "login": "h&f",
///     "token": "55cc9ce5",
///     "method": "online_score",
///     "arguments": {"phone": "79175002040"}
/// });
///
/// let request = MethodRequest::validate(Tainted::new(body.as_object().unwrap().clone()))
///     .expect("valid envelope")
///     .into_inner();
///
/// assert_eq!(request.login(), "h&f");
/// assert!(!request.is_admin("admin"));
/// assert_eq!(format!("{:?}", request.token()), "[REDACTED]");
/// ```
#[derive(Debug)]
pub struct MethodRequest {
    account: Option<String>,
    login: String,
    token: Secret<String>,
    method: String,
    arguments: Tainted<Map<String, Value>>,
}

impl MethodRequest {
    /// Account name, when one was supplied.
    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    /// Caller login.
    pub fn login(&self) -> &str {
        &self.login
    }

    /// Supplied token.
    pub fn token(&self) -> &Secret<String> {
        &self.token
    }

    /// Requested method name, not yet resolved.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Whether the caller is the privileged login.
    pub fn is_admin(&self, admin_login: &str) -> bool {
        self.login == admin_login
    }

    /// Hands the still-unvalidated arguments to payload validation.
    pub fn into_arguments(self) -> Tainted<Map<String, Value>> {
        self.arguments
    }
}

fn take_text(record: &mut Record, name: &str) -> Option<String> {
    record.take(name).and_then(FieldValue::into_text)
}

impl Validated for MethodRequest {
    fn schema() -> &'static Schema {
        &SCHEMA
    }

    fn from_record(mut record: Record) -> Self {
        Self {
            account: take_text(&mut record, "account"),
            login: take_text(&mut record, "login").unwrap_or_default(),
            token: Secret::new(take_text(&mut record, "token").unwrap_or_default()),
            method: take_text(&mut record, "method").unwrap_or_default(),
            arguments: Tainted::new(
                record
                    .take("arguments")
                    .and_then(FieldValue::into_arguments)
                    .unwrap_or_default(),
            ),
        }
    }
}
