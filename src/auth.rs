//! Token authentication.
//!
//! Users present `sha512(account + login + salt)`. The admin presents
//! `sha512(YYYYMMDDHH + admin_salt)` for the current local hour, so an admin
//! token expires when the hour turns.

use chrono::{DateTime, TimeZone};
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

use crate::request::MethodRequest;
use crate::Secret;

/// Default shared salt for user tokens.
pub const SALT: &str = "Otus";
/// Default admin salt.
pub const ADMIN_SALT: &str = "42";
/// Default privileged login.
pub const ADMIN_LOGIN: &str = "admin";

const ADMIN_HOUR_FORMAT: &str = "%Y%m%d%H";

/// Computes and checks expected tokens.
///
/// # Examples
///
/// ```
/// use chrono::Local;
/// use scoring_api::Authenticator;
///
/// let auth = Authenticator::default();
/// let token = auth.expected_token(Some("horns&hoofs"), "h&f", Local::now());
///
/// assert_eq!(token.expose_secret().len(), 128);
/// ```
#[derive(Debug)]
pub struct Authenticator {
    salt: Secret<String>,
    admin_salt: Secret<String>,
    admin_login: String,
}

impl Default for Authenticator {
    fn default() -> Self {
        Self::new(SALT, ADMIN_SALT, ADMIN_LOGIN)
    }
}

impl Authenticator {
    /// Creates an authenticator with explicit salts.
    pub fn new(
        salt: impl Into<String>,
        admin_salt: impl Into<String>,
        admin_login: impl Into<String>,
    ) -> Self {
        Self {
            salt: Secret::new(salt.into()),
            admin_salt: Secret::new(admin_salt.into()),
            admin_login: admin_login.into(),
        }
    }

    /// The privileged login.
    pub fn admin_login(&self) -> &str {
        &self.admin_login
    }

    /// Hex token the caller must present at `now`.
    ///
    /// A missing account hashes as the empty string.
    pub fn expected_token<Tz: TimeZone>(
        &self,
        account: Option<&str>,
        login: &str,
        now: DateTime<Tz>,
    ) -> Secret<String>
    where
        Tz::Offset: std::fmt::Display,
    {
        let digest = if login == self.admin_login {
            let hour = now.format(ADMIN_HOUR_FORMAT).to_string();
            sha512_hex(&[&hour, self.admin_salt.expose_secret()])
        } else {
            sha512_hex(&[account.unwrap_or(""), login, self.salt.expose_secret()])
        };
        Secret::new(digest)
    }
}

/// Whether the envelope's token matches the one expected at `now`.
///
/// Comparison is constant-time. [`Ctx::authenticate`](crate::Ctx::authenticate)
/// is the only caller on the request path.
pub fn check_auth<Tz: TimeZone>(
    auth: &Authenticator,
    request: &MethodRequest,
    now: DateTime<Tz>,
) -> bool
where
    Tz::Offset: std::fmt::Display,
{
    let expected = auth.expected_token(request.account(), request.login(), now);
    let supplied = request.token().expose_secret().as_bytes();
    supplied.ct_eq(expected.expose_secret().as_bytes()).into()
}

fn sha512_hex(parts: &[&str]) -> String {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}
