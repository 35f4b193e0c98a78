//! Authenticated scoring API with declarative request validation.
//!
//! A request travels through a fixed pipeline:
//! - **Taint**: the body enters as [`Tainted<T>`] and cannot be read by
//!   application code until a field rule has checked it
//! - **Validation**: [`record::Schema`]s of [`field::Field`]s turn tainted
//!   input into [`Verified<T>`] values, reporting every violation at once
//! - **Authentication**: the envelope's token moves a [`Ctx`] from
//!   `Unauthed` to `Authed`; nothing else can
//! - **Dispatch**: the [`Dispatcher`] validates the method's payload and runs
//!   the scoring rule against a [`store::Store`]
//!
//! Tokens and salts are [`Secret<T>`] and never reach a log line.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use chrono::Local;
//! use scoring_api::{Authenticator, Dispatcher, Tainted};
//! use scoring_api::error::Status;
//! use scoring_api::store::MemoryStore;
//! use serde_json::json;
//!
//! let auth = Authenticator::default();
//! let token = auth.expected_token(Some("horns&hoofs"), "h&f", Local::now());
//! let dispatcher = Dispatcher::new(Arc::new(MemoryStore::new()), auth, Duration::from_secs(3600));
//!
//! let outcome = dispatcher.method_handler("req-1", Tainted::new(json!({
//!     "account": "horns&hoofs",
//!     "login": "h&f",
//!     "token": token.expose_secret(),
//!     "method": "online_score",
//!     "arguments": {"phone": "79175002040", "email": "stupnikov@otus.ru"}
//! })));
//!
//! assert_eq!(outcome.status(), Status::Ok);
//! assert_eq!(outcome.body()["response"]["score"], 3.0);
//! assert_eq!(outcome.telemetry().has(), &["email", "phone"]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod auth;
pub mod config;
mod context;
pub mod dispatch;
pub mod error;
pub mod field;
pub mod logging;
pub mod payload;
pub mod record;
mod request;
pub mod scoring;
mod secret;
mod state;
pub mod store;
mod tainted;
pub mod telemetry;
mod verified;
pub mod web;

#[cfg(test)]
mod test_utils;

pub use auth::{check_auth, Authenticator, ADMIN_LOGIN, ADMIN_SALT, SALT};
pub use context::Ctx;
pub use dispatch::{Dispatcher, Method, Outcome};
pub use error::{ApiError, ValidationError};
pub use logging::RequestLog;
pub use request::MethodRequest;
pub use secret::Secret;
pub use state::{Authed, Unauthed};
pub use tainted::Tainted;
pub use verified::Verified;
