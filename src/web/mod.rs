//! HTTP transport.
//!
//! The boundary between the network and the dispatcher:
//! - request ids are taken from `x-request-id` or generated, and echoed back
//! - the body is parsed once and wrapped in [`Tainted`](crate::Tainted)
//! - the dispatcher runs on the blocking pool since store calls block
//!
//! [`RequestAdapter`] holds the framework-independent part; [`router`] and
//! [`serve`] wire it into axum.

mod adapter;
mod server;

pub use adapter::{RequestAdapter, REQUEST_ID_HEADER};
pub use server::{router, serve, shutdown_signal, AppState};
