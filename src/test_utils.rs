//! Shared helpers for unit tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use chrono::Local;
use serde_json::{json, Value};

use crate::auth::Authenticator;
use crate::store::{Store, StoreError};
use crate::Tainted;

/// A store whose every call fails.
#[derive(Debug, Default)]
pub(crate) struct FailingStore;

impl Store for FailingStore {
    fn cache_get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    fn cache_set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

/// A store that fails its first `failures` calls, then delegates.
#[derive(Debug)]
pub(crate) struct FlakyStore<S> {
    inner: S,
    failures_left: AtomicU32,
    calls: AtomicU32,
}

impl<S: Store> FlakyStore<S> {
    pub(crate) fn new(inner: S, failures: u32) -> Self {
        Self {
            inner,
            failures_left: AtomicU32::new(failures),
            calls: AtomicU32::new(0),
        }
    }

    pub(crate) fn inner(&self) -> &S {
        &self.inner
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn trip(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(StoreError::Unavailable("timeout".into()));
        }
        Ok(())
    }
}

impl<S: Store> Store for FlakyStore<S> {
    fn cache_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.trip()?;
        self.inner.cache_get(key)
    }

    fn cache_set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.trip()?;
        self.inner.cache_set(key, value, ttl)
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.trip()?;
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.trip()?;
        self.inner.set(key, value)
    }
}

/// Builds a request body carrying a valid token for `login`.
pub(crate) fn signed_body(account: &str, login: &str, method: &str, arguments: Value) -> Value {
    let auth = Authenticator::default();
    let token = auth.expected_token(Some(account), login, Local::now());
    json!({
        "account": account,
        "login": login,
        "method": method,
        "token": token.expose_secret(),
        "arguments": arguments,
    })
}

/// Wraps a JSON body as wire input.
pub(crate) fn tainted(body: Value) -> Tainted<Value> {
    Tainted::new(body)
}
