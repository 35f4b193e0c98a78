//! Type-state markers for context progression.
//!
//! A request context starts `Unauthed` and becomes `Authed` only through a
//! successful token check.

/// Marker for a context whose token has not been checked.
#[derive(Debug, Clone, Copy)]
pub struct Unauthed {
    _private: (),
}

impl Unauthed {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

/// Marker for a context whose token matched.
///
/// Only `Ctx<Authed>` can hand its arguments to a method.
#[derive(Debug, Clone, Copy)]
pub struct Authed {
    _private: (),
}

impl Authed {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}
