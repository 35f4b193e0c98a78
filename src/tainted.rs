use std::fmt;

/// A wrapper for request data that has not been validated yet.
///
/// Every value that crosses the wire (the envelope body, the `arguments`
/// map, a single argument) enters the crate as `Tainted<T>`. Only field rules
/// inside this crate can unwrap it, and they only hand back a
/// [`Verified<T>`](crate::Verified) once the value passed.
///
/// # Examples
///
/// ```
/// use scoring_api::Tainted;
/// use serde_json::json;
///
/// let body = Tainted::new(json!({"login": "h&f"}));
///
/// // Debug output shows it's tainted
/// assert!(format!("{:?}", body).starts_with("Tainted"));
///
/// // But the raw value cannot be reached from outside the crate:
/// // let v = body.inner; // Won't compile!
/// ```
pub struct Tainted<T> {
    // Must stay private. Making it public lets callers skip field validation.
    inner: T,
}

impl<T> Tainted<T> {
    /// Wraps an unvalidated value in `Tainted`.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Extracts the inner value for validation.
    ///
    /// This method is `pub(crate)`: only field rules and record schemas may
    /// look inside, and they must either reject the value or wrap it in
    /// `Verified<T>`.
    pub(crate) fn into_inner(self) -> T {
        self.inner
    }

    /// Borrows the inner value.
    #[cfg(test)]
    pub(crate) fn peek(&self) -> &T {
        &self.inner
    }

    /// Maps the inner value while keeping it tainted.
    pub(crate) fn map<U>(self, f: impl FnOnce(T) -> U) -> Tainted<U> {
        Tainted::new(f(self.inner))
    }
}

// Do NOT add Deref, AsRef, Borrow, From<T> or Into<T> here: each would let
// unvalidated request data reach the scoring rule directly.

impl<T: fmt::Debug> fmt::Debug for Tainted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tainted")
            .field("inner", &self.inner)
            .finish()
    }
}
