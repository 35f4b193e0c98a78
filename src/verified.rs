/// A value that has passed its field rule.
///
/// `Verified<T>` is what a [`Field`](crate::field::Field) hands back after the
/// required/nullable checks and the type-specific rule all succeeded. Records,
/// envelopes and payloads are assembled only from verified values.
///
/// # Construction Invariants
///
/// There is no public constructor and no `From<T>` implementation. Only
/// crate-internal validation code calls `new_unchecked`, and only after the
/// value was checked.
///
/// # Access
///
/// - [`AsRef::as_ref`]: borrow the verified value
/// - [`into_inner`](Self::into_inner): consume and extract the value
///
/// ```compile_fail
/// use scoring_api::Verified;
///
/// // No public constructor:
/// let verified = Verified::new("data".to_string());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Verified<T> {
    inner: T,
}

impl<T> Verified<T> {
    /// Creates a `Verified<T>` without performing validation.
    ///
    /// Callers inside the crate must have validated `value` already.
    pub(crate) fn new_unchecked(value: T) -> Self {
        Self { inner: value }
    }

    /// Consumes the `Verified<T>` and returns the inner value.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> AsRef<T> for Verified<T> {
    fn as_ref(&self) -> &T {
        &self.inner
    }
}
