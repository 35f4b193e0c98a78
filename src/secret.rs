use std::fmt;

/// A wrapper that keeps tokens and salts out of logs.
///
/// The envelope `token` and both authentication salts are held as
/// `Secret<String>`. Debug and Display always print `[REDACTED]`; the value is
/// only reachable through [`expose_secret`](Self::expose_secret).
///
/// # Examples
///
/// ```
/// use scoring_api::Secret;
///
/// let token = Secret::new("55cc9ce545bcd144".to_string());
///
/// assert_eq!(format!("{:?}", token), "[REDACTED]");
/// assert_eq!(format!("{}", token), "[REDACTED]");
/// assert_eq!(token.expose_secret(), "55cc9ce545bcd144");
/// ```
// Do NOT derive Clone, Copy or Default.
pub struct Secret<T> {
    // Must stay private.
    inner: T,
}

impl<T> Secret<T> {
    /// Wraps a sensitive value in a `Secret`.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Explicitly exposes the secret value.
    ///
    /// # Security Warning
    ///
    /// Never log or echo the returned reference.
    pub fn expose_secret(&self) -> &T {
        &self.inner
    }
}

impl<T> fmt::Debug for Secret<T> {
    // Must unconditionally print "[REDACTED]".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_redacts_debug() {
        let salt = Secret::new("Otus".to_string());
        let debug_output = format!("{:?}", salt);

        assert_eq!(debug_output, "[REDACTED]");
        assert!(!debug_output.contains("Otus"));
        assert!(!debug_output.contains("String"));
    }

    #[test]
    fn secret_redacts_display() {
        let token = Secret::new("deadbeef");
        let display_output = format!("{}", token);

        assert_eq!(display_output, "[REDACTED]");
        assert!(!display_output.contains("dead"));
    }

    #[test]
    fn secret_redacted_inside_structs() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Envelope {
            login: String,
            token: Secret<String>,
        }

        let envelope = Envelope {
            login: "h&f".to_string(),
            token: Secret::new("abcdef".to_string()),
        };
        let out = format!("{:?}", envelope);

        assert!(out.contains("h&f"));
        assert!(!out.contains("abcdef"));
    }

    #[test]
    fn secret_exposes_when_explicit() {
        let secret = Secret::new(42);
        assert_eq!(*secret.expose_secret(), 42);
    }
}
