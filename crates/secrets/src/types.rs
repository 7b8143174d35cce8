//! Secure secret value type
//!
//! [`SecureSecret`] wraps `secrecy::SecretString` so resolved values are
//! zeroed on drop and never show up in `Debug` or `Display` output.

use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, Serializer};

/// A resolved secret value with automatic memory zeroing on drop.
///
/// Debug and Display output show `[REDACTED]`; serialization writes the
/// actual value, since the response document is the one place it belongs.
#[derive(Clone)]
pub struct SecureSecret {
    inner: SecretString,
}

impl SecureSecret {
    /// Create a new secure secret from a string.
    #[must_use]
    pub fn new(value: String) -> Self {
        Self {
            inner: SecretString::from(value),
        }
    }

    /// Build a secret from a stored JSON field.
    ///
    /// Strings are taken verbatim; any other JSON value becomes its compact
    /// JSON text.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => Self::new(s.clone()),
            other => Self::new(other.to_string()),
        }
    }

    /// Expose the secret value for use.
    ///
    /// The caller must not log or persist the returned value.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.inner.expose_secret()
    }
}

impl std::fmt::Debug for SecureSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl std::fmt::Display for SecureSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Serialize for SecureSecret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.expose())
    }
}
