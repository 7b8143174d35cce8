//! Secret handle parsing

use crate::SecretError;

const EXPECTED_SHAPE: &str = "Expected \"mount/path#key\"";

/// A parsed `mount/path#key` secret handle
///
/// The raw string is split at the first `#`, then the part before it at the
/// first `/`. Keys may therefore contain `#` and paths may contain `/`.
/// Empty segments are accepted and left for the store to reject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretHandle {
    raw: String,
    mount: String,
    path: String,
    key: String,
}

impl SecretHandle {
    /// Parse a raw handle.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::Format`] if there is no `#`, or if the portion
    /// before it contains no `/`.
    pub fn parse(raw: &str) -> Result<Self, SecretError> {
        let Some((mount_path, key)) = raw.split_once('#') else {
            return Err(SecretError::Format {
                handle: raw.to_string(),
                reason: EXPECTED_SHAPE.to_string(),
            });
        };

        let Some((mount, path)) = mount_path.split_once('/') else {
            return Err(SecretError::Format {
                handle: raw.to_string(),
                reason: format!("Invalid mount/path \"{mount_path}\", expected \"mount/path\""),
            });
        };

        Ok(Self {
            raw: raw.to_string(),
            mount: mount.to_string(),
            path: path.to_string(),
            key: key.to_string(),
        })
    }

    /// The handle exactly as it appeared in the request
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Secret engine mount
    #[must_use]
    pub fn mount(&self) -> &str {
        &self.mount
    }

    /// Secret path within the mount
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Field within the secret
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Display for SecretHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for SecretHandle {
    type Err = SecretError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
