//! Secret store abstraction

use crate::SecretError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

/// Field map of a single secret, as returned by a store read
pub type SecretData = BTreeMap<String, serde_json::Value>;

/// Outcome of one failed protocol attempt against the store
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Nothing stored at this mount/path
    #[error("secret \"{mount}/{path}\" not found")]
    NotFound {
        /// Secret engine mount
        mount: String,
        /// Secret path within the mount
        path: String,
    },

    /// The mount does not speak the requested protocol version
    #[error("secret engine at \"{mount}\" does not support this request: {message}")]
    Unsupported {
        /// Secret engine mount
        mount: String,
        /// Detail from the store
        message: String,
    },

    /// The token is not allowed to read this path
    #[error("permission denied reading \"{mount}/{path}\": {message}")]
    Denied {
        /// Secret engine mount
        mount: String,
        /// Secret path within the mount
        path: String,
        /// Detail from the store
        message: String,
    },

    /// Network, TLS, decoding or any other client failure
    #[error("{message}")]
    Transport {
        /// Client error text
        message: String,
    },
}

impl StoreError {
    /// True for outcomes that suggest the other KV protocol version may work.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Unsupported { .. })
    }
}

/// When the fetcher retries a versioned read with the legacy protocol
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Retry only when the versioned read reports not-found or unsupported.
    Strict,
    /// Retry after any versioned failure, including a missing key or a
    /// permission error.
    #[default]
    Lenient,
}

impl FallbackPolicy {
    /// Whether a failed versioned read should be retried with the legacy protocol
    #[must_use]
    pub const fn falls_back_on(self, err: &StoreError) -> bool {
        match self {
            Self::Strict => err.is_missing(),
            Self::Lenient => true,
        }
    }

    /// Whether a versioned secret without the requested key is retried
    #[must_use]
    pub const fn falls_back_on_missing_key(self) -> bool {
        matches!(self, Self::Lenient)
    }
}

/// Client capability required to resolve handles.
///
/// Implementors provide an authentication check plus the two KV read shapes:
/// - [`read`](SecretStore::read) - versioned (KV v2) read returning the inner
///   `data.data` map
/// - [`read_v1`](SecretStore::read_v1) - legacy (KV v1) read returning `data`
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Provider identifier used in log fields and messages
    fn provider_name(&self) -> &'static str;

    /// Check whether the configured credentials are accepted.
    ///
    /// `Ok(false)` means the store explicitly rejected them.
    async fn is_authenticated(&self) -> Result<bool, StoreError>;

    /// Versioned read of the latest secret version at `mount/path`
    async fn read(&self, mount: &str, path: &str) -> Result<SecretData, StoreError>;

    /// Legacy unversioned read of `mount/path`
    async fn read_v1(&self, mount: &str, path: &str) -> Result<SecretData, StoreError>;

    /// Verify credentials, mapping every non-success to [`SecretError::Auth`].
    async fn verify(&self) -> Result<(), SecretError> {
        match self.is_authenticated().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(SecretError::auth(format!(
                "{} client not authenticated",
                self.provider_name()
            ))),
            Err(e) => Err(SecretError::auth(format!(
                "failed to verify {} credentials: {e}",
                self.provider_name()
            ))),
        }
    }
}
