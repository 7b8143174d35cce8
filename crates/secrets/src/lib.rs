//! Secret resolution for secret-backend
//!
//! Resolves `mount/path#key` handles against a [`SecretStore`], one handle at
//! a time, and collects a per-handle result map suitable for writing back to
//! the host agent.
//!
//! # Batch Resolution
//!
//! ```ignore
//! use secret_backend_secrets::{FallbackPolicy, SecretRequest, resolve_batch};
//!
//! let request: SecretRequest = serde_json::from_str(&input)?;
//! let response = resolve_batch(&store, &request, FallbackPolicy::default()).await;
//! println!("{}", serde_json::to_string(&response)?);
//! ```
//!
//! Store implementations live in separate crates:
//! - secret-backend-vault: `VaultStore`, `VaultConfig`

mod batch;
mod fetch;
mod handle;
mod memory;
mod store;
mod types;

pub use batch::{ResolutionResult, SecretRequest, SecretResponse, resolve_batch};
pub use fetch::fetch_secret;
pub use handle::SecretHandle;
pub use memory::MemoryStore;
pub use store::{FallbackPolicy, SecretData, SecretStore, StoreError};
pub use types::SecureSecret;

use thiserror::Error;

/// Error types for secret resolution
///
/// `Config` and `Auth` happen before any handle is resolved and abort the
/// whole batch. The remaining variants are scoped to a single handle and end
/// up in that handle's `error` field.
#[derive(Debug, Error)]
pub enum SecretError {
    /// Required configuration is missing or invalid
    #[error("{message}")]
    Config {
        /// What is missing or invalid
        message: String,
    },

    /// The store rejected the supplied credentials
    #[error("{message}")]
    Auth {
        /// Reason reported while verifying credentials
        message: String,
    },

    /// The handle does not have the `mount/path#key` shape
    #[error("Invalid secret handle format: {handle}. {reason}")]
    Format {
        /// The offending handle
        handle: String,
        /// Which part of the shape is violated
        reason: String,
    },

    /// The secret exists but has no such key
    #[error("Key \"{key}\" not found in secret \"{mount}/{path}\"")]
    NotFound {
        /// Secret engine mount
        mount: String,
        /// Secret path within the mount
        path: String,
        /// Requested field
        key: String,
    },

    /// Every applicable protocol attempt failed
    #[error("Failed to fetch secret {handle}: {source}")]
    Fetch {
        /// The handle being resolved
        handle: String,
        /// Terminal error from the last attempt
        #[source]
        source: StoreError,
    },
}

impl SecretError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an authentication error
    #[must_use]
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Whether this error aborts the batch rather than a single handle.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::Auth { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_error_config() {
        let err = SecretError::config("VAULT_TOKEN environment variable is required");
        assert_eq!(
            err.to_string(),
            "VAULT_TOKEN environment variable is required"
        );
        assert!(err.is_fatal());
    }

    #[test]
    fn test_secret_error_auth_is_fatal() {
        let err = SecretError::auth("Vault client not authenticated");
        assert!(err.is_fatal());
        assert!(err.to_string().contains("not authenticated"));
    }

    #[test]
    fn test_secret_error_format() {
        let err = SecretError::Format {
            handle: "nohash".to_string(),
            reason: "Expected \"mount/path#key\"".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("nohash"));
        assert!(msg.contains("mount/path#key"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_secret_error_not_found() {
        let err = SecretError::NotFound {
            mount: "secret".to_string(),
            path: "myapp".to_string(),
            key: "missing".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Key \"missing\" not found in secret \"secret/myapp\""
        );
    }

    #[test]
    fn test_secret_error_fetch_includes_handle_and_cause() {
        let err = SecretError::Fetch {
            handle: "kv/app#token".to_string(),
            source: StoreError::Transport {
                message: "connection refused".to_string(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("kv/app#token"));
        assert!(msg.contains("connection refused"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_secret_error_debug() {
        let err = SecretError::config("missing");
        let debug = format!("{err:?}");
        assert!(debug.contains("Config"));
    }
}
