//! Vault connection settings

use secrecy::SecretString;

/// Address used when none is configured
pub const DEFAULT_ADDRESS: &str = "http://vault:8200";

/// Explicit settings for connecting to Vault.
///
/// Built once at startup and handed to [`VaultStore::connect`](crate::VaultStore::connect).
/// The token is optional here so that a missing token is reported by the
/// store initializer rather than at argument parsing.
#[derive(Clone)]
pub struct VaultConfig {
    /// Server address, e.g. `https://vault.internal:8200`
    pub address: String,

    /// Authentication token
    pub token: Option<SecretString>,

    /// Enterprise namespace sent as `X-Vault-Namespace`
    pub namespace: Option<String>,

    /// Verify the server's TLS certificate
    pub verify: bool,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            token: None,
            namespace: None,
            verify: true,
        }
    }
}

impl VaultConfig {
    /// Create a config for `address` with no token
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// Set the token; an empty string counts as no token
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.is_empty()).then(|| SecretString::from(token));
        self
    }

    /// Set the namespace; an empty string counts as none
    #[must_use]
    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace.filter(|ns| !ns.is_empty());
        self
    }

    /// Enable or disable TLS certificate verification
    #[must_use]
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }
}

impl std::fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultConfig")
            .field("address", &self.address)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("namespace", &self.namespace)
            .field("verify", &self.verify)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_address() {
        let config = VaultConfig::default();
        assert_eq!(config.address, "http://vault:8200");
        assert!(config.token.is_none());
        assert!(config.verify);
    }

    #[test]
    fn test_with_token() {
        let config = VaultConfig::new("http://127.0.0.1:8200").with_token("s.abc");
        assert!(config.token.is_some());
        assert_eq!(config.address, "http://127.0.0.1:8200");
    }

    #[test]
    fn test_empty_token_is_no_token() {
        let config = VaultConfig::default().with_token("");
        assert!(config.token.is_none());
    }

    #[test]
    fn test_empty_namespace_is_none() {
        let config = VaultConfig::default().with_namespace(Some(String::new()));
        assert!(config.namespace.is_none());
        let config = VaultConfig::default().with_namespace(Some("team-a".to_string()));
        assert_eq!(config.namespace.as_deref(), Some("team-a"));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = VaultConfig::default().with_token("hvs.very-secret");
        let debug = format!("{config:?}");
        assert!(debug.contains("VaultConfig"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hvs.very-secret"));
    }
}
