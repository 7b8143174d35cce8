//! `HashiCorp` Vault integration for secret-backend
//!
//! Provides a [`SecretStore`](secret_backend_secrets::SecretStore) over Vault's
//! KV secret engines:
//! - KV v2 reads via `GET /v1/{mount}/data/{path}`
//! - KV v1 reads via `GET /v1/{mount}/{path}`
//! - Credential checks via `GET /v1/auth/token/lookup-self`

pub mod config;
pub mod secrets;

// Re-export main types for convenience
pub use config::{DEFAULT_ADDRESS, VaultConfig};
pub use secrets::VaultStore;
