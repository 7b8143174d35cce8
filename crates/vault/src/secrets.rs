//! `HashiCorp` Vault secret store over the HTTP API

use crate::VaultConfig;
use async_trait::async_trait;
use secrecy::ExposeSecret;
use secret_backend_secrets::{SecretData, SecretError, SecretStore, StoreError};
use tracing::debug;
use vaultrs::client::{VaultClient, VaultClientSettingsBuilder};
use vaultrs::error::ClientError;

/// Reads secrets from Vault KV engines
///
/// One client is created per process and reused for every read.
pub struct VaultStore {
    client: VaultClient,
    address: String,
}

impl std::fmt::Debug for VaultStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultStore")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl VaultStore {
    /// Build a Vault client from `config` without contacting the server
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::Config`] if no token is configured or the client
    /// settings are invalid.
    pub fn new(config: &VaultConfig) -> Result<Self, SecretError> {
        let token = config
            .token
            .as_ref()
            .ok_or_else(|| SecretError::config("VAULT_TOKEN environment variable is required"))?;

        let mut builder = VaultClientSettingsBuilder::default();
        builder
            .address(&config.address)
            .token(token.expose_secret())
            .verify(config.verify);
        if let Some(ns) = &config.namespace {
            builder.namespace(Some(ns.clone()));
        }

        let settings = builder
            .build()
            .map_err(|e| SecretError::config(format!("Failed to build Vault client: {e}")))?;
        let client = VaultClient::new(settings)
            .map_err(|e| SecretError::config(format!("Failed to create Vault client: {e}")))?;

        Ok(Self {
            client,
            address: config.address.clone(),
        })
    }

    /// Build a client and verify its token with one round-trip
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::Config`] for missing or invalid settings and
    /// [`SecretError::Auth`] if Vault rejects the token or cannot be reached.
    pub async fn connect(config: &VaultConfig) -> Result<Self, SecretError> {
        let store = Self::new(config)?;
        store.verify().await?;
        debug!(address = %store.address, "Vault token verified");
        Ok(store)
    }

    /// The configured server address
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }
}

fn describe(errors: &[String]) -> String {
    if errors.is_empty() {
        "no details".to_string()
    } else {
        errors.join(", ")
    }
}

/// Classify a `vaultrs` error for the fetcher's fallback decision
pub(crate) fn classify(mount: &str, path: &str, err: ClientError) -> StoreError {
    match err {
        ClientError::APIError { code: 404, .. } => StoreError::NotFound {
            mount: mount.to_string(),
            path: path.to_string(),
        },
        ClientError::APIError { code: 405, errors } => StoreError::Unsupported {
            mount: mount.to_string(),
            message: describe(&errors),
        },
        ClientError::APIError {
            code: 401 | 403,
            errors,
        } => StoreError::Denied {
            mount: mount.to_string(),
            path: path.to_string(),
            message: describe(&errors),
        },
        // A 2xx without the expected payload: the engine answered in a shape
        // this protocol version does not use
        ClientError::ResponseDataEmptyError | ClientError::ResponseEmptyError => {
            StoreError::Unsupported {
                mount: mount.to_string(),
                message: err.to_string(),
            }
        }
        other => StoreError::Transport {
            message: other.to_string(),
        },
    }
}

#[async_trait]
impl SecretStore for VaultStore {
    fn provider_name(&self) -> &'static str {
        "vault"
    }

    async fn is_authenticated(&self) -> Result<bool, StoreError> {
        match vaultrs::token::lookup_self(&self.client).await {
            Ok(_) => Ok(true),
            Err(ClientError::APIError {
                code: 401 | 403, ..
            }) => Ok(false),
            Err(e) => Err(StoreError::Transport {
                message: e.to_string(),
            }),
        }
    }

    async fn read(&self, mount: &str, path: &str) -> Result<SecretData, StoreError> {
        debug!(mount, path, "Reading KV v2 secret");
        vaultrs::kv2::read(&self.client, mount, path)
            .await
            .map_err(|e| classify(mount, path, e))
    }

    async fn read_v1(&self, mount: &str, path: &str) -> Result<SecretData, StoreError> {
        debug!(mount, path, "Reading KV v1 secret");
        vaultrs::kv1::get(&self.client, mount, path)
            .await
            .map_err(|e| classify(mount, path, e))
    }
}
