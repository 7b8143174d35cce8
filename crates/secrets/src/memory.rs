//! In-memory secret store

use crate::{SecretData, SecretStore, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

type Location = (String, String);

/// A [`SecretStore`] backed by plain maps.
///
/// Versioned and legacy secrets are kept apart so either protocol can be
/// exercised on its own. A location with no entry reads as
/// [`StoreError::NotFound`]; injected errors take precedence over data.
#[derive(Debug)]
pub struct MemoryStore {
    versioned: HashMap<Location, SecretData>,
    legacy: HashMap<Location, SecretData>,
    versioned_errors: HashMap<Location, StoreError>,
    legacy_errors: HashMap<Location, StoreError>,
    authenticated: bool,
    versioned_reads: AtomicUsize,
    legacy_reads: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            versioned: HashMap::new(),
            legacy: HashMap::new(),
            versioned_errors: HashMap::new(),
            legacy_errors: HashMap::new(),
            authenticated: true,
            versioned_reads: AtomicUsize::new(0),
            legacy_reads: AtomicUsize::new(0),
        }
    }
}

fn location(mount: &str, path: &str) -> Location {
    (mount.to_string(), path.to_string())
}

fn collect<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> SecretData
where
    K: Into<String>,
    V: Into<serde_json::Value>,
{
    fields
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

impl MemoryStore {
    /// Create an empty, authenticated store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a secret readable through the versioned protocol
    #[must_use]
    pub fn with_versioned<K, V>(
        mut self,
        mount: &str,
        path: &str,
        fields: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.versioned.insert(location(mount, path), collect(fields));
        self
    }

    /// Store a secret readable through the legacy protocol
    #[must_use]
    pub fn with_legacy<K, V>(
        mut self,
        mount: &str,
        path: &str,
        fields: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.legacy.insert(location(mount, path), collect(fields));
        self
    }

    /// Make versioned reads of `mount/path` fail with `error`
    #[must_use]
    pub fn with_versioned_error(mut self, mount: &str, path: &str, error: StoreError) -> Self {
        self.versioned_errors.insert(location(mount, path), error);
        self
    }

    /// Make legacy reads of `mount/path` fail with `error`
    #[must_use]
    pub fn with_legacy_error(mut self, mount: &str, path: &str, error: StoreError) -> Self {
        self.legacy_errors.insert(location(mount, path), error);
        self
    }

    /// Reject credentials on [`SecretStore::is_authenticated`]
    #[must_use]
    pub fn unauthenticated(mut self) -> Self {
        self.authenticated = false;
        self
    }

    /// Number of versioned reads served so far
    #[must_use]
    pub fn versioned_reads(&self) -> usize {
        self.versioned_reads.load(Ordering::SeqCst)
    }

    /// Number of legacy reads served so far
    #[must_use]
    pub fn legacy_reads(&self) -> usize {
        self.legacy_reads.load(Ordering::SeqCst)
    }

    fn lookup(
        data: &HashMap<Location, SecretData>,
        errors: &HashMap<Location, StoreError>,
        mount: &str,
        path: &str,
    ) -> Result<SecretData, StoreError> {
        let loc = location(mount, path);
        if let Some(err) = errors.get(&loc) {
            return Err(err.clone());
        }
        data.get(&loc).cloned().ok_or_else(|| StoreError::NotFound {
            mount: mount.to_string(),
            path: path.to_string(),
        })
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    fn provider_name(&self) -> &'static str {
        "memory"
    }

    async fn is_authenticated(&self) -> Result<bool, StoreError> {
        Ok(self.authenticated)
    }

    async fn read(&self, mount: &str, path: &str) -> Result<SecretData, StoreError> {
        self.versioned_reads.fetch_add(1, Ordering::SeqCst);
        Self::lookup(&self.versioned, &self.versioned_errors, mount, path)
    }

    async fn read_v1(&self, mount: &str, path: &str) -> Result<SecretData, StoreError> {
        self.legacy_reads.fetch_add(1, Ordering::SeqCst);
        Self::lookup(&self.legacy, &self.legacy_errors, mount, path)
    }
}
