//! Single-secret fetch with versioned-to-legacy fallback

use crate::{FallbackPolicy, SecretError, SecretHandle, SecretStore, SecureSecret, StoreError};
use tracing::debug;

/// Why the versioned attempt did not produce a value
enum VersionedMiss {
    KeyMissing,
    Failed(StoreError),
}

fn not_found(handle: &SecretHandle) -> SecretError {
    SecretError::NotFound {
        mount: handle.mount().to_string(),
        path: handle.path().to_string(),
        key: handle.key().to_string(),
    }
}

fn fetch_failed(handle: &SecretHandle, source: StoreError) -> SecretError {
    SecretError::Fetch {
        handle: handle.raw().to_string(),
        source,
    }
}

/// Fetch the value of `handle` from `store`.
///
/// The versioned protocol is tried first. Whether a failed versioned attempt
/// is retried with the legacy protocol is decided by `policy`. Nothing is
/// cached; each call reads the store again.
///
/// # Errors
///
/// - [`SecretError::NotFound`] if the secret was read but lacks the key
/// - [`SecretError::Fetch`] with the terminal store error otherwise
pub async fn fetch_secret<S>(
    store: &S,
    handle: &SecretHandle,
    policy: FallbackPolicy,
) -> Result<SecureSecret, SecretError>
where
    S: SecretStore + ?Sized,
{
    let (mount, path, key) = (handle.mount(), handle.path(), handle.key());

    let miss = match store.read(mount, path).await {
        Ok(data) => match data.get(key) {
            Some(value) => return Ok(SecureSecret::from_json(value)),
            None if policy.falls_back_on_missing_key() => VersionedMiss::KeyMissing,
            None => return Err(not_found(handle)),
        },
        Err(err) if policy.falls_back_on(&err) => VersionedMiss::Failed(err),
        Err(err) => return Err(fetch_failed(handle, err)),
    };

    let reason = match &miss {
        VersionedMiss::KeyMissing => "key missing".to_string(),
        VersionedMiss::Failed(err) => err.to_string(),
    };
    debug!(
        provider = store.provider_name(),
        handle = %handle,
        reason = %reason,
        "Versioned read missed, retrying with legacy protocol"
    );

    match store.read_v1(mount, path).await {
        Ok(data) => data
            .get(key)
            .map(SecureSecret::from_json)
            .ok_or_else(|| not_found(handle)),
        // The versioned read already proved the secret exists without this key
        Err(_) if matches!(miss, VersionedMiss::KeyMissing) => Err(not_found(handle)),
        Err(err) => Err(fetch_failed(handle, err)),
    }
}
