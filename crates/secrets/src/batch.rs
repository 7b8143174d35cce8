//! Batch resolution of a secret request
//!
//! Handles are resolved sequentially in request order. A failure for one
//! handle is recorded in its [`ResolutionResult`] and never stops the batch.

use crate::{FallbackPolicy, SecretError, SecretHandle, SecretStore, SecureSecret, fetch_secret};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

const NOT_A_STRING: &str = "Expected a string \"mount/path#key\"";

/// Request document read from the host agent
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct SecretRequest {
    /// Protocol version announced by the agent (e.g. `"1.0"`)
    #[serde(default)]
    pub version: Option<String>,

    /// Handles to resolve; absent or `null` means none.
    ///
    /// Entries are kept as raw JSON so a non-string entry fails on its own
    /// instead of rejecting the whole request.
    #[serde(default)]
    pub secrets: Option<Vec<serde_json::Value>>,
}

impl SecretRequest {
    /// Build a request for the given handles
    #[must_use]
    pub fn new<I, S>(secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            version: None,
            secrets: Some(
                secrets
                    .into_iter()
                    .map(|s| serde_json::Value::String(s.into()))
                    .collect(),
            ),
        }
    }

    /// Requested entries, in request order
    #[must_use]
    pub fn entries(&self) -> &[serde_json::Value] {
        self.secrets.as_deref().unwrap_or_default()
    }

    /// Whether the announced protocol version is one this backend speaks.
    ///
    /// A missing version is accepted.
    #[must_use]
    pub fn is_supported_version(&self) -> bool {
        self.version
            .as_deref()
            .is_none_or(|v| v.split('.').next() == Some("1"))
    }
}

/// Outcome for one handle; exactly one of `value` and `error` is set
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionResult {
    value: Option<SecureSecret>,
    error: Option<String>,
}

impl ResolutionResult {
    /// A successfully resolved value
    #[must_use]
    pub fn resolved(value: SecureSecret) -> Self {
        Self {
            value: Some(value),
            error: None,
        }
    }

    /// A failure, recorded as its human-readable message
    #[must_use]
    pub fn failed(error: &SecretError) -> Self {
        Self {
            value: None,
            error: Some(error.to_string()),
        }
    }

    /// The resolved value, if any
    #[must_use]
    pub fn value(&self) -> Option<&SecureSecret> {
        self.value.as_ref()
    }

    /// The error message, if any
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True when a value was resolved
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.value.is_some()
    }
}

impl From<Result<SecureSecret, SecretError>> for ResolutionResult {
    fn from(result: Result<SecureSecret, SecretError>) -> Self {
        match result {
            Ok(value) => Self::resolved(value),
            Err(e) => Self::failed(&e),
        }
    }
}

/// Response document: original handle -> [`ResolutionResult`]
///
/// Serializes as a flat JSON object with keys in sorted order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct SecretResponse(BTreeMap<String, ResolutionResult>);

impl SecretResponse {
    /// Record the result for `handle`, replacing any earlier one
    pub fn insert(&mut self, handle: impl Into<String>, result: ResolutionResult) {
        self.0.insert(handle.into(), result);
    }

    /// Look up the result for a handle
    #[must_use]
    pub fn get(&self, handle: &str) -> Option<&ResolutionResult> {
        self.0.get(handle)
    }

    /// Number of distinct handles
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no handle was requested
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over handles and their results
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResolutionResult)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Resolve every handle in `request` against `store`.
///
/// Duplicate handles are fetched again and the last result wins.
pub async fn resolve_batch<S>(
    store: &S,
    request: &SecretRequest,
    policy: FallbackPolicy,
) -> SecretResponse
where
    S: SecretStore + ?Sized,
{
    let mut response = SecretResponse::default();

    for entry in request.entries() {
        let (raw, result) = match entry {
            serde_json::Value::String(raw) => match SecretHandle::parse(raw) {
                Ok(handle) => (raw.clone(), fetch_secret(store, &handle, policy).await),
                Err(e) => (raw.clone(), Err(e)),
            },
            // Keyed by its JSON text so the agent can still match it up
            other => {
                let raw = other.to_string();
                let err = SecretError::Format {
                    handle: raw.clone(),
                    reason: NOT_A_STRING.to_string(),
                };
                (raw, Err(err))
            }
        };

        match &result {
            Ok(_) => debug!(handle = %raw, "Secret resolved"),
            Err(e) => warn!(handle = %raw, error = %e, "Secret resolution failed"),
        }

        response.insert(raw, result.into());
    }

    let resolved = response.iter().filter(|(_, r)| r.is_resolved()).count();
    info!(
        provider = store.provider_name(),
        requested = request.entries().len(),
        distinct = response.len(),
        resolved,
        "Batch resolution complete"
    );

    response
}
