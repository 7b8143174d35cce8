//! Request/response driver: read stdin, resolve, write stdout
//!
//! Runs in three phases. Reading consumes the whole input; a zero-length input
//! ends the run without output. Resolving connects to the store once and
//! resolves each handle. Writing serializes the full response before emitting
//! a single byte, so a failure never leaves a partial document on stdout.

use crate::cli::CliError;
use secret_backend_secrets::{
    FallbackPolicy, SecretError, SecretRequest, SecretStore, resolve_batch,
};
use std::future::Future;
use std::io::{Read, Write};
use tracing::{debug, warn};

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Input was empty; nothing was written
    Empty,
    /// A response with this many entries was written
    Written {
        /// Number of distinct handles in the response
        entries: usize,
    },
}

/// Process one request from `input`, writing the response to `output`.
///
/// The raw input is echoed to `diagnostics` before parsing. `connect` is
/// called at most once, after the request parsed successfully.
///
/// # Errors
///
/// Returns a [`CliError`] for I/O failures, malformed request JSON, and
/// configuration or authentication failures from `connect`. Nothing is
/// written to `output` in those cases.
pub async fn run<R, W, D, S, F, Fut>(
    mut input: R,
    mut output: W,
    mut diagnostics: D,
    connect: F,
    policy: FallbackPolicy,
) -> Result<Outcome, CliError>
where
    R: Read,
    W: Write,
    D: Write,
    S: SecretStore,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<S, SecretError>>,
{
    // Reading
    let mut raw = String::new();
    input
        .read_to_string(&mut raw)
        .map_err(|e| CliError::other(format!("failed to read request from stdin: {e}")))?;
    if raw.is_empty() {
        debug!("Empty request, nothing to resolve");
        return Ok(Outcome::Empty);
    }

    // Diagnostics must never block resolution
    let _ = writeln!(diagnostics, "Secret backend called with: {raw}");
    let _ = diagnostics.flush();

    let request: SecretRequest = serde_json::from_str(&raw).map_err(|e| {
        CliError::other_with_help(
            format!("invalid request JSON: {e}"),
            r#"Expected an object like {"secrets": ["mount/path#key"]}"#,
        )
    })?;
    if !request.is_supported_version() {
        warn!(
            version = request.version.as_deref().unwrap_or_default(),
            "Unsupported request protocol version, continuing"
        );
    }

    // Resolving
    let store = connect().await?;
    let response = resolve_batch(&store, &request, policy).await;

    // Writing
    let document = serde_json::to_string(&response)
        .map_err(|e| CliError::other(format!("failed to serialize response: {e}")))?;
    output
        .write_all(document.as_bytes())
        .and_then(|()| output.flush())
        .map_err(|e| CliError::other(format!("failed to write response to stdout: {e}")))?;

    Ok(Outcome::Written {
        entries: response.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use secret_backend_secrets::MemoryStore;
    use std::cell::Cell;

    fn store() -> MemoryStore {
        MemoryStore::new().with_versioned("secret", "myapp", [("password", "s3cr3t")])
    }

    async fn run_with(
        input: &str,
        connect: impl FnOnce() -> Result<MemoryStore, SecretError>,
    ) -> (Result<Outcome, CliError>, String, String) {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let result = run(
            input.as_bytes(),
            &mut stdout,
            &mut stderr,
            move || async move { connect() },
            FallbackPolicy::Strict,
        )
        .await;
        (
            result,
            String::from_utf8(stdout).unwrap(),
            String::from_utf8(stderr).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_empty_input_is_a_no_op() {
        let connected = Cell::new(false);
        let (result, stdout, stderr) = run_with("", || {
            connected.set(true);
            Ok(store())
        })
        .await;

        assert_eq!(result.unwrap(), Outcome::Empty);
        assert!(stdout.is_empty());
        assert!(stderr.is_empty());
        assert!(!connected.get());
    }

    #[tokio::test]
    async fn test_whitespace_input_is_echoed_then_rejected() {
        let connected = Cell::new(false);
        let (result, stdout, stderr) = run_with("\n", || {
            connected.set(true);
            Ok(store())
        })
        .await;

        let err = result.unwrap_err();
        assert!(matches!(err, CliError::Other { .. }));
        assert!(err.to_string().contains("invalid request JSON"));
        assert!(stdout.is_empty());
        assert!(stderr.starts_with("Secret backend called with: \n"));
        assert!(!connected.get());
    }

    #[tokio::test]
    async fn test_resolves_and_writes_response() {
        let input = r#"{"version": "1.0", "secrets": ["secret/myapp#password"]}"#;
        let (result, stdout, stderr) = run_with(input, || Ok(store())).await;

        assert_eq!(result.unwrap(), Outcome::Written { entries: 1 });
        let output: serde_json::Value = serde_json::from_str(&stdout).unwrap();
        assert_eq!(
            output,
            serde_json::json!({"secret/myapp#password": {"value": "s3cr3t", "error": null}})
        );
        assert!(stderr.contains("Secret backend called with:"));
        assert!(stderr.contains("secret/myapp#password"));
        assert!(!stderr.contains("s3cr3t"));
    }

    #[tokio::test]
    async fn test_missing_secrets_field_writes_empty_object() {
        let (result, stdout, _) = run_with("{}", || Ok(store())).await;
        assert_eq!(result.unwrap(), Outcome::Written { entries: 0 });
        assert_eq!(stdout, "{}");
    }

    #[tokio::test]
    async fn test_malformed_json_is_fatal() {
        let connected = Cell::new(false);
        let (result, stdout, stderr) = run_with("{not json", || {
            connected.set(true);
            Ok(store())
        })
        .await;

        let err = result.unwrap_err();
        assert!(matches!(err, CliError::Other { .. }));
        assert!(err.to_string().contains("invalid request JSON"));
        assert!(stdout.is_empty());
        assert!(stderr.contains("{not json"));
        assert!(!connected.get());
    }

    #[tokio::test]
    async fn test_missing_token_is_fatal_with_no_output() {
        let input = r#"{"secrets": ["secret/myapp#password"]}"#;
        let (result, stdout, _) = run_with(input, || {
            Err(SecretError::config(
                "VAULT_TOKEN environment variable is required",
            ))
        })
        .await;

        assert!(matches!(result.unwrap_err(), CliError::Config { .. }));
        assert!(stdout.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_credentials_are_fatal() {
        let input = r#"{"secrets": ["secret/myapp#password"]}"#;
        let mut stdout = Vec::new();
        let result = run(
            input.as_bytes(),
            &mut stdout,
            std::io::sink(),
            || async {
                let store = store().unauthenticated();
                store.verify().await?;
                Ok::<_, SecretError>(store)
            },
            FallbackPolicy::Strict,
        )
        .await;

        assert!(matches!(result.unwrap_err(), CliError::Auth { .. }));
        assert!(stdout.is_empty());
    }

    #[tokio::test]
    async fn test_bad_handle_does_not_abort_batch() {
        let input = r#"{"secrets": ["secret/myapp#password", "garbage"]}"#;
        let (result, stdout, _) = run_with(input, || Ok(store())).await;

        assert_eq!(result.unwrap(), Outcome::Written { entries: 2 });
        let output: serde_json::Value = serde_json::from_str(&stdout).unwrap();
        assert_eq!(output["secret/myapp#password"]["value"], "s3cr3t");
        assert!(output["garbage"]["error"].is_string());
    }

    #[tokio::test]
    async fn test_non_string_handle_does_not_abort_batch() {
        let input = r#"{"secrets": ["secret/myapp#password", 42]}"#;
        let (result, stdout, _) = run_with(input, || Ok(store())).await;

        assert_eq!(result.unwrap(), Outcome::Written { entries: 2 });
        let output: serde_json::Value = serde_json::from_str(&stdout).unwrap();
        assert_eq!(output["secret/myapp#password"]["value"], "s3cr3t");
        assert!(output["42"]["value"].is_null());
        assert!(output["42"]["error"].is_string());
    }

    #[tokio::test]
    async fn test_unsupported_version_still_resolves() {
        let input = r#"{"version": "2.0", "secrets": ["secret/myapp#password"]}"#;
        let (result, _, _) = run_with(input, || Ok(store())).await;
        assert_eq!(result.unwrap(), Outcome::Written { entries: 1 });
    }
}
