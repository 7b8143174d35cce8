//! secret-backend - resolve agent secret handles from HashiCorp Vault
//!
//! The host agent runs the binary once per batch: a JSON request on stdin,
//! a JSON map of handle to `{value, error}` on stdout, diagnostics on stderr.
//!
//! ```text
//! $ echo '{"version": "1.0", "secrets": ["secret/myapp#password"]}' | secret-backend
//! {"secret/myapp#password":{"value":"s3cr3t","error":null}}
//! ```

// CLI binary needs to output to stderr - this is intentional
#![allow(clippy::print_stderr)]

/// Request/response driver.
pub mod backend;
/// CLI arguments, configuration and exit codes.
pub mod cli;
/// Tracing and logging configuration.
pub mod tracing;

use crate::cli::{Cli, EXIT_OK, exit_code_for, render_error};
use secret_backend_vault::VaultStore;

/// Run one request against Vault using the process's stdio.
///
/// Returns the process exit code.
pub async fn run(cli: Cli) -> i32 {
    let config = cli.vault_config();
    let policy = cli.fallback_policy();

    let result = backend::run(
        std::io::stdin().lock(),
        std::io::stdout().lock(),
        std::io::stderr(),
        || VaultStore::connect(&config),
        policy,
    )
    .await;

    match result {
        Ok(outcome) => {
            ::tracing::debug!(?outcome, "Secret backend finished");
            EXIT_OK
        }
        Err(err) => {
            render_error(&err);
            exit_code_for(&err)
        }
    }
}
