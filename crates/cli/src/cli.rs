use crate::tracing::{LogLevel, TracingConfig, TracingFormat};
use clap::{Parser, ValueEnum};
use miette::{Diagnostic, Report};
use secret_backend_secrets::{FallbackPolicy, SecretError};
use secret_backend_vault::{DEFAULT_ADDRESS, VaultConfig};
use std::io::{self, Write};
use thiserror::Error;

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// I/O or request parsing failure exit code
pub const EXIT_FAILURE: i32 = 1;
/// Configuration error exit code
pub const EXIT_CONFIG: i32 = 2;
/// Store authentication failure exit code
pub const EXIT_AUTH: i32 = 3;

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// Missing or invalid configuration (exit code 2)
    #[error("Configuration error: {message}")]
    #[diagnostic(code(secret_backend::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// The secret store rejected the credentials (exit code 3)
    #[error("Authentication error: {message}")]
    #[diagnostic(code(secret_backend::auth))]
    Auth {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// I/O, request parsing or other failure (exit code 1)
    #[error("Error in secret backend: {message}")]
    #[diagnostic(code(secret_backend::other))]
    Other {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new authentication error
    #[must_use]
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new other error
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new other error with help text
    #[must_use]
    pub fn other_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Add help text to an existing error, returning a new error with the help text set.
    #[must_use]
    pub fn with_help(self, help_text: impl Into<String>) -> Self {
        let help = Some(help_text.into());
        match self {
            Self::Config { message, .. } => Self::Config { message, help },
            Self::Auth { message, .. } => Self::Auth { message, help },
            Self::Other { message, .. } => Self::Other { message, help },
        }
    }
}

/// Convert a fatal [`SecretError`] to the matching `CliError` variant.
///
/// Per-handle errors never reach this point during a normal run; they are
/// mapped to `Other` for completeness.
impl From<SecretError> for CliError {
    fn from(err: SecretError) -> Self {
        match err {
            SecretError::Config { message } => Self::config(message).with_help(
                "Set VAULT_TOKEN (and VAULT_ADDR if Vault is not at the default address)",
            ),
            SecretError::Auth { message } => Self::auth(message)
                .with_help("Check that VAULT_TOKEN is valid and has not expired"),
            other => Self::other(other.to_string()),
        }
    }
}

/// Map CLI error to appropriate exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } => EXIT_CONFIG,
        CliError::Auth { .. } => EXIT_AUTH,
        CliError::Other { .. } => EXIT_FAILURE,
    }
}

/// Render an error report on stderr
pub fn render_error(err: &CliError) {
    let report = Report::new(err.clone());
    eprintln!("{report:?}");
    // Ensure output is flushed before process exit
    let _ = io::stderr().flush();
}

/// Which failures of a versioned KV read are retried with the legacy protocol
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum KvFallback {
    /// Retry only when the secret or engine is not found
    Strict,
    /// Retry on any failure, including a missing key or a denied read
    #[default]
    Lenient,
}

impl From<KvFallback> for FallbackPolicy {
    fn from(value: KvFallback) -> Self {
        match value {
            KvFallback::Strict => Self::Strict,
            KvFallback::Lenient => Self::Lenient,
        }
    }
}

/// Resolve `mount/path#key` secret handles from HashiCorp Vault.
///
/// Reads `{"secrets": [...]}` on stdin and writes
/// `{"<handle>": {"value": ..., "error": ...}}` on stdout.
#[derive(Parser, Debug)]
#[command(name = "secret-backend", version, about, long_about = None)]
pub struct Cli {
    /// Vault server address
    #[arg(long, env = "VAULT_ADDR", default_value = DEFAULT_ADDRESS)]
    pub vault_addr: String,

    /// Vault token used for every read
    #[arg(long, env = "VAULT_TOKEN", hide_env_values = true)]
    pub vault_token: Option<String>,

    /// Vault Enterprise namespace
    #[arg(long, env = "VAULT_NAMESPACE")]
    pub vault_namespace: Option<String>,

    /// Skip TLS certificate verification
    #[arg(
        long,
        env = "VAULT_SKIP_VERIFY",
        action = clap::ArgAction::Set,
        value_parser = clap::builder::BoolishValueParser::new(),
        default_value = "false"
    )]
    pub vault_skip_verify: bool,

    /// When a KV v2 read fails, which failures retry with KV v1
    #[arg(long, env = "SECRET_BACKEND_KV_FALLBACK", value_enum, default_value_t = KvFallback::Lenient)]
    pub kv_fallback: KvFallback,

    /// Log level (RUST_LOG overrides it)
    #[arg(long, env = "SECRET_BACKEND_LOG_LEVEL", value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, env = "SECRET_BACKEND_LOG_FORMAT", value_enum, default_value_t = TracingFormat::Compact)]
    pub log_format: TracingFormat,
}

impl Cli {
    /// Store connection settings derived from flags and environment
    #[must_use]
    pub fn vault_config(&self) -> VaultConfig {
        let config = VaultConfig::new(self.vault_addr.clone())
            .with_namespace(self.vault_namespace.clone())
            .with_verify(!self.vault_skip_verify);
        match &self.vault_token {
            Some(token) => config.with_token(token.clone()),
            None => config,
        }
    }

    /// Fallback policy for the fetcher
    #[must_use]
    pub fn fallback_policy(&self) -> FallbackPolicy {
        self.kv_fallback.into()
    }

    /// Tracing settings for this invocation
    #[must_use]
    pub fn tracing_config(&self) -> TracingConfig {
        TracingConfig {
            format: self.log_format,
            level: self.log_level.into(),
        }
    }
}

/// Parse command line arguments and environment
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const VARS: [&str; 7] = [
        "VAULT_ADDR",
        "VAULT_TOKEN",
        "VAULT_NAMESPACE",
        "VAULT_SKIP_VERIFY",
        "SECRET_BACKEND_KV_FALLBACK",
        "SECRET_BACKEND_LOG_LEVEL",
        "SECRET_BACKEND_LOG_FORMAT",
    ];

    fn parse_clean(args: &[&str], vars: &[(&str, &str)]) -> Cli {
        let mut env: Vec<(&str, Option<&str>)> = VARS.iter().map(|v| (*v, None)).collect();
        env.extend(vars.iter().map(|(k, v)| (*k, Some(*v))));
        temp_env::with_vars(env, || {
            Cli::try_parse_from(std::iter::once("secret-backend").chain(args.iter().copied()))
                .unwrap()
        })
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = parse_clean(&[], &[]);
        assert_eq!(cli.vault_addr, "http://vault:8200");
        assert!(cli.vault_token.is_none());
        assert!(!cli.vault_skip_verify);
        assert_eq!(cli.kv_fallback, KvFallback::Lenient);
        assert_eq!(cli.fallback_policy(), FallbackPolicy::Lenient);
        assert_eq!(cli.log_level, LogLevel::Warn);
        assert_eq!(cli.log_format, TracingFormat::Compact);

        let config = cli.vault_config();
        assert!(config.token.is_none());
        assert!(config.verify);
    }

    #[test]
    fn test_environment_configuration() {
        let cli = parse_clean(
            &[],
            &[
                ("VAULT_ADDR", "https://vault.internal:8200"),
                ("VAULT_TOKEN", "hvs.abc"),
                ("VAULT_NAMESPACE", "team-a"),
                ("VAULT_SKIP_VERIFY", "true"),
                ("SECRET_BACKEND_KV_FALLBACK", "strict"),
            ],
        );

        let config = cli.vault_config();
        assert_eq!(config.address, "https://vault.internal:8200");
        assert!(config.token.is_some());
        assert_eq!(config.namespace.as_deref(), Some("team-a"));
        assert!(!config.verify);
        assert_eq!(cli.fallback_policy(), FallbackPolicy::Strict);
    }

    #[test]
    fn test_flags_override_environment() {
        let cli = parse_clean(
            &["--vault-addr", "http://127.0.0.1:8200", "--log-level", "debug"],
            &[("VAULT_ADDR", "http://ignored:8200")],
        );
        assert_eq!(cli.vault_addr, "http://127.0.0.1:8200");
        assert_eq!(cli.tracing_config().level, tracing::Level::DEBUG);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(EXIT_OK, 0);
        assert_eq!(exit_code_for(&CliError::config("x")), EXIT_CONFIG);
        assert_eq!(exit_code_for(&CliError::auth("x")), EXIT_AUTH);
        assert_eq!(exit_code_for(&CliError::other("x")), EXIT_FAILURE);
    }

    #[test]
    fn test_secret_error_conversion() {
        let err: CliError = SecretError::config("VAULT_TOKEN environment variable is required").into();
        assert!(matches!(err, CliError::Config { help: Some(_), .. }));
        assert!(err.to_string().contains("VAULT_TOKEN"));

        let err: CliError = SecretError::auth("Vault client not authenticated").into();
        assert_eq!(exit_code_for(&err), EXIT_AUTH);
    }

    #[test]
    fn test_with_help() {
        let err = CliError::other("boom").with_help("try again");
        match err {
            CliError::Other { message, help } => {
                assert_eq!(message, "boom");
                assert_eq!(help.as_deref(), Some("try again"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
