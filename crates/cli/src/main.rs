//! secret-backend CLI Application
//!
//! Entry point invoked by the host agent. Parses configuration, installs
//! tracing, then runs a single request on a current-thread runtime.

// CLI binary needs to output to stderr - this is intentional
#![allow(clippy::print_stderr)]

use secret_backend::cli::{self, EXIT_FAILURE};
use secret_backend::tracing::init_tracing;

fn main() {
    // NOTE: Using eprintln! in panic hook is intentional - tracing infrastructure
    // may be corrupted during a panic, so we use the most reliable output method.
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();

    if let Err(e) = init_tracing(cli.tracing_config()) {
        eprintln!("{e:?}");
        std::process::exit(EXIT_FAILURE);
    }

    let exit_code = run_with_tokio(cli);
    std::process::exit(exit_code);
}

/// Create a current-thread runtime and run the request on it
fn run_with_tokio(cli: cli::Cli) -> i32 {
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Fatal error: Failed to create tokio runtime: {e}");
            return EXIT_FAILURE;
        }
    };

    rt.block_on(secret_backend::run(cli))
}
