//! credbroker - command-line front end for the credential broker
//!
//! Credentials go to stdout; logs go to stderr so fetched secrets can be
//! piped without noise.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use credbroker_cli::{execute, exit_code, load_settings, Args};
use credbroker_core::{CredentialStore, KeyringVault};
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut settings = load_settings(args.config, &args.command)?;

    init_tracing(&settings.get().log_filter, args.verbose);
    debug!("Using settings from {:?}", settings.path());

    let vault = Arc::new(KeyringVault::new(settings.get().index_namespace.clone()));
    let store = CredentialStore::new(vault);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(args.command, &store, &mut settings, &mut out)
}

/// Initialize logging: `RUST_LOG` wins, then `--verbose`, then the settings filter
fn init_tracing(log_filter: &str, verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new(log_filter)
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
