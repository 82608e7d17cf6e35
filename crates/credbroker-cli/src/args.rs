//! Command-line arguments

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Credential broker - keep one username/secret pair per service in the OS keychain
#[derive(Parser, Debug)]
#[command(name = "credbroker")]
#[command(version)]
#[command(about = "Store, fetch, update and remove one credential per service in the OS keychain")]
pub struct Args {
    /// Settings file (defaults to the per-user configuration directory)
    #[arg(long, global = true, env = "CREDBROKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level regardless of settings
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Store a new credential; fails if the service already has one
    Store {
        service: String,
        #[arg(short, long)]
        username: String,
        /// Secret value; prompted for when omitted
        #[arg(long, env = "CREDBROKER_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },

    /// Replace the username and secret of an existing credential
    Update {
        service: String,
        #[arg(short, long)]
        username: String,
        /// Secret value; prompted for when omitted
        #[arg(long, env = "CREDBROKER_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },

    /// Print the username and secret stored for a service
    Fetch {
        service: String,
        /// Print as a JSON object
        #[arg(long)]
        json: bool,
    },

    /// Remove the credential stored for a service
    Remove { service: String },

    /// Print how many vault items exist for a service
    Count { service: String },

    /// Inspect or create the settings file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective settings and where they come from
    Show,
    /// Write default settings to the settings file
    Init {
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },
}
