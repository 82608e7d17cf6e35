//! # credbroker-cli
//!
//! Command-line binding for the credential broker: parses arguments, reads
//! secrets without echoing them, and maps broker errors to exit codes.

pub mod args;
pub mod commands;

pub use args::{Args, Command, ConfigCommand};
pub use commands::{execute, exit_code, load_settings};
