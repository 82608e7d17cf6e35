//! Command execution

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context};
use credbroker_core::{BrokerError, CredentialStore, ErrorKind, SecretString, SettingsManager};
use tracing::{debug, warn};

use crate::args::{Command, ConfigCommand};

/// Load settings for `command`
///
/// `config init --force` overwrites the file anyway, so a file that cannot be
/// read is replaced by defaults instead of failing the command.
pub fn load_settings(config: Option<PathBuf>, command: &Command) -> anyhow::Result<SettingsManager> {
    let path = match config {
        Some(path) => path,
        None => SettingsManager::default_path()?,
    };

    match SettingsManager::load(path.clone()) {
        Ok(settings) => Ok(settings),
        Err(e) if matches!(command, Command::Config(ConfigCommand::Init { force: true })) => {
            warn!(error = %e, "Ignoring unreadable settings file");
            Ok(SettingsManager::with_defaults(path))
        }
        Err(e) => Err(e).with_context(|| format!("Failed to load {}", path.display())),
    }
}

/// Run one command against the credential store
pub fn execute(
    command: Command,
    store: &CredentialStore,
    settings: &mut SettingsManager,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    debug!(backend = store.backend_name(), command = command_name(&command), "Executing command");

    match command {
        Command::Store {
            service,
            username,
            secret,
        } => {
            let secret = read_secret(secret)?;
            store.store(&service, &username, secret.expose())?;
            writeln!(out, "Stored credential for {}", service)?;
        }
        Command::Update {
            service,
            username,
            secret,
        } => {
            let secret = read_secret(secret)?;
            store.update(&service, &username, secret.expose())?;
            writeln!(out, "Updated credential for {}", service)?;
        }
        Command::Fetch { service, json } => {
            let credential = store.fetch(&service)?;
            if json {
                let value = serde_json::json!({
                    "username": credential.username,
                    "secret": credential.secret.expose(),
                });
                writeln!(out, "{}", value)?;
            } else {
                writeln!(out, "username: {}", credential.username)?;
                writeln!(out, "secret: {}", credential.secret.expose())?;
            }
        }
        Command::Remove { service } => {
            store.remove(&service)?;
            writeln!(out, "Removed credential for {}", service)?;
        }
        Command::Count { service } => {
            writeln!(out, "{}", store.match_count(&service)?)?;
        }
        Command::Config(ConfigCommand::Show) => {
            let source = if settings.is_persisted() {
                "file"
            } else {
                "defaults"
            };
            writeln!(out, "# {} ({})", settings.path().display(), source)?;
            writeln!(out, "{}", serde_json::to_string_pretty(settings.get())?)?;
        }
        Command::Config(ConfigCommand::Init { force }) => {
            if settings.is_persisted() && !force {
                bail!(
                    "Settings file already exists at {} (use --force to overwrite)",
                    settings.path().display()
                );
            }
            settings
                .reset()
                .with_context(|| format!("Failed to write {}", settings.path().display()))?;
            writeln!(out, "Wrote default settings to {}", settings.path().display())?;
        }
    }

    Ok(())
}

/// Process exit code for a failed command
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<BrokerError>().map(BrokerError::kind) {
        Some(ErrorKind::InvalidArgument) => 2,
        Some(ErrorKind::AlreadyExists) => 3,
        Some(ErrorKind::NotFound) => 4,
        Some(ErrorKind::Vault) => 5,
        None => 1,
    }
}

/// Use the secret given on the command line, or prompt for it without echo
fn read_secret(secret: Option<String>) -> anyhow::Result<SecretString> {
    match secret {
        Some(secret) => Ok(SecretString::new(secret)),
        None => rpassword::prompt_password("Secret: ")
            .map(SecretString::new)
            .context("Failed to read secret"),
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Store { .. } => "store",
        Command::Update { .. } => "update",
        Command::Fetch { .. } => "fetch",
        Command::Remove { .. } => "remove",
        Command::Count { .. } => "count",
        Command::Config(_) => "config",
    }
}
