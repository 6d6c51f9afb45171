//! settings-host entry point.
//!
//! Loads the host configuration, initialises logging, builds a
//! [`SettingsSession`] around the platform registrar, and runs one command.
//!
//! ```text
//! settings-host [--config PATH] [FILE]          open FILE (as launched by the OS) and print it
//! settings-host show [FILE]                     print defaults, or FILE merged over them
//! settings-host set FILE KEY [VALUE]            change one setting and re-save FILE
//! settings-host save NAME                       write the defaults to <documents>/NAME.<tag>
//! settings-host reset FILE                      overwrite FILE with the defaults
//! settings-host register | deregister | status  manage the OS file association
//! ```
//!
//! When the OS opens a `*.<tag>` file with this executable it runs
//! `settings-host "<path>"`, which takes the bare `FILE` form.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use settings_host::application::session::{AssociationReport, SettingsSession};
use settings_host::infrastructure::association::NativeAssociationRegistrar;
use settings_host::infrastructure::storage::config::{config_file_path, load_config_from};

#[derive(Debug, Parser)]
#[command(name = "settings-host", version, about = "Typed settings files and their file association")]
struct Cli {
    /// Host configuration file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Settings file to open (the form the OS uses when launching a file)
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    /// Resolves the command to run.  A bare FILE is shorthand for `show FILE`;
    /// giving both a FILE and a subcommand is a usage error.
    fn into_command(self) -> Result<Command, clap::Error> {
        match (self.command, self.file) {
            (Some(_), Some(file)) => Err(Cli::command().error(
                ErrorKind::ArgumentConflict,
                format!(
                    "a settings file ({}) cannot be combined with a subcommand",
                    file.display()
                ),
            )),
            (Some(command), None) => Ok(command),
            (None, file) => Ok(Command::Show { file }),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the defaults, or a settings file merged over them
    Show { file: Option<PathBuf> },
    /// Change one setting in a settings file and save it
    Set {
        file: PathBuf,
        key: String,
        value: Option<String>,
    },
    /// Save the defaults under NAME in the documents directory
    Save { name: String },
    /// Overwrite a settings file with the defaults
    Reset { file: PathBuf },
    /// Make this executable the handler for the association tag
    Register,
    /// Remove the association
    Deregister,
    /// Report whether the association points at this executable
    Status,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_arg = cli.config.clone();
    let command = cli.into_command().unwrap_or_else(|e| e.exit());

    let config_path = match config_arg {
        Some(path) => path,
        None => config_file_path()?,
    };
    let config = load_config_from(&config_path)
        .with_context(|| format!("loading host configuration {}", config_path.display()))?;

    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.host.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(config = %config_path.display(), association = %config.host.association, "settings-host starting");

    let registrar = Arc::new(NativeAssociationRegistrar::new());
    let mut session = SettingsSession::from_config(&config, registrar)?;

    match command {
        Command::Show { file } => {
            if let Some(file) = file {
                session.open(&file)?;
            }
            print_settings(&session);
        }
        Command::Set { file, key, value } => {
            session.open(&file)?;
            session.set_from_text(&key, value.as_deref())?;
            let written = session.save(None)?;
            println!("{key} updated in {}", written.display());
        }
        Command::Save { name } => {
            let written = session.save(Some(&name))?;
            println!("saved {}", written.display());
        }
        Command::Reset { file } => {
            session.reset();
            let written = session.save_to(&file)?;
            println!("reset {}", written.display());
        }
        Command::Register => print_report(&session.register()?),
        Command::Deregister => print_report(&session.deregister()?),
        Command::Status => print_report(&session.association_status()),
    }

    Ok(())
}

fn print_settings(session: &SettingsSession) {
    if let Some(file) = session.store().current_file() {
        println!("# {}", file.display());
    }
    for line in session.show() {
        let marker = match (line.has_default, line.is_default) {
            (false, _) => " (file only)",
            (true, false) => " (modified)",
            (true, true) => "",
        };
        println!("{} [{}] = {}{marker}", line.key, line.value_type, line.value);
    }
}

fn print_report(report: &AssociationReport) {
    let executable = report
        .executable
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<unknown executable>".to_string());
    let state = if report.registered {
        "registered"
    } else {
        "not registered"
    };
    println!(".{} -> {executable}: {state}", report.tag);
}

// ── Tests ─────────────────────────────────────────────────────────────────────
