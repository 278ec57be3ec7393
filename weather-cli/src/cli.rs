use anyhow::bail;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use weather_core::Config;

use crate::{
    display::{MessageKind, message},
    session::Session,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    /// Path to the config file; defaults to the platform config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Without a subcommand the interactive menu is started.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Verify an API key and store it in the config file.
    Configure,

    /// Look up current weather for a city and record it.
    Show {
        /// City name, e.g. "Paris".
        city: String,
    },

    /// Show stored lookups, newest first.
    History {
        /// Number of records to show; defaults to the configured history limit.
        #[arg(long, conflicts_with = "all")]
        limit: Option<usize>,

        /// Show every stored record.
        #[arg(long)]
        all: bool,
    },

    /// Find stored lookups whose city contains the given text (case-insensitive).
    Search { text: String },

    /// List every city with at least one stored lookup.
    Cities,

    /// Delete all stored lookups from the database.
    Clear {
        /// Reset the log file instead of the database.
        #[arg(long)]
        log: bool,

        /// Do not ask for confirmation.
        #[arg(short, long)]
        yes: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config_path = match self.config {
            Some(path) => path,
            None => Config::config_file_path()?,
        };
        let config = Config::load_from(&config_path)?;
        let history_limit = config.history_limit();
        let mut session = Session::new(config, config_path)?;

        let Some(command) = self.command else {
            return session.run().await;
        };

        match command {
            Command::Configure => session.configure().await?,
            Command::Show { city } => {
                session.warn_if_default_credential();
                if !session.check_weather(&city).await {
                    bail!("Lookup for '{city}' did not succeed");
                }
            }
            Command::History { limit, all } => {
                let limit = if all { None } else { Some(limit.unwrap_or(history_limit)) };
                session.show_history(limit)?;
            }
            Command::Search { text } => session.search(&text)?,
            Command::Cities => session.list_cities()?,
            Command::Clear { log, yes } => {
                let target = if log { "the log file" } else { "all stored weather records" };
                if !yes && !confirm_clear(target)? {
                    message(MessageKind::Info, "Operation cancelled.");
                    return Ok(());
                }
                if log {
                    session.clear_log_file()?;
                } else {
                    session.clear_history()?;
                }
            }
        }

        Ok(())
    }
}

fn confirm_clear(target: &str) -> anyhow::Result<bool> {
    Ok(inquire::Confirm::new(&format!("Really clear {target}? This cannot be undone."))
        .with_default(false)
        .prompt()?)
}
