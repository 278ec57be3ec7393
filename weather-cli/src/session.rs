//! Interactive session: credential handling and menu dispatch.

use anyhow::{Result, bail};
use chrono::Local;
use inquire::{Confirm, InquireError, Password, PasswordDisplayMode, Select, Text};
use std::{fmt, path::PathBuf};
use tracing::debug;
use weather_core::{Config, Credential, PersistStatus, WeatherService, config::API_KEY_ENV};

use crate::display::{self, MessageKind, message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    CheckWeather,
    RecentHistory,
    FullHistory,
    SearchCity,
    ListCities,
    Statistics,
    ClearHistory,
    ClearLogFile,
    ChangeApiKey,
    Exit,
}

impl MenuChoice {
    const ALL: [MenuChoice; 10] = [
        MenuChoice::CheckWeather,
        MenuChoice::RecentHistory,
        MenuChoice::FullHistory,
        MenuChoice::SearchCity,
        MenuChoice::ListCities,
        MenuChoice::Statistics,
        MenuChoice::ClearHistory,
        MenuChoice::ClearLogFile,
        MenuChoice::ChangeApiKey,
        MenuChoice::Exit,
    ];
}

impl fmt::Display for MenuChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MenuChoice::CheckWeather => "Check weather for a city",
            MenuChoice::RecentHistory => "View recent searches",
            MenuChoice::FullHistory => "View all records",
            MenuChoice::SearchCity => "Search records by city",
            MenuChoice::ListCities => "List recorded cities",
            MenuChoice::Statistics => "Show statistics",
            MenuChoice::ClearHistory => "Clear database history",
            MenuChoice::ClearLogFile => "Clear log file",
            MenuChoice::ChangeApiKey => "Change API key",
            MenuChoice::Exit => "Exit",
        })
    }
}

/// Owns the active credential and configuration for one run of the program.
#[derive(Debug)]
pub struct Session {
    config: Config,
    config_path: PathBuf,
    credential: Credential,
    service: WeatherService,
}

impl Session {
    pub fn new(config: Config, config_path: PathBuf) -> Result<Self> {
        let credential = config.credential();
        let service = WeatherService::from_config(&config)?;

        Ok(Self { config, config_path, credential, service })
    }

    pub fn warn_if_default_credential(&self) {
        if self.credential.is_default() {
            message(
                MessageKind::Warning,
                format!(
                    "No API key configured; using the built-in default, lookups will likely fail.\n    \
                     Set {API_KEY_ENV} or run `weather configure`.\n    \
                     Get a free API key from: https://openweathermap.org/api"
                ),
            );
        }
    }

    /// Run the menu loop until the operator exits or interrupts.
    pub async fn run(mut self) -> Result<()> {
        println!("{}", display::header("WEATHER INFORMATION SYSTEM"));
        println!("Session started: {}", Local::now().format("%Y-%m-%d %H:%M"));
        self.warn_if_default_credential();

        loop {
            let menu = Select::new("Select an option:", MenuChoice::ALL.to_vec())
                .with_page_size(MenuChoice::ALL.len())
                .prompt();

            let choice = match ask(menu) {
                Ok(Some(choice)) => choice,
                Ok(None) => break,
                Err(e) if is_interrupt(&e) => break,
                Err(e) => return Err(e),
            };

            if choice == MenuChoice::Exit {
                break;
            }

            if let Err(e) = self.dispatch(choice).await {
                if is_interrupt(&e) {
                    break;
                }
                message(MessageKind::Error, e.to_string());
            }
        }

        println!("{}", display::header("APPLICATION TERMINATED"));
        println!("\nThank you for using Weather Information System.");
        println!("Goodbye!");
        Ok(())
    }

    async fn dispatch(&mut self, choice: MenuChoice) -> Result<()> {
        debug!(?choice, "menu selection");
        match choice {
            MenuChoice::CheckWeather => {
                if let Some(city) = ask(Text::new("Enter city name:").prompt())? {
                    self.check_weather(&city).await;
                }
            }
            MenuChoice::RecentHistory => self.show_history(Some(self.config.history_limit()))?,
            MenuChoice::FullHistory => self.show_history(None)?,
            MenuChoice::SearchCity => {
                if let Some(needle) = ask(Text::new("City name (or part of it):").prompt())? {
                    self.search(&needle)?;
                }
            }
            MenuChoice::ListCities => self.list_cities()?,
            MenuChoice::Statistics => self.statistics()?,
            MenuChoice::ClearHistory => {
                if confirm("Delete ALL stored weather records? This cannot be undone.")? {
                    self.clear_history()?;
                } else {
                    message(MessageKind::Info, "Operation cancelled.");
                }
            }
            MenuChoice::ClearLogFile => {
                if confirm("Reset the weather log file? All entries will be lost.")? {
                    self.clear_log_file()?;
                } else {
                    message(MessageKind::Info, "Operation cancelled.");
                }
            }
            MenuChoice::ChangeApiKey => self.change_api_key().await?,
            MenuChoice::Exit => {}
        }
        Ok(())
    }

    /// Look up `city`, show the result and how it was saved. Returns whether a
    /// record was obtained.
    pub async fn check_weather(&self, city: &str) -> bool {
        let city = city.trim();
        if !city.is_empty() {
            message(MessageKind::Info, format!("Getting weather data for {city}..."));
        }

        match self.service.lookup_and_record(city, self.credential.key()).await {
            Ok(report) => {
                println!("{}", display::weather_report(&report.record));
                let status = report.outcome.status();
                let kind = match status {
                    PersistStatus::Both => MessageKind::Success,
                    PersistStatus::DatabaseOnly | PersistStatus::FileOnly => MessageKind::Warning,
                    PersistStatus::Neither => MessageKind::Error,
                };
                message(kind, status.message());
                true
            }
            Err(e) => {
                message(MessageKind::Error, e.to_string());
                false
            }
        }
    }

    /// `None` shows every record.
    pub fn show_history(&self, limit: Option<usize>) -> Result<()> {
        let store = self.service.store();
        let (records, title) = match limit {
            Some(n) => (store.recent(n)?, format!("RECENT WEATHER SEARCHES (LAST {n})")),
            None => (store.all()?, "ALL WEATHER RECORDS".to_string()),
        };
        println!("{}", display::history_table(&records, &title));
        Ok(())
    }

    pub fn search(&self, needle: &str) -> Result<()> {
        let needle = needle.trim();
        if needle.is_empty() {
            message(MessageKind::Error, "Please enter a city name to search for.");
            return Ok(());
        }

        let records = self.service.store().search(needle)?;
        if records.is_empty() {
            message(MessageKind::Info, format!("No records found for '{needle}'."));
            return Ok(());
        }
        let title = format!("SEARCH RESULTS FOR '{}'", needle.to_uppercase());
        println!("{}", display::history_table(&records, &title));
        Ok(())
    }

    pub fn list_cities(&self) -> Result<()> {
        let cities = self.service.store().distinct_cities()?;
        println!("{}", display::city_list(&cities));
        Ok(())
    }

    pub fn statistics(&self) -> Result<()> {
        let store = self.service.store();
        let journal = self.service.journal();

        println!("{}", display::header("STATISTICS"));
        println!("Stored records:  {}", store.count()?);
        println!("Cities:          {}", store.distinct_cities()?.len());
        println!("Log file size:   {}", display::human_size(journal.size()?));
        println!("Database:        {}", store.path().display());
        println!("Log file:        {}", journal.path().display());
        println!(
            "API key:         {} ({})",
            self.credential.masked(),
            self.credential.source()
        );
        Ok(())
    }

    pub fn clear_history(&self) -> Result<()> {
        let removed = self.service.store().clear_all()?;
        message(MessageKind::Success, format!("Deleted {removed} record(s) from the database."));
        Ok(())
    }

    pub fn clear_log_file(&self) -> Result<()> {
        self.service.journal().clear()?;
        message(MessageKind::Success, "Log file reset.");
        Ok(())
    }

    async fn change_api_key(&mut self) -> Result<()> {
        let Some(key) = prompt_api_key()? else {
            return Ok(());
        };

        if self.adopt_credential(key).await
            && confirm("Save this API key to the config file?")?
        {
            self.save_api_key()?;
        }
        Ok(())
    }

    /// Prompt for a key, verify it and store it in the config file.
    pub async fn configure(&mut self) -> Result<()> {
        let Some(key) = prompt_api_key()? else {
            bail!("No API key entered");
        };

        if !self.adopt_credential(key).await {
            bail!("API key was not saved");
        }
        self.save_api_key()
    }

    /// Verify `key` with a test lookup and make it active. On failure the
    /// previous credential stays in use.
    async fn adopt_credential(&mut self, key: String) -> bool {
        message(MessageKind::Info, "Verifying API key...");

        match self.service.verify_credential(&key).await {
            Ok(()) => {
                self.credential = Credential::session(key);
                message(MessageKind::Success, "API key verified and now in use.");
                true
            }
            Err(e) => {
                message(MessageKind::Error, format!("{e} Keeping the previous API key."));
                false
            }
        }
    }

    fn save_api_key(&mut self) -> Result<()> {
        self.config.set_api_key(self.credential.key().to_string());
        self.config.save_to(&self.config_path)?;
        message(
            MessageKind::Success,
            format!("API key saved to {}", self.config_path.display()),
        );
        Ok(())
    }
}

fn prompt_api_key() -> Result<Option<String>> {
    let entered = ask(
        Password::new("New API key:")
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt(),
    )?;

    match entered.map(|k| k.trim().to_string()) {
        Some(key) if !key.is_empty() => Ok(Some(key)),
        Some(_) => {
            message(MessageKind::Error, "API key cannot be empty.");
            Ok(None)
        }
        None => Ok(None),
    }
}

fn confirm(question: &str) -> Result<bool> {
    Ok(ask(Confirm::new(question).with_default(false).prompt())?.unwrap_or(false))
}

/// `Ok(None)` when the operator backs out of a prompt with Esc.
fn ask<T>(answer: Result<T, InquireError>) -> Result<Option<T>> {
    match answer {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn is_interrupt(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<InquireError>(), Some(InquireError::OperationInterrupted))
}
