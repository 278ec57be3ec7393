use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::provider::openweather::{DEFAULT_TIMEOUT, OPENWEATHER_CURRENT_URL};

/// Environment variable checked before the config file for the API key.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Placeholder used when no key is configured anywhere. Lookups with it will
/// be rejected by the provider; the session warns about it up front.
pub const DEFAULT_API_KEY: &str = "replace-with-your-openweather-api-key";

pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// timeout_secs = 10
/// database_path = "/home/me/.local/share/weather/weather.db"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub database_path: Option<PathBuf>,
    pub log_file_path: Option<PathBuf>,
    pub history_limit: Option<usize>,
}

impl Config {
    /// Load config from `path`, or an empty default if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(OPENWEATHER_CURRENT_URL)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_secs.map(Duration::from_secs).unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit.filter(|n| *n > 0).unwrap_or(DEFAULT_HISTORY_LIMIT)
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path.clone().unwrap_or_else(|| data_dir().join("weather.db"))
    }

    pub fn log_file_path(&self) -> PathBuf {
        self.log_file_path.clone().unwrap_or_else(|| data_dir().join("weather_log.txt"))
    }

    /// Resolve the active credential from the process environment and this config.
    pub fn credential(&self) -> Credential {
        Credential::resolve(std::env::var(API_KEY_ENV).ok(), self.api_key.as_deref())
    }

    /// Replace the stored API key.
    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "weather-task", "weather-cli")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}

/// Platform data directory, or `./data` when none can be determined.
fn data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|_| PathBuf::from("data"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    ConfigFile,
    BuiltinDefault,
    /// Entered by the operator during the current session.
    Session,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CredentialSource::Environment => "environment variable",
            CredentialSource::ConfigFile => "config file",
            CredentialSource::BuiltinDefault => "built-in default",
            CredentialSource::Session => "entered this session",
        })
    }
}

/// The API key in use, and where it came from.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    key: String,
    source: CredentialSource,
}

impl Credential {
    /// Environment value first, then the config file, then the built-in default.
    /// Blank values are skipped.
    pub fn resolve(env_value: Option<String>, configured: Option<&str>) -> Self {
        let non_blank = |s: &str| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        };

        if let Some(key) = env_value.as_deref().and_then(non_blank) {
            return Self { key, source: CredentialSource::Environment };
        }
        if let Some(key) = configured.and_then(non_blank) {
            return Self { key, source: CredentialSource::ConfigFile };
        }
        Self { key: DEFAULT_API_KEY.to_string(), source: CredentialSource::BuiltinDefault }
    }

    pub fn session(key: String) -> Self {
        Self { key, source: CredentialSource::Session }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn is_default(&self) -> bool {
        self.source == CredentialSource::BuiltinDefault
    }

    /// Key with everything but the last four characters hidden.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.key.chars().collect();
        let visible = chars.len().min(4);
        let tail: String = chars[chars.len() - visible..].iter().collect();
        format!("{}{}", "*".repeat(chars.len() - visible), tail)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("key", &self.masked())
            .field("source", &self.source)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn env_wins_over_config() {
        let cred = Credential::resolve(Some("ENV_KEY".into()), Some("FILE_KEY"));
        assert_eq!(cred.key(), "ENV_KEY");
        assert_eq!(cred.source(), CredentialSource::Environment);
    }

    #[test]
    fn config_used_when_env_absent_or_blank() {
        let cred = Credential::resolve(None, Some("FILE_KEY"));
        assert_eq!(cred.source(), CredentialSource::ConfigFile);

        let cred = Credential::resolve(Some("   ".into()), Some("FILE_KEY"));
        assert_eq!(cred.key(), "FILE_KEY");
    }

    #[test]
    fn falls_back_to_builtin_default() {
        let cred = Credential::resolve(None, None);
        assert!(cred.is_default());
        assert_eq!(cred.key(), DEFAULT_API_KEY);
    }

    #[test]
    fn debug_output_masks_key() {
        let cred = Credential::session("abcdef123456".into());
        let dbg = format!("{cred:?}");
        assert!(!dbg.contains("abcdef"));
        assert!(dbg.contains("3456"));
        assert_eq!(Credential::session("ab".into()).masked(), "ab");
    }

    #[test]
    fn defaults_when_fields_absent() {
        let cfg = Config::default();
        assert_eq!(cfg.base_url(), OPENWEATHER_CURRENT_URL);
        assert_eq!(cfg.timeout(), Duration::from_secs(10));
        assert_eq!(cfg.history_limit(), DEFAULT_HISTORY_LIMIT);
        assert!(cfg.database_path().ends_with("weather.db"));
        assert!(cfg.log_file_path().ends_with("weather_log.txt"));
    }

    #[test]
    fn missing_file_loads_default() {
        let dir = tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config { timeout_secs: Some(3), ..Config::default() };
        cfg.set_api_key("KEY".into());
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_key.as_deref(), Some("KEY"));
        assert_eq!(loaded.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn partial_file_parses() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "history_limit = 25\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.history_limit(), 25);
        assert_eq!(cfg.api_key, None);
    }

    #[test]
    fn invalid_file_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "timeout_secs = \"soon\"").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
