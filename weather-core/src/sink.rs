//! Fan-out of a record to the database and the log file.

use std::fmt;
use tracing::{info, warn};

use crate::{journal::WeatherJournal, model::WeatherRecord, store::WeatherStore};

/// Which sinks accepted a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistOutcome {
    pub database_ok: bool,
    pub file_ok: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistStatus {
    Both,
    DatabaseOnly,
    FileOnly,
    Neither,
}

impl PersistOutcome {
    pub fn status(&self) -> PersistStatus {
        match (self.database_ok, self.file_ok) {
            (true, true) => PersistStatus::Both,
            (true, false) => PersistStatus::DatabaseOnly,
            (false, true) => PersistStatus::FileOnly,
            (false, false) => PersistStatus::Neither,
        }
    }
}

impl PersistStatus {
    pub fn message(&self) -> &'static str {
        match self {
            PersistStatus::Both => "Data saved to database and log file.",
            PersistStatus::DatabaseOnly => "Data saved to database only; writing the log file failed.",
            PersistStatus::FileOnly => "Data saved to log file only; writing the database failed.",
            PersistStatus::Neither => "Failed to save data to both database and log file.",
        }
    }
}

impl fmt::Display for PersistStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone)]
pub struct PersistenceSink {
    store: WeatherStore,
    journal: WeatherJournal,
}

impl PersistenceSink {
    pub fn new(store: WeatherStore, journal: WeatherJournal) -> Self {
        Self { store, journal }
    }

    pub fn store(&self) -> &WeatherStore {
        &self.store
    }

    pub fn journal(&self) -> &WeatherJournal {
        &self.journal
    }

    /// Write to the database, then the log file. A failure in one does not
    /// stop or undo the other.
    pub fn persist(&self, record: &WeatherRecord) -> PersistOutcome {
        let database_ok = match self.store.insert(record) {
            Ok(id) => {
                info!(id, city = %record.city, "record stored");
                true
            }
            Err(e) => {
                warn!(error = %e, path = %self.store.path().display(), "database write failed");
                false
            }
        };

        let file_ok = match self.journal.append(record) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, path = %self.journal.path().display(), "log file write failed");
                false
            }
        };

        PersistOutcome { database_ok, file_ok }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn record() -> WeatherRecord {
        WeatherRecord {
            city: "Lisbon".into(),
            country: "PT".into(),
            temperature_celsius: 22.0,
            humidity_percent: Some(70),
            pressure_hpa: Some(1018),
            condition_description: "few clouds".into(),
            wind_speed_mps: 5.0,
            observed_at: NaiveDate::from_ymd_opt(2024, 7, 1)
                .and_then(|d| d.and_hms_opt(14, 0, 0))
                .unwrap(),
        }
    }

    /// A path under a regular file, so nothing can be created there.
    fn blocked(dir: &TempDir, name: &str) -> std::path::PathBuf {
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        blocker.join(name)
    }

    #[test]
    fn status_covers_every_combination() {
        let status = |database_ok, file_ok| PersistOutcome { database_ok, file_ok }.status();
        assert_eq!(status(true, true), PersistStatus::Both);
        assert_eq!(status(true, false), PersistStatus::DatabaseOnly);
        assert_eq!(status(false, true), PersistStatus::FileOnly);
        assert_eq!(status(false, false), PersistStatus::Neither);
    }

    #[test]
    fn both_sinks_succeed() {
        let dir = tempdir().unwrap();
        let sink = PersistenceSink::new(
            WeatherStore::new(dir.path().join("weather.db")),
            WeatherJournal::new(dir.path().join("weather_log.txt")),
        );

        assert_eq!(sink.persist(&record()).status(), PersistStatus::Both);
        assert_eq!(sink.store().recent(1).unwrap()[0].record, record());
        assert!(sink.journal().size().unwrap() > 0);
    }

    #[test]
    fn file_failure_does_not_block_database() {
        let dir = tempdir().unwrap();
        let sink = PersistenceSink::new(
            WeatherStore::new(dir.path().join("weather.db")),
            WeatherJournal::new(blocked(&dir, "weather_log.txt")),
        );

        assert_eq!(sink.persist(&record()).status(), PersistStatus::DatabaseOnly);
        assert_eq!(sink.store().count().unwrap(), 1);
    }

    #[test]
    fn database_failure_does_not_block_file() {
        let dir = tempdir().unwrap();
        let sink = PersistenceSink::new(
            WeatherStore::new(blocked(&dir, "weather.db")),
            WeatherJournal::new(dir.path().join("weather_log.txt")),
        );

        assert_eq!(sink.persist(&record()).status(), PersistStatus::FileOnly);
        assert!(sink.journal().size().unwrap() > 0);
    }

    #[test]
    fn neither_sink_reachable() {
        let dir = tempdir().unwrap();
        let sink = PersistenceSink::new(
            WeatherStore::new(blocked(&dir, "weather.db")),
            WeatherJournal::new(blocked(&dir, "weather_log.txt")),
        );

        let status = sink.persist(&record()).status();
        assert_eq!(status, PersistStatus::Neither);
        assert!(status.message().contains("both"));
    }
}
