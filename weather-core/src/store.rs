//! SQLite-backed history of weather lookups.
//!
//! Every operation opens its own connection and closes it before returning.
//! The file and the `weather_data` table are created on first use.

use chrono::NaiveDateTime;
use rusqlite::{Connection, params, types::Type};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::{
    error::PersistError,
    model::{StoredRecord, TIMESTAMP_FORMAT, WeatherRecord},
};

const SELECT_COLUMNS: &str = "SELECT id, city, country, temperature, humidity, weather_condition, \
     wind_speed, pressure, timestamp FROM weather_data";

/// Newest first; `id` breaks ties between records stamped in the same second.
const NEWEST_FIRST: &str = "ORDER BY timestamp DESC, id DESC";

#[derive(Debug, Clone)]
pub struct WeatherStore {
    path: PathBuf,
}

impl WeatherStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, PersistError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&self.path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS weather_data (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                city TEXT NOT NULL,
                country TEXT NOT NULL,
                temperature REAL NOT NULL,
                humidity INTEGER,
                weather_condition TEXT NOT NULL,
                wind_speed REAL NOT NULL,
                pressure INTEGER,
                timestamp TEXT NOT NULL
            );
            "#,
        )?;
        Ok(conn)
    }

    /// Append a record. Returns its surrogate id.
    pub fn insert(&self, record: &WeatherRecord) -> Result<i64, PersistError> {
        let conn = self.connect()?;
        conn.execute(
            r#"
            INSERT INTO weather_data
                (city, country, temperature, humidity, weather_condition, wind_speed, pressure, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.city,
                record.country,
                record.temperature_celsius,
                record.humidity_percent,
                record.condition_description,
                record.wind_speed_mps,
                record.pressure_hpa,
                record.timestamp(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        debug!(id, city = %record.city, "inserted weather record");
        Ok(id)
    }

    /// The `limit` most recent records.
    pub fn recent(&self, limit: usize) -> Result<Vec<StoredRecord>, PersistError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} {NEWEST_FIRST} LIMIT ?1"))?;
        let rows = stmt.query_map(params![limit], row_to_record)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Every record, newest first.
    pub fn all(&self) -> Result<Vec<StoredRecord>, PersistError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} {NEWEST_FIRST}"))?;
        let rows = stmt.query_map([], row_to_record)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Cities with at least one record, alphabetical.
    pub fn distinct_cities(&self) -> Result<Vec<String>, PersistError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT DISTINCT city FROM weather_data ORDER BY city")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Records whose city contains `needle`, ignoring case. Same order as [`Self::all`].
    ///
    /// Matching is done here rather than with `LIKE`, which only folds ASCII.
    pub fn search(&self, needle: &str) -> Result<Vec<StoredRecord>, PersistError> {
        let needle = needle.trim().to_lowercase();
        let records = self.all()?;
        Ok(records
            .into_iter()
            .filter(|r| r.record.city.to_lowercase().contains(&needle))
            .collect())
    }

    pub fn count(&self) -> Result<usize, PersistError> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM weather_data", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Delete every record. Returns how many were removed.
    pub fn clear_all(&self) -> Result<usize, PersistError> {
        let conn = self.connect()?;
        let removed = conn.execute("DELETE FROM weather_data", [])?;
        info!(removed, "cleared weather history");
        Ok(removed)
    }
}

fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<StoredRecord> {
    let timestamp: String = row.get(8)?;
    let observed_at = NaiveDateTime::parse_from_str(&timestamp, TIMESTAMP_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?;

    Ok(StoredRecord {
        id: row.get(0)?,
        record: WeatherRecord {
            city: row.get(1)?,
            country: row.get(2)?,
            temperature_celsius: row.get(3)?,
            humidity_percent: row.get(4)?,
            condition_description: row.get(5)?,
            wind_speed_mps: row.get(6)?,
            pressure_hpa: row.get(7)?,
            observed_at,
        },
    })
}
