//! Append-only, human-readable log of weather lookups.

use chrono::Local;
use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use crate::{
    error::PersistError,
    model::{TIMESTAMP_FORMAT, WeatherRecord},
};

const RULE_WIDTH: usize = 80;
const TITLE: &str = "WEATHER DATA LOG - Real-Time Weather Information System";

#[derive(Debug, Clone)]
pub struct WeatherJournal {
    path: PathBuf,
}

impl WeatherJournal {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one block for `record`, creating the file with a header if needed.
    pub fn append(&self, record: &WeatherRecord) -> Result<(), PersistError> {
        self.ensure_initialized()?;

        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(format_entry(record).as_bytes())?;
        Ok(())
    }

    /// Truncate the log back to a fresh header.
    pub fn clear(&self) -> Result<(), PersistError> {
        self.create_parent()?;
        let mut file = File::create(&self.path)?;
        write_header(&mut file)?;
        Ok(())
    }

    /// Size in bytes; 0 if the file does not exist yet.
    pub fn size(&self) -> Result<u64, PersistError> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn ensure_initialized(&self) -> io::Result<()> {
        self.create_parent()?;
        match OpenOptions::new().write(true).create_new(true).open(&self.path) {
            Ok(mut file) => write_header(&mut file),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn create_parent(&self) -> io::Result<()> {
        match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => fs::create_dir_all(parent),
            None => Ok(()),
        }
    }
}

fn write_header(out: &mut impl Write) -> io::Result<()> {
    let rule = "=".repeat(RULE_WIDTH);
    writeln!(out, "{rule}")?;
    writeln!(out, "{TITLE}")?;
    writeln!(out, "{rule}")?;
    writeln!(out, "Created: {}", Local::now().format(TIMESTAMP_FORMAT))?;
    writeln!(out)
}

fn format_entry(record: &WeatherRecord) -> String {
    let humidity = record.humidity_percent.map_or("N/A".to_string(), |h| format!("{h}%"));
    let pressure = record.pressure_hpa.map_or("N/A".to_string(), |p| format!("{p} hPa"));

    format!(
        "\n[{}] Weather Report for {}, {}\n\
         \x20   Temperature:     {:.1}°C\n\
         \x20   Humidity:        {}\n\
         \x20   Pressure:        {}\n\
         \x20   Weather:         {}\n\
         \x20   Wind Speed:      {} m/s\n\
         {}\n",
        record.timestamp(),
        record.city,
        record.country,
        record.temperature_celsius,
        humidity,
        pressure,
        record.condition_description,
        record.wind_speed_mps,
        "=".repeat(RULE_WIDTH),
    )
}
