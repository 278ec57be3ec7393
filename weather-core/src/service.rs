//! The lookup pipeline: fetch, normalize, persist to both sinks.

use tracing::{debug, warn};

use crate::{
    config::Config,
    error::{FetchError, LookupError},
    journal::WeatherJournal,
    model::WeatherRecord,
    normalize::normalize,
    provider::{OpenWeatherProvider, WeatherProvider},
    sink::{PersistOutcome, PersistenceSink},
    store::WeatherStore,
};

/// City used to test a credential before it is accepted.
pub const PROBE_CITY: &str = "London";

/// A successful lookup and what happened when it was persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupReport {
    pub record: WeatherRecord,
    pub outcome: PersistOutcome,
}

#[derive(Debug)]
pub struct WeatherService {
    provider: Box<dyn WeatherProvider>,
    sink: PersistenceSink,
}

impl WeatherService {
    pub fn new(provider: Box<dyn WeatherProvider>, sink: PersistenceSink) -> Self {
        Self { provider, sink }
    }

    /// OpenWeather provider plus the store and log file named in `config`.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let provider = OpenWeatherProvider::from_config(config)?;
        let sink = PersistenceSink::new(
            WeatherStore::new(config.database_path()),
            WeatherJournal::new(config.log_file_path()),
        );
        Ok(Self::new(Box::new(provider), sink))
    }

    pub fn store(&self) -> &WeatherStore {
        self.sink.store()
    }

    pub fn journal(&self) -> &WeatherJournal {
        self.sink.journal()
    }

    /// Fetch and normalize without persisting.
    pub async fn lookup(&self, city: &str, api_key: &str) -> Result<WeatherRecord, LookupError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(LookupError::EmptyCity);
        }

        let raw = self.provider.fetch(city, api_key).await.inspect_err(|e| {
            debug!(city, error = ?e, "fetch failed");
        })?;
        let record = normalize(&raw)?;

        if !record.has_plausible_temperature() {
            warn!(
                city = %record.city,
                temperature = record.temperature_celsius,
                "implausible temperature reported by provider; storing as-is"
            );
        }

        Ok(record)
    }

    /// Fetch, normalize, and write the record to both sinks.
    pub async fn lookup_and_record(
        &self,
        city: &str,
        api_key: &str,
    ) -> Result<LookupReport, LookupError> {
        let record = self.lookup(city, api_key).await?;
        let outcome = self.sink.persist(&record);
        Ok(LookupReport { record, outcome })
    }

    /// Check that `api_key` is accepted, using a lookup that is not persisted.
    pub async fn verify_credential(&self, api_key: &str) -> Result<(), FetchError> {
        self.provider.fetch(PROBE_CITY, api_key).await.map(|_| ())
    }
}
