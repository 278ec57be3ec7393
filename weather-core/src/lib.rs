//! Core library for the `weather` CLI.
//!
//! This crate defines the lookup pipeline:
//! - Fetching current weather from a provider, with a closed error taxonomy
//! - Normalizing the provider payload into a [`WeatherRecord`]
//! - Persisting records to a SQLite store and an append-only log file
//! - Querying the stored history
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod journal;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod service;
pub mod sink;
pub mod store;

pub use config::{Config, Credential, CredentialSource};
pub use error::{FetchError, LookupError, NormalizeError, PersistError};
pub use journal::WeatherJournal;
pub use model::{RawPayload, StoredRecord, WeatherRecord};
pub use provider::{OpenWeatherProvider, WeatherProvider};
pub use service::{LookupReport, WeatherService};
pub use sink::{PersistOutcome, PersistStatus, PersistenceSink};
pub use store::WeatherStore;
