use crate::{error::FetchError, model::RawPayload};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

pub use openweather::OpenWeatherProvider;

/// A source of current-weather payloads.
///
/// The credential is passed on every call; providers hold no key of their own.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch(&self, city: &str, api_key: &str) -> Result<RawPayload, FetchError>;
}
