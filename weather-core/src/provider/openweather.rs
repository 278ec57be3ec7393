use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{config::Config, error::FetchError, model::RawPayload};

use super::WeatherProvider;

pub const OPENWEATHER_CURRENT_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the OpenWeather current-weather endpoint:
/// one request per call, metric units, no retries.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn with_options(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self { base_url: base_url.to_string(), http })
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Self::with_options(config.base_url(), config.timeout())
    }

    #[instrument(skip(self, api_key), level = "debug")]
    async fn fetch_current(&self, city: &str, api_key: &str) -> Result<RawPayload, FetchError> {
        let res = self
            .http
            .get(&self.base_url)
            .query(&[("q", city), ("appid", api_key), ("units", "metric")])
            .send()
            .await
            .inspect_err(|e| debug!(error = %e, "request failed"))?;

        let status = res.status();
        if let Some(err) = FetchError::from_status(status) {
            let body = res.text().await.unwrap_or_default();
            debug!(%status, body = %truncate_body(&body), "provider rejected request");
            return Err(err);
        }

        let body = res.text().await?;
        let value = serde_json::from_str(&body).map_err(|e| {
            FetchError::Unknown(format!("invalid JSON in response: {e}"))
        })?;

        Ok(RawPayload(value))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch(&self, city: &str, api_key: &str) -> Result<RawPayload, FetchError> {
        self.fetch_current(city, api_key).await
    }
}

fn truncate_body(body: &str) -> &str {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> OpenWeatherProvider {
        OpenWeatherProvider::with_options(&server.uri(), DEFAULT_TIMEOUT).unwrap()
    }

    async fn status_result(status: u16) -> Result<RawPayload, FetchError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status).set_body_string("{\"cod\":\"x\"}"))
            .mount(&server)
            .await;

        provider(&server).fetch("Anywhere", "KEY").await
    }

    #[tokio::test]
    async fn sends_city_key_and_metric_units() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("q", "Paris"))
            .and(query_param("appid", "KEY"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Paris",
                "main": { "temp": 18.5 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let raw = provider(&server).fetch("Paris", "KEY").await.unwrap();
        assert_eq!(raw.0["name"], "Paris");
    }

    #[tokio::test]
    async fn not_found() {
        assert_eq!(status_result(404).await, Err(FetchError::NotFound));
    }

    #[tokio::test]
    async fn unauthorized() {
        assert_eq!(status_result(401).await, Err(FetchError::Unauthorized));
    }

    #[tokio::test]
    async fn rate_limited() {
        assert_eq!(status_result(429).await, Err(FetchError::RateLimited));
    }

    #[tokio::test]
    async fn other_status_is_provider_error() {
        assert_eq!(status_result(500).await, Err(FetchError::ProviderError(500)));
        assert_eq!(status_result(403).await, Err(FetchError::ProviderError(403)));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "name": "Paris" }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let slow = OpenWeatherProvider::with_options(&server.uri(), Duration::from_millis(100))
            .unwrap();
        assert_eq!(slow.fetch("Paris", "KEY").await, Err(FetchError::Timeout));
    }

    #[tokio::test]
    async fn refused_connection_is_unavailable() {
        // Bind then drop a listener so the port is known to be closed.
        let addr = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        let dead = OpenWeatherProvider::with_options(&format!("http://{addr}"), DEFAULT_TIMEOUT)
            .unwrap();

        assert_eq!(dead.fetch("Paris", "KEY").await, Err(FetchError::ConnectionUnavailable));
    }

    #[tokio::test]
    async fn non_json_body_is_unknown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = provider(&server).fetch("Paris", "KEY").await.unwrap_err();
        assert!(matches!(err, FetchError::Unknown(msg) if msg.contains("invalid JSON")));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(300);
        assert_eq!(truncate_body(&long).chars().count(), 200);
        assert_eq!(truncate_body("short"), "short");
    }
}
