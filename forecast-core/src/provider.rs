use crate::{
    Config, ForecastBundle, ForecastRequest, LocationQuery, Resolution,
    credentials::EnvCredentials,
    error::{Result, UpstreamError},
    provider::openweather::OpenWeatherService,
};
use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tokio_util::sync::CancellationToken;

pub mod open_meteo;
pub mod openweather;

/// Default number of geocoding matches requested.
pub const DEFAULT_GEOCODE_LIMIT: u32 = 5;

/// Upstream feeds the core talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    Geocoding,
    Current,
    Forecast,
    UvIndex,
}

impl Feed {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feed::Geocoding => "geocoding",
            Feed::Current => "current-conditions",
            Feed::Forecast => "forecast",
            Feed::UvIndex => "uv-index",
        }
    }

    pub const fn all() -> &'static [Feed] {
        &[Feed::Geocoding, Feed::Current, Feed::Forecast, Feed::UvIndex]
    }
}

impl std::fmt::Display for Feed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base URLs of the upstream providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Geocoding, current conditions and 3-hour forecast.
    pub openweather: String,
    /// UV index, no credential needed.
    pub open_meteo: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            openweather: "https://api.openweathermap.org".to_string(),
            open_meteo: "https://api.open-meteo.com".to_string(),
        }
    }
}

impl Endpoints {
    /// Point every feed at one base URL, e.g. a mock server.
    pub fn single(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            openweather: base.clone(),
            open_meteo: base,
        }
    }

    pub(crate) fn openweather_url(&self, path: &str) -> String {
        format!("{}{path}", self.openweather.trim_end_matches('/'))
    }

    pub(crate) fn open_meteo_url(&self, path: &str) -> String {
        format!("{}{path}", self.open_meteo.trim_end_matches('/'))
    }
}

#[async_trait]
pub trait WeatherService: Send + Sync + Debug {
    /// Look up places by name or coordinates, best match first.
    async fn resolve_location(&self, query: &LocationQuery, limit: u32) -> Result<Resolution>;

    /// Fetch and merge the upstream feeds into one bundle.
    ///
    /// Cancelling `cancel` drops every outstanding upstream call.
    async fn get_forecast(
        &self,
        request: &ForecastRequest,
        cancel: &CancellationToken,
    ) -> Result<ForecastBundle>;
}

/// Construct the service from persisted settings; the environment key wins over
/// the one stored in the config file.
pub fn service_from_config(config: &Config) -> Result<Box<dyn WeatherService>> {
    let credentials = EnvCredentials::with_fallback(config.api_key.clone());
    Ok(Box::new(OpenWeatherService::new(credentials)?))
}

/// Send the request and return `(status, body)` for a 2xx response.
pub(crate) async fn fetch_body(
    feed: Feed,
    request: RequestBuilder,
) -> std::result::Result<(u16, String), UpstreamError> {
    let res = request
        .send()
        .await
        .map_err(|e| UpstreamError::transport(feed, &e))?;

    let status = res.status().as_u16();
    let body = res.text().await.map_err(|e| {
        UpstreamError::new(feed, Some(status), format!("failed to read body: {e}"))
    })?;

    if !(200..300).contains(&status) {
        return Err(UpstreamError::new(feed, Some(status), body));
    }

    Ok((status, body))
}

pub(crate) fn decode<T: DeserializeOwned>(
    feed: Feed,
    status: u16,
    body: &str,
) -> std::result::Result<T, UpstreamError> {
    serde_json::from_str(body).map_err(|e| UpstreamError::malformed(feed, status, &e))
}
