use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    aggregate::{self, ForecastStep},
    credentials::CredentialSource,
    error::{ForecastError, Result, UpstreamError},
    model::{
        CurrentSnapshot, ForecastBundle, ForecastRequest, GeocodeMatch, LocationQuery, Resolution,
        WeatherCondition,
    },
    provider::{Endpoints, Feed, decode, fetch_body, open_meteo},
};

use super::WeatherService;

const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("forecast-core/", env!("CARGO_PKG_VERSION"));

/// Geocoding and forecast aggregation backed by OpenWeather, with UV index from Open-Meteo.
#[derive(Debug, Clone)]
pub struct OpenWeatherService {
    http: Client,
    endpoints: Endpoints,
    credentials: Arc<dyn CredentialSource>,
}

impl OpenWeatherService {
    pub fn new(credentials: impl CredentialSource + 'static) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            endpoints: Endpoints::default(),
            credentials: Arc::new(credentials),
        })
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    fn api_key(&self) -> Result<String> {
        self.credentials
            .api_key()
            .ok_or(ForecastError::UpstreamConfigMissing {
                variable: self.credentials.variable(),
            })
    }

    async fn geocode(
        &self,
        query: &LocationQuery,
        limit: u32,
        api_key: &str,
    ) -> std::result::Result<Vec<GeocodeMatch>, UpstreamError> {
        let limit = limit.to_string();
        let request = match query {
            LocationQuery::Text(q) => self
                .http
                .get(self.endpoints.openweather_url("/geo/1.0/direct"))
                .query(&[("q", q.as_str()), ("limit", limit.as_str()), ("appid", api_key)]),
            LocationQuery::Coordinates(c) => self
                .http
                .get(self.endpoints.openweather_url("/geo/1.0/reverse"))
                .query(&[("lat", c.lat), ("lon", c.lon)])
                .query(&[("limit", limit.as_str()), ("appid", api_key)]),
        };

        debug!(?query, %limit, "requesting geocoding matches");
        let (status, body) = fetch_body(Feed::Geocoding, request).await?;
        let entries: Vec<serde_json::Value> = decode(Feed::Geocoding, status, &body)?;
        Ok(usable_matches(entries))
    }

    fn feed_request(
        &self,
        path: &str,
        request: &ForecastRequest,
        api_key: &str,
    ) -> reqwest::RequestBuilder {
        self.http
            .get(self.endpoints.openweather_url(path))
            .query(&[("lat", request.coordinate.lat), ("lon", request.coordinate.lon)])
            .query(&[
                ("units", request.units.as_str()),
                ("lang", request.language.as_str()),
                ("appid", api_key),
            ])
    }

    async fn fetch_current(
        &self,
        request: &ForecastRequest,
        api_key: &str,
    ) -> std::result::Result<OwCurrentResponse, UpstreamError> {
        debug!(coordinate = ?request.coordinate, "requesting current conditions");
        let http = self.feed_request("/data/2.5/weather", request, api_key);
        let (status, body) = fetch_body(Feed::Current, http).await?;
        decode(Feed::Current, status, &body)
    }

    async fn fetch_forecast(
        &self,
        request: &ForecastRequest,
        api_key: &str,
    ) -> std::result::Result<OwForecastResponse, UpstreamError> {
        debug!(coordinate = ?request.coordinate, "requesting 3-hour forecast");
        let http = self.feed_request("/data/2.5/forecast", request, api_key);
        let (status, body) = fetch_body(Feed::Forecast, http).await?;
        decode(Feed::Forecast, status, &body)
    }

    async fn aggregate(&self, request: &ForecastRequest, api_key: &str) -> Result<ForecastBundle> {
        // The UV lookup resolves to `None` on any failure, so it never aborts the join.
        let (current, forecast, uv_index) = tokio::join!(
            self.fetch_current(request, api_key),
            self.fetch_forecast(request, api_key),
            open_meteo::fetch_uv_index(&self.http, &self.endpoints, request.coordinate, Utc::now()),
        );
        let current = current?;
        let forecast = forecast?;

        let offset = aggregate::resolve_timezone_offset(
            forecast.city.as_ref().and_then(|c| c.timezone),
            current.timezone,
        );
        let steps: Vec<ForecastStep> = forecast
            .list
            .unwrap_or_default()
            .into_iter()
            .map(OwForecastEntry::into_step)
            .collect();

        Ok(aggregate::assemble(
            current.into_snapshot(uv_index),
            &steps,
            offset,
        ))
    }
}

#[async_trait]
impl WeatherService for OpenWeatherService {
    async fn resolve_location(&self, query: &LocationQuery, limit: u32) -> Result<Resolution> {
        let api_key = self.api_key()?;
        let matches = self.geocode(query, limit, &api_key).await?;
        let resolution = Resolution::new(query, matches);

        if let Some(remembered) = &resolution.remembered {
            info!(label = %remembered.label, lat = remembered.lat, lon = remembered.lon, "resolved location");
        }
        Ok(resolution)
    }

    async fn get_forecast(
        &self,
        request: &ForecastRequest,
        cancel: &CancellationToken,
    ) -> Result<ForecastBundle> {
        let api_key = self.api_key()?;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ForecastError::Cancelled),
            bundle = self.aggregate(request, &api_key) => bundle,
        }
    }
}

/// Keep the entries that decode as a match, in upstream order.
fn usable_matches(entries: Vec<serde_json::Value>) -> Vec<GeocodeMatch> {
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<GeocodeMatch>(entry) {
            Ok(m) => Some(m),
            Err(err) => {
                debug!(%err, "skipping unusable geocoding entry");
                None
            }
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: i32,
    #[serde(default)]
    main: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

impl From<OwWeather> for WeatherCondition {
    fn from(w: OwWeather) -> Self {
        WeatherCondition {
            id: w.id,
            main: w.main,
            description: w.description,
            icon_code: w.icon,
        }
    }
}

fn conditions(weather: Option<Vec<OwWeather>>) -> Vec<WeatherCondition> {
    weather
        .unwrap_or_default()
        .into_iter()
        .map(WeatherCondition::from)
        .collect()
}

#[derive(Debug, Deserialize)]
struct OwSys {
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    sunrise: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    sunset: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentMain {
    temp: f64,
    feels_like: f64,
    pressure: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwClouds {
    all: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(with = "chrono::serde::ts_seconds")]
    dt: DateTime<Utc>,
    sys: Option<OwSys>,
    main: OwCurrentMain,
    weather: Option<Vec<OwWeather>>,
    wind: OwWind,
    clouds: Option<OwClouds>,
    visibility: Option<f64>,
    timezone: Option<i64>,
}

impl OwCurrentResponse {
    fn into_snapshot(self, uv_index: Option<f64>) -> CurrentSnapshot {
        let (sunrise, sunset) = self
            .sys
            .map(|s| (s.sunrise, s.sunset))
            .unwrap_or_default();

        CurrentSnapshot {
            timestamp: self.dt,
            sunrise,
            sunset,
            temp: self.main.temp,
            feels_like: self.main.feels_like,
            pressure: self.main.pressure,
            humidity: self.main.humidity,
            uv_index,
            clouds_pct: self.clouds.and_then(|c| c.all),
            visibility_meters: self.visibility,
            wind_speed: self.wind.speed,
            conditions: conditions(self.weather),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwStepMain {
    temp: f64,
    temp_min: Option<f64>,
    temp_max: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwStepWind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    #[serde(with = "chrono::serde::ts_seconds")]
    dt: DateTime<Utc>,
    main: OwStepMain,
    pop: Option<f64>,
    wind: Option<OwStepWind>,
    visibility: Option<f64>,
    weather: Option<Vec<OwWeather>>,
}

impl OwForecastEntry {
    fn into_step(self) -> ForecastStep {
        ForecastStep {
            timestamp: self.dt,
            temp: self.main.temp,
            temp_min: self.main.temp_min,
            temp_max: self.main.temp_max,
            precip_probability: self.pop,
            wind_speed: self.wind.and_then(|w| w.speed),
            humidity: self.main.humidity,
            visibility_meters: self.visibility,
            conditions: conditions(self.weather),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwCity {
    timezone: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: Option<OwCity>,
    list: Option<Vec<OwForecastEntry>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::StaticCredentials;
    use serde_json::json;

    #[test]
    fn current_payload_tolerates_missing_optionals() {
        let raw: OwCurrentResponse = serde_json::from_value(json!({
            "dt": 1_714_550_400,
            "main": { "temp": 18.5, "feels_like": 17.9, "pressure": 1013, "humidity": 60 },
            "wind": { "speed": 4.1 }
        }))
        .expect("minimal payload decodes");

        let snapshot = raw.into_snapshot(None);
        assert_eq!(snapshot.timestamp.timestamp(), 1_714_550_400);
        assert!(snapshot.sunrise.is_none());
        assert!(snapshot.clouds_pct.is_none());
        assert!(snapshot.conditions.is_empty());
    }

    #[test]
    fn current_payload_maps_every_field() {
        let raw: OwCurrentResponse = serde_json::from_value(json!({
            "dt": 1_714_550_400,
            "timezone": 7200,
            "sys": { "sunrise": 1_714_536_000, "sunset": 1_714_587_000 },
            "main": { "temp": 18.5, "feels_like": 17.9, "pressure": 1013, "humidity": 60 },
            "wind": { "speed": 4.1, "deg": 200 },
            "clouds": { "all": 40 },
            "visibility": 10000,
            "weather": [{ "id": 802, "main": "Clouds", "description": "scattered clouds", "icon": "03d" }]
        }))
        .expect("full payload decodes");

        assert_eq!(raw.timezone, Some(7200));
        let snapshot = raw.into_snapshot(Some(5.5));
        assert_eq!(snapshot.uv_index, Some(5.5));
        assert_eq!(snapshot.sunset.map(|s| s.timestamp()), Some(1_714_587_000));
        assert_eq!(snapshot.clouds_pct, Some(40.0));
        assert_eq!(snapshot.visibility_meters, Some(10_000.0));
        assert_eq!(snapshot.conditions[0].icon_code, "03d");
    }

    #[test]
    fn forecast_entry_without_optionals() {
        let raw: OwForecastEntry = serde_json::from_value(json!({
            "dt": 1_714_550_400,
            "main": { "temp": 12.0 },
            "weather": null
        }))
        .expect("entry decodes");

        let step = raw.into_step();
        assert_eq!(step.temp, 12.0);
        assert!(step.temp_min.is_none());
        assert!(step.precip_probability.is_none());
        assert!(step.conditions.is_empty());
    }

    #[test]
    fn forecast_without_list_or_city() {
        let raw: OwForecastResponse = serde_json::from_value(json!({ "cod": "200" }))
            .expect("empty forecast decodes");
        assert!(raw.city.is_none());
        assert!(raw.list.is_none());
    }

    #[test]
    fn geocoding_entries_without_coordinates_are_dropped() {
        let entries = vec![
            json!({ "name": "Atlantis", "country": "XX" }),
            json!({ "name": "Lisbon", "lat": "38.72", "lon": -9.14 }),
            json!({ "name": "Lisbon", "lat": 38.7223, "lon": -9.1393, "country": "PT" }),
        ];

        let matches = usable_matches(entries);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].label(), "Lisbon, PT");
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let service = OpenWeatherService::new(StaticCredentials::missing())
            .expect("client builds")
            // Nothing listens here; reaching the network would be a transport error instead.
            .with_endpoints(Endpoints::single("http://127.0.0.1:9"));

        let query = LocationQuery::Text("Madrid".into());
        let err = service.resolve_location(&query, 5).await.unwrap_err();
        assert!(matches!(err, ForecastError::UpstreamConfigMissing { variable: "OWM_API_KEY" }));
    }
}
