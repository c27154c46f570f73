use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// Measurement system requested from the upstream provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub fn temperature_suffix(&self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    pub fn speed_suffix(&self) -> &'static str {
        match self {
            Units::Metric => "m/s",
            Units::Imperial => "mph",
        }
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Units {
    type Err = ForecastError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            _ => Err(ForecastError::invalid(format!(
                "Unknown units '{value}'. Supported units: metric, imperial."
            ))),
        }
    }
}

/// A point on the globe. Construct through [`Coordinate::new`] to keep the ranges valid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(ForecastError::invalid(format!(
                "latitude {lat} is outside [-90, 90]"
            )));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(ForecastError::invalid(format!(
                "longitude {lon} is outside [-180, 180]"
            )));
        }
        Ok(Self { lat, lon })
    }

    /// Parse raw `lat`/`lon` parameters as they arrive from a query string or CLI.
    pub fn parse(lat: Option<&str>, lon: Option<&str>) -> Result<Self> {
        let (Some(lat), Some(lon)) = (non_blank(lat), non_blank(lon)) else {
            return Err(ForecastError::invalid("Missing lat/lon"));
        };

        let lat: f64 = lat
            .parse()
            .map_err(|_| ForecastError::invalid(format!("lat '{lat}' is not a number")))?;
        let lon: f64 = lon
            .parse()
            .map_err(|_| ForecastError::invalid(format!("lon '{lon}' is not a number")))?;

        Self::new(lat, lon)
    }
}

/// One entry of the geocoding provider's ranked result list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeMatch {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

impl GeocodeMatch {
    /// `name`, then `, state` and `, country` when present and non-empty.
    pub fn label(&self) -> String {
        let mut label = self.name.clone();
        for part in [&self.state, &self.country].into_iter().flatten() {
            if !part.is_empty() {
                label.push_str(", ");
                label.push_str(part);
            }
        }
        label
    }
}

/// A resolved place the caller may persist and reuse on later runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RememberedLocation {
    pub lat: f64,
    pub lon: f64,
    pub label: String,
}

impl RememberedLocation {
    pub fn coordinate(&self) -> Result<Coordinate> {
        Coordinate::new(self.lat, self.lon)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub id: i32,
    pub main: String,
    pub description: String,
    pub icon_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentSnapshot {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub sunrise: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub sunset: Option<DateTime<Utc>>,
    pub temp: f64,
    pub feels_like: f64,
    pub pressure: f64,
    pub humidity: f64,
    pub uv_index: Option<f64>,
    pub clouds_pct: Option<f64>,
    pub visibility_meters: Option<f64>,
    pub wind_speed: f64,
    pub conditions: Vec<WeatherCondition>,
}

/// One 3-hour forecast step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySample {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    pub temp: f64,
    pub precip_probability: Option<f64>,
    pub wind_speed: Option<f64>,
    pub humidity: Option<f64>,
    pub visibility_meters: Option<f64>,
    pub conditions: Vec<WeatherCondition>,
}

/// Per-day rollup derived from forecast steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    /// Timestamp of the representative step.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub sunrise: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub sunset: Option<DateTime<Utc>>,
    pub temp_min: f64,
    pub temp_max: f64,
    pub precip_probability: Option<f64>,
    pub conditions: Vec<WeatherCondition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastBundle {
    pub timezone_offset_seconds: i64,
    pub current: CurrentSnapshot,
    pub hourly: Vec<HourlySample>,
    pub daily: Vec<DailySummary>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub coordinate: Coordinate,
    pub units: Units,
    pub language: String,
}

impl ForecastRequest {
    pub const DEFAULT_LANGUAGE: &'static str = "en";

    pub fn new(coordinate: Coordinate, units: Units, language: Option<&str>) -> Self {
        Self {
            coordinate,
            units,
            language: non_blank(language)
                .unwrap_or(Self::DEFAULT_LANGUAGE)
                .to_string(),
        }
    }

    /// Build a request from raw string parameters.
    ///
    /// Missing or non-numeric `lat`/`lon` is rejected; `units` defaults to metric
    /// and `lang` to English.
    pub fn from_params(
        lat: Option<&str>,
        lon: Option<&str>,
        units: Option<&str>,
        lang: Option<&str>,
    ) -> Result<Self> {
        let coordinate = Coordinate::parse(lat, lon)?;
        let units = match non_blank(units) {
            Some(u) => u.parse()?,
            None => Units::default(),
        };
        Ok(Self::new(coordinate, units, lang))
    }
}

/// What the geocoding resolver should look up.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    /// Direct lookup by free-text place name.
    Text(String),
    /// Reverse lookup by coordinates.
    Coordinates(Coordinate),
}

impl LocationQuery {
    /// A blank text query counts as absent; text wins when both are given.
    pub fn from_parts(query: Option<&str>, coords: Option<Coordinate>) -> Result<Self> {
        match (non_blank(query), coords) {
            (Some(q), _) => Ok(Self::Text(q.to_string())),
            (None, Some(c)) => Ok(Self::Coordinates(c)),
            (None, None) => Err(ForecastError::invalid("Missing q or lat/lon")),
        }
    }
}

/// Outcome of a geocoding call.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Upstream order, best match first.
    pub matches: Vec<GeocodeMatch>,
    pub remembered: Option<RememberedLocation>,
}

impl Resolution {
    pub fn new(query: &LocationQuery, matches: Vec<GeocodeMatch>) -> Self {
        let best = matches.first();
        let remembered = match query {
            LocationQuery::Text(_) => best.map(|m| RememberedLocation {
                lat: m.lat,
                lon: m.lon,
                label: m.label(),
            }),
            // Keep the caller's own position; the provider only supplies the label.
            LocationQuery::Coordinates(c) => Some(RememberedLocation {
                lat: c.lat,
                lon: c.lon,
                label: best.map(GeocodeMatch::label).unwrap_or_default(),
            }),
        };

        Self {
            matches,
            remembered,
        }
    }

    pub fn best(&self) -> Option<&GeocodeMatch> {
        self.matches.first()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
