//! Core library for the `forecast` CLI.
//!
//! This crate defines:
//! - The geocoding resolver and the forecast aggregator behind [`WeatherService`]
//! - Daily bucketing and other derivations over forecast steps
//! - Icon and local-time display helpers
//! - Credentials and persisted user settings
//!
//! It is used by `forecast-cli`, but can also be reused by other binaries or services.

pub mod aggregate;
pub mod config;
pub mod credentials;
pub mod display;
pub mod error;
pub mod icon;
pub mod model;
pub mod provider;

pub use config::Config;
pub use credentials::{CredentialSource, EnvCredentials, StaticCredentials};
pub use error::{ForecastError, Result, UpstreamError};
pub use icon::WeatherIcon;
pub use model::{
    Coordinate, CurrentSnapshot, DailySummary, ForecastBundle, ForecastRequest, GeocodeMatch,
    HourlySample, LocationQuery, RememberedLocation, Resolution, Units, WeatherCondition,
};
pub use provider::{
    DEFAULT_GEOCODE_LIMIT, Endpoints, Feed, WeatherService, openweather::OpenWeatherService,
    service_from_config,
};
pub use tokio_util::sync::CancellationToken;
