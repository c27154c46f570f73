//! Provider-agnostic derivations over normalized forecast steps: the hourly
//! slice, timezone resolution and the daily rollup.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};

use crate::model::{CurrentSnapshot, DailySummary, ForecastBundle, HourlySample, WeatherCondition};

/// Number of 3-hour steps surfaced as hourly samples (~48 hours).
pub const HOURLY_LIMIT: usize = 16;
/// Maximum number of daily summaries.
pub const DAILY_LIMIT: usize = 7;

const NOON: u32 = 12;

/// Largest UTC offset any real timezone uses (±18h).
pub const MAX_OFFSET_SECONDS: i64 = 18 * 3600;

/// One upstream 3-hour forecast step after field-by-field validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastStep {
    pub timestamp: DateTime<Utc>,
    pub temp: f64,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub precip_probability: Option<f64>,
    pub wind_speed: Option<f64>,
    pub humidity: Option<f64>,
    pub visibility_meters: Option<f64>,
    pub conditions: Vec<WeatherCondition>,
}

impl ForecastStep {
    fn to_hourly(&self) -> HourlySample {
        HourlySample {
            timestamp: self.timestamp,
            temp: self.temp,
            precip_probability: self.precip_probability,
            wind_speed: self.wind_speed,
            humidity: self.humidity,
            visibility_meters: self.visibility_meters,
            conditions: self.conditions.clone(),
        }
    }
}

/// `Some(offset)` only when it lies within [`MAX_OFFSET_SECONDS`] of UTC.
pub fn valid_offset(offset_seconds: Option<i64>) -> Option<i64> {
    offset_seconds.filter(|o| o.abs() <= MAX_OFFSET_SECONDS)
}

/// Forecast city offset first, then the current-conditions offset, else UTC.
///
/// Out-of-range offsets count as absent.
pub fn resolve_timezone_offset(forecast_city: Option<i64>, current: Option<i64>) -> i64 {
    valid_offset(forecast_city)
        .or(valid_offset(current))
        .unwrap_or(0)
}

/// Wall-clock time at `offset_seconds` from UTC. An offset that cannot be
/// applied leaves the instant unshifted.
pub fn local_datetime(ts: DateTime<Utc>, offset_seconds: i64) -> NaiveDateTime {
    Duration::try_seconds(offset_seconds)
        .and_then(|d| ts.checked_add_signed(d))
        .unwrap_or(ts)
        .naive_utc()
}

/// Shift the instant by `offset_seconds` and read its UTC calendar date.
pub fn local_date(ts: DateTime<Utc>, offset_seconds: i64) -> NaiveDate {
    local_datetime(ts, offset_seconds).date()
}

pub fn local_hour(ts: DateTime<Utc>, offset_seconds: i64) -> u32 {
    local_datetime(ts, offset_seconds).hour()
}

pub fn hourly_slice(steps: &[ForecastStep]) -> Vec<HourlySample> {
    steps
        .iter()
        .take(HOURLY_LIMIT)
        .map(ForecastStep::to_hourly)
        .collect()
}

/// Group steps by local calendar date and summarize the first [`DAILY_LIMIT`] days.
///
/// Steps are sorted chronologically first, so day order does not depend on the
/// upstream list being ordered.
pub fn bucket_daily(steps: &[ForecastStep], offset_seconds: i64) -> Vec<DailySummary> {
    let mut sorted: Vec<&ForecastStep> = steps.iter().collect();
    sorted.sort_by_key(|s| s.timestamp);

    sorted
        .chunk_by(|a, b| {
            local_date(a.timestamp, offset_seconds) == local_date(b.timestamp, offset_seconds)
        })
        .take(DAILY_LIMIT)
        .map(|day| summarize_day(day, offset_seconds))
        .collect()
}

fn summarize_day(day: &[&ForecastStep], offset_seconds: i64) -> DailySummary {
    let rep = day
        .iter()
        .find(|s| local_hour(s.timestamp, offset_seconds) == NOON)
        .unwrap_or(&day[day.len() / 2]);

    let temp_min = day
        .iter()
        .filter_map(|s| s.temp_min)
        .reduce(f64::min)
        .unwrap_or(rep.temp);
    let temp_max = day
        .iter()
        .filter_map(|s| s.temp_max)
        .reduce(f64::max)
        .unwrap_or(rep.temp);

    let pops: Vec<f64> = day.iter().filter_map(|s| s.precip_probability).collect();
    let precip_probability = if pops.is_empty() {
        None
    } else {
        Some(pops.iter().sum::<f64>() / pops.len() as f64)
    };

    DailySummary {
        timestamp: rep.timestamp,
        sunrise: None,
        sunset: None,
        temp_min,
        temp_max,
        precip_probability,
        conditions: rep.conditions.clone(),
    }
}

pub fn assemble(
    current: CurrentSnapshot,
    steps: &[ForecastStep],
    timezone_offset_seconds: i64,
) -> ForecastBundle {
    ForecastBundle {
        timezone_offset_seconds,
        current,
        hourly: hourly_slice(steps),
        daily: bucket_daily(steps, timezone_offset_seconds),
    }
}
