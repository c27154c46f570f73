//! Supplementary UV index from Open-Meteo. Every failure here degrades to "no value".

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    aggregate::valid_offset,
    error::UpstreamError,
    model::Coordinate,
    provider::{Endpoints, Feed, decode, fetch_body},
};

/// Local ISO timestamps without seconds, as returned with `timezone=auto`.
const HOURLY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Deserialize)]
pub(crate) struct OmCurrent {
    uv_index: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OmHourly {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    uv_index: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OmResponse {
    utc_offset_seconds: Option<i64>,
    current: Option<OmCurrent>,
    hourly: Option<OmHourly>,
}

/// Fetch the UV index for `coordinate`, or `None` if the feed is unusable.
pub(crate) async fn fetch_uv_index(
    http: &Client,
    endpoints: &Endpoints,
    coordinate: Coordinate,
    now: DateTime<Utc>,
) -> Option<f64> {
    match try_fetch(http, endpoints, coordinate).await {
        Ok(payload) => {
            let uv = pick_uv_index(&payload, now);
            debug!(?uv, "UV index resolved");
            uv
        }
        Err(err) => {
            warn!(%err, "UV index unavailable, continuing without it");
            None
        }
    }
}

async fn try_fetch(
    http: &Client,
    endpoints: &Endpoints,
    coordinate: Coordinate,
) -> Result<OmResponse, UpstreamError> {
    let request = http
        .get(endpoints.open_meteo_url("/v1/forecast"))
        .query(&[("latitude", coordinate.lat), ("longitude", coordinate.lon)])
        .query(&[
            ("current", "uv_index"),
            ("hourly", "uv_index"),
            ("timezone", "auto"),
        ]);

    let (status, body) = fetch_body(Feed::UvIndex, request).await?;
    decode(Feed::UvIndex, status, &body)
}

/// Prefer the instantaneous value; otherwise take the hourly value closest to `now`.
///
/// Entries without a value or with an unparseable time are skipped. The first
/// entry with the minimal distance wins. A UTC offset outside ±18h makes the
/// hourly series unusable.
pub(crate) fn pick_uv_index(payload: &OmResponse, now: DateTime<Utc>) -> Option<f64> {
    if let Some(uv) = payload.current.as_ref().and_then(|c| c.uv_index) {
        return Some(uv);
    }

    let hourly = payload.hourly.as_ref()?;
    let offset = match payload.utc_offset_seconds {
        None => Duration::zero(),
        Some(seconds) => Duration::seconds(valid_offset(Some(seconds))?),
    };

    let mut best: Option<(i64, f64)> = None;
    for (time, value) in hourly.time.iter().zip(&hourly.uv_index) {
        let Some(value) = *value else { continue };
        let Ok(local) = NaiveDateTime::parse_from_str(time, HOURLY_TIME_FORMAT) else {
            continue;
        };

        let Some(at) = local.and_utc().checked_sub_signed(offset) else {
            continue;
        };

        let distance = (at - now).num_seconds().abs();
        if best.is_none_or(|(d, _)| distance < d) {
            best = Some((distance, value));
        }
    }

    best.map(|(_, value)| value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> OmResponse {
        serde_json::from_value(value).expect("payload decodes")
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 10, 0).unwrap()
    }

    #[test]
    fn prefers_current_value() {
        let p = payload(json!({
            "current": { "uv_index": 6.2 },
            "hourly": { "time": ["2024-06-01T12:00"], "uv_index": [1.0] }
        }));
        assert_eq!(pick_uv_index(&p, noon()), Some(6.2));
    }

    #[test]
    fn falls_back_to_nearest_hour() {
        let p = payload(json!({
            "current": { "uv_index": null },
            "hourly": {
                "time": ["2024-06-01T10:00", "2024-06-01T11:00", "2024-06-01T12:00", "2024-06-01T13:00"],
                "uv_index": [3.0, 4.5, 5.1, 5.8]
            }
        }));
        assert_eq!(pick_uv_index(&p, noon()), Some(5.1));
    }

    #[test]
    fn hourly_times_are_shifted_by_utc_offset() {
        // Local 14:00 at +02:00 is 12:00 UTC.
        let p = payload(json!({
            "utc_offset_seconds": 7200,
            "hourly": {
                "time": ["2024-06-01T12:00", "2024-06-01T14:00"],
                "uv_index": [2.0, 7.0]
            }
        }));
        assert_eq!(pick_uv_index(&p, noon()), Some(7.0));
    }

    #[test]
    fn ties_keep_the_first_entry() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap();
        let p = payload(json!({
            "hourly": { "time": ["2024-06-01T12:00", "2024-06-01T13:00"], "uv_index": [4.0, 9.0] }
        }));
        assert_eq!(pick_uv_index(&p, now), Some(4.0));
    }

    #[test]
    fn skips_missing_values_and_bad_times() {
        let p = payload(json!({
            "hourly": {
                "time": ["2024-06-01T12:00", "garbage", "2024-06-01T15:00"],
                "uv_index": [null, 8.0, 2.5]
            }
        }));
        assert_eq!(pick_uv_index(&p, noon()), Some(2.5));
    }

    #[test]
    fn absurd_utc_offset_yields_none() {
        let p = payload(json!({
            "utc_offset_seconds": 9_000_000_000_000_000_i64,
            "hourly": { "time": ["2024-06-01T12:00"], "uv_index": [5.0] }
        }));
        assert_eq!(pick_uv_index(&p, noon()), None);

        // The instantaneous value does not depend on the offset.
        let p = payload(json!({
            "utc_offset_seconds": i64::MIN,
            "current": { "uv_index": 3.5 }
        }));
        assert_eq!(pick_uv_index(&p, noon()), Some(3.5));
    }

    #[test]
    fn nothing_usable_yields_none() {
        assert_eq!(pick_uv_index(&payload(json!({})), noon()), None);
        let p = payload(json!({ "hourly": { "time": [], "uv_index": [] } }));
        assert_eq!(pick_uv_index(&p, noon()), None);
    }
}
