use std::fmt::Write;

use chrono::{DateTime, Utc};
use forecast_core::{
    ForecastBundle, Resolution, WeatherCondition, WeatherIcon,
    display::{DisplayOptions, format_day_name, format_km, format_local_time, format_pct},
    icon::is_night_icon_code,
};

use crate::session::Session;

fn icon_for(conditions: &[WeatherCondition]) -> WeatherIcon {
    match conditions.first() {
        Some(c) => WeatherIcon::for_condition(c.id, is_night_icon_code(Some(c.icon_code.as_str()))),
        None => WeatherIcon::for_condition(0, false),
    }
}

fn description(conditions: &[WeatherCondition]) -> &str {
    conditions
        .first()
        .map(|c| c.description.as_str())
        .unwrap_or("Unknown")
}

pub fn matches(resolution: &Resolution) -> String {
    if resolution.matches.is_empty() {
        return "No matching city. Try a different search term.\n".to_string();
    }

    let mut out = String::new();
    for (i, m) in resolution.matches.iter().enumerate() {
        let _ = writeln!(out, "{:>2}. {} ({:.4}, {:.4})", i + 1, m.label(), m.lat, m.lon);
    }
    out
}

pub fn forecast(session: &Session, bundle: &ForecastBundle, now: DateTime<Utc>) -> String {
    let offset = bundle.timezone_offset_seconds;
    let units = session.units();
    let t = units.temperature_suffix();
    let current = &bundle.current;

    let mut out = String::new();
    let _ = writeln!(out, "{}", session.label);
    let _ = writeln!(
        out,
        "{} {:.0}{t}  {}  (feels like {:.0}{t})",
        icon_for(&current.conditions).glyph(),
        current.temp,
        description(&current.conditions),
        current.feels_like,
    );
    let _ = writeln!(
        out,
        "Humidity {:.0}%  Pressure {:.0} hPa  Wind {:.1} {}  UV {}  Visibility {}",
        current.humidity,
        current.pressure,
        current.wind_speed,
        units.speed_suffix(),
        current
            .uv_index
            .map(|uv| format!("{uv:.1}"))
            .unwrap_or_else(|| "-".to_string()),
        format_km(current.visibility_meters),
    );
    if let (Some(rise), Some(set)) = (current.sunrise, current.sunset) {
        let _ = writeln!(
            out,
            "Sunrise {}  Sunset {}",
            format_local_time(rise, offset, &DisplayOptions::default()),
            format_local_time(set, offset, &DisplayOptions::default()),
        );
    }

    if !bundle.hourly.is_empty() {
        let _ = writeln!(out, "\nNext hours");
        for h in &bundle.hourly {
            let _ = writeln!(
                out,
                "  {:>6}  {} {:>4.0}{t}  rain {:>4}",
                format_local_time(h.timestamp, offset, &DisplayOptions::hour_only()),
                icon_for(&h.conditions).glyph(),
                h.temp,
                format_pct(h.precip_probability),
            );
        }
    }

    if !bundle.daily.is_empty() {
        let _ = writeln!(out, "\nDaily");
        for d in &bundle.daily {
            let _ = writeln!(
                out,
                "  {:<5}  {} {:>4.0}{t} / {:>4.0}{t}  rain {:>4}  {}",
                format_day_name(d.timestamp, offset, now),
                icon_for(&d.conditions).glyph(),
                d.temp_max,
                d.temp_min,
                format_pct(d.precip_probability),
                description(&d.conditions),
            );
        }
    }

    out
}
