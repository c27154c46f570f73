//! Formatting helpers for rendering forecast values in a location's local time.

use chrono::{DateTime, Utc};

use crate::aggregate::{local_date, local_datetime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekdayStyle {
    /// `Mon`
    Short,
    /// `Monday`
    Long,
}

/// Which date/time components to render.
///
/// With no component selected the output is a 12-hour `h:mm AM` clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayOptions {
    pub weekday: Option<WeekdayStyle>,
    pub year: bool,
    pub month: bool,
    pub day: bool,
    pub hour: bool,
    pub minute: bool,
    pub second: bool,
    pub hour12: bool,
}

impl DisplayOptions {
    pub fn clock() -> Self {
        Self {
            hour: true,
            minute: true,
            hour12: true,
            ..Self::default()
        }
    }

    pub fn hour_only() -> Self {
        Self {
            hour: true,
            hour12: true,
            ..Self::default()
        }
    }

    pub fn weekday(style: WeekdayStyle) -> Self {
        Self {
            weekday: Some(style),
            ..Self::default()
        }
    }

    pub fn date() -> Self {
        Self {
            year: true,
            month: true,
            day: true,
            ..Self::default()
        }
    }

    fn has_date_part(&self) -> bool {
        self.weekday.is_some() || self.year || self.month || self.day
    }

    fn has_time_part(&self) -> bool {
        self.hour || self.minute || self.second
    }

    fn pattern(&self) -> String {
        if !self.has_date_part() && !self.has_time_part() {
            return Self::clock().pattern();
        }

        let mut date = Vec::new();
        match self.weekday {
            Some(WeekdayStyle::Short) => date.push("%a".to_string()),
            Some(WeekdayStyle::Long) => date.push("%A".to_string()),
            None => {}
        }
        match (self.month, self.day) {
            (true, true) => date.push("%b %-d".to_string()),
            (true, false) => date.push("%b".to_string()),
            (false, true) => date.push("%-d".to_string()),
            (false, false) => {}
        }
        if self.year {
            date.push("%Y".to_string());
        }

        let mut time = String::new();
        if self.hour {
            time.push_str(if self.hour12 { "%-I" } else { "%H" });
        }
        if self.minute {
            if !time.is_empty() {
                time.push(':');
            }
            time.push_str("%M");
        }
        if self.second {
            if !time.is_empty() {
                time.push(':');
            }
            time.push_str("%S");
        }
        if self.hour && self.hour12 {
            time.push_str(" %p");
        }

        let mut pattern = date.join(" ");
        if !time.is_empty() {
            if !pattern.is_empty() {
                pattern.push_str(", ");
            }
            pattern.push_str(&time);
        }
        pattern
    }
}

/// Render `ts` shifted by `offset_seconds`, independent of the host's timezone.
pub fn format_local_time(ts: DateTime<Utc>, offset_seconds: i64, options: &DisplayOptions) -> String {
    let local = local_datetime(ts, offset_seconds);
    local.format(&options.pattern()).to_string()
}

/// `Today` when `ts` and `now` share a local calendar date, else a short weekday.
pub fn format_day_name(ts: DateTime<Utc>, offset_seconds: i64, now: DateTime<Utc>) -> String {
    if local_date(ts, offset_seconds) == local_date(now, offset_seconds) {
        "Today".to_string()
    } else {
        format_local_time(ts, offset_seconds, &DisplayOptions::weekday(WeekdayStyle::Short))
    }
}

pub fn format_km(meters: Option<f64>) -> String {
    match meters {
        Some(m) => format!("{:.0} km", m / 1000.0),
        None => "-".to_string(),
    }
}

/// Render a 0..=1 fraction as a whole percentage.
pub fn format_pct(fraction: Option<f64>) -> String {
    match fraction {
        Some(f) => format!("{}%", (f * 100.0).round() as i64),
        None => "-".to_string(),
    }
}
