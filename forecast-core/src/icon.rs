use serde::{Deserialize, Serialize};

/// Display icon for a weather condition id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeatherIcon {
    Storm,
    Drizzle,
    LightRain,
    FreezingRain,
    Showers,
    Snow,
    Fog,
    ClearDay,
    ClearNight,
    PartlyCloudyDay,
    PartlyCloudyNight,
    Cloudy,
    /// Fallback for ids outside the known taxonomy.
    Windy,
}

impl WeatherIcon {
    /// Map a condition id (200..=804 taxonomy) to an icon.
    ///
    /// Only the clear and partly-cloudy states have a night variant. The
    /// atmosphere group (mist, haze, dust, fog) gets its own icon instead of
    /// sharing `Cloudy`.
    pub fn for_condition(id: i32, night: bool) -> Self {
        match id {
            200..=232 => Self::Storm,
            300..=321 => Self::Drizzle,
            500..=504 => Self::LightRain,
            511 => Self::FreezingRain,
            520..=531 => Self::Showers,
            600..=622 => Self::Snow,
            700..=781 => Self::Fog,
            800 if night => Self::ClearNight,
            800 => Self::ClearDay,
            801 | 802 if night => Self::PartlyCloudyNight,
            801 | 802 => Self::PartlyCloudyDay,
            803 | 804 => Self::Cloudy,
            _ => Self::Windy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Storm => "storm",
            Self::Drizzle => "drizzle",
            Self::LightRain => "light-rain",
            Self::FreezingRain => "freezing-rain",
            Self::Showers => "showers",
            Self::Snow => "snow",
            Self::Fog => "fog",
            Self::ClearDay => "clear-day",
            Self::ClearNight => "clear-night",
            Self::PartlyCloudyDay => "partly-cloudy-day",
            Self::PartlyCloudyNight => "partly-cloudy-night",
            Self::Cloudy => "cloudy",
            Self::Windy => "windy",
        }
    }

    /// Single glyph for terminal output.
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Storm => "⛈",
            Self::Drizzle | Self::LightRain => "🌦",
            Self::FreezingRain | Self::Showers => "🌧",
            Self::Snow => "❄",
            Self::Fog => "🌫",
            Self::ClearDay => "☀",
            Self::ClearNight => "☾",
            Self::PartlyCloudyDay => "⛅",
            Self::PartlyCloudyNight => "☁",
            Self::Cloudy => "☁",
            Self::Windy => "🌬",
        }
    }
}

impl std::fmt::Display for WeatherIcon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider icon codes end in `n` at night (`01n`) and `d` by day.
pub fn is_night_icon_code(code: Option<&str>) -> bool {
    code.is_some_and(|c| c.ends_with('n'))
}
