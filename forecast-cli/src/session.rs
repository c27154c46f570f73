use forecast_core::{Config, Coordinate, ForecastRequest, Result, Units};

/// Shown when nothing was given and nothing is remembered.
const DEFAULT_LABEL: &str = "Madrid, ES";
const DEFAULT_LAT: f64 = 40.4168;
const DEFAULT_LON: f64 = -3.7038;

/// The location and preferences a single invocation renders for.
///
/// Built once per run and handed to every renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub label: String,
    pub request: ForecastRequest,
}

/// Raw `show` arguments before resolution.
#[derive(Debug, Clone, Default)]
pub struct ShowArgs<'a> {
    pub lat: Option<&'a str>,
    pub lon: Option<&'a str>,
    pub units: Option<&'a str>,
    pub lang: Option<&'a str>,
}

impl Session {
    /// Explicit coordinates win, then the remembered location, then the default city.
    pub fn resolve(config: &Config, args: ShowArgs<'_>) -> Result<Self> {
        let units = match args.units {
            Some(u) => u.parse()?,
            None => config.units(),
        };
        let lang = args.lang.or(config.language.as_deref());

        if args.lat.is_some() || args.lon.is_some() {
            let request = ForecastRequest::from_params(args.lat, args.lon, Some(units.as_str()), lang)?;
            let label = format!("{:.4}, {:.4}", request.coordinate.lat, request.coordinate.lon);
            return Ok(Self { label, request });
        }

        let (label, coordinate) = match &config.last_location {
            Some(saved) => (saved.label.clone(), saved.coordinate()?),
            None => (
                DEFAULT_LABEL.to_string(),
                Coordinate::new(DEFAULT_LAT, DEFAULT_LON)?,
            ),
        };

        Ok(Self {
            label: if label.is_empty() {
                format!("{:.4}, {:.4}", coordinate.lat, coordinate.lon)
            } else {
                label
            },
            request: ForecastRequest::new(coordinate, units, lang),
        })
    }

    pub fn units(&self) -> Units {
        self.request.units
    }
}
