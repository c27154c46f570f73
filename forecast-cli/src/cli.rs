use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use forecast_core::{
    CancellationToken, Config, Coordinate, DEFAULT_GEOCODE_LIMIT, LocationQuery, Resolution,
    Units, service_from_config,
};
use inquire::{Password, Select, Text};
use tracing::debug;

use crate::{
    render,
    session::{Session, ShowArgs},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "Weather forecast in your terminal")]
pub struct Cli {
    /// Log upstream requests (overrides RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the fallback API key, units and language.
    Configure,

    /// Search cities by name and remember the best match.
    Search {
        /// Place name, e.g. "Porto" or "Springfield, US".
        query: String,

        #[arg(long, default_value_t = DEFAULT_GEOCODE_LIMIT)]
        limit: u32,

        /// Do not remember the best match.
        #[arg(long)]
        no_save: bool,
    },

    /// Name the place at the given coordinates and remember it.
    Locate {
        #[arg(long, allow_negative_numbers = true)]
        lat: String,

        #[arg(long, allow_negative_numbers = true)]
        lon: String,

        #[arg(long, default_value_t = 1)]
        limit: u32,

        /// Do not remember the location.
        #[arg(long)]
        no_save: bool,
    },

    /// Show current conditions, the next hours and the daily outlook.
    Show {
        /// Latitude; defaults to the remembered location.
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<String>,

        /// Longitude; defaults to the remembered location.
        #[arg(long, allow_negative_numbers = true)]
        lon: Option<String>,

        /// "metric" or "imperial".
        #[arg(long)]
        units: Option<String>,

        /// Language code for condition descriptions.
        #[arg(long)]
        lang: Option<String>,

        /// Print the raw forecast bundle as JSON.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;
        debug!(path = ?Config::config_file_path().ok(), "loaded configuration");

        match self.command {
            Command::Configure => configure(&mut config)?,
            Command::Search {
                query,
                limit,
                no_save,
            } => {
                let query = LocationQuery::from_parts(Some(query.as_str()), None)?;
                lookup(&mut config, &query, limit, no_save).await?;
            }
            Command::Locate {
                lat,
                lon,
                limit,
                no_save,
            } => {
                let coords = Coordinate::parse(Some(lat.as_str()), Some(lon.as_str()))?;
                let query = LocationQuery::from_parts(None, Some(coords))?;
                lookup(&mut config, &query, limit, no_save).await?;
            }
            Command::Show {
                lat,
                lon,
                units,
                lang,
                json,
            } => {
                let args = ShowArgs {
                    lat: lat.as_deref(),
                    lon: lon.as_deref(),
                    units: units.as_deref(),
                    lang: lang.as_deref(),
                };
                let session = Session::resolve(&config, args)?;
                show(&config, &session, json).await?;
            }
        }

        Ok(())
    }
}

async fn lookup(
    config: &mut Config,
    query: &LocationQuery,
    limit: u32,
    no_save: bool,
) -> anyhow::Result<()> {
    let service = service_from_config(config)?;
    let resolution: Resolution = service
        .resolve_location(query, limit)
        .await
        .context("Location lookup failed")?;

    print!("{}", render::matches(&resolution));

    if let Some(remembered) = resolution.remembered.filter(|_| !no_save) {
        println!("Remembering {}", remembered.label);
        config.remember_location(remembered);
        config.save()?;
    }
    Ok(())
}

async fn show(config: &Config, session: &Session, json: bool) -> anyhow::Result<()> {
    let service = service_from_config(config)?;

    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let bundle = service.get_forecast(&session.request, &cancel).await;
    watcher.abort();
    let bundle = bundle.context("Failed to load weather")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&bundle)?);
    } else {
        print!("{}", render::forecast(session, &bundle, Utc::now()));
    }
    Ok(())
}

fn configure(config: &mut Config) -> anyhow::Result<()> {
    let api_key = Password::new("OpenWeather API key (empty to rely on OWM_API_KEY):")
        .without_confirmation()
        .prompt()?;
    config.set_api_key(api_key);

    let units = Select::new("Units:", vec![Units::Metric, Units::Imperial])
        .with_starting_cursor(if config.units() == Units::Imperial { 1 } else { 0 })
        .prompt()?;
    config.units = Some(units);

    let language = Text::new("Language:")
        .with_default(config.language.as_deref().unwrap_or("en"))
        .prompt()?;
    config.language = Some(language.trim().to_string()).filter(|l| !l.is_empty());

    config.save()?;
    println!(
        "Saved configuration to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}
