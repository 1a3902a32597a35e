use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use weatherly_core::{
    Config, Coordinates, JsonFileStore, Place, WeatherApp, store::load_recent_searches,
};

use crate::render;

/// How long to wait for suggestions once the debounce delay has passed.
const SEARCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherly", version, about = "Weather forecasts in the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the WeatherAPI.com key and default city.
    Configure,

    /// Show the forecast for the current location, last city or default city.
    Show {
        /// Look up this city instead of resolving a location.
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        city: Option<String>,

        /// Device latitude; overrides `[location]` in the config.
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Device longitude; overrides `[location]` in the config.
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Print the forecast payload as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Search for a place and show its forecast.
    Search {
        /// Search text (at least three characters).
        text: String,

        /// Take the first suggestion instead of asking.
        #[arg(long)]
        first: bool,
    },

    /// List recent searches.
    Recent,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        tracing::debug!(command = ?self.command, "running");
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, lat, lon, json } => show(city, lat.zip(lon), json).await,
            Command::Search { text, first } => search(&text, first).await,
            Command::Recent => recent().await,
        }
    }
}

fn configure() -> Result<()> {
    let mut cfg = Config::load()?;

    let api_key = inquire::Password::new("WeatherAPI.com API key:")
        .without_confirmation()
        .with_help_message("Get one at https://www.weatherapi.com/my/")
        .prompt()
        .context("Failed to read API key")?;
    if !api_key.trim().is_empty() {
        cfg.set_api_key(api_key.trim().to_string());
    }

    let default_city = inquire::Text::new("Default city:")
        .with_default(&cfg.default_city)
        .prompt()
        .context("Failed to read default city")?;
    cfg.default_city = default_city.trim().to_string();

    cfg.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(city: Option<String>, position: Option<(f64, f64)>, json: bool) -> Result<()> {
    let mut cfg = Config::load()?;
    if let Some((lat, lon)) = position {
        cfg.location = Some(Coordinates::new(lat, lon));
    }
    let app = WeatherApp::from_config(cfg)?;

    match city {
        Some(city) => {
            app.restore_recent_searches().await;
            app.on_select(Place::new(city.trim(), "")).await;
        }
        None => {
            app.bootstrap().await;
        }
    }

    let state = app.state();
    if json {
        println!("{}", serde_json::to_string_pretty(&state.forecast)?);
    } else {
        print!("{}", render::forecast(&state));
    }
    Ok(())
}

async fn search(text: &str, first: bool) -> Result<()> {
    let app = WeatherApp::from_config(Config::load()?)?;
    app.restore_recent_searches().await;

    let mut rx = app.subscribe();
    let previous = rx.borrow_and_update().search_request;

    app.open_search();
    app.on_text_changed(text);

    let wait = app.config().search.debounce() + SEARCH_TIMEOUT;
    tokio::time::timeout(wait, rx.wait_for(|s| s.search_request != previous && !s.searching))
        .await
        .context("Timed out waiting for place suggestions")?
        .context("Search state closed unexpectedly")?;

    if first {
        if app.on_submit().await.is_none() {
            println!("No places found for \"{text}\".");
            return Ok(());
        }
    } else {
        let suggestions = app.state().suggestions;
        if suggestions.is_empty() {
            println!("No places found for \"{text}\".");
            return Ok(());
        }

        let picked = tokio::task::spawn_blocking(move || {
            inquire::Select::new("Pick a place:", suggestions).prompt()
        })
        .await
        .context("Place picker crashed")?;

        match picked {
            Ok(place) => app.on_select(place).await,
            Err(inquire::InquireError::OperationCanceled)
            | Err(inquire::InquireError::OperationInterrupted) => {
                app.close_search();
                return Ok(());
            }
            Err(err) => return Err(err).context("Failed to pick a place"),
        }
    }

    print!("{}", render::forecast(&app.state()));
    Ok(())
}

async fn recent() -> Result<()> {
    let store = JsonFileStore::new(Config::store_file_path()?);
    let entries = load_recent_searches(&store).await;

    if entries.is_empty() {
        println!("No recent searches.");
    } else {
        print!("{}", render::recent(&entries));
    }
    Ok(())
}
