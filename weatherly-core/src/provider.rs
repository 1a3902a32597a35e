use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    Config,
    error::LookupError,
    model::{ForecastPayload, ForecastQuery, Place},
    provider::weatherapi::WeatherApiProvider,
};

pub mod weatherapi;

/// A source of forecasts and place suggestions.
///
/// Implementors provide the `try_*` methods. The plain methods are the
/// boundary the rest of the crate uses: failures are logged and come back as
/// `None`, never as an error.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn try_fetch_forecast(&self, query: &ForecastQuery)
    -> Result<ForecastPayload, LookupError>;

    async fn try_fetch_place_suggestions(&self, prefix: &str) -> Result<Vec<Place>, LookupError>;

    async fn fetch_forecast(&self, query: &ForecastQuery) -> Option<ForecastPayload> {
        match self.try_fetch_forecast(query).await {
            Ok(payload) => Some(payload),
            Err(err) => {
                tracing::warn!(q = %query.location_query(), %err, "forecast unavailable");
                None
            }
        }
    }

    /// Returns `None` without touching the network when `prefix` is empty.
    async fn fetch_place_suggestions(&self, prefix: &str) -> Option<Vec<Place>> {
        if prefix.is_empty() {
            tracing::warn!("place search requires a non-empty query");
            return None;
        }

        match self.try_fetch_place_suggestions(prefix).await {
            Ok(places) => Some(places),
            Err(err) => {
                tracing::warn!(q = prefix, %err, "place suggestions unavailable");
                None
            }
        }
    }
}

/// Construct the WeatherAPI.com provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.api_key()?;
    let provider = WeatherApiProvider::new(api_key.to_owned()).with_base_url(&config.base_url);
    Ok(Box::new(provider))
}
