use async_trait::async_trait;
use parking_lot::Mutex;
use std::{collections::HashMap, time::Duration};
use tokio::time::Instant;

use crate::{
    error::LookupError,
    location::{LocationService, Permission},
    model::{Coordinates, DailyForecast, ForecastLocation, ForecastPayload, ForecastQuery, Place},
    provider::WeatherProvider,
};

/// A valid one-day payload for `name`.
pub fn payload(name: &str) -> ForecastPayload {
    ForecastPayload {
        location: ForecastLocation { name: Some(name.to_string()), ..Default::default() },
        daily: vec![DailyForecast {
            condition_text: Some(format!("Sunny in {name}")),
            ..Default::default()
        }],
        ..Default::default()
    }
}

/// Provider with canned responses keyed by the `q` value; anything unknown
/// fails.
#[derive(Debug, Default)]
pub struct FakeProvider {
    forecasts: Mutex<HashMap<String, ForecastPayload>>,
    suggestions: Mutex<HashMap<String, Vec<Place>>>,
    delays: Mutex<HashMap<String, Duration>>,
    forecast_calls: Mutex<Vec<ForecastQuery>>,
    search_calls: Mutex<Vec<(String, Instant)>>,
}

impl FakeProvider {
    pub fn with_forecast(self, q: &str, payload: ForecastPayload) -> Self {
        self.forecasts.lock().insert(q.to_string(), payload);
        self
    }

    pub fn with_suggestions(self, prefix: &str, places: Vec<Place>) -> Self {
        self.suggestions.lock().insert(prefix.to_string(), places);
        self
    }

    pub fn remove_forecast(&self, q: &str) {
        self.forecasts.lock().remove(q);
    }

    /// Delay responses for `q` (forecast or search) by `delay`.
    pub fn with_delay(self, q: &str, delay: Duration) -> Self {
        self.delays.lock().insert(q.to_string(), delay);
        self
    }

    pub fn forecast_calls(&self) -> Vec<ForecastQuery> {
        self.forecast_calls.lock().clone()
    }

    pub fn search_calls(&self) -> Vec<String> {
        self.search_calls.lock().iter().map(|(q, _)| q.clone()).collect()
    }

    pub fn search_call_times(&self) -> Vec<Instant> {
        self.search_calls.lock().iter().map(|(_, at)| *at).collect()
    }

    async fn delay_for(&self, q: &str) {
        let delay = self.delays.lock().get(q).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl WeatherProvider for FakeProvider {
    async fn try_fetch_forecast(
        &self,
        query: &ForecastQuery,
    ) -> Result<ForecastPayload, LookupError> {
        self.forecast_calls.lock().push(query.clone());
        let q = query.location_query();
        self.delay_for(&q).await;

        let found = self.forecasts.lock().get(&q).cloned();
        found.ok_or_else(|| LookupError::NetworkOrHttp(format!("no fixture for {q}")))
    }

    async fn try_fetch_place_suggestions(&self, prefix: &str) -> Result<Vec<Place>, LookupError> {
        self.search_calls.lock().push((prefix.to_string(), Instant::now()));
        self.delay_for(prefix).await;

        let found = self.suggestions.lock().get(prefix).cloned();
        found.ok_or(LookupError::EmptyResult)
    }
}

/// Location service with a fixed permission answer and position result.
#[derive(Debug)]
pub struct ScriptedLocation {
    pub permission: Permission,
    pub position: Result<Coordinates, LookupError>,
}

impl ScriptedLocation {
    pub fn unavailable() -> Self {
        Self {
            permission: Permission::Granted,
            position: Err(LookupError::LocationUnavailable("no fix".into())),
        }
    }
}

#[async_trait]
impl LocationService for ScriptedLocation {
    async fn request_permission(&self) -> Permission {
        self.permission
    }

    async fn current_position(&self) -> Result<Coordinates, LookupError> {
        self.position.clone()
    }
}
