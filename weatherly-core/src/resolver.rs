//! Picks which place's forecast to show when the app comes to the foreground.
//!
//! One pass tries, in order and each exactly once: the device position, the
//! last saved city, then the configured default city. The first attempt that
//! yields a forecast wins; if every attempt fails the pass still settles,
//! with a blank payload.

use std::sync::Arc;

use crate::{
    error::LookupError,
    location::{LocationService, Permission},
    model::{ForecastPayload, ForecastQuery, ResolutionSource, ResolvedLocationState},
    provider::WeatherProvider,
    store::{self, KeyValueStore},
};

/// Outcome of one resolution pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub location: ResolvedLocationState,
    pub source: ResolutionSource,
    pub payload: ForecastPayload,
}

#[derive(Debug, Clone)]
pub struct LocationResolver {
    provider: Arc<dyn WeatherProvider>,
    location: Arc<dyn LocationService>,
    store: Arc<dyn KeyValueStore>,
    default_city: String,
    days: u8,
}

impl LocationResolver {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        location: Arc<dyn LocationService>,
        store: Arc<dyn KeyValueStore>,
        default_city: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            location,
            store,
            default_city: default_city.into(),
            days: ForecastQuery::DEFAULT_DAYS,
        }
    }

    pub fn with_days(mut self, days: u8) -> Self {
        self.days = days;
        self
    }

    pub async fn resolve(&self) -> Resolution {
        match self.location.request_permission().await {
            Permission::Granted => match self.location.current_position().await {
                Ok(coords) => {
                    let query = ForecastQuery::coordinates(coords).with_days(self.days);
                    if let Some(payload) = self.provider.fetch_forecast(&query).await {
                        tracing::info!(q = %coords.as_query(), "resolved forecast from device location");
                        return Resolution {
                            location: ResolvedLocationState::UsingDeviceLocation(coords),
                            source: ResolutionSource::Device,
                            payload,
                        };
                    }
                    tracing::info!(err = %LookupError::EmptyResult, "device forecast failed, falling back");
                }
                Err(err) => tracing::info!(%err, "falling back to saved city"),
            },
            Permission::Denied => {
                tracing::info!(err = %LookupError::PermissionDenied, "falling back to saved city");
            }
        }

        self.resolve_saved_or_default().await
    }

    async fn resolve_saved_or_default(&self) -> Resolution {
        let (location, source, city) = match store::load_last_city(self.store.as_ref()).await {
            Some(city) => {
                (ResolvedLocationState::UsingSavedCity(city.clone()), ResolutionSource::Saved, city)
            }
            None => {
                let city = self.default_city.clone();
                (ResolvedLocationState::UsingDefaultCity(city.clone()), ResolutionSource::Default, city)
            }
        };

        let query = ForecastQuery::city(&city).with_days(self.days);
        match self.provider.fetch_forecast(&query).await {
            Some(payload) => {
                tracing::info!(%city, ?source, "resolved forecast");
                Resolution { location, source, payload }
            }
            None => {
                tracing::warn!(%city, "no forecast available, showing blank payload");
                Resolution {
                    location,
                    source: ResolutionSource::None,
                    payload: ForecastPayload::default(),
                }
            }
        }
    }
}
