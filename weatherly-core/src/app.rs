use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;

use crate::{
    Config,
    location::{LocationService, location_service},
    model::{Place, ResolutionSource},
    provider::{WeatherProvider, provider_from_config},
    resolver::{LocationResolver, Resolution},
    search::SearchController,
    state::{Action, AppState, StateStore},
    store::{self, JsonFileStore, KeyValueStore},
};

/// The weather screen's behaviour with no rendering attached.
///
/// Drive it with the `on_*` methods and render from [`WeatherApp::state`] or
/// a [`WeatherApp::subscribe`] receiver.
#[derive(Debug)]
pub struct WeatherApp {
    config: Config,
    store: Arc<dyn KeyValueStore>,
    state: Arc<StateStore>,
    resolver: LocationResolver,
    search: SearchController,
}

impl WeatherApp {
    pub fn new(
        config: Config,
        provider: Arc<dyn WeatherProvider>,
        location: Arc<dyn LocationService>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let state = Arc::new(StateStore::default());
        let resolver =
            LocationResolver::new(provider.clone(), location, store.clone(), &config.default_city)
                .with_days(config.forecast_days);
        let search = SearchController::new(provider, store.clone(), state.clone(), &config.search)
            .with_days(config.forecast_days);

        Self { config, store, state, resolver, search }
    }

    /// WeatherAPI.com provider, file-backed store, location from config.
    pub fn from_config(config: Config) -> Result<Self> {
        let provider: Arc<dyn WeatherProvider> = Arc::from(provider_from_config(&config)?);
        let location: Arc<dyn LocationService> = Arc::from(location_service(config.location));
        let store = Arc::new(JsonFileStore::new(Config::store_file_path()?));
        Ok(Self::new(config, provider, location, store))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> AppState {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.state.subscribe()
    }

    /// Restores recent searches and runs the first resolution pass.
    pub async fn bootstrap(&self) -> Resolution {
        self.restore_recent_searches().await;
        self.refresh().await
    }

    /// Loads the persisted recent searches into state. Selections made before
    /// this runs start a fresh list.
    pub async fn restore_recent_searches(&self) {
        let recent = store::load_recent_searches(self.store.as_ref()).await;
        self.state.dispatch(Action::RecentSearchesLoaded(recent));
    }

    pub async fn use_current_location(&self) -> Resolution {
        self.refresh().await
    }

    async fn refresh(&self) -> Resolution {
        let request = self.state.next_request();
        self.state.dispatch(Action::ForecastDispatched(request));

        let resolution = self.resolver.resolve().await;

        // a blank payload only replaces a blank screen
        if resolution.source == ResolutionSource::None && self.state.snapshot().forecast.is_valid() {
            self.state.dispatch(Action::ForecastFailed(request));
        } else {
            self.state.dispatch(Action::ForecastLoaded {
                request,
                payload: resolution.payload.clone(),
                source: resolution.source,
            });
        }
        resolution
    }

    pub fn open_search(&self) {
        self.state.dispatch(Action::SearchOpened);
    }

    pub fn close_search(&self) {
        self.search.cancel_pending();
        self.state.dispatch(Action::SearchClosed);
    }

    pub fn on_text_changed(&self, text: &str) {
        self.search.on_text_changed(text);
    }

    pub async fn on_submit(&self) -> Option<Place> {
        self.search.on_submit().await
    }

    pub async fn on_select(&self, place: Place) {
        self.search.on_select(place).await;
    }
}
