//! Search-as-you-type over the place search endpoint.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::{
    config::SearchConfig,
    debounce::Debouncer,
    model::{ForecastQuery, Place, RecentSearchEntry, ResolutionSource},
    provider::WeatherProvider,
    state::{Action, StateStore},
    store::{self, KeyValueStore},
};

#[derive(Debug)]
pub struct SearchController {
    provider: Arc<dyn WeatherProvider>,
    store: Arc<dyn KeyValueStore>,
    state: Arc<StateStore>,
    debouncer: Mutex<Debouncer>,
    min_query_len: usize,
    days: u8,
}

impl SearchController {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        store: Arc<dyn KeyValueStore>,
        state: Arc<StateStore>,
        config: &SearchConfig,
    ) -> Self {
        Self {
            provider,
            store,
            state,
            debouncer: Mutex::new(Debouncer::new(config.debounce())),
            min_query_len: config.min_query_len,
            days: ForecastQuery::DEFAULT_DAYS,
        }
    }

    pub fn with_days(mut self, days: u8) -> Self {
        self.days = days;
        self
    }

    /// Feed the current contents of the search box.
    ///
    /// Short input clears the suggestions right away. Anything longer is
    /// searched once the input has been quiet for the debounce delay.
    pub fn on_text_changed(&self, text: &str) {
        let mut debouncer = self.debouncer.lock();

        if text.chars().count() < self.min_query_len {
            debouncer.cancel();
            self.state.dispatch(Action::SuggestionsCleared(self.state.next_request()));
            return;
        }

        let provider = self.provider.clone();
        let state = self.state.clone();
        let text = text.to_string();
        debouncer.schedule(async move {
            let request = state.next_request();
            state.dispatch(Action::SearchDispatched(request));

            match provider.fetch_place_suggestions(&text).await {
                Some(places) => {
                    tracing::debug!(q = %text, count = places.len(), "suggestions loaded");
                    state.dispatch(Action::SuggestionsLoaded { request, places });
                }
                None => state.dispatch(Action::SearchFailed(request)),
            }
        });
    }

    /// Drops a search that is still waiting out the debounce delay.
    pub fn cancel_pending(&self) {
        self.debouncer.lock().cancel();
    }

    /// Selects the first suggestion, if there is one.
    pub async fn on_submit(&self) -> Option<Place> {
        let first = self.state.snapshot().first_suggestion().cloned()?;
        self.on_select(first.clone()).await;
        Some(first)
    }

    /// Show the forecast for `place`. Only a successful lookup is remembered
    /// as the last city and recorded in the recent searches.
    pub async fn on_select(&self, place: Place) {
        self.cancel_pending();

        let request = self.state.next_request();
        self.state.dispatch(Action::PlaceSelected(request));

        let query = ForecastQuery::city(&place.name).with_days(self.days);
        let Some(payload) = self.provider.fetch_forecast(&query).await else {
            self.state.dispatch(Action::ForecastFailed(request));
            return;
        };

        self.state.dispatch(Action::ForecastLoaded {
            request,
            payload,
            source: ResolutionSource::Search,
        });
        store::save_last_city(self.store.as_ref(), &place.name).await;

        self.state.dispatch(Action::RecentSearchRecorded(RecentSearchEntry::from(&place)));
        let recent = self.state.snapshot().recent;
        store::save_recent_searches(self.store.as_ref(), &recent).await;
    }
}
