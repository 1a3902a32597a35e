//! Application state as an immutable value moved forward by [`AppState::reduce`].
//!
//! The presentation layer only reads snapshots (or subscribes to changes);
//! every mutation goes through [`StateStore::dispatch`].

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use crate::{
    model::{ForecastPayload, Place, RecentSearchEntry, ResolutionSource},
    recent,
};

/// Tag for an outgoing request. Ids only increase; a response carrying an id
/// older than the latest dispatched one of its kind is ignored.
pub type RequestId = u64;

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub forecast: ForecastPayload,
    pub source: Option<ResolutionSource>,
    pub loading: bool,
    pub search_open: bool,
    pub searching: bool,
    pub suggestions: Vec<Place>,
    pub recent: Vec<RecentSearchEntry>,
    pub forecast_request: RequestId,
    pub search_request: RequestId,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            forecast: ForecastPayload::default(),
            source: None,
            loading: true,
            search_open: false,
            searching: false,
            suggestions: Vec::new(),
            recent: Vec::new(),
            forecast_request: 0,
            search_request: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SearchOpened,
    SearchClosed,
    /// Input too short to search; also invalidates any search in flight.
    SuggestionsCleared(RequestId),
    SearchDispatched(RequestId),
    SuggestionsLoaded { request: RequestId, places: Vec<Place> },
    SearchFailed(RequestId),
    ForecastDispatched(RequestId),
    /// A place was picked: close search, drop suggestions, start loading.
    PlaceSelected(RequestId),
    ForecastLoaded { request: RequestId, payload: ForecastPayload, source: ResolutionSource },
    ForecastFailed(RequestId),
    RecentSearchesLoaded(Vec<RecentSearchEntry>),
    RecentSearchRecorded(RecentSearchEntry),
}

impl AppState {
    pub fn first_suggestion(&self) -> Option<&Place> {
        self.suggestions.first()
    }

    pub fn reduce(mut self, action: Action) -> Self {
        match action {
            Action::SearchOpened => self.search_open = true,
            Action::SearchClosed => self.search_open = false,
            Action::SuggestionsCleared(request) => {
                self.search_request = request;
                self.suggestions.clear();
                self.searching = false;
            }
            Action::SearchDispatched(request) => {
                self.search_request = request;
                self.searching = true;
            }
            Action::SuggestionsLoaded { request, places } => {
                if request == self.search_request {
                    self.suggestions = places;
                    self.searching = false;
                }
            }
            Action::SearchFailed(request) => {
                // previous suggestions stay on screen
                if request == self.search_request {
                    self.searching = false;
                }
            }
            Action::ForecastDispatched(request) => {
                self.forecast_request = request;
                self.loading = true;
            }
            Action::PlaceSelected(request) => {
                self.forecast_request = request;
                self.search_request = request;
                self.suggestions.clear();
                self.searching = false;
                self.search_open = false;
                self.loading = true;
            }
            Action::ForecastLoaded { request, payload, source } => {
                if request == self.forecast_request {
                    self.forecast = payload;
                    self.source = Some(source);
                    self.loading = false;
                }
            }
            Action::ForecastFailed(request) => {
                if request == self.forecast_request {
                    self.loading = false;
                }
            }
            Action::RecentSearchesLoaded(recent) => self.recent = recent,
            Action::RecentSearchRecorded(entry) => self.recent = recent::record(&self.recent, entry),
        }
        self
    }
}

/// Holder of the current [`AppState`].
#[derive(Debug)]
pub struct StateStore {
    tx: watch::Sender<AppState>,
    next_id: AtomicU64,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}

impl StateStore {
    pub fn new(initial: AppState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx, next_id: AtomicU64::new(1) }
    }

    pub fn dispatch(&self, action: Action) {
        tracing::trace!(?action, "dispatch");
        self.tx.send_modify(|state| {
            let current = std::mem::take(state);
            *state = current.reduce(action);
        });
    }

    pub fn snapshot(&self) -> AppState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.tx.subscribe()
    }

    pub fn next_request(&self) -> RequestId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::payload;

    fn place(name: &str) -> Place {
        Place::new(name, "X")
    }

    #[test]
    fn initial_state_is_loading_and_blank() {
        let state = AppState::default();
        assert!(state.loading);
        assert!(!state.search_open);
        assert_eq!(state.forecast, ForecastPayload::default());
        assert!(state.first_suggestion().is_none());
    }

    #[test]
    fn stale_suggestions_are_discarded() {
        let state = AppState::default()
            .reduce(Action::SearchDispatched(1))
            .reduce(Action::SearchDispatched(2))
            .reduce(Action::SuggestionsLoaded { request: 2, places: vec![place("Lon")] })
            .reduce(Action::SuggestionsLoaded { request: 1, places: vec![place("Lo")] });

        assert_eq!(state.suggestions, vec![place("Lon")]);
        assert!(!state.searching);
    }

    #[test]
    fn clearing_invalidates_search_in_flight() {
        let state = AppState::default()
            .reduce(Action::SearchDispatched(1))
            .reduce(Action::SuggestionsCleared(2))
            .reduce(Action::SuggestionsLoaded { request: 1, places: vec![place("Lon")] });

        assert!(state.suggestions.is_empty());
    }

    #[test]
    fn failed_search_keeps_previous_suggestions() {
        let state = AppState::default()
            .reduce(Action::SearchDispatched(1))
            .reduce(Action::SuggestionsLoaded { request: 1, places: vec![place("Lon")] })
            .reduce(Action::SearchDispatched(2))
            .reduce(Action::SearchFailed(2));

        assert_eq!(state.suggestions, vec![place("Lon")]);
        assert!(!state.searching);
    }

    #[test]
    fn selecting_closes_search_and_loads() {
        let state = AppState::default()
            .reduce(Action::SearchOpened)
            .reduce(Action::SearchDispatched(1))
            .reduce(Action::SuggestionsLoaded { request: 1, places: vec![place("Lon")] })
            .reduce(Action::PlaceSelected(2));

        assert!(!state.search_open);
        assert!(state.suggestions.is_empty());
        assert!(state.loading);
        assert_eq!(state.forecast_request, 2);
    }

    #[test]
    fn older_forecast_cannot_overwrite_newer() {
        let state = AppState::default()
            .reduce(Action::ForecastDispatched(1))
            .reduce(Action::PlaceSelected(2))
            .reduce(Action::ForecastLoaded {
                request: 2,
                payload: payload("Paris"),
                source: ResolutionSource::Search,
            })
            .reduce(Action::ForecastLoaded {
                request: 1,
                payload: payload("Chennai"),
                source: ResolutionSource::Default,
            });

        assert_eq!(state.forecast, payload("Paris"));
        assert_eq!(state.source, Some(ResolutionSource::Search));
        assert!(!state.loading);
    }

    #[test]
    fn failed_forecast_keeps_previous_payload() {
        let state = AppState::default()
            .reduce(Action::ForecastDispatched(1))
            .reduce(Action::ForecastLoaded {
                request: 1,
                payload: payload("Paris"),
                source: ResolutionSource::Saved,
            })
            .reduce(Action::PlaceSelected(2))
            .reduce(Action::ForecastFailed(2));

        assert_eq!(state.forecast, payload("Paris"));
        assert!(!state.loading);
    }

    #[test]
    fn recorded_searches_are_deduplicated() {
        let entry = |name: &str| RecentSearchEntry { id: None, name: name.into(), country: "X".into() };
        let state = AppState::default()
            .reduce(Action::RecentSearchesLoaded(vec![entry("B"), entry("A")]))
            .reduce(Action::RecentSearchRecorded(entry("A")));

        assert_eq!(state.recent, vec![entry("A"), entry("B")]);
    }

    #[test]
    fn store_notifies_subscribers() {
        let store = StateStore::default();
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());

        store.dispatch(Action::SearchOpened);

        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().search_open);
        assert!(store.snapshot().search_open);
    }

    #[test]
    fn request_ids_increase() {
        let store = StateStore::default();
        let a = store.next_request();
        let b = store.next_request();
        assert!(b > a);
        assert!(a > AppState::default().forecast_request);
    }
}
