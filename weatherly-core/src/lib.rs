//! Core library for the `weatherly` weather app.
//!
//! This crate defines:
//! - Configuration handling
//! - The WeatherAPI.com client behind the `WeatherProvider` trait
//! - Location resolution (device position → saved city → default city)
//! - Debounced search-as-you-type with recent searches
//! - An immutable application state moved forward by a reducer
//!
//! It is used by `weatherly-cli`, but any front-end can drive [`WeatherApp`]
//! and render its state.

pub mod app;
pub mod config;
pub mod debounce;
pub mod error;
pub mod location;
pub mod model;
pub mod provider;
pub mod recent;
pub mod resolver;
pub mod search;
pub mod state;
pub mod store;

#[cfg(test)]
mod testing;

pub use app::WeatherApp;
pub use config::{Config, SearchConfig};
pub use error::LookupError;
pub use location::{FixedLocation, LocationService, NoLocation, Permission};
pub use model::{
    Coordinates, ForecastPayload, ForecastQuery, Place, RecentSearchEntry, ResolutionSource,
    ResolvedLocationState,
};
pub use provider::{WeatherProvider, weatherapi::WeatherApiProvider};
pub use resolver::{LocationResolver, Resolution};
pub use state::{Action, AppState};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
