use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// The `lat,lon` form the forecast endpoint accepts as its `q` parameter.
    pub fn as_query(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

/// A place returned by the search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

/// Identity of a place: the provider id when known, else the name/country pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlaceKey {
    Id(i64),
    NameCountry(String, String),
}

impl Place {
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            id: None,
            region: None,
            url: None,
            coordinates: None,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn key(&self) -> PlaceKey {
        match self.id {
            Some(id) => PlaceKey::Id(id),
            None => PlaceKey::NameCountry(self.name.clone(), self.country.clone()),
        }
    }

    /// "Name, Country", or just the name when the country is unknown.
    pub fn label(&self) -> String {
        if self.country.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.country)
        }
    }
}

impl std::fmt::Display for Place {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.region {
            Some(region) if !region.is_empty() && region != &self.name => {
                write!(f, "{}, {}, {}", self.name, region, self.country)
            }
            _ => f.write_str(&self.label()),
        }
    }
}

/// Where a forecast should be fetched for.
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastTarget {
    City(String),
    Coordinates(Coordinates),
}

/// Parameters for a single forecast request.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastQuery {
    pub target: ForecastTarget,
    pub days: u8,
}

impl ForecastQuery {
    pub const DEFAULT_DAYS: u8 = 7;

    pub fn city(name: impl Into<String>) -> Self {
        Self { target: ForecastTarget::City(name.into()), days: Self::DEFAULT_DAYS }
    }

    pub fn coordinates(coords: Coordinates) -> Self {
        Self { target: ForecastTarget::Coordinates(coords), days: Self::DEFAULT_DAYS }
    }

    /// Builds a query from loose inputs. Coordinates win when both are given;
    /// returns `None` when neither is.
    pub fn from_parts(city: Option<&str>, coords: Option<Coordinates>) -> Option<Self> {
        match (coords, city) {
            (Some(c), _) => Some(Self::coordinates(c)),
            (None, Some(name)) if !name.trim().is_empty() => Some(Self::city(name)),
            _ => None,
        }
    }

    pub fn with_days(mut self, days: u8) -> Self {
        self.days = days;
        self
    }

    /// Value of the `q` parameter sent to the provider.
    pub fn location_query(&self) -> String {
        match &self.target {
            ForecastTarget::City(name) => name.clone(),
            ForecastTarget::Coordinates(c) => c.as_query(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature_c: Option<f64>,
    pub feels_like_c: Option<f64>,
    pub humidity_pct: Option<u8>,
    pub uv_index: Option<f64>,
    pub precipitation_mm: Option<f64>,
    pub wind_kph: Option<f64>,
    pub visibility_km: Option<f64>,
    /// US EPA index, 1 (good) to 6 (hazardous).
    pub air_quality_index: Option<u8>,
    pub condition_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastLocation {
    pub name: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub timezone_id: Option<String>,
    pub localtime: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub time_epoch: Option<i64>,
    /// Provider-local wall clock time, e.g. "2024-06-01 13:00".
    pub time_local: Option<String>,
    pub temperature_c: Option<f64>,
    pub condition_text: Option<String>,
    pub wind_kph: Option<f64>,
    pub chance_of_rain_pct: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: Option<NaiveDate>,
    pub average_temperature_c: Option<f64>,
    pub max_temperature_c: Option<f64>,
    pub min_temperature_c: Option<f64>,
    pub chance_of_rain_pct: Option<u8>,
    pub condition_text: Option<String>,
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
    pub moon_phase: Option<String>,
    pub hourly: Vec<HourlyForecast>,
}

/// Current conditions plus the daily/hourly forecast for one place.
///
/// `ForecastPayload::default()` is the fully blank shape shown when nothing
/// could be fetched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastPayload {
    pub current: CurrentConditions,
    pub location: ForecastLocation,
    pub daily: Vec<DailyForecast>,
}

impl ForecastPayload {
    pub fn is_valid(&self) -> bool {
        !self.daily.is_empty()
    }

    pub fn today(&self) -> Option<&DailyForecast> {
        self.daily.first()
    }
}

/// One entry of the persisted recent-searches list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentSearchEntry {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub country: String,
}

impl From<&Place> for RecentSearchEntry {
    fn from(place: &Place) -> Self {
        Self { id: place.id, name: place.name.clone(), country: place.country.clone() }
    }
}

impl From<&RecentSearchEntry> for Place {
    fn from(entry: &RecentSearchEntry) -> Self {
        Place {
            name: entry.name.clone(),
            country: entry.country.clone(),
            id: entry.id,
            region: None,
            url: None,
            coordinates: None,
        }
    }
}

/// Which rung of the resolution chain produced the displayed forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionSource {
    Device,
    Saved,
    Default,
    /// A place picked from search.
    Search,
    /// Every attempt failed; the payload is blank.
    None,
}

/// The place a resolution pass settled on.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedLocationState {
    UsingDeviceLocation(Coordinates),
    UsingSavedCity(String),
    UsingDefaultCity(String),
}
