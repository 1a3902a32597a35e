use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Request, Url};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    error::LookupError,
    model::{
        Coordinates, CurrentConditions, DailyForecast, ForecastLocation, ForecastPayload,
        ForecastQuery, HourlyForecast, Place,
    },
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Self {
        Self { api_key, base_url: DEFAULT_BASE_URL.to_string(), http: Client::new() }
    }

    /// Point the provider at a different host, e.g. a local mock server.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// `GET {base}/forecast.json?key&q&days&aqi=yes&alerts=no`
    pub fn forecast_request(&self, query: &ForecastQuery) -> Result<Request> {
        let url = format!("{}/forecast.json", self.base_url);
        let request = self
            .http
            .get(url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", query.location_query().as_str()),
                ("days", query.days.to_string().as_str()),
                ("aqi", "yes"),
                ("alerts", "no"),
            ])
            .build()
            .context("Failed to build WeatherAPI forecast request")?;
        Ok(request)
    }

    /// `GET {base}/search.json?key&q`
    pub fn search_request(&self, prefix: &str) -> Result<Request> {
        let url = format!("{}/search.json", self.base_url);
        let request = self
            .http
            .get(url)
            .query(&[("key", self.api_key.as_str()), ("q", prefix)])
            .build()
            .context("Failed to build WeatherAPI search request")?;
        Ok(request)
    }

    async fn execute<T: DeserializeOwned>(&self, request: Request, what: &str) -> Result<T> {
        tracing::debug!(url = %redacted_url(request.url()), what, "WeatherAPI request");

        let res = self
            .http
            .execute(request)
            .await
            .with_context(|| format!("Failed to send request to WeatherAPI.com ({what})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read WeatherAPI {what} response body"))?;

        if !status.is_success() {
            return Err(anyhow::anyhow!(
                "WeatherAPI {} request failed with status {}: {}",
                what,
                status,
                truncate_body(&body),
            ));
        }

        serde_json::from_str(&body).with_context(|| format!("Failed to parse WeatherAPI {what} JSON"))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WaCondition {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WaAirQuality {
    #[serde(rename = "us-epa-index")]
    us_epa_index: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WaCurrent {
    temp_c: Option<f64>,
    feelslike_c: Option<f64>,
    humidity: Option<f64>,
    uv: Option<f64>,
    precip_mm: Option<f64>,
    wind_kph: Option<f64>,
    vis_km: Option<f64>,
    air_quality: Option<WaAirQuality>,
    condition: Option<WaCondition>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WaLocation {
    name: Option<String>,
    region: Option<String>,
    country: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    tz_id: Option<String>,
    localtime: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WaDay {
    avgtemp_c: Option<f64>,
    maxtemp_c: Option<f64>,
    mintemp_c: Option<f64>,
    daily_chance_of_rain: Option<f64>,
    condition: Option<WaCondition>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WaAstro {
    sunrise: Option<String>,
    sunset: Option<String>,
    moon_phase: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WaForecastHour {
    time_epoch: Option<i64>,
    time: Option<String>,
    temp_c: Option<f64>,
    wind_kph: Option<f64>,
    chance_of_rain: Option<f64>,
    condition: Option<WaCondition>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WaForecastDay {
    date: Option<String>,
    day: Option<WaDay>,
    astro: Option<WaAstro>,
    hour: Vec<WaForecastHour>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WaForecastResponse {
    current: Option<WaCurrent>,
    location: Option<WaLocation>,
    forecast: Option<WaForecast>,
}

#[derive(Debug, Deserialize)]
struct WaSearchResult {
    #[serde(default)]
    id: Option<i64>,
    name: String,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

fn condition_text(condition: Option<WaCondition>) -> Option<String> {
    condition.and_then(|c| c.text).filter(|t| !t.is_empty())
}

fn coordinates(lat: Option<f64>, lon: Option<f64>) -> Option<Coordinates> {
    Some(Coordinates::new(lat?, lon?))
}

fn percent(value: Option<f64>) -> Option<u8> {
    value.map(|v| v.round().clamp(0.0, 100.0) as u8)
}

impl From<WaCurrent> for CurrentConditions {
    fn from(c: WaCurrent) -> Self {
        Self {
            temperature_c: c.temp_c,
            feels_like_c: c.feelslike_c,
            humidity_pct: percent(c.humidity),
            uv_index: c.uv,
            precipitation_mm: c.precip_mm,
            wind_kph: c.wind_kph,
            visibility_km: c.vis_km,
            air_quality_index: c.air_quality.and_then(|aq| aq.us_epa_index).map(|i| i as u8),
            condition_text: condition_text(c.condition),
        }
    }
}

impl From<WaLocation> for ForecastLocation {
    fn from(l: WaLocation) -> Self {
        Self {
            coordinates: coordinates(l.lat, l.lon),
            name: l.name,
            region: l.region,
            country: l.country,
            timezone_id: l.tz_id,
            localtime: l.localtime,
        }
    }
}

impl From<WaForecastHour> for HourlyForecast {
    fn from(h: WaForecastHour) -> Self {
        Self {
            time_epoch: h.time_epoch,
            time_local: h.time,
            temperature_c: h.temp_c,
            condition_text: condition_text(h.condition),
            wind_kph: h.wind_kph,
            chance_of_rain_pct: percent(h.chance_of_rain),
        }
    }
}

impl From<WaForecastDay> for DailyForecast {
    fn from(d: WaForecastDay) -> Self {
        let day = d.day.unwrap_or_default();
        let astro = d.astro.unwrap_or_default();
        Self {
            date: d.date.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            average_temperature_c: day.avgtemp_c,
            max_temperature_c: day.maxtemp_c,
            min_temperature_c: day.mintemp_c,
            chance_of_rain_pct: percent(day.daily_chance_of_rain),
            condition_text: condition_text(day.condition),
            sunrise: astro.sunrise,
            sunset: astro.sunset,
            moon_phase: astro.moon_phase,
            hourly: d.hour.into_iter().map(HourlyForecast::from).collect(),
        }
    }
}

impl From<WaForecastResponse> for ForecastPayload {
    fn from(r: WaForecastResponse) -> Self {
        Self {
            current: r.current.map(CurrentConditions::from).unwrap_or_default(),
            location: r.location.map(ForecastLocation::from).unwrap_or_default(),
            daily: r
                .forecast
                .map(|f| f.forecastday.into_iter().map(DailyForecast::from).collect())
                .unwrap_or_default(),
        }
    }
}

impl From<WaSearchResult> for Place {
    fn from(r: WaSearchResult) -> Self {
        Place {
            coordinates: coordinates(r.lat, r.lon),
            name: r.name,
            country: r.country.unwrap_or_default(),
            id: r.id,
            region: r.region,
            url: r.url.filter(|u| !u.is_empty()),
        }
    }
}

fn network(err: anyhow::Error) -> LookupError {
    LookupError::NetworkOrHttp(format!("{err:#}"))
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    async fn try_fetch_forecast(
        &self,
        query: &ForecastQuery,
    ) -> Result<ForecastPayload, LookupError> {
        let request = self.forecast_request(query).map_err(network)?;
        let parsed: WaForecastResponse = self.execute(request, "forecast").await.map_err(network)?;

        let payload = ForecastPayload::from(parsed);
        if !payload.is_valid() {
            return Err(LookupError::EmptyResult);
        }
        Ok(payload)
    }

    async fn try_fetch_place_suggestions(&self, prefix: &str) -> Result<Vec<Place>, LookupError> {
        let request = self.search_request(prefix).map_err(network)?;
        let parsed: Vec<WaSearchResult> = self.execute(request, "search").await.map_err(network)?;

        Ok(parsed.into_iter().map(Place::from).collect())
    }
}

/// The request URL with the API key masked, for logging.
fn redacted_url(url: &Url) -> String {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .into_owned()
        .map(|(k, v)| if k == "key" { (k, "***".to_string()) } else { (k, v) })
        .collect();

    let mut url = url.clone();
    url.query_pairs_mut().clear().extend_pairs(pairs);
    url.to_string()
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn params(request: &Request) -> HashMap<String, String> {
        request.url().query_pairs().into_owned().collect()
    }

    #[test]
    fn forecast_request_by_city() {
        let provider = WeatherApiProvider::new("KEY".into());
        let request = provider.forecast_request(&ForecastQuery::city("Paris")).unwrap();

        assert_eq!(request.url().path(), "/v1/forecast.json");
        let p = params(&request);
        assert_eq!(p["key"], "KEY");
        assert_eq!(p["q"], "Paris");
        assert_eq!(p["days"], "7");
        assert_eq!(p["aqi"], "yes");
        assert_eq!(p["alerts"], "no");
    }

    #[test]
    fn forecast_request_by_coordinates() {
        let provider = WeatherApiProvider::new("KEY".into());
        let query = ForecastQuery::coordinates(Coordinates::new(48.85, 2.35)).with_days(3);
        let request = provider.forecast_request(&query).unwrap();

        let p = params(&request);
        assert_eq!(p["q"], "48.85,2.35");
        assert_eq!(p["days"], "3");
    }

    #[test]
    fn search_request_carries_prefix() {
        let provider = WeatherApiProvider::new("KEY".into()).with_base_url("http://localhost:9/v1/");
        let request = provider.search_request("Lon").unwrap();

        assert_eq!(request.url().as_str(), "http://localhost:9/v1/search.json?key=KEY&q=Lon");
    }

    #[test]
    fn logged_url_masks_api_key() {
        let provider = WeatherApiProvider::new("SECRET".into());
        let request = provider.forecast_request(&ForecastQuery::city("Paris")).unwrap();

        let logged = redacted_url(request.url());
        assert!(!logged.contains("SECRET"));
        assert_eq!(
            logged,
            "https://api.weatherapi.com/v1/forecast.json?key=***&q=Paris&days=7&aqi=yes&alerts=no"
        );
        assert!(request.url().as_str().contains("key=SECRET"));
    }

    #[test]
    fn sparse_forecast_json_is_tolerated() {
        let json = r#"{
            "location": { "name": "Chennai", "country": "India", "tz_id": "Asia/Kolkata" },
            "forecast": { "forecastday": [ { "date": "2024-06-01", "hour": [ { "time_epoch": 1717180200 } ] } ] }
        }"#;
        let parsed: WaForecastResponse = serde_json::from_str(json).unwrap();
        let payload = ForecastPayload::from(parsed);

        assert!(payload.is_valid());
        assert_eq!(payload.current, CurrentConditions::default());
        assert_eq!(payload.location.name.as_deref(), Some("Chennai"));
        assert_eq!(payload.location.timezone_id.as_deref(), Some("Asia/Kolkata"));
        let today = payload.today().unwrap();
        assert_eq!(today.date, NaiveDate::from_ymd_opt(2024, 6, 1));
        assert!(today.sunrise.is_none());
        assert_eq!(today.hourly.len(), 1);
        assert_eq!(today.hourly[0].time_epoch, Some(1717180200));
    }

    #[test]
    fn current_conditions_are_mapped() {
        let json = r#"{
            "temp_c": 31.2, "feelslike_c": 36.0, "humidity": 66, "uv": 8.0,
            "precip_mm": 0.1, "wind_kph": 14.4, "vis_km": 6.0,
            "air_quality": { "us-epa-index": 2 },
            "condition": { "text": "Partly cloudy" }
        }"#;
        let current = CurrentConditions::from(serde_json::from_str::<WaCurrent>(json).unwrap());

        assert_eq!(current.temperature_c, Some(31.2));
        assert_eq!(current.humidity_pct, Some(66));
        assert_eq!(current.air_quality_index, Some(2));
        assert_eq!(current.condition_text.as_deref(), Some("Partly cloudy"));
    }

    #[test]
    fn search_results_keep_provider_order() {
        let json = r#"[
            { "id": 2801268, "name": "London", "region": "City of London, Greater London", "country": "United Kingdom", "lat": 51.52, "lon": -0.11, "url": "london-city-of-london-greater-london-united-kingdom" },
            { "name": "Londrina", "country": "Brazil", "url": "" }
        ]"#;
        let parsed: Vec<WaSearchResult> = serde_json::from_str(json).unwrap();
        let places: Vec<Place> = parsed.into_iter().map(Place::from).collect();

        assert_eq!(places[0].name, "London");
        assert_eq!(places[0].id, Some(2801268));
        assert_eq!(places[0].coordinates, Some(Coordinates::new(51.52, -0.11)));
        assert_eq!(places[0].url.as_deref(), Some("london-city-of-london-greater-london-united-kingdom"));
        assert_eq!(places[1].name, "Londrina");
        assert!(places[1].id.is_none());
        assert!(places[1].url.is_none());
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "é".repeat(150);
        let truncated = truncate_body(&body);
        assert!(truncated.ends_with("..."));
        assert!(truncated.len() <= 203);
    }
}
