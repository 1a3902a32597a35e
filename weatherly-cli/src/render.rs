//! Plain-text rendering of the app state. Missing fields print as `-`.

use std::fmt::{self, Display};

use chrono::DateTime;
use chrono_tz::Tz;
use weatherly_core::{
    AppState, RecentSearchEntry, ResolutionSource,
    model::{DailyForecast, HourlyForecast},
};

const BLANK: &str = "-";

fn or_blank<T: Display>(value: Option<T>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v}{unit}"),
        None => BLANK.to_string(),
    }
}

fn text(value: &Option<String>) -> &str {
    value.as_deref().filter(|s| !s.is_empty()).unwrap_or(BLANK)
}

fn temperature(value: Option<f64>) -> String {
    or_blank(value.map(|t| format!("{t:.0}")), "°C")
}

fn air_quality(index: Option<u8>) -> &'static str {
    match index {
        Some(1) => "Good",
        Some(2) => "Moderate",
        Some(3) => "Unhealthy for sensitive groups",
        Some(4) => "Unhealthy",
        Some(5) => "Very unhealthy",
        Some(6) => "Hazardous",
        _ => BLANK,
    }
}

fn source_label(source: Option<ResolutionSource>) -> &'static str {
    match source {
        Some(ResolutionSource::Device) => "current location",
        Some(ResolutionSource::Saved) => "last city",
        Some(ResolutionSource::Default) => "default city",
        Some(ResolutionSource::Search) => "search",
        Some(ResolutionSource::None) | None => "unavailable",
    }
}

/// "13:00" from the provider's local time, else the epoch shown in the
/// location's time zone (or UTC when the zone is unknown).
fn hour_label(hour: &HourlyForecast, timezone: Option<&str>) -> String {
    if let Some((_, time)) = hour.time_local.as_deref().and_then(|t| t.split_once(' ')) {
        return time.to_string();
    }
    let Some(utc) = hour.time_epoch.and_then(|epoch| DateTime::from_timestamp(epoch, 0)) else {
        return BLANK.to_string();
    };
    match timezone.and_then(|tz| tz.parse::<Tz>().ok()) {
        Some(tz) => utc.with_timezone(&tz).format("%H:%M").to_string(),
        None => utc.format("%H:%M UTC").to_string(),
    }
}

fn day_label(day: &DailyForecast) -> String {
    day.date.map(|d| d.format("%a %d %b").to_string()).unwrap_or_else(|| BLANK.to_string())
}

struct ForecastView<'a>(&'a AppState);

impl Display for ForecastView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0;
        let payload = &state.forecast;
        let location = &payload.location;
        let current = &payload.current;

        writeln!(
            f,
            "{}, {}  ({})",
            text(&location.name),
            text(&location.country),
            source_label(state.source)
        )?;
        if let Some(localtime) = &location.localtime {
            writeln!(f, "Local time: {localtime}")?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "{}  {}  (feels like {})",
            temperature(current.temperature_c),
            text(&current.condition_text),
            temperature(current.feels_like_c)
        )?;
        writeln!(
            f,
            "Humidity {}  Wind {}  UV {}",
            or_blank(current.humidity_pct, "%"),
            or_blank(current.wind_kph, " km/h"),
            or_blank(current.uv_index, "")
        )?;
        writeln!(
            f,
            "Precipitation {}  Visibility {}  Air quality {}",
            or_blank(current.precipitation_mm, " mm"),
            or_blank(current.visibility_km, " km"),
            air_quality(current.air_quality_index)
        )?;

        let Some(today) = payload.today() else {
            return writeln!(f, "\nNo forecast available.");
        };

        writeln!(
            f,
            "Sunrise {}  Sunset {}  Moon {}",
            text(&today.sunrise),
            text(&today.sunset),
            text(&today.moon_phase)
        )?;

        if !today.hourly.is_empty() {
            writeln!(f, "\nHourly")?;
            let timezone = location.timezone_id.as_deref();
            for hour in &today.hourly {
                writeln!(
                    f,
                    "  {:>9}  {:>5}  {}",
                    hour_label(hour, timezone),
                    temperature(hour.temperature_c),
                    text(&hour.condition_text)
                )?;
            }
        }

        writeln!(f, "\nDaily")?;
        for day in &payload.daily {
            writeln!(
                f,
                "  {:<10}  {:>5}  {:>5}/{:<5}  {}",
                day_label(day),
                temperature(day.average_temperature_c),
                temperature(day.max_temperature_c),
                temperature(day.min_temperature_c),
                text(&day.condition_text)
            )?;
        }
        Ok(())
    }
}

struct RecentView<'a>(&'a [RecentSearchEntry]);

impl Display for RecentView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.0.iter().enumerate() {
            if entry.country.is_empty() {
                writeln!(f, "{}. {}", i + 1, entry.name)?;
            } else {
                writeln!(f, "{}. {}, {}", i + 1, entry.name, entry.country)?;
            }
        }
        Ok(())
    }
}

pub fn forecast(state: &AppState) -> String {
    ForecastView(state).to_string()
}

pub fn recent(entries: &[RecentSearchEntry]) -> String {
    RecentView(entries).to_string()
}
