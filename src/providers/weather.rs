//! Current conditions via OpenWeatherMap `/data/2.5/weather`.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use crate::config::WeatherConfig;
use crate::providers::{endpoint, http_client, read_credential, ProviderError};

pub const DEFAULT_LOCATION: &str = "Brookhaven, Georgia";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherReport {
    pub temperature_f: i64,
    pub description: String,
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// `Ok(None)` when the provider does not know the location.
    async fn current(&self, location: &str) -> Result<Option<WeatherReport>, ProviderError>;
}

/// Celsius to whole Fahrenheit degrees, rounded down.
///
/// ```
/// use voice_assistant::providers::fahrenheit;
///
/// assert_eq!(fahrenheit(0.0), 32);
/// assert_eq!(fahrenheit(100.0), 212);
/// assert_eq!(fahrenheit(0.6), 33);
/// ```
pub fn fahrenheit(celsius: f64) -> i64 {
    (celsius * 1.8 + 32.0).floor() as i64
}

fn location_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"weather in ([\w\s]+)").expect("location pattern is valid"))
}

/// The words after "weather in", lowercased and trimmed, or `default`.
pub fn extract_location_or(text: &str, default: &str) -> String {
    let lowered = text.to_lowercase();
    location_pattern()
        .captures(&lowered)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|loc| !loc.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// [`extract_location_or`] with [`DEFAULT_LOCATION`].
///
/// ```
/// use voice_assistant::providers::extract_location;
///
/// assert_eq!(extract_location("what's the weather in Austin"), "austin");
/// assert_eq!(extract_location("is it cold outside"), "Brookhaven, Georgia");
/// ```
pub fn extract_location(text: &str) -> String {
    extract_location_or(text, DEFAULT_LOCATION)
}

/// The sentence spoken for a lookup result.
pub fn format_weather(location: &str, report: Option<&WeatherReport>) -> String {
    match report {
        Some(r) => format!(
            "The current temperature in {location} is {}°F with {}.",
            r.temperature_f, r.description
        ),
        None => format!("Unable to retrieve weather data for {location}. Please try again."),
    }
}

/// Decode an OpenWeatherMap body (metric units).  A body without `main`
/// (unknown city, bad key) is `Ok(None)`.
pub fn parse_weather_response(
    json: &serde_json::Value,
) -> Result<Option<WeatherReport>, ProviderError> {
    let Some(main) = json.get("main") else {
        log::debug!("weather: no data in response: {json}");
        return Ok(None);
    };

    let celsius = main["temp"]
        .as_f64()
        .ok_or_else(|| ProviderError::Parse("missing main.temp".into()))?;
    let description = json["weather"][0]["description"]
        .as_str()
        .ok_or_else(|| ProviderError::Parse("missing weather[0].description".into()))?
        .to_string();

    Ok(Some(WeatherReport {
        temperature_f: fahrenheit(celsius),
        description,
    }))
}

// ---------------------------------------------------------------------------
// OpenWeatherClient
// ---------------------------------------------------------------------------

pub struct OpenWeatherClient {
    client: reqwest::Client,
    config: WeatherConfig,
}

impl OpenWeatherClient {
    pub fn from_config(config: &WeatherConfig) -> Self {
        Self {
            client: http_client(config.timeout_secs),
            config: config.clone(),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current(&self, location: &str) -> Result<Option<WeatherReport>, ProviderError> {
        let key = read_credential(&self.config.api_key_env)?;
        let url = endpoint(&self.config.base_url, "data/2.5/weather");

        let response = self
            .client
            .get(&url)
            .query(&[("q", location), ("appid", key.as_str()), ("units", "metric")])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        parse_weather_response(&json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fahrenheit_floors() {
        assert_eq!(fahrenheit(0.0), 32);
        assert_eq!(fahrenheit(100.0), 212);
        assert_eq!(fahrenheit(0.6), 33);
        assert_eq!(fahrenheit(-40.0), -40);
        assert_eq!(fahrenheit(-0.1), 31);
    }

    #[test]
    fn location_after_weather_in() {
        assert_eq!(extract_location("What's the WEATHER in San Francisco?"), "san francisco");
        assert_eq!(extract_location("weather in   "), DEFAULT_LOCATION);
        assert_eq!(extract_location("tell me the weather"), DEFAULT_LOCATION);
        assert_eq!(extract_location_or("weather please", "Oslo"), "Oslo");
    }

    #[test]
    fn parses_metric_body() {
        let body = json!({
            "weather": [{ "main": "Clouds", "description": "broken clouds" }],
            "main": { "temp": 21.3, "humidity": 40 },
            "name": "Austin"
        });
        let report = parse_weather_response(&body).unwrap().unwrap();
        assert_eq!(report.temperature_f, 70);
        assert_eq!(
            format_weather("austin", Some(&report)),
            "The current temperature in austin is 70°F with broken clouds."
        );
    }

    #[test]
    fn unknown_city_is_none() {
        let body = json!({ "cod": "404", "message": "city not found" });
        assert_eq!(parse_weather_response(&body).unwrap(), None);
        assert_eq!(
            format_weather("atlantis", None),
            "Unable to retrieve weather data for atlantis. Please try again."
        );
    }

    #[test]
    fn malformed_main_is_parse_error() {
        let body = json!({ "main": { "temp": "warm" } });
        assert!(matches!(parse_weather_response(&body), Err(ProviderError::Parse(_))));
    }
}
