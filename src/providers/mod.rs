//! Content providers behind the intent router.
//!
//! * [`ConversationProvider`] / [`OpenAiChat`]: chat completions for free-form conversation.
//! * [`NewsProvider`] / [`NewsApiClient`]: article search.
//! * [`WeatherProvider`] / [`OpenWeatherClient`]: current conditions for a location.
//!
//! Every client reads its API key from the environment on each call (see
//! [`read_credential`]), so a missing key only fails the request that needs it.

pub mod chat;
pub mod credentials;
pub mod news;
pub mod weather;

use thiserror::Error;

pub use chat::{parse_chat_response, ChatMessage, ConversationProvider, OpenAiChat, Role};
pub use credentials::read_credential;
pub use news::{format_articles, parse_news_response, Article, NewsApiClient, NewsProvider};
pub use weather::{
    extract_location, extract_location_or, fahrenheit, format_weather, parse_weather_response,
    OpenWeatherClient, WeatherProvider, WeatherReport, DEFAULT_LOCATION,
};

// ---------------------------------------------------------------------------
// ProviderError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The environment variable holding the API key is unset or blank.
    #[error("{0} is not set")]
    MissingCredential(String),

    /// HTTP 429.
    #[error("rate limit exceeded")]
    RateLimited,

    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("request timed out")]
    Timeout,

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("provider returned an empty response")]
    EmptyResponse,

    /// Non-success status with the provider's own message.
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Request(e.to_string())
        }
    }
}

/// Shared HTTP client with a per-request timeout.
pub(crate) fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs.max(1)))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Join a configured base URL and an API path without doubling slashes.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_cleanly() {
        assert_eq!(
            endpoint("https://api.openai.com/", "/v1/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(endpoint("http://localhost:8080", "v2/everything"), "http://localhost:8080/v2/everything");
    }

    #[test]
    fn error_messages_are_speakable() {
        assert_eq!(
            ProviderError::MissingCredential("NEWSAPI_KEY".into()).to_string(),
            "NEWSAPI_KEY is not set"
        );
        assert_eq!(
            ProviderError::Api { status: 401, message: "invalid key".into() }.to_string(),
            "HTTP 401: invalid key"
        );
    }
}
