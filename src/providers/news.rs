//! Article search via NewsAPI `/v2/everything`.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::NewsConfig;
use crate::providers::{endpoint, http_client, read_credential, ProviderError};

/// Spoken when a search returns nothing.
pub const NO_NEWS: &str = "No news found at the moment.";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: String,
}

#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Up to the configured number of articles matching `query`.
    async fn search(&self, query: &str) -> Result<Vec<Article>, ProviderError>;
}

/// One line per article:
/// `Article N: <title>. <description>. More info: <url>.`
///
/// ```
/// use voice_assistant::providers::{format_articles, Article};
///
/// let a = Article { title: "Rust 2.0".into(), description: None, url: "https://x.y".into() };
/// assert_eq!(format_articles(&[a]), "Article 1: Rust 2.0. More info: https://x.y.");
/// assert_eq!(format_articles(&[]), "No news found at the moment.");
/// ```
pub fn format_articles(articles: &[Article]) -> String {
    if articles.is_empty() {
        return NO_NEWS.to_string();
    }

    articles
        .iter()
        .enumerate()
        .map(|(i, a)| match a.description.as_deref().map(str::trim) {
            Some(desc) if !desc.is_empty() => format!(
                "Article {}: {}. {}. More info: {}.",
                i + 1,
                a.title.trim(),
                desc,
                a.url
            ),
            _ => format!("Article {}: {}. More info: {}.", i + 1, a.title.trim(), a.url),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Decode a NewsAPI response body, keeping at most `limit` articles.
pub fn parse_news_response(
    json: &serde_json::Value,
    limit: usize,
) -> Result<Vec<Article>, ProviderError> {
    if json["status"] == "error" {
        return Err(ProviderError::Api {
            status: 0,
            message: json["message"].as_str().unwrap_or("unknown error").to_string(),
        });
    }

    let mut articles: Vec<Article> = match json.get("articles") {
        Some(list) => serde_json::from_value(list.clone())
            .map_err(|e| ProviderError::Parse(e.to_string()))?,
        None => Vec::new(),
    };
    articles.truncate(limit);
    Ok(articles)
}

// ---------------------------------------------------------------------------
// NewsApiClient
// ---------------------------------------------------------------------------

pub struct NewsApiClient {
    client: reqwest::Client,
    config: NewsConfig,
}

impl NewsApiClient {
    pub fn from_config(config: &NewsConfig) -> Self {
        Self {
            client: http_client(config.timeout_secs),
            config: config.clone(),
        }
    }

    /// The query actually sent: the trimmed text, or the default when blank.
    pub fn effective_query<'a>(&'a self, query: &'a str) -> &'a str {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            &self.config.default_query
        } else {
            trimmed
        }
    }
}

#[async_trait]
impl NewsProvider for NewsApiClient {
    async fn search(&self, query: &str) -> Result<Vec<Article>, ProviderError> {
        let key = read_credential(&self.config.api_key_env)?;
        let url = endpoint(&self.config.base_url, "v2/everything");
        let page_size = self.config.page_size.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", self.effective_query(query)),
                ("pageSize", page_size.as_str()),
                ("apiKey", key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        parse_news_response(&json, self.config.page_size).map_err(|e| match e {
            ProviderError::Api { message, .. } => ProviderError::Api {
                status: status.as_u16(),
                message,
            },
            other => other,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
