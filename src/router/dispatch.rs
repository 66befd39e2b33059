//! [`IntentRouter`]: classify an utterance and fetch the text to speak.

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::providers::{
    extract_location_or, format_articles, format_weather, ChatMessage, ConversationProvider,
    NewsProvider, ProviderError, WeatherProvider,
};
use crate::router::history::ConversationHistory;
use crate::router::intent::{classify, Intent};

/// Result of routing one utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedResponse {
    pub intent: Intent,
    /// `None` means nothing should be spoken.
    pub text: Option<String>,
}

pub struct IntentRouter {
    chat: Arc<dyn ConversationProvider>,
    news: Arc<dyn NewsProvider>,
    weather: Arc<dyn WeatherProvider>,
    history: ConversationHistory,
    stop_keyword: String,
    default_location: String,
    rate_limit_backoff: Duration,
}

impl IntentRouter {
    pub fn new(
        chat: Arc<dyn ConversationProvider>,
        news: Arc<dyn NewsProvider>,
        weather: Arc<dyn WeatherProvider>,
        config: &AppConfig,
    ) -> Self {
        Self {
            chat,
            news,
            weather,
            history: ConversationHistory::with_capacity(config.assistant.history_capacity),
            stop_keyword: config.assistant.stop_keyword.clone(),
            default_location: config.weather.default_location.clone(),
            rate_limit_backoff: config.chat.rate_limit_backoff(),
        }
    }

    /// Override the wait applied after a rate-limited conversation request.
    pub fn with_rate_limit_backoff(mut self, backoff: Duration) -> Self {
        self.rate_limit_backoff = backoff;
        self
    }

    pub fn classify(&self, text: &str) -> Intent {
        classify(text, &self.stop_keyword)
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Route `text` to its provider and return what should be said.
    ///
    /// News and weather failures become a spoken error sentence.
    /// Conversation failures produce no text.  `Stop` is never routed.
    pub async fn respond(&mut self, text: &str) -> RoutedResponse {
        let intent = self.classify(text);
        log::debug!("router: {text:?} -> {intent:?}");

        let text = match intent {
            Intent::Stop => None,
            Intent::NewsQuery => Some(self.news_report(text).await),
            Intent::WeatherQuery => Some(self.weather_report(text).await),
            Intent::Conversation => self.converse(text).await,
        };

        RoutedResponse { intent, text }
    }

    async fn news_report(&self, text: &str) -> String {
        match self.news.search(text).await {
            Ok(articles) => {
                log::info!("router: {} news article(s)", articles.len());
                format_articles(&articles)
            }
            Err(e) => {
                log::warn!("router: news lookup failed: {e}");
                spoken_error(&e)
            }
        }
    }

    async fn weather_report(&self, text: &str) -> String {
        let location = extract_location_or(text, &self.default_location);
        match self.weather.current(&location).await {
            Ok(report) => format_weather(&location, report.as_ref()),
            Err(e) => {
                log::warn!("router: weather lookup for {location:?} failed: {e}");
                spoken_error(&e)
            }
        }
    }

    async fn converse(&mut self, text: &str) -> Option<String> {
        self.history.push(ChatMessage::user(text));

        match self.chat.reply(&self.history.messages()).await {
            Ok(reply) => {
                self.history.push(ChatMessage::assistant(reply.clone()));
                Some(reply)
            }
            Err(ProviderError::RateLimited) => {
                log::warn!(
                    "router: rate limit exceeded, waiting {:?} before giving up",
                    self.rate_limit_backoff
                );
                tokio::time::sleep(self.rate_limit_backoff).await;
                None
            }
            Err(e) => {
                log::warn!("router: conversation request failed: {e}");
                None
            }
        }
    }
}

fn spoken_error(e: &ProviderError) -> String {
    format!("An error occurred: {e}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Instant;

    use async_trait::async_trait;

    use super::*;
    use crate::providers::{Article, WeatherReport};

    #[derive(Default)]
    struct FakeChat {
        replies: Mutex<Vec<Result<String, ProviderError>>>,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    #[async_trait]
    impl ConversationProvider for FakeChat {
        async fn reply(&self, history: &[ChatMessage]) -> Result<String, ProviderError> {
            self.seen.lock().unwrap().push(history.to_vec());
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                Ok("ok".into())
            } else {
                replies.remove(0)
            }
        }
    }

    #[derive(Default)]
    struct FakeNews {
        fail: bool,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl NewsProvider for FakeNews {
        async fn search(&self, query: &str) -> Result<Vec<Article>, ProviderError> {
            self.queries.lock().unwrap().push(query.to_owned());
            if self.fail {
                return Err(ProviderError::MissingCredential("NEWSAPI_KEY".into()));
            }
            Ok(vec![Article {
                title: "Headline".into(),
                description: Some("Details".into()),
                url: "https://n.example".into(),
            }])
        }
    }

    #[derive(Default)]
    struct FakeWeather {
        locations: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl WeatherProvider for FakeWeather {
        async fn current(&self, location: &str) -> Result<Option<WeatherReport>, ProviderError> {
            self.locations.lock().unwrap().push(location.to_owned());
            if location == "atlantis" {
                return Ok(None);
            }
            Ok(Some(WeatherReport {
                temperature_f: 75,
                description: "clear sky".into(),
            }))
        }
    }

    struct Fixture {
        chat: Arc<FakeChat>,
        news: Arc<FakeNews>,
        weather: Arc<FakeWeather>,
        router: IntentRouter,
    }

    fn fixture(chat: FakeChat, news: FakeNews) -> Fixture {
        let chat = Arc::new(chat);
        let news = Arc::new(news);
        let weather = Arc::new(FakeWeather::default());
        let router = IntentRouter::new(
            chat.clone(),
            news.clone(),
            weather.clone(),
            &AppConfig::default(),
        );
        Fixture { chat, news, weather, router }
    }

    #[tokio::test]
    async fn news_goes_to_news_provider_with_whole_utterance() {
        let mut f = fixture(FakeChat::default(), FakeNews::default());
        let routed = f.router.respond("Tell me the news").await;

        assert_eq!(routed.intent, Intent::NewsQuery);
        assert_eq!(
            routed.text.as_deref(),
            Some("Article 1: Headline. Details. More info: https://n.example.")
        );
        assert_eq!(*f.news.queries.lock().unwrap(), vec!["Tell me the news"]);
        assert!(f.router.history().is_empty());
        assert!(f.chat.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn news_failure_is_spoken() {
        let mut f = fixture(FakeChat::default(), FakeNews { fail: true, ..Default::default() });
        let routed = f.router.respond("any news?").await;
        assert_eq!(
            routed.text.as_deref(),
            Some("An error occurred: NEWSAPI_KEY is not set")
        );
    }

    #[tokio::test]
    async fn weather_uses_extracted_or_default_location() {
        let mut f = fixture(FakeChat::default(), FakeNews::default());

        let routed = f.router.respond("What's the weather in Austin").await;
        assert_eq!(
            routed.text.as_deref(),
            Some("The current temperature in austin is 75°F with clear sky.")
        );

        f.router.respond("how is the weather").await;
        let routed = f.router.respond("weather in Atlantis").await;
        assert_eq!(
            routed.text.as_deref(),
            Some("Unable to retrieve weather data for atlantis. Please try again.")
        );

        assert_eq!(
            *f.weather.locations.lock().unwrap(),
            vec!["austin", "Brookhaven, Georgia", "atlantis"]
        );
    }

    #[tokio::test]
    async fn conversation_records_both_turns() {
        let chat = FakeChat {
            replies: Mutex::new(vec![Ok("Shakespeare.".into())]),
            ..Default::default()
        };
        let mut f = fixture(chat, FakeNews::default());

        let routed = f.router.respond("who wrote hamlet").await;
        assert_eq!(routed.intent, Intent::Conversation);
        assert_eq!(routed.text.as_deref(), Some("Shakespeare."));
        assert_eq!(
            f.router.history().messages(),
            vec![ChatMessage::user("who wrote hamlet"), ChatMessage::assistant("Shakespeare.")]
        );
        assert_eq!(f.chat.seen.lock().unwrap()[0], vec![ChatMessage::user("who wrote hamlet")]);
    }

    #[tokio::test]
    async fn failed_conversation_is_silent_and_keeps_user_turn() {
        let chat = FakeChat {
            replies: Mutex::new(vec![Err(ProviderError::Timeout)]),
            ..Default::default()
        };
        let mut f = fixture(chat, FakeNews::default());

        let routed = f.router.respond("tell me a joke").await;
        assert_eq!(routed.text, None);
        assert_eq!(f.router.history().messages(), vec![ChatMessage::user("tell me a joke")]);
    }

    #[tokio::test]
    async fn rate_limit_waits_then_gives_up() {
        let chat = FakeChat {
            replies: Mutex::new(vec![Err(ProviderError::RateLimited)]),
            ..Default::default()
        };
        let mut f = fixture(chat, FakeNews::default());
        f.router = f.router.with_rate_limit_backoff(Duration::from_millis(60));

        let started = Instant::now();
        let routed = f.router.respond("hello there").await;
        assert_eq!(routed.text, None);
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn history_stays_bounded_over_many_turns() {
        let mut f = fixture(FakeChat::default(), FakeNews::default());
        for i in 0..30 {
            f.router.respond(&format!("question {i}")).await;
            assert!(f.router.history().len() <= 10);
        }
        assert_eq!(f.router.history().len(), 10);
    }

    #[tokio::test]
    async fn stop_is_not_routed() {
        let mut f = fixture(FakeChat::default(), FakeNews::default());
        let routed = f.router.respond("stop").await;
        assert_eq!(routed, RoutedResponse { intent: Intent::Stop, text: None });
        assert!(f.chat.seen.lock().unwrap().is_empty());
    }
}
