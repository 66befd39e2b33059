//! Keyword-based intent classification.

/// What the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Stop,
    NewsQuery,
    WeatherQuery,
    Conversation,
}

struct IntentKeyword {
    intent: Intent,
    keyword: &'static str,
}

/// Checked in order after the stop keyword; the first match wins.
static TOPIC_KEYWORDS: &[IntentKeyword] = &[
    IntentKeyword {
        intent: Intent::NewsQuery,
        keyword: "news",
    },
    IntentKeyword {
        intent: Intent::WeatherQuery,
        keyword: "weather",
    },
];

/// Case-insensitive substring match.  A blank keyword never matches.
///
/// ```
/// use voice_assistant::router::contains_keyword;
///
/// assert!(contains_keyword("Please STOP.", "stop"));
/// assert!(!contains_keyword("keep going", "stop"));
/// ```
pub fn contains_keyword(text: &str, keyword: &str) -> bool {
    let keyword = keyword.trim().to_lowercase();
    !keyword.is_empty() && text.to_lowercase().contains(&keyword)
}

/// Stop first, then news, then weather; everything else is conversation.
pub fn classify(text: &str, stop_keyword: &str) -> Intent {
    if contains_keyword(text, stop_keyword) {
        return Intent::Stop;
    }
    TOPIC_KEYWORDS
        .iter()
        .find(|k| contains_keyword(text, k.keyword))
        .map(|k| k.intent)
        .unwrap_or(Intent::Conversation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_each_intent() {
        assert_eq!(classify("Stop", "stop"), Intent::Stop);
        assert_eq!(classify("tell me the news", "stop"), Intent::NewsQuery);
        assert_eq!(classify("What's the Weather in Austin", "stop"), Intent::WeatherQuery);
        assert_eq!(classify("who wrote hamlet", "stop"), Intent::Conversation);
    }

    #[test]
    fn stop_wins_over_topics() {
        assert_eq!(classify("stop the news", "stop"), Intent::Stop);
    }

    #[test]
    fn news_wins_over_weather() {
        assert_eq!(classify("weather news today", "stop"), Intent::NewsQuery);
    }

    #[test]
    fn substring_matching_follows_the_keyword() {
        // "newspaper" contains "news".
        assert_eq!(classify("read the newspaper", "stop"), Intent::NewsQuery);
        assert_eq!(classify("nonstop music", "stop"), Intent::Stop);
    }

    #[test]
    fn custom_stop_keyword() {
        assert_eq!(classify("Halt!", "halt"), Intent::Stop);
        assert_eq!(classify("stop", "halt"), Intent::Conversation);
        assert_eq!(classify("anything", "  "), Intent::Conversation);
    }
}
