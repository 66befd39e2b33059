//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//! Every section is `#[serde(default)]`, so a partial `settings.toml` only
//! overrides the keys it names.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

/// Upper bound for any seconds-valued setting.
const MAX_SETTING_SECS: f32 = 86_400.0;

/// Seconds from a config value, clamped to `0..=MAX_SETTING_SECS`.  NaN reads as zero.
fn secs(value: f32) -> Duration {
    Duration::from_secs_f32(value.max(0.0).min(MAX_SETTING_SECS))
}

// ---------------------------------------------------------------------------
// AssistantConfig
// ---------------------------------------------------------------------------

/// Turn-loop behaviour: wake phrases, the stop keyword and pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Name printed next to conversational replies.
    pub name: String,
    /// Phrases that wake the assistant.  Matched case-insensitively after
    /// punctuation is stripped from the transcript.
    pub wake_phrases: Vec<String>,
    /// Keyword that interrupts speech or ends the current exchange.
    pub stop_keyword: String,
    /// What the assistant says after an explicit stop command.
    pub stop_acknowledgement: String,
    /// Pause after the acknowledgement before the cancellation flag is cleared.
    pub stop_settle_ms: u64,
    /// Pause between two turns.
    pub turn_cooldown_ms: u64,
    /// Speak a short notice when an utterance could not be understood.
    pub announce_capture_failures: bool,
    /// Maximum number of chat messages kept in the conversation history.
    pub history_capacity: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: "Rusty".into(),
            wake_phrases: vec!["hey rusty".into(), "hey rust".into()],
            stop_keyword: "stop".into(),
            stop_acknowledgement: "Okay, stopping.".into(),
            stop_settle_ms: 1_000,
            turn_cooldown_ms: 1_000,
            announce_capture_failures: false,
            history_capacity: 10,
        }
    }
}

impl AssistantConfig {
    pub fn stop_settle(&self) -> Duration {
        Duration::from_millis(self.stop_settle_ms)
    }

    pub fn turn_cooldown(&self) -> Duration {
        Duration::from_millis(self.turn_cooldown_ms)
    }
}

// ---------------------------------------------------------------------------
// SttConfig
// ---------------------------------------------------------------------------

/// Settings for the Whisper STT engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SttConfig {
    /// GGML model file stem inside the models directory, or an absolute path.
    pub model: String,
    /// Speech language as an ISO-639-1 code, or `"auto"` for Whisper's
    /// built-in language detection.
    pub language: String,
    /// Attempt GPU-accelerated inference when available.
    pub use_gpu: bool,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model: "ggml-base.en".into(),
            language: "en".into(),
            use_gpu: false,
        }
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Microphone framing and utterance endpointing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Input device to capture from, matched as a substring of the device
    /// name.  `None` uses the host's default input.
    pub device: Option<String>,
    /// Samples per frame delivered by the frame source (16 kHz mono).
    pub frame_length: usize,
    /// Minimum RMS level for a frame to count as voice.
    pub vad_threshold: f32,
    /// Seconds of ambient audio sampled to raise the VAD threshold.
    pub calibration_secs: f32,
    /// Seconds of trailing silence that end an utterance.
    pub pause_secs: f32,
    /// Seconds of audio kept from before speech onset.
    pub pre_roll_secs: f32,
    /// Seconds to wait for a command to start after the wake word.
    pub command_timeout_secs: f32,
    /// Hard upper bound for one spoken command.
    pub max_command_secs: f32,
    /// Upper bound for one wake-phrase segment.
    pub wake_phrase_secs: f32,
    /// Milliseconds without any device callback before the stream is
    /// considered stalled.
    pub read_timeout_ms: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            frame_length: 512,
            vad_threshold: 0.015,
            calibration_secs: 0.5,
            pause_secs: 0.8,
            pre_roll_secs: 0.3,
            command_timeout_secs: 8.0,
            max_command_secs: 30.0,
            wake_phrase_secs: 2.5,
            read_timeout_ms: 2_000,
        }
    }
}

impl AudioConfig {
    pub fn pause(&self) -> Duration {
        secs(self.pause_secs)
    }

    pub fn calibration(&self) -> Duration {
        secs(self.calibration_secs)
    }

    pub fn pre_roll(&self) -> Duration {
        secs(self.pre_roll_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        secs(self.command_timeout_secs)
    }

    pub fn max_command(&self) -> Duration {
        secs(self.max_command_secs)
    }

    pub fn wake_phrase(&self) -> Duration {
        secs(self.wake_phrase_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

// ---------------------------------------------------------------------------
// InterruptConfig
// ---------------------------------------------------------------------------

/// Background "stop" listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterruptConfig {
    /// Run the interrupt monitor at all.
    pub enabled: bool,
    /// Longest phrase captured per listening window.
    pub phrase_time_limit_secs: f32,
    /// Seconds to wait for speech before starting a fresh window.
    pub listen_timeout_secs: f32,
    /// Back-off after the speech service or device fails.
    pub error_backoff_ms: u64,
}

impl Default for InterruptConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            phrase_time_limit_secs: 2.0,
            listen_timeout_secs: 5.0,
            error_backoff_ms: 250,
        }
    }
}

impl InterruptConfig {
    pub fn phrase_time_limit(&self) -> Duration {
        secs(self.phrase_time_limit_secs)
    }

    pub fn listen_timeout(&self) -> Duration {
        secs(self.listen_timeout_secs)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }
}

// ---------------------------------------------------------------------------
// TtsConfig
// ---------------------------------------------------------------------------

/// How response text reaches the synthesis program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextDelivery {
    /// Write the text to the program's stdin, then close it.
    Stdin,
    /// Substitute the text for every `{text}` placeholder in `args`, or
    /// append it as the last argument when there is none.
    Argument,
}

impl Default for TextDelivery {
    fn default() -> Self {
        Self::Stdin
    }
}

/// External text-to-speech program.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    /// Executable name or path (looked up on `PATH`).
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<String>,
    /// How the text is handed over.
    pub delivery: TextDelivery,
    /// How often a running session is checked for completion or cancellation.
    pub poll_interval_ms: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            program: "festival".into(),
            args: vec!["--tts".into()],
            delivery: TextDelivery::Stdin,
            poll_interval_ms: 100,
        }
    }
}

impl TtsConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

// ---------------------------------------------------------------------------
// ChatConfig
// ---------------------------------------------------------------------------

/// OpenAI-compatible chat-completions backend used for conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Base URL of the API endpoint (without `/v1/...`).
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Model identifier sent to the API.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens in one reply.
    pub max_tokens: u32,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Delay after a rate-limit response before the turn is given up.
    pub rate_limit_backoff_secs: u64,
    /// Optional system message sent ahead of the history.
    pub system_prompt: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".into(),
            api_key_env: "OPENAI_API_KEY".into(),
            model: "gpt-4".into(),
            temperature: 0.7,
            max_tokens: 200,
            timeout_secs: 30,
            rate_limit_backoff_secs: 60,
            system_prompt: None,
        }
    }
}

impl ChatConfig {
    pub fn rate_limit_backoff(&self) -> Duration {
        Duration::from_secs(self.rate_limit_backoff_secs)
    }
}

// ---------------------------------------------------------------------------
// NewsConfig
// ---------------------------------------------------------------------------

/// NewsAPI search backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub base_url: String,
    pub api_key_env: String,
    /// Number of articles requested and read out.
    pub page_size: usize,
    /// Query used when the utterance is blank.
    pub default_query: String,
    pub timeout_secs: u64,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://newsapi.org".into(),
            api_key_env: "NEWSAPI_KEY".into(),
            page_size: 3,
            default_query: "latest news".into(),
            timeout_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// WeatherConfig
// ---------------------------------------------------------------------------

/// OpenWeatherMap current-weather backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub base_url: String,
    pub api_key_env: String,
    /// Location used when the utterance does not name one.
    pub default_location: String,
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "http://api.openweathermap.org".into(),
            api_key_env: "OPENWEATHER_API_KEY".into(),
            default_location: "Brookhaven, Georgia".into(),
            timeout_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use voice_assistant::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub assistant: AssistantConfig,
    pub stt: SttConfig,
    pub audio: AudioConfig,
    pub interrupt: InterruptConfig,
    pub tts: TtsConfig,
    pub chat: ChatConfig,
    pub news: NewsConfig,
    pub weather: WeatherConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
