//! Configuration module for the voice assistant.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each subsystem,
//! `AppPaths` for cross-platform data directories, and TOML persistence via
//! `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::{AppPaths, CONFIG_ENV_VAR};
pub use settings::{
    AppConfig, AssistantConfig, AudioConfig, ChatConfig, InterruptConfig, NewsConfig, SttConfig,
    TextDelivery, TtsConfig, WeatherConfig,
};
