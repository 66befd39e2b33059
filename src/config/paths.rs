//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\voice-assistant\
//!   macOS:   ~/Library/Application Support/voice-assistant/
//!   Linux:   ~/.config/voice-assistant/
//!
//! Data dir (Whisper models):
//!   Windows: %LOCALAPPDATA%\voice-assistant\
//!   macOS:   ~/Library/Application Support/voice-assistant/
//!   Linux:   ~/.local/share/voice-assistant/

use std::path::{Path, PathBuf};

/// Environment variable that overrides the location of `settings.toml`.
pub const CONFIG_ENV_VAR: &str = "VOICE_ASSISTANT_CONFIG";

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory holding `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Directory for GGML Whisper model files.
    pub models_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "voice-assistant";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// `VOICE_ASSISTANT_CONFIG` replaces the settings file location when set.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => config_dir.join("settings.toml"),
        };

        Self {
            config_dir,
            settings_file,
            models_dir: data_dir.join("models"),
        }
    }

    /// Resolve a configured model name to a file path.
    ///
    /// Absolute paths and names ending in `.bin` that exist are used as-is;
    /// anything else is looked up as `<models_dir>/<name>.bin`.
    pub fn model_file(&self, model: &str) -> PathBuf {
        let candidate = Path::new(model);
        if candidate.is_absolute() || (model.ends_with(".bin") && candidate.exists()) {
            return candidate.to_path_buf();
        }
        self.models_dir.join(format!("{model}.bin"))
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_non_empty() {
        let paths = AppPaths::new();
        assert!(paths.config_dir.to_str().is_some_and(|s| !s.is_empty()));
        assert!(paths.models_dir.to_str().is_some_and(|s| !s.is_empty()));
        assert!(paths.settings_file.file_name().is_some());
    }

    #[test]
    fn model_name_resolves_into_models_dir() {
        let paths = AppPaths::new();
        let file = paths.model_file("ggml-base.en");
        assert_eq!(file, paths.models_dir.join("ggml-base.en.bin"));
    }

    #[test]
    fn absolute_model_path_is_kept() {
        let paths = AppPaths::new();
        let file = paths.model_file("/opt/models/ggml-small.bin");
        assert_eq!(file, PathBuf::from("/opt/models/ggml-small.bin"));
    }
}
