//! Turn loop for the voice assistant.
//!
//! # Architecture
//!
//! ```text
//! TurnCoordinator::run_forever()  ← async tokio task
//!        │
//!        ├─ spawn_blocking(WakeListener::wait_for_wake_word)
//!        ├─ spawn_blocking(SpeechCaptureService::capture_utterance)
//!        ├─ IntentRouter::respond            (chat / news / weather providers)
//!        └─ ResponseSpeaker::speak           (polls the CancellationFlag)
//!                                   ▲
//! InterruptMonitor (OS thread) ─────┘ raises the flag on "stop"
//!
//! SharedState (Arc<Mutex<AssistantState>>) ←── phase, last transcript/response
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use voice_assistant::config::AppConfig;
//! use voice_assistant::interrupt::CancellationFlag;
//! use voice_assistant::pipeline::{new_shared_state, TurnCoordinator, TurnSettings};
//! use voice_assistant::router::IntentRouter;
//! use voice_assistant::tts::{CommandSynthesizer, ResponseSpeaker};
//!
//! # use voice_assistant::listen::SpeechCaptureService;
//! # use voice_assistant::providers::{ConversationProvider, NewsProvider, WeatherProvider};
//! # use voice_assistant::wake::WakeListener;
//! # fn wake() -> Arc<dyn WakeListener> { unimplemented!() }
//! # fn capture() -> Arc<dyn SpeechCaptureService> { unimplemented!() }
//! # fn chat() -> Arc<dyn ConversationProvider> { unimplemented!() }
//! # fn news() -> Arc<dyn NewsProvider> { unimplemented!() }
//! # fn weather() -> Arc<dyn WeatherProvider> { unimplemented!() }
//! # async fn example() {
//! let config = AppConfig::default();
//! let flag = CancellationFlag::new();
//! let speaker = ResponseSpeaker::new(
//!     Arc::new(CommandSynthesizer::from_config(&config.tts)),
//!     flag.clone(),
//!     config.tts.poll_interval(),
//! );
//! let router = IntentRouter::new(chat(), news(), weather(), &config);
//!
//! let mut coordinator = TurnCoordinator::new(
//!     wake(),
//!     capture(),
//!     router,
//!     speaker,
//!     new_shared_state(),
//!     TurnSettings::from_config(&config.assistant),
//! );
//! coordinator.run_forever().await;
//! # }
//! ```

pub mod coordinator;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use coordinator::{
    TurnCoordinator, TurnError, TurnOutcome, TurnSettings, NOT_UNDERSTOOD_NOTICE,
    SERVICE_UNAVAILABLE_NOTICE,
};
pub use state::{lock_state, new_shared_state, AssistantState, SharedState, TurnPhase};
