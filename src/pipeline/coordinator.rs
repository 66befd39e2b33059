//! Turn coordinator: wake word → command → intent → spoken reply.
//!
//! [`TurnCoordinator`] owns the router and the speaker and publishes its
//! progress into [`SharedState`].
//!
//! # Turn flow
//!
//! ```text
//! spawn_blocking(wake.wait_for_wake_word)            [WaitingForWake]
//!   └─▶ spawn_blocking(capture.capture_utterance)    [Listening]
//!         ├─ Err(failure) → optional notice, end turn
//!         ├─ "stop"       → cancel, acknowledge, settle, clear flag   [Stopping]
//!         └─ text         → router.respond(text)                      [Routing]
//!                             ├─ Some(reply) → speaker.speak(reply)   [Speaking]
//!                             └─ None        → end turn
//! sleep(cooldown)                                    [Cooldown]
//! ```
//!
//! The wake-word wait and the capture are blocking calls, so they run on
//! tokio's blocking pool.  A panic inside either surfaces as a join error; a
//! panic in the async half (router, providers, speaker) is caught around the
//! whole turn.  Either way only the current turn ends.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use thiserror::Error;

use crate::config::AssistantConfig;
use crate::listen::{CaptureFailure, SpeechCaptureService};
use crate::router::{contains_keyword, Intent, IntentRouter};
use crate::tts::{ResponseSpeaker, SpeakError, SpeakOutcome};
use crate::wake::{WakeError, WakeListener};

use super::state::{lock_state, SharedState, TurnPhase};

/// Spoken after [`CaptureFailure::NoSpeechUnderstood`] when notices are on.
pub const NOT_UNDERSTOOD_NOTICE: &str = "Sorry, I did not understand that. Could you repeat?";
/// Spoken after [`CaptureFailure::ServiceUnavailable`] when notices are on.
pub const SERVICE_UNAVAILABLE_NOTICE: &str =
    "Could not request results from the speech recognition service.";

// ---------------------------------------------------------------------------
// TurnError / TurnOutcome
// ---------------------------------------------------------------------------

/// A turn that could not run to completion.  The loop logs it and continues.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Wake(#[from] WakeError),

    #[error(transparent)]
    Speak(#[from] SpeakError),

    /// A blocking collaborator panicked or was cancelled.
    #[error("background task failed: {0}")]
    Join(String),

    #[error("turn panicked: {0}")]
    Panicked(String),
}

impl From<tokio::task::JoinError> for TurnError {
    fn from(e: tokio::task::JoinError) -> Self {
        TurnError::Join(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Nothing usable was heard after the wake word.
    CaptureFailed(CaptureFailure),
    /// The command was the stop keyword; the acknowledgement was spoken.
    Stopped,
    /// A reply was spoken.
    Spoke { intent: Intent, outcome: SpeakOutcome },
    /// The router produced nothing to say.
    NoResponse { intent: Intent },
}

// ---------------------------------------------------------------------------
// TurnSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TurnSettings {
    pub assistant_name: String,
    pub stop_keyword: String,
    pub stop_acknowledgement: String,
    pub stop_settle: Duration,
    pub cooldown: Duration,
    pub announce_capture_failures: bool,
}

impl TurnSettings {
    pub fn from_config(config: &AssistantConfig) -> Self {
        Self {
            assistant_name: config.name.clone(),
            stop_keyword: config.stop_keyword.clone(),
            stop_acknowledgement: config.stop_acknowledgement.clone(),
            stop_settle: config.stop_settle(),
            cooldown: config.turn_cooldown(),
            announce_capture_failures: config.announce_capture_failures,
        }
    }
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self::from_config(&AssistantConfig::default())
    }
}

// ---------------------------------------------------------------------------
// TurnCoordinator
// ---------------------------------------------------------------------------

pub struct TurnCoordinator {
    wake: Arc<dyn WakeListener>,
    capture: Arc<dyn SpeechCaptureService>,
    router: IntentRouter,
    speaker: ResponseSpeaker,
    state: SharedState,
    settings: TurnSettings,
}

impl TurnCoordinator {
    pub fn new(
        wake: Arc<dyn WakeListener>,
        capture: Arc<dyn SpeechCaptureService>,
        router: IntentRouter,
        speaker: ResponseSpeaker,
        state: SharedState,
        settings: TurnSettings,
    ) -> Self {
        Self {
            wake,
            capture,
            router,
            speaker,
            state,
            settings,
        }
    }

    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    pub fn router(&self) -> &IntentRouter {
        &self.router
    }

    pub fn speaker(&self) -> &ResponseSpeaker {
        &self.speaker
    }

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------

    /// Run turns until the task is dropped.  Turn errors are logged and the
    /// loop carries on after the cooldown.
    pub async fn run_forever(&mut self) {
        log::info!("turn: {} is ready", self.settings.assistant_name);
        loop {
            match self.guarded_turn().await {
                Ok(outcome) => log::debug!("turn: finished with {outcome:?}"),
                Err(e) => {
                    log::error!("turn: {e}");
                    lock_state(&self.state).last_error = Some(e.to_string());
                }
            }

            self.set_phase(TurnPhase::Cooldown);
            tokio::time::sleep(self.settings.cooldown).await;
        }
    }

    /// Run exactly one turn.
    pub async fn run_turn(&mut self) -> Result<TurnOutcome, TurnError> {
        self.set_phase(TurnPhase::WaitingForWake);
        let wake = Arc::clone(&self.wake);
        tokio::task::spawn_blocking(move || wake.wait_for_wake_word()).await??;

        self.set_phase(TurnPhase::Listening);
        let capture = Arc::clone(&self.capture);
        let captured = tokio::task::spawn_blocking(move || capture.capture_utterance()).await?;

        let text = match captured {
            Ok(text) => text,
            Err(failure) => return self.capture_failed(failure).await,
        };

        log::info!("turn: you said: {text}");
        lock_state(&self.state).last_transcript = Some(text.clone());

        let outcome = if contains_keyword(&text, &self.settings.stop_keyword) {
            self.handle_stop().await?
        } else {
            self.set_phase(TurnPhase::Routing);
            let routed = self.router.respond(&text).await;
            lock_state(&self.state).last_intent = Some(routed.intent);

            match routed.text {
                Some(reply) => {
                    log::info!("turn: {}: {reply}", self.settings.assistant_name);
                    let outcome = self.say(&reply).await?;
                    TurnOutcome::Spoke {
                        intent: routed.intent,
                        outcome,
                    }
                }
                None => TurnOutcome::NoResponse {
                    intent: routed.intent,
                },
            }
        };

        self.finish_turn(None);
        Ok(outcome)
    }

    /// [`run_turn`](Self::run_turn) with panics turned into [`TurnError::Panicked`].
    async fn guarded_turn(&mut self) -> Result<TurnOutcome, TurnError> {
        AssertUnwindSafe(self.run_turn())
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(TurnError::Panicked(panic_message(payload.as_ref()))))
    }

    // -----------------------------------------------------------------------
    // Turn steps
    // -----------------------------------------------------------------------

    async fn capture_failed(&mut self, failure: CaptureFailure) -> Result<TurnOutcome, TurnError> {
        log::info!("turn: {failure}");

        if self.settings.announce_capture_failures {
            let notice = match failure {
                CaptureFailure::NoSpeechUnderstood => NOT_UNDERSTOOD_NOTICE,
                CaptureFailure::ServiceUnavailable(_) => SERVICE_UNAVAILABLE_NOTICE,
            };
            self.say(notice).await?;
        }

        self.finish_turn(Some(failure.to_string()));
        Ok(TurnOutcome::CaptureFailed(failure))
    }

    /// Cancel whatever is playing, acknowledge, let the room settle, then
    /// clear the flag so the next reply is not cut short.
    async fn handle_stop(&mut self) -> Result<TurnOutcome, TurnError> {
        self.set_phase(TurnPhase::Stopping);
        log::info!("turn: stop requested");

        self.speaker.cancel();
        let ack = self.settings.stop_acknowledgement.clone();
        let spoken = self.say(&ack).await;

        // Settle and clear even when the acknowledgement could not be spoken.
        tokio::time::sleep(self.settings.stop_settle).await;
        self.speaker.flag().clear();

        spoken?;
        Ok(TurnOutcome::Stopped)
    }

    async fn say(&mut self, text: &str) -> Result<SpeakOutcome, TurnError> {
        self.set_phase(TurnPhase::Speaking);
        let outcome = self.speaker.speak(text).await?;

        let mut st = lock_state(&self.state);
        st.last_response = Some(text.to_string());
        if outcome == SpeakOutcome::Interrupted {
            st.interruptions += 1;
        }
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn set_phase(&self, phase: TurnPhase) {
        lock_state(&self.state).phase = phase;
    }

    fn finish_turn(&self, error: Option<String>) {
        let mut st = lock_state(&self.state);
        st.turns_completed += 1;
        st.last_error = error;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
