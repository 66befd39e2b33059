//! Turn phase and shared assistant state.
//!
//! [`TurnPhase`] follows the coordinator through one turn.  [`AssistantState`]
//! is what the coordinator publishes for observers (the binary's status log,
//! tests).  [`SharedState`] is a type alias for `Arc<Mutex<AssistantState>>`,
//! cheap to clone and safe to share across threads.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::router::Intent;

// ---------------------------------------------------------------------------
// TurnPhase
// ---------------------------------------------------------------------------

/// Where the coordinator is within a turn.
///
/// ```text
/// WaitingForWake ──wake word──▶ Listening ──text──▶ Routing ──reply──▶ Speaking
///                                        ──"stop"─▶ Stopping
///                                        ──failure─────────────────────▶ Cooldown
/// Speaking / Stopping ──▶ Cooldown ──▶ WaitingForWake
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// Before the first turn.
    Idle,
    WaitingForWake,
    /// Capturing the command.
    Listening,
    /// Waiting on a content provider.
    Routing,
    Speaking,
    /// Handling an explicit stop command.
    Stopping,
    /// Pause between turns.
    Cooldown,
}

impl TurnPhase {
    /// Returns `true` while a turn is past the wake word.
    ///
    /// ```
    /// use voice_assistant::pipeline::TurnPhase;
    ///
    /// assert!(!TurnPhase::WaitingForWake.is_busy());
    /// assert!(TurnPhase::Speaking.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            TurnPhase::Listening | TurnPhase::Routing | TurnPhase::Speaking | TurnPhase::Stopping
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            TurnPhase::Idle => "Idle",
            TurnPhase::WaitingForWake => "Waiting for wake word",
            TurnPhase::Listening => "Listening",
            TurnPhase::Routing => "Thinking",
            TurnPhase::Speaking => "Speaking",
            TurnPhase::Stopping => "Stopping",
            TurnPhase::Cooldown => "Cooldown",
        }
    }
}

impl Default for TurnPhase {
    fn default() -> Self {
        TurnPhase::Idle
    }
}

// ---------------------------------------------------------------------------
// AssistantState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct AssistantState {
    pub phase: TurnPhase,

    /// Most recent command transcript.
    pub last_transcript: Option<String>,

    /// Intent of the most recent routed command.
    pub last_intent: Option<Intent>,

    /// Most recent text handed to the speaker.
    pub last_response: Option<String>,

    /// Most recent turn error or capture failure, cleared when a turn succeeds.
    pub last_error: Option<String>,

    /// Turns that ended without a turn error (capture failures included).
    pub turns_completed: u64,

    /// Spoken responses cut short by the cancellation flag.
    pub interruptions: u64,
}

impl AssistantState {
    pub fn new() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// SharedState
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`AssistantState`].  Do not hold the lock across
/// `.await` points.
pub type SharedState = Arc<Mutex<AssistantState>>;

pub fn new_shared_state() -> SharedState {
    Arc::new(Mutex::new(AssistantState::new()))
}

/// Lock `state`, recovering the data if a previous holder panicked.
pub fn lock_state(state: &SharedState) -> MutexGuard<'_, AssistantState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waiting_is_not_busy() {
        assert!(!TurnPhase::Idle.is_busy());
        assert!(!TurnPhase::WaitingForWake.is_busy());
        assert!(!TurnPhase::Cooldown.is_busy());
    }

    #[test]
    fn turn_work_is_busy() {
        assert!(TurnPhase::Listening.is_busy());
        assert!(TurnPhase::Routing.is_busy());
        assert!(TurnPhase::Stopping.is_busy());
    }

    #[test]
    fn labels() {
        assert_eq!(TurnPhase::Routing.label(), "Thinking");
        assert_eq!(TurnPhase::WaitingForWake.label(), "Waiting for wake word");
    }

    #[test]
    fn default_state_is_idle_and_empty() {
        let state = AssistantState::default();
        assert_eq!(state.phase, TurnPhase::Idle);
        assert!(state.last_transcript.is_none());
        assert_eq!(state.turns_completed, 0);
    }

    #[test]
    fn shared_state_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedState>();
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let state = new_shared_state();
        let poisoner = Arc::clone(&state);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(state.is_poisoned());
        lock_state(&state).turns_completed = 3;
        assert_eq!(lock_state(&state).turns_completed, 3);
    }
}
