//! Intent routing.
//!
//! * [`classify`] / [`Intent`]: keyword classification (stop, news, weather, conversation).
//! * [`ConversationHistory`]: bounded FIFO of chat messages.
//! * [`IntentRouter`]: dispatches an utterance to its provider and returns the text to speak.

pub mod dispatch;
pub mod history;
pub mod intent;

pub use dispatch::{IntentRouter, RoutedResponse};
pub use history::{ConversationHistory, DEFAULT_HISTORY_CAPACITY};
pub use intent::{classify, contains_keyword, Intent};
