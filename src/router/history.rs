//! Bounded conversation memory.
//!
//! [`ConversationHistory`] keeps the most recent chat messages, oldest
//! first.  Once the capacity is exceeded the oldest entries are dropped, so
//! the length never exceeds the capacity.

use std::collections::VecDeque;

use crate::providers::ChatMessage;

/// Default number of messages kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

#[derive(Debug, Clone)]
pub struct ConversationHistory {
    entries: VecDeque<ChatMessage>,
    capacity: usize,
}

impl ConversationHistory {
    /// A capacity of zero is raised to one so the latest turn is always kept.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.entries.push_back(message);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Copy of the entries, oldest first.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.entries.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::Role;

    #[test]
    fn starts_empty() {
        let history = ConversationHistory::default();
        assert!(history.is_empty());
        assert_eq!(history.capacity(), 10);
    }

    #[test]
    fn never_exceeds_capacity_and_evicts_fifo() {
        let mut history = ConversationHistory::default();
        for i in 0..25 {
            history.push(ChatMessage::user(format!("q{i}")));
            history.push(ChatMessage::assistant(format!("a{i}")));
            assert!(history.len() <= 10);
        }

        let contents: Vec<String> = history.iter().map(|m| m.content.clone()).collect();
        assert_eq!(contents.first().map(String::as_str), Some("q20"));
        assert_eq!(contents.last().map(String::as_str), Some("a24"));
        assert_eq!(history.len(), 10);
    }

    #[test]
    fn order_is_preserved() {
        let mut history = ConversationHistory::with_capacity(3);
        history.push(ChatMessage::user("one"));
        history.push(ChatMessage::assistant("two"));
        history.push(ChatMessage::user("three"));
        history.push(ChatMessage::assistant("four"));

        let messages = history.messages();
        assert_eq!(messages[0], ChatMessage::assistant("two"));
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[2].content, "four");
    }

    #[test]
    fn zero_capacity_keeps_latest() {
        let mut history = ConversationHistory::with_capacity(0);
        history.push(ChatMessage::user("a"));
        history.push(ChatMessage::user("b"));
        assert_eq!(history.messages(), vec![ChatMessage::user("b")]);
    }

    #[test]
    fn clear_empties() {
        let mut history = ConversationHistory::default();
        history.push(ChatMessage::user("hello"));
        history.clear();
        assert!(history.is_empty());
    }
}
