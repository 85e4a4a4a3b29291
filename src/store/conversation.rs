//! Rolling conversation history used as LLM context

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::agent::Message;

/// Bounded rolling message history.
///
/// Holds the user/assistant exchanges fed back to the LLM as context.
/// Tool traffic never lands here; it lives only in a run's transient
/// transcript.
pub struct ConversationStore {
    max_messages: usize,
    messages: Mutex<VecDeque<Message>>,
}

impl ConversationStore {
    pub fn new(max_messages: usize) -> Self {
        Self {
            max_messages: max_messages.max(2),
            messages: Mutex::new(VecDeque::new()),
        }
    }

    /// Record one completed exchange: exactly one user and one assistant
    /// message, trimming the oldest entries past the bound.
    pub fn record_exchange(&self, user: &str, assistant: &str) {
        let mut messages = self.messages.lock().unwrap();
        messages.push_back(Message::user(user));
        messages.push_back(Message::assistant(assistant));
        while messages.len() > self.max_messages {
            messages.pop_front();
        }
    }

    /// Snapshot the current history for transcript assembly.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.lock().unwrap().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all history and return how many messages were dropped.
    pub fn clear(&self) -> usize {
        let mut messages = self.messages.lock().unwrap();
        let dropped = messages.len();
        messages.clear();
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Role;

    #[test]
    fn test_record_and_snapshot() {
        let store = ConversationStore::new(40);
        store.record_exchange("hi", "hello");

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].role, Role::User);
        assert_eq!(snapshot[1].role, Role::Assistant);
        assert_eq!(snapshot[1].content, "hello");
    }

    #[test]
    fn test_trims_oldest_past_bound() {
        let store = ConversationStore::new(4);
        for i in 0..5 {
            store.record_exchange(&format!("q{}", i), &format!("a{}", i));
        }

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 4);
        assert_eq!(snapshot[0].content, "q3");
        assert_eq!(snapshot[3].content, "a4");
    }

    #[test]
    fn test_clear() {
        let store = ConversationStore::new(40);
        store.record_exchange("hi", "hello");
        assert_eq!(store.clear(), 2);
        assert!(store.is_empty());
    }
}
