//! Append-only display log with per-client poll cursors
//!
//! The display log is the user-facing transcript, distinct from the LLM
//! context window. Concurrent runs may interleave entries, so each entry
//! carries an optional analysis id and a timestamp for causal grouping;
//! position alone is not a causality guarantee.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::Role;

/// One user-facing transcript entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayEntry {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl DisplayEntry {
    pub fn user(content: impl Into<String>, analysis_id: Option<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            analysis_id,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>, analysis_id: Option<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            analysis_id,
            timestamp: Utc::now(),
        }
    }
}

/// What a polling client gets back for one poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayUpdates {
    pub messages: Vec<DisplayEntry>,
    /// The position this poll started reading from.
    pub last_position: usize,
    /// The position after this poll; the cursor now points here.
    pub current_position: usize,
    pub has_updates: bool,
}

struct PollCursor {
    last_position: usize,
    last_seen: DateTime<Utc>,
}

/// Append-only transcript plus per-client read cursors.
pub struct DisplayLog {
    entries: Mutex<Vec<DisplayEntry>>,
    cursors: Mutex<HashMap<String, PollCursor>>,
}

impl DisplayLog {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            cursors: Mutex::new(HashMap::new()),
        }
    }

    /// Append an entry. Entries are never edited or removed.
    pub fn push(&self, entry: DisplayEntry) {
        self.entries.lock().unwrap().push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the entries a client has not seen yet and advance its
    /// cursor.
    ///
    /// `full_history` rereads from the start without breaking the cursor
    /// invariant: the cursor still only moves forward, to the current log
    /// end.
    pub fn updates_for(&self, client_id: &str, full_history: bool) -> DisplayUpdates {
        let entries = self.entries.lock().unwrap();
        let mut cursors = self.cursors.lock().unwrap();

        let now = Utc::now();
        let cursor = cursors.entry(client_id.to_string()).or_insert(PollCursor {
            last_position: 0,
            last_seen: now,
        });

        let start = if full_history { 0 } else { cursor.last_position.min(entries.len()) };
        let current_position = entries.len();
        let messages: Vec<DisplayEntry> = entries[start..].to_vec();

        // Monotonic: the cursor only ever advances.
        cursor.last_position = current_position.max(cursor.last_position);
        cursor.last_seen = now;

        DisplayUpdates {
            has_updates: !messages.is_empty(),
            messages,
            last_position: start,
            current_position,
        }
    }

    /// Drop cursors of clients that have not polled within `max_age`.
    /// Returns how many were removed. There is no automatic eviction;
    /// callers decide when to run maintenance.
    pub fn prune_stale_cursors(&self, max_age: Duration) -> usize {
        let mut cursors = self.cursors.lock().unwrap();
        let deadline = Utc::now() - max_age;
        let before = cursors.len();
        cursors.retain(|_, c| c.last_seen >= deadline);
        before - cursors.len()
    }

    #[cfg(test)]
    fn cursor_position(&self, client_id: &str) -> Option<usize> {
        self.cursors.lock().unwrap().get(client_id).map(|c| c.last_position)
    }
}

impl Default for DisplayLog {
    fn default() -> Self {
        Self::new()
    }
}
