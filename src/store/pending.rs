//! Registry for analyses whose explanation is produced asynchronously

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A background analysis result as seen by pollers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingResult {
    pub analysis_id: String,
    pub brief_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    pub is_pending: bool,
    pub created_at: DateTime<Utc>,
}

struct Slot {
    brief_message: String,
    response: Option<String>,
    consumed: bool,
    created_at: DateTime<Utc>,
}

impl Slot {
    fn to_result(&self, analysis_id: &str) -> PendingResult {
        PendingResult {
            analysis_id: analysis_id.to_string(),
            brief_message: self.brief_message.clone(),
            response: self.response.clone(),
            is_pending: self.response.is_none(),
            created_at: self.created_at,
        }
    }
}

/// Keyed storage for asynchronously produced analysis explanations.
///
/// Each id transitions pending → complete at most once, and a completed
/// result is handed out at most once.
pub struct PendingResultRegistry {
    slots: Mutex<HashMap<String, Slot>>,
}

impl PendingResultRegistry {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Register a new pending analysis. A no-op if the id is already
    /// known.
    pub fn register(&self, analysis_id: &str, brief_message: &str) {
        let mut slots = self.slots.lock().unwrap();
        slots.entry(analysis_id.to_string()).or_insert_with(|| Slot {
            brief_message: brief_message.to_string(),
            response: None,
            consumed: false,
            created_at: Utc::now(),
        });
    }

    /// Complete a pending analysis. Idempotent: unknown ids and already
    /// completed entries are left untouched.
    pub fn complete(&self, analysis_id: &str, response: &str) {
        let mut slots = self.slots.lock().unwrap();
        match slots.get_mut(analysis_id) {
            Some(slot) if slot.response.is_none() => {
                slot.response = Some(response.to_string());
            }
            Some(_) => debug!("Ignoring duplicate completion for {}", analysis_id),
            None => debug!("Ignoring completion for unknown analysis {}", analysis_id),
        }
    }

    /// Retrieve a result by id.
    ///
    /// A still-pending entry is reported (`is_pending == true`) without
    /// being consumed. A completed entry is returned exactly once and
    /// marked consumed; later calls return `None`, as do unknown ids.
    pub fn take(&self, analysis_id: &str) -> Option<PendingResult> {
        let mut slots = self.slots.lock().unwrap();
        let slot = slots.get_mut(analysis_id)?;

        if slot.consumed {
            return None;
        }
        if slot.response.is_some() {
            slot.consumed = true;
        }
        Some(slot.to_result(analysis_id))
    }

    /// All analyses still awaiting completion. Non-destructive.
    pub fn list_pending(&self) -> Vec<PendingResult> {
        let slots = self.slots.lock().unwrap();
        let mut pending: Vec<PendingResult> = slots
            .iter()
            .filter(|(_, slot)| slot.response.is_none())
            .map(|(id, slot)| slot.to_result(id))
            .collect();
        pending.sort_by_key(|p| p.created_at);
        pending
    }

    pub fn len(&self) -> usize {
        self.slots.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop consumed entries older than `max_age`. Returns how many were
    /// removed. There is no automatic eviction; callers decide when to
    /// run maintenance.
    pub fn prune_consumed(&self, max_age: Duration) -> usize {
        let mut slots = self.slots.lock().unwrap();
        let deadline = Utc::now() - max_age;
        let before = slots.len();
        slots.retain(|_, slot| !(slot.consumed && slot.created_at < deadline));
        before - slots.len()
    }
}

impl Default for PendingResultRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_pending_complete_consume() {
        let registry = PendingResultRegistry::new();
        registry.register("a1", "working on it");

        // Pending: reported but not consumed.
        let peek = registry.take("a1").unwrap();
        assert!(peek.is_pending);
        assert!(peek.response.is_none());
        assert!(registry.take("a1").is_some());

        registry.complete("a1", "done text");

        // Completed: handed out exactly once.
        let taken = registry.take("a1").unwrap();
        assert!(!taken.is_pending);
        assert_eq!(taken.response.as_deref(), Some("done text"));
        assert!(registry.take("a1").is_none());
    }

    #[test]
    fn test_take_unknown_id() {
        let registry = PendingResultRegistry::new();
        assert!(registry.take("ghost").is_none());
    }

    #[test]
    fn test_complete_is_idempotent() {
        let registry = PendingResultRegistry::new();
        registry.register("a1", "brief");
        registry.complete("a1", "first");
        registry.complete("a1", "second");
        registry.complete("unknown", "ignored");

        let taken = registry.take("a1").unwrap();
        assert_eq!(taken.response.as_deref(), Some("first"));
    }

    #[test]
    fn test_list_pending_is_non_destructive() {
        let registry = PendingResultRegistry::new();
        registry.register("a1", "one");
        registry.register("a2", "two");
        registry.complete("a2", "finished");

        let pending = registry.list_pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].analysis_id, "a1");

        // Listing twice gives the same view.
        assert_eq!(registry.list_pending().len(), 1);
    }

    #[test]
    fn test_prune_consumed() {
        let registry = PendingResultRegistry::new();
        registry.register("a1", "brief");
        registry.complete("a1", "done");
        registry.take("a1");

        // Not old enough yet.
        assert_eq!(registry.prune_consumed(Duration::hours(1)), 0);
        // Old enough now.
        assert_eq!(registry.prune_consumed(Duration::seconds(-1)), 1);
        assert!(registry.is_empty());
    }
}
