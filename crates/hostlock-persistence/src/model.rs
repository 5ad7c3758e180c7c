//! Persisted model types
//!
//! The lock record is a singleton: exactly one exists for the whole system,
//! created with `LockRecord::initial()` the first time the store is read
//! empty, and mutated only by the lock manager.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel filename meaning "no save has ever been uploaded".
pub const SAVED_FILENAME_INIT: &str = "init";

/// Lock state of the shared save
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockState {
    Free,
    Locked,
}

/// The singleton coordination record
///
/// `holder` and `acquired_at` are set while `state` is `Locked` and cleared
/// on release. `saved_filename` names the canonical blob; after at least one
/// successful release it always refers to a blob that exists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LockRecord {
    pub state: LockState,
    pub holder: Option<String>,
    pub saved_filename: String,
    pub acquired_at: Option<DateTime<Utc>>,
}

impl LockRecord {
    /// The record as created at provisioning time: free, no save yet.
    pub fn initial() -> Self {
        LockRecord {
            state: LockState::Free,
            holder: None,
            saved_filename: SAVED_FILENAME_INIT.to_string(),
            acquired_at: None,
        }
    }

    pub fn is_free(&self) -> bool {
        self.state == LockState::Free
    }

    /// Returns true while no save has ever been stored.
    pub fn is_uninitialized(&self) -> bool {
        self.saved_filename == SAVED_FILENAME_INIT
    }

    /// Transition free -> locked under the given holder.
    pub fn lock(&mut self, holder: &str, at: DateTime<Utc>) {
        self.state = LockState::Locked;
        self.holder = Some(holder.to_string());
        self.acquired_at = Some(at);
    }

    /// Transition locked -> free, recording the newly stored blob name.
    pub fn unlock(&mut self, saved_filename: &str) {
        self.state = LockState::Free;
        self.holder = None;
        self.acquired_at = None;
        self.saved_filename = saved_filename.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_record() {
        let record = LockRecord::initial();
        assert!(record.is_free());
        assert!(record.is_uninitialized());
        assert_eq!(record.holder, None);
    }

    #[test]
    fn test_lock_unlock_cycle() {
        let mut record = LockRecord::initial();
        record.lock("alice", Utc::now());
        assert!(!record.is_free());
        assert_eq!(record.holder.as_deref(), Some("alice"));
        assert!(record.acquired_at.is_some());

        record.unlock("save-v2.zip");
        assert!(record.is_free());
        assert_eq!(record.holder, None);
        assert_eq!(record.acquired_at, None);
        assert_eq!(record.saved_filename, "save-v2.zip");
        assert!(!record.is_uninitialized());
    }

    #[test]
    fn test_record_json_round_trip() {
        let mut record = LockRecord::initial();
        record.lock("bob", Utc::now());

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"locked\""));

        let parsed: LockRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }
}
