//! Persisted index types.
//!
//! Serialized as a single pretty-printed JSON document (`index.json`).

use crate::fs::DIGEST_ALGORITHM;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One retained backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupEntry {
    pub id: String,
    /// Name of the content file inside the backup directory
    pub filename: String,
    pub content_digest: String,
    pub fast_signature: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub is_automatic: bool,
    #[serde(default)]
    pub source_path: String,
    pub last_modified_at: DateTime<Utc>,
}

/// The whole catalogue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexState {
    #[serde(default)]
    pub target_path: String,
    #[serde(default)]
    pub digest_algorithm: String,
    /// Fast signature last observed on the target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_signature: Option<String>,
    #[serde(default)]
    pub entries: Vec<BackupEntry>,
    /// Derived label -> id map; rebuilt from `entries` on every normalize
    #[serde(default)]
    pub label_index: BTreeMap<String, String>,
}

impl IndexState {
    /// Fill descriptive defaults and re-derive the label index.
    ///
    /// Returns `true` when the stored label index disagreed with `entries`.
    pub fn normalize(&mut self, target: &Path) -> bool {
        if self.digest_algorithm.is_empty() {
            self.digest_algorithm = DIGEST_ALGORITHM.to_string();
        }
        if self.target_path.is_empty() {
            self.target_path = target.to_string_lossy().into_owned();
        }
        if matches!(self.latest_signature.as_deref(), Some("")) {
            self.latest_signature = None;
        }
        for entry in &mut self.entries {
            if matches!(entry.label.as_deref(), Some("")) {
                entry.label = None;
            }
        }

        let derived: BTreeMap<String, String> = self
            .entries
            .iter()
            .filter_map(|e| e.label.clone().map(|label| (label, e.id.clone())))
            .collect();
        let drifted = derived != self.label_index;
        self.label_index = derived;
        drifted
    }

    pub fn entry(&self, id: &str) -> Option<&BackupEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn entry_mut(&mut self, id: &str) -> Option<&mut BackupEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    pub fn find_by_digest(&self, digest: &str) -> Option<&BackupEntry> {
        self.entries.iter().find(|e| e.content_digest == digest)
    }

    /// Id of the entry currently holding `label`.
    pub fn label_owner(&self, label: &str) -> Option<&str> {
        self.label_index.get(label).map(String::as_str)
    }

    /// Entry with the most recent creation time.
    pub fn newest_entry(&self) -> Option<&BackupEntry> {
        self.entries.iter().max_by_key(|e| e.created_at)
    }

    /// Entries ordered newest first.
    pub fn sorted_entries(&self) -> Vec<BackupEntry> {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries
    }
}
