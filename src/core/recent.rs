//! Recently-opened repository records.
//!
//! A small versioned JSON file under the user config directory: which
//! repositories were opened, when, and the last branch pair compared in each.
//! Corrupt or missing state loads as empty; persistence failures never block
//! the session.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Most records kept before the oldest is dropped.
const MAX_RECENT: usize = 10;

/// Cached config directory path.
static CONFIG_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Get the diffnote config directory (cached).
fn config_dir() -> &'static Path {
    CONFIG_DIR.get_or_init(|| {
        directories::ProjectDirs::from("", "", "diffnote")
            .map(|d| d.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".diffnote"))
    })
}

/// One recently-opened repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentRepo {
    /// Repository root path.
    pub path: String,
    /// Last-used comparison base branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_from: Option<String>,
    /// Last-used comparison target branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_to: Option<String>,
    /// Last-opened timestamp (milliseconds since epoch).
    pub opened_at_ms: u64,
}

/// Persisted state schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RecentState {
    /// Schema version for migration.
    version: u32,
    /// Records, most recently opened first.
    repos: Vec<RecentRepo>,
}

impl Default for RecentState {
    fn default() -> Self {
        Self {
            version: 1,
            repos: Vec::new(),
        }
    }
}

/// File-backed store of recently-opened repositories.
#[derive(Debug)]
pub struct RecentStore {
    state_path: PathBuf,
    state: RecentState,
}

impl RecentStore {
    /// Open the default store under the user config directory.
    /// A missing or unreadable state file loads as empty.
    #[must_use]
    pub fn open_default() -> Self {
        Self::open_at(config_dir().join("recent.json"))
    }

    /// Open a store backed by an explicit state file path.
    #[must_use]
    pub fn open_at(state_path: PathBuf) -> Self {
        let state = std::fs::read_to_string(&state_path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();
        Self { state_path, state }
    }

    /// Save state to disk using atomic write (temp file + rename).
    #[must_use = "this returns a Result that should be checked"]
    pub fn save(&self) -> io::Result<()> {
        if let Some(parent) = self.state_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp_path = self.state_path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(&self.state)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        std::fs::write(&temp_path, content)?;
        std::fs::rename(&temp_path, &self.state_path)?;

        Ok(())
    }

    /// Record that a repository was opened now. Moves an existing record to
    /// the front, preserving its remembered branch pair; drops the oldest
    /// record past the cap.
    pub fn record_open(&mut self, repo_path: &str) {
        let existing = self
            .state
            .repos
            .iter()
            .position(|r| r.path == repo_path)
            .map(|i| self.state.repos.remove(i));

        let mut record = existing.unwrap_or(RecentRepo {
            path: repo_path.to_string(),
            last_from: None,
            last_to: None,
            opened_at_ms: 0,
        });
        record.opened_at_ms = now_ms();

        self.state.repos.insert(0, record);
        self.state.repos.truncate(MAX_RECENT);
    }

    /// Remember the last branch pair compared in a repository.
    /// Unknown repositories are a no-op; record the open first.
    pub fn record_branches(&mut self, repo_path: &str, from: &str, to: &str) {
        if let Some(record) = self.state.repos.iter_mut().find(|r| r.path == repo_path) {
            record.last_from = Some(from.to_string());
            record.last_to = Some(to.to_string());
        }
    }

    /// Records, most recently opened first.
    #[must_use]
    pub fn recent(&self) -> &[RecentRepo] {
        &self.state.repos
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, RecentStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RecentStore::open_at(dir.path().join("recent.json"));
        (dir, store)
    }

    #[test]
    fn record_and_reload_round_trip() {
        let (dir, mut store) = temp_store();
        store.record_open("/repos/alpha");
        store.record_open("/repos/beta");
        store.record_branches("/repos/beta", "main", "feature");
        store.save().unwrap();

        let reloaded = RecentStore::open_at(dir.path().join("recent.json"));
        let repos = reloaded.recent();
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0].path, "/repos/beta");
        assert_eq!(repos[0].last_from.as_deref(), Some("main"));
        assert_eq!(repos[0].last_to.as_deref(), Some("feature"));
        assert_eq!(repos[1].path, "/repos/alpha");
    }

    #[test]
    fn reopening_moves_to_front_and_keeps_branches() {
        let (_dir, mut store) = temp_store();
        store.record_open("/repos/alpha");
        store.record_branches("/repos/alpha", "main", "dev");
        store.record_open("/repos/beta");
        store.record_open("/repos/alpha");

        let repos = store.recent();
        assert_eq!(repos[0].path, "/repos/alpha");
        assert_eq!(repos[0].last_from.as_deref(), Some("main"));
        assert_eq!(repos.len(), 2);
    }

    #[test]
    fn capped_at_max_records() {
        let (_dir, mut store) = temp_store();
        for i in 0..15 {
            store.record_open(&format!("/repos/r{i}"));
        }
        assert_eq!(store.recent().len(), MAX_RECENT);
        assert_eq!(store.recent()[0].path, "/repos/r14");
    }

    #[test]
    fn corrupt_state_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recent.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = RecentStore::open_at(path);
        assert!(store.recent().is_empty());
    }

    #[test]
    fn branches_for_unknown_repo_is_noop() {
        let (_dir, mut store) = temp_store();
        store.record_branches("/repos/ghost", "a", "b");
        assert!(store.recent().is_empty());
    }
}
