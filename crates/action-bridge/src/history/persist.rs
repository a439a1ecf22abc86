//! On-disk snapshots of history and statistics.
//!
//! Two JSON documents live under one directory: `history.json` (a list of
//! entries, oldest first) and `stats.json` (command id to statistics). Each
//! save rewrites a document wholesale through a temporary file and a rename.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::store::HistoryStore;
use super::{CommandStats, HistoryEntry};

const DATA_DIR_NAME: &str = ".intellij-actions";
const HISTORY_FILE_NAME: &str = "history.json";
const STATS_FILE_NAME: &str = "stats.json";

/// Failure to read or write a snapshot.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PersistenceError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Locations of the two snapshot documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryFiles {
    pub history: PathBuf,
    pub stats: PathBuf,
}

impl HistoryFiles {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            history: dir.join(HISTORY_FILE_NAME),
            stats: dir.join(STATS_FILE_NAME),
        }
    }

    /// `~/.intellij-actions`, if the home directory is known.
    pub fn default_location() -> Option<Self> {
        dirs::home_dir().map(|home| Self::in_dir(home.join(DATA_DIR_NAME)))
    }

    /// Load persisted history. A missing file is an empty history.
    pub fn load_history(&self) -> Result<Vec<HistoryEntry>, PersistenceError> {
        read_json(&self.history).map(Option::unwrap_or_default)
    }

    /// Load persisted statistics. A missing file is an empty map.
    pub fn load_stats(&self) -> Result<BTreeMap<String, CommandStats>, PersistenceError> {
        read_json(&self.stats).map(Option::unwrap_or_default)
    }

    pub fn save_history(&self, entries: &[HistoryEntry]) -> Result<(), PersistenceError> {
        write_json(&self.history, entries)
    }

    pub fn save_stats(
        &self,
        stats: &BTreeMap<String, CommandStats>,
    ) -> Result<(), PersistenceError> {
        write_json(&self.stats, stats)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, PersistenceError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(PersistenceError::io(path, e)),
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| PersistenceError::json(path, e))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, e))?;
    }

    let json = serde_json::to_vec_pretty(value).map_err(|e| PersistenceError::json(path, e))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|e| PersistenceError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| PersistenceError::io(path, e))?;
    Ok(())
}

/// Persist `store` every `period` until the task is aborted.
///
/// The first snapshot is taken one full period after start.
pub fn spawn_persister(store: Arc<HistoryStore>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let store = Arc::clone(&store);
            match tokio::task::spawn_blocking(move || store.persist()).await {
                Ok(()) => debug!("Periodic history snapshot written"),
                Err(e) => warn!(error = %e, "History persister task failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> HistoryEntry {
        HistoryEntry {
            command_id: id.to_string(),
            timestamp: "2026-03-01T10:00:00.000".to_string(),
            success: true,
            execution_time_ms: 12,
            error_kind: None,
            chained_with: Some(vec!["ReformatCode".to_string()]),
        }
    }

    #[test]
    fn test_missing_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let files = HistoryFiles::in_dir(dir.path().join("nested"));
        assert!(files.load_history().unwrap().is_empty());
        assert!(files.load_stats().unwrap().is_empty());
    }

    #[test]
    fn test_save_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let files = HistoryFiles::in_dir(dir.path().join("data"));

        files.save_history(&[entry("SaveAll"), entry("Git.Pull")]).unwrap();
        files.save_history(&[entry("CompileProject")]).unwrap();

        let loaded = files.load_history().unwrap();
        assert_eq!(loaded, vec![entry("CompileProject")]);
        assert!(!files.history.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let files = HistoryFiles::in_dir(dir.path());
        fs::write(&files.stats, "{ not json").unwrap();
        assert!(matches!(files.load_stats(), Err(PersistenceError::Json { .. })));
    }

    #[test]
    fn test_legacy_field_names_load() {
        let dir = tempfile::tempdir().unwrap();
        let files = HistoryFiles::in_dir(dir.path());
        fs::write(
            &files.history,
            r#"[{"actionId":"Git.Pull","timestamp":"2025-01-01T00:00:00","success":false,
                "executionTimeMs":40,"errorType":"GIT_REPOSITORY_REQUIRED","chainedWith":null}]"#,
        )
        .unwrap();
        let loaded = files.load_history().unwrap();
        assert_eq!(loaded[0].command_id, "Git.Pull");
        assert_eq!(
            loaded[0].error_kind,
            Some(crate::engine::ErrorKind::RepositoryRequired)
        );
    }
}
