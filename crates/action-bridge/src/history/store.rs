//! The history and statistics store.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, PoisonError, RwLock};

use chrono::Local;
use tracing::{debug, info, warn};

use crate::engine::{CommandClassifier, ErrorKind};
use crate::result_ext::ResultExt;

use super::patterns::{self, DEFAULT_MIN_FREQUENCY};
use super::persist::{HistoryFiles, PersistenceError};
use super::{CommandStats, HistoryEntry, UsagePattern, MAX_HISTORY_ENTRIES};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Bounded execution log with incrementally maintained statistics.
///
/// The store is the only writer of its three collections. Each collection
/// has its own lock, so a reader may see the log already trimmed but the
/// statistics not yet updated for the same record.
#[derive(Debug)]
pub struct HistoryStore {
    history: Mutex<VecDeque<HistoryEntry>>,
    stats: RwLock<BTreeMap<String, CommandStats>>,
    patterns: RwLock<HashMap<String, u64>>,
    max_entries: usize,
    classifier: CommandClassifier,
    files: Option<HistoryFiles>,
}

impl HistoryStore {
    /// A store that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            history: Mutex::new(VecDeque::new()),
            stats: RwLock::new(BTreeMap::new()),
            patterns: RwLock::new(HashMap::new()),
            max_entries: MAX_HISTORY_ENTRIES,
            classifier: CommandClassifier::new(),
            files: None,
        }
    }

    /// A store backed by `files`, loaded from whatever is already there.
    ///
    /// Unreadable or corrupt files are logged and the affected collection
    /// starts empty.
    pub fn open(files: HistoryFiles) -> Self {
        let mut store = Self::in_memory();

        let entries = files
            .load_history()
            .log("Loading persisted history")
            .unwrap_or_default();
        let stats = files
            .load_stats()
            .log("Loading persisted statistics")
            .unwrap_or_default();

        info!(
            entries = entries.len(),
            commands = stats.len(),
            path = %files.history.display(),
            "Loaded command history"
        );

        store.files = Some(files);
        store.replace_contents(entries, stats);
        store
    }

    /// Cap the log at `max_entries`, dropping the oldest entries.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        let mut history = self.lock_history();
        trim_front(&mut history, self.max_entries);
        drop(history);
        self
    }

    pub fn with_classifier(mut self, classifier: CommandClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn files(&self) -> Option<&HistoryFiles> {
        self.files.as_ref()
    }

    fn replace_contents(&self, entries: Vec<HistoryEntry>, stats: BTreeMap<String, CommandStats>) {
        let skip = entries.len().saturating_sub(self.max_entries);
        let entries: VecDeque<HistoryEntry> = entries.into_iter().skip(skip).collect();

        // Pattern counters are not persisted; rebuild them from the log.
        let mut patterns = HashMap::new();
        for entry in &entries {
            if let Some(key) = entry_pattern_key(entry) {
                *patterns.entry(key).or_insert(0) += 1;
            }
        }

        *self.lock_history() = entries;
        *self.stats.write().unwrap_or_else(PoisonError::into_inner) = stats;
        *self.patterns.write().unwrap_or_else(PoisonError::into_inner) = patterns;
    }

    fn lock_history(&self) -> std::sync::MutexGuard<'_, VecDeque<HistoryEntry>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record one completed invocation.
    pub fn record(
        &self,
        id: &str,
        success: bool,
        elapsed_ms: u64,
        error_kind: Option<ErrorKind>,
        chained_with: Option<Vec<String>>,
    ) {
        let entry = HistoryEntry {
            command_id: id.to_string(),
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            success,
            execution_time_ms: elapsed_ms,
            error_kind,
            chained_with,
        };

        {
            let mut history = self.lock_history();
            history.push_back(entry.clone());
            trim_front(&mut history, self.max_entries);
        }

        {
            let mut stats = self.stats.write().unwrap_or_else(PoisonError::into_inner);
            match stats.get_mut(id) {
                Some(current) => current.apply(&entry),
                None => {
                    stats.insert(id.to_string(), CommandStats::first(&entry));
                }
            }
        }

        if let Some(key) = entry_pattern_key(&entry) {
            let mut patterns = self.patterns.write().unwrap_or_else(PoisonError::into_inner);
            *patterns.entry(key).or_insert(0) += 1;
        }

        debug!(command = %id, success, elapsed_ms, "Recorded execution");
    }

    /// Up to `limit` entries, most recent first.
    pub fn recent_history(&self, limit: usize) -> Vec<HistoryEntry> {
        self.lock_history().iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock_history().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Most executed commands first.
    pub fn top_commands(&self, limit: usize) -> Vec<CommandStats> {
        let stats = self.stats.read().unwrap_or_else(PoisonError::into_inner);
        let mut top: Vec<CommandStats> = stats.values().cloned().collect();
        top.sort_by(|a, b| b.execution_count.cmp(&a.execution_count));
        top.truncate(limit);
        top
    }

    pub fn stats_for(&self, id: &str) -> Option<CommandStats> {
        self.stats
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Chains seen at least `min_frequency` times, most frequent first.
    pub fn common_patterns(&self, min_frequency: u64) -> Vec<UsagePattern> {
        let frequent: Vec<(String, u64)> = self
            .patterns
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, count)| **count >= min_frequency)
            .map(|(key, count)| (key.clone(), *count))
            .collect();

        let history = self.lock_history();
        let mut result: Vec<UsagePattern> = frequent
            .into_iter()
            .map(|(key, frequency)| {
                let sequence = patterns::split_pattern_key(&key);
                let (head, tail) = sequence.split_first().map_or(("", &[][..]), |(h, t)| (h.as_str(), t));

                let times: Vec<u64> = history
                    .iter()
                    .filter(|e| e.command_id == head && e.chained_with.as_deref() == Some(tail))
                    .map(|e| e.execution_time_ms)
                    .collect();
                let average_time_ms = if times.is_empty() {
                    0
                } else {
                    times.iter().fold(0u64, |sum, t| sum.saturating_add(*t)) / times.len() as u64
                };

                let suggestion = patterns::pattern_hint(&sequence, frequency, &self.classifier)
                    .map(str::to_string);
                UsagePattern {
                    sequence,
                    frequency,
                    average_time_ms,
                    suggestion,
                }
            })
            .collect();
        drop(history);

        result.sort_by(|a, b| {
            b.frequency
                .cmp(&a.frequency)
                .then_with(|| a.sequence.cmp(&b.sequence))
        });
        result
    }

    /// Human readable hints: pattern hints, frequent failures, slow commands.
    pub fn suggestions(&self) -> Vec<String> {
        let mut suggestions: Vec<String> = self
            .common_patterns(DEFAULT_MIN_FREQUENCY)
            .into_iter()
            .filter_map(|pattern| pattern.suggestion)
            .collect();

        let stats = self.stats.read().unwrap_or_else(PoisonError::into_inner);
        suggestions.extend(stats.values().filter_map(patterns::failure_hint));
        suggestions.extend(patterns::slow_commands_hint(stats.values()));
        suggestions
    }

    /// Forget everything and persist the empty state.
    pub fn clear(&self) {
        self.lock_history().clear();
        self.stats.write().unwrap_or_else(PoisonError::into_inner).clear();
        self.patterns.write().unwrap_or_else(PoisonError::into_inner).clear();
        self.persist();
        info!("History and statistics cleared");
    }

    /// Write both snapshots, logging failures.
    pub fn persist(&self) {
        let _ = self.try_persist().log("Persisting command history");
    }

    /// Write both snapshots. A store without files is a no-op.
    pub fn try_persist(&self) -> Result<(), PersistenceError> {
        let Some(files) = &self.files else {
            return Ok(());
        };

        let entries: Vec<HistoryEntry> = self.lock_history().iter().cloned().collect();
        files.save_history(&entries)?;

        let stats = self.stats.read().unwrap_or_else(PoisonError::into_inner).clone();
        files.save_stats(&stats)?;

        debug!(entries = entries.len(), commands = stats.len(), "Persisted command history");
        Ok(())
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

fn entry_pattern_key(entry: &HistoryEntry) -> Option<String> {
    match entry.chained_with.as_deref() {
        Some(chained) if !chained.is_empty() => {
            Some(patterns::pattern_key(&entry.command_id, chained))
        }
        _ => None,
    }
}

fn trim_front(history: &mut VecDeque<HistoryEntry>, max_entries: usize) {
    let excess = history.len().saturating_sub(max_entries);
    if excess > 0 {
        history.drain(..excess);
        if excess > 1 {
            warn!(dropped = excess, "History trimmed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(ids: &[&str]) -> Option<Vec<String>> {
        Some(ids.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_fifo_bound() {
        let store = HistoryStore::in_memory();
        for i in 0..1001 {
            store.record(&format!("Cmd{}", i), true, 1, None, None);
        }
        let recent = store.recent_history(1001);
        assert_eq!(recent.len(), 1000);
        assert_eq!(recent[0].command_id, "Cmd1000");
        assert!(recent.iter().all(|e| e.command_id != "Cmd0"));
        assert_eq!(recent.last().unwrap().command_id, "Cmd1");
    }

    #[test]
    fn test_running_average() {
        let store = HistoryStore::in_memory();
        for sample in [100, 200, 300] {
            store.record("X", true, sample, None, None);
        }
        assert_eq!(store.stats_for("X").unwrap().average_time_ms, 200);

        store.record("Y", true, 1, None, None);
        store.record("Y", true, 2, None, None);
        assert_eq!(store.stats_for("Y").unwrap().average_time_ms, 1);
        store.record("Y", true, 3, None, None);
        assert_eq!(store.stats_for("Y").unwrap().average_time_ms, 1);
    }

    #[test]
    fn test_counts_and_chained_frequencies() {
        let store = HistoryStore::in_memory();
        store.record("SaveAll", true, 5, None, chain(&["ReformatCode"]));
        store.record("SaveAll", false, 5, Some(ErrorKind::Disabled), chain(&["ReformatCode", "Git.Push"]));
        store.record("SaveAll", true, 5, None, None);

        let stats = store.stats_for("SaveAll").unwrap();
        assert_eq!(stats.execution_count, 3);
        assert_eq!(stats.success_count, 2);
        assert_eq!(stats.failure_count, 1);
        assert_eq!(stats.commonly_chained_with["ReformatCode"], 2);
        assert_eq!(stats.commonly_chained_with["Git.Push"], 1);
        assert!(store.stats_for("ReformatCode").is_none());
    }

    #[test]
    fn test_top_commands_sorted() {
        let store = HistoryStore::in_memory();
        for _ in 0..3 {
            store.record("B", true, 1, None, None);
        }
        store.record("A", true, 1, None, None);
        for _ in 0..2 {
            store.record("C", true, 1, None, None);
        }
        let top: Vec<String> = store.top_commands(2).into_iter().map(|s| s.command_id).collect();
        assert_eq!(top, vec!["B", "C"]);
    }

    #[test]
    fn test_common_patterns_and_suggestions() {
        let store = HistoryStore::in_memory();
        for elapsed in [10, 20, 30] {
            store.record("SaveAll", true, elapsed, None, chain(&["$Copy"]));
        }
        store.record("SaveAll", true, 99, None, chain(&["ReformatCode"]));

        let patterns = store.common_patterns(DEFAULT_MIN_FREQUENCY);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].sequence, vec!["SaveAll", "$Copy"]);
        assert_eq!(patterns[0].frequency, 3);
        assert_eq!(patterns[0].average_time_ms, 20);
        assert_eq!(
            patterns[0].suggestion.as_deref(),
            Some("This sequence executes instantly with smart delays")
        );

        for _ in 0..2 {
            store.record("Git.Pull", false, 5, Some(ErrorKind::RepositoryRequired), None);
        }
        let suggestions = store.suggestions();
        assert_eq!(suggestions.len(), 2);
        assert!(suggestions[1].starts_with("Command 'Git.Pull' fails frequently (2/2)"));
    }

    #[test]
    fn test_clear() {
        let store = HistoryStore::in_memory();
        store.record("SaveAll", true, 1, None, chain(&["SaveAll"]));
        store.clear();
        assert!(store.is_empty());
        assert!(store.stats_for("SaveAll").is_none());
        assert!(store.common_patterns(1).is_empty());
    }

    #[test]
    fn test_persist_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let files = HistoryFiles::in_dir(dir.path());

        let store = HistoryStore::open(files.clone());
        for _ in 0..3 {
            store.record("SaveAll", true, 4, None, chain(&["ReformatCode"]));
        }
        store.try_persist().unwrap();

        let reopened = HistoryStore::open(files);
        assert_eq!(reopened.len(), 3);
        assert_eq!(reopened.stats_for("SaveAll").unwrap().execution_count, 3);
        assert_eq!(reopened.common_patterns(3)[0].frequency, 3);
    }

    #[test]
    fn test_open_keeps_last_entries_and_survives_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let files = HistoryFiles::in_dir(dir.path());
        let store = HistoryStore::open(files.clone()).with_max_entries(5);
        for i in 0..5 {
            store.record(&format!("Cmd{}", i), true, 1, None, None);
        }
        store.try_persist().unwrap();

        let small = HistoryStore::open(files.clone()).with_max_entries(2);
        let ids: Vec<String> = small.recent_history(10).into_iter().map(|e| e.command_id).collect();
        assert_eq!(ids, vec!["Cmd4", "Cmd3"]);

        std::fs::write(&files.history, "garbage").unwrap();
        let recovered = HistoryStore::open(files);
        assert!(recovered.is_empty());
        assert_eq!(recovered.stats_for("Cmd0").unwrap().execution_count, 1);
    }

    #[test]
    fn test_oversized_persisted_stats_do_not_overflow() {
        let dir = tempfile::tempdir().unwrap();
        let files = HistoryFiles::in_dir(dir.path());
        std::fs::write(
            &files.stats,
            format!(
                r#"{{"SaveAll":{{"commandId":"SaveAll","executionCount":{max},"successCount":{max},
                "failureCount":0,"averageTimeMs":{max},"lastUsed":"2026-03-01T10:00:00.000"}}}}"#,
                max = u64::MAX
            ),
        )
        .unwrap();

        let store = HistoryStore::open(files);
        store.record("SaveAll", true, 10, None, None);
        store.record("SaveAll", false, 10, None, None);

        let stats = store.stats_for("SaveAll").unwrap();
        assert_eq!(stats.execution_count, u64::MAX);
        assert_eq!(stats.success_count, u64::MAX);
        assert_eq!(stats.failure_count, 1);
        assert_eq!(stats.average_time_ms, 1);
    }
}
