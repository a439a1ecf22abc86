//! Execution history and usage statistics.
//!
//! - [`store`]: bounded history log, per-command statistics, chain patterns
//! - [`patterns`]: hint rules that turn statistics into suggestions
//! - [`persist`]: JSON snapshots on disk and the periodic persister task

pub mod patterns;
pub mod persist;
pub mod store;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::engine::ErrorKind;

pub use persist::{spawn_persister, HistoryFiles, PersistenceError};
pub use store::HistoryStore;

/// Maximum number of entries kept in the history log.
pub const MAX_HISTORY_ENTRIES: usize = 1000;

/// One completed command invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(alias = "actionId")]
    pub command_id: String,
    /// Local time, ISO-8601 without offset.
    pub timestamp: String,
    pub success: bool,
    pub execution_time_ms: u64,
    #[serde(default, alias = "errorType", skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Commands that followed this one in the same chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chained_with: Option<Vec<String>>,
}

/// Aggregated statistics for one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandStats {
    #[serde(alias = "actionId")]
    pub command_id: String,
    pub execution_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    /// Running average, updated incrementally with integer arithmetic.
    pub average_time_ms: u64,
    pub last_used: String,
    #[serde(default)]
    pub commonly_chained_with: BTreeMap<String, u64>,
}

impl CommandStats {
    fn first(entry: &HistoryEntry) -> Self {
        let mut stats = Self {
            command_id: entry.command_id.clone(),
            execution_count: 0,
            success_count: 0,
            failure_count: 0,
            average_time_ms: 0,
            last_used: entry.timestamp.clone(),
            commonly_chained_with: BTreeMap::new(),
        };
        stats.apply(entry);
        stats
    }

    /// Fold one more entry into the aggregate.
    fn apply(&mut self, entry: &HistoryEntry) {
        let new_count = self.execution_count.saturating_add(1);
        self.average_time_ms = self
            .average_time_ms
            .saturating_mul(self.execution_count)
            .saturating_add(entry.execution_time_ms)
            / new_count;
        self.execution_count = new_count;
        if entry.success {
            self.success_count = self.success_count.saturating_add(1);
        } else {
            self.failure_count = self.failure_count.saturating_add(1);
        }
        self.last_used = entry.timestamp.clone();
        for chained in entry.chained_with.iter().flatten() {
            let count = self.commonly_chained_with.entry(chained.clone()).or_insert(0);
            *count = count.saturating_add(1);
        }
    }
}

/// A frequently executed chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsagePattern {
    pub sequence: Vec<String>,
    pub frequency: u64,
    pub average_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}
