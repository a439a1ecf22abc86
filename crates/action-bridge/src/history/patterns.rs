//! Suggestion rules derived from usage statistics.

use crate::engine::CommandClassifier;

use super::CommandStats;

/// Patterns seen fewer times than this are not reported.
pub const DEFAULT_MIN_FREQUENCY: u64 = 3;

const ALIAS_MIN_FREQUENCY: u64 = 10;
const ALIAS_MIN_LENGTH: usize = 3;
const SLOW_AVERAGE_MS: u64 = 1000;
const SLOW_MIN_EXECUTIONS: u64 = 5;
const SLOW_REPORT_LIMIT: usize = 3;

type PatternRule = fn(&[String], u64, &CommandClassifier) -> bool;

/// Pattern hints, first match wins.
const PATTERN_RULES: &[(PatternRule, &str)] = &[
    (
        |sequence, frequency, _| {
            frequency >= ALIAS_MIN_FREQUENCY && sequence.len() >= ALIAS_MIN_LENGTH
        },
        "Consider creating an alias for this frequently used sequence",
    ),
    (
        |sequence, _, _| {
            sequence
                .windows(2)
                .any(|pair| pair[0].starts_with("Save") && pair[1].starts_with("Save"))
        },
        "Duplicate save detected - consider removing redundant saves",
    ),
    (
        |sequence, _, classifier| sequence.iter().all(|id| classifier.is_instant(id)),
        "This sequence executes instantly with smart delays",
    ),
];

/// Key under which a chain is counted.
pub fn pattern_key(id: &str, chained_with: &[String]) -> String {
    std::iter::once(id)
        .chain(chained_with.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(",")
}

/// Inverse of [`pattern_key`].
pub fn split_pattern_key(key: &str) -> Vec<String> {
    key.split(',').map(str::to_string).collect()
}

pub fn pattern_hint(
    sequence: &[String],
    frequency: u64,
    classifier: &CommandClassifier,
) -> Option<&'static str> {
    PATTERN_RULES
        .iter()
        .find(|(rule, _)| rule(sequence, frequency, classifier))
        .map(|(_, hint)| *hint)
}

/// Hint for a command that fails more often than it succeeds.
pub fn failure_hint(stats: &CommandStats) -> Option<String> {
    (stats.failure_count > stats.success_count).then(|| {
        format!(
            "Command '{}' fails frequently ({}/{}). Check requirements with /explain?action={}",
            stats.command_id, stats.failure_count, stats.execution_count, stats.command_id
        )
    })
}

/// One hint naming the slowest frequently used commands.
pub fn slow_commands_hint<'a, I>(stats: I) -> Option<String>
where
    I: IntoIterator<Item = &'a CommandStats>,
{
    let mut slow: Vec<&CommandStats> = stats
        .into_iter()
        .filter(|s| s.average_time_ms > SLOW_AVERAGE_MS && s.execution_count > SLOW_MIN_EXECUTIONS)
        .collect();
    if slow.is_empty() {
        return None;
    }
    slow.sort_by(|a, b| b.average_time_ms.cmp(&a.average_time_ms));

    let listed = slow
        .iter()
        .take(SLOW_REPORT_LIMIT)
        .map(|s| format!("{} ({}ms)", s.command_id, s.average_time_ms))
        .collect::<Vec<_>>()
        .join(", ");
    Some(format!("Slow commands detected: {}", listed))
}
