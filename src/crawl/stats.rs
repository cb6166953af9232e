//! Crawl statistics and skip reasons.

use std::fmt;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::remote::RemoteError;

/// Why a frontier item produced no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The service answered but had nothing
    NotFound,
    /// Timeout, connection failure or error status
    RemoteUnavailable,
    /// Offline mode and no cache entry
    OfflineMiss,
}

impl SkipReason {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::RemoteUnavailable => "remote_unavailable",
            Self::OfflineMiss => "offline_miss",
        }
    }
}

impl From<&RemoteError> for SkipReason {
    fn from(err: &RemoteError) -> Self {
        match err {
            RemoteError::NotFound => Self::NotFound,
            RemoteError::Unavailable(_) => Self::RemoteUnavailable,
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fetch step of a frontier item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlStep {
    Identifier,
    Details,
    Structure,
}

impl CrawlStep {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Identifier => "identifier",
            Self::Details => "details",
            Self::Structure => "structure",
        }
    }
}

impl fmt::Display for CrawlStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One skipped frontier item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedItem {
    /// Part number of the target
    pub target: String,
    /// The last step the item reached
    pub step: CrawlStep,
    pub reason: SkipReason,
}

impl fmt::Display for SkippedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} skipped at {}: {}", self.target, self.step, self.reason)
    }
}

/// Counters threaded through a crawl.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CrawlStats {
    /// Frontier items processed (not counting duplicates)
    pub nodes_visited: usize,
    /// Remote calls actually issued
    pub remote_calls: usize,
    /// Answers served from the cache
    pub cache_hits: usize,
    /// Cache misses (offline misses included)
    pub cache_misses: usize,
    /// Structure responses fetched (cached or remote)
    pub structures_fetched: usize,
    /// Structure re-fetches by number after a shallow response
    pub structure_refetches: usize,
    /// Details responses merged
    pub details_fetched: usize,
    /// Edges newly added to the graph
    pub edges_added: usize,
    /// Self-loop edges rejected
    pub self_loops: usize,
    /// Searches that returned more than one candidate
    pub ambiguous_identifiers: usize,
    /// Walks cut short by the recursion bound
    pub truncated_walks: usize,
    /// Attribute fields filled by merges
    pub fields_filled: usize,
    /// Frontier items that ended without data, one entry per item
    pub skipped: Vec<SkippedItem>,
    /// Failed fetches per step, including those an item recovered from
    #[serde(default)]
    pub failed_calls: IndexMap<CrawlStep, usize>,
    /// Duration of the crawl
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

impl CrawlStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one failed fetch. Does not mark the item as skipped.
    pub(crate) fn record_failure(&mut self, target: &str, step: CrawlStep, reason: SkipReason) {
        tracing::debug!(target_part = %target, step = %step, reason = %reason, "Fetch failed");
        *self.failed_calls.entry(step).or_insert(0) += 1;
    }

    /// Mark a frontier item as skipped.
    pub(crate) fn record_skip(&mut self, target: &str, step: CrawlStep, reason: SkipReason) {
        tracing::warn!(target_part = %target, step = %step, reason = %reason, "Skipping frontier item");
        self.skipped.push(SkippedItem {
            target: target.to_string(),
            step,
            reason,
        });
    }

    /// Total failed fetches across steps.
    #[must_use]
    pub fn failed_call_count(&self) -> usize {
        self.failed_calls.values().sum()
    }

    /// Skip counts per reason, in first-seen order.
    #[must_use]
    pub fn skipped_by_reason(&self) -> IndexMap<SkipReason, usize> {
        let mut counts = IndexMap::new();
        for item in &self.skipped {
            *counts.entry(item.reason).or_insert(0) += 1;
        }
        counts
    }

    /// Log a summary of the crawl
    pub fn log_summary(&self) {
        tracing::info!(
            "Crawl complete: {} nodes visited, {} edges added, {} remote calls, \
             {} cache hits, {} cache misses, {} nodes skipped, {} failed fetches in {:?}",
            self.nodes_visited,
            self.edges_added,
            self.remote_calls,
            self.cache_hits,
            self.cache_misses,
            self.skipped.len(),
            self.failed_call_count(),
            self.duration
        );
        if self.ambiguous_identifiers > 0 {
            tracing::warn!(
                "{} part numbers matched more than one identifier; the first candidate was used",
                self.ambiguous_identifiers
            );
        }
        if self.truncated_walks > 0 {
            tracing::warn!(
                "{} structure responses exceeded the walk depth bound",
                self.truncated_walks
            );
        }
        for item in &self.skipped {
            tracing::warn!("Crawl skip: {}", item);
        }
    }

    /// Merge stats from another crawl pass
    pub fn merge(&mut self, other: &Self) {
        self.nodes_visited += other.nodes_visited;
        self.remote_calls += other.remote_calls;
        self.cache_hits += other.cache_hits;
        self.cache_misses += other.cache_misses;
        self.structures_fetched += other.structures_fetched;
        self.structure_refetches += other.structure_refetches;
        self.details_fetched += other.details_fetched;
        self.edges_added += other.edges_added;
        self.self_loops += other.self_loops;
        self.ambiguous_identifiers += other.ambiguous_identifiers;
        self.truncated_walks += other.truncated_walks;
        self.fields_filled += other.fields_filled;
        self.skipped.extend(other.skipped.iter().cloned());
        for (step, count) in &other.failed_calls {
            *self.failed_calls.entry(*step).or_insert(0) += count;
        }
        self.duration += other.duration;
    }
}

/// Serde support for Duration
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skipped_by_reason() {
        let mut stats = CrawlStats::new();
        stats.record_skip("100", CrawlStep::Structure, SkipReason::OfflineMiss);
        stats.record_skip("200", CrawlStep::Details, SkipReason::NotFound);
        stats.record_skip("300", CrawlStep::Structure, SkipReason::OfflineMiss);

        let counts = stats.skipped_by_reason();
        assert_eq!(counts[&SkipReason::OfflineMiss], 2);
        assert_eq!(counts[&SkipReason::NotFound], 1);
        assert!(!counts.contains_key(&SkipReason::RemoteUnavailable));
        assert_eq!(stats.failed_call_count(), 0);
    }

    #[test]
    fn test_failures_are_not_skips() {
        let mut stats = CrawlStats::new();
        stats.record_failure("100", CrawlStep::Details, SkipReason::NotFound);
        stats.record_failure("100", CrawlStep::Structure, SkipReason::NotFound);
        stats.record_failure("200", CrawlStep::Structure, SkipReason::NotFound);

        assert!(stats.skipped.is_empty());
        assert_eq!(stats.failed_calls[&CrawlStep::Structure], 2);
        assert_eq!(stats.failed_call_count(), 3);

        let mut total = CrawlStats::new();
        total.merge(&stats);
        total.merge(&stats);
        assert_eq!(total.failed_calls[&CrawlStep::Details], 2);
    }

    #[test]
    fn test_merge_and_serde() {
        let mut a = CrawlStats {
            nodes_visited: 2,
            duration: Duration::from_millis(1500),
            ..Default::default()
        };
        let b = CrawlStats {
            nodes_visited: 3,
            remote_calls: 4,
            duration: Duration::from_millis(500),
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.nodes_visited, 5);
        assert_eq!(a.remote_calls, 4);

        a.record_skip("9", CrawlStep::Identifier, SkipReason::NotFound);
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["duration"], 2000);
        assert_eq!(json["skipped"][0]["step"], "identifier");
        let back: CrawlStats = serde_json::from_value(json).unwrap();
        assert_eq!(back.duration, Duration::from_secs(2));
    }

    #[test]
    fn test_reason_from_remote_error() {
        assert_eq!(SkipReason::from(&RemoteError::NotFound), SkipReason::NotFound);
        assert_eq!(
            SkipReason::from(&RemoteError::Unavailable("timeout".into())),
            SkipReason::RemoteUnavailable
        );
    }
}
