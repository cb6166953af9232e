//! Part number → opaque identifier resolution.

use indexmap::IndexMap;
use serde_json::Value;

use super::source::CachedSource;
use super::stats::{CrawlStats, SkipReason};
use crate::cache::CacheKind;
use crate::model::{scalar_string, FieldAliases};
use crate::remote::ProductDataService;

/// Outcome of resolving one part number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierResolution {
    pub identifier: String,
    /// Number of search candidates; 0 when answered from the known map
    pub candidate_count: usize,
}

impl IdentifierResolution {
    /// Whether the search matched more than one record.
    #[must_use]
    pub const fn is_ambiguous(&self) -> bool {
        self.candidate_count > 1
    }
}

/// Maps part numbers to service identifiers.
///
/// Known mappings (seeded from a previous run's index or learned from
/// structure responses) are used first; otherwise a cached search commits
/// to the first candidate that carries an identifier.
#[derive(Debug, Clone)]
pub struct IdentifierResolver {
    known: IndexMap<String, String>,
    id_aliases: FieldAliases,
}

impl IdentifierResolver {
    #[must_use]
    pub fn new(id_aliases: FieldAliases) -> Self {
        Self {
            known: IndexMap::new(),
            id_aliases,
        }
    }

    /// Seed with previously resolved mappings.
    #[must_use]
    pub fn with_known(mut self, known: &IndexMap<String, String>) -> Self {
        for (number, id) in known {
            self.record(number, id);
        }
        self
    }

    /// Record a mapping. An existing mapping is kept.
    pub fn record(&mut self, number: &str, id: &str) {
        if number.is_empty() || id.is_empty() {
            return;
        }
        self.known
            .entry(number.to_string())
            .or_insert_with(|| id.to_string());
    }

    #[must_use]
    pub fn known_identifier(&self, number: &str) -> Option<&str> {
        self.known.get(number).map(String::as_str)
    }

    #[must_use]
    pub const fn known(&self) -> &IndexMap<String, String> {
        &self.known
    }

    /// Resolve `number`, searching through `source` when not yet known.
    pub fn resolve<S: ProductDataService>(
        &mut self,
        number: &str,
        source: &mut CachedSource<S>,
        stats: &mut CrawlStats,
    ) -> Result<IdentifierResolution, SkipReason> {
        if let Some(id) = self.known_identifier(number) {
            return Ok(IdentifierResolution {
                identifier: id.to_string(),
                candidate_count: 0,
            });
        }

        let response = source.fetch(CacheKind::SearchByNumber, number, stats)?;
        let candidates = candidate_list(&response);
        let identifier = candidates
            .iter()
            .find_map(|candidate| {
                candidate
                    .as_object()
                    .and_then(|map| self.id_aliases.lookup(map))
                    .and_then(scalar_string)
            })
            .ok_or(SkipReason::NotFound)?;

        let resolution = IdentifierResolution {
            identifier,
            candidate_count: candidates.len(),
        };
        if resolution.is_ambiguous() {
            stats.ambiguous_identifiers += 1;
            tracing::warn!(
                part = %number,
                candidates = resolution.candidate_count,
                "Search matched several parts; using the first candidate"
            );
        }
        self.record(number, &resolution.identifier);
        Ok(resolution)
    }
}

/// Candidate records out of a search response.
fn candidate_list(response: &Value) -> Vec<&Value> {
    match response {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => ["results", "value", "items"]
            .iter()
            .find_map(|key| map.get(*key)?.as_array())
            .map_or_else(|| vec![response], |items| items.iter().collect()),
        _ => Vec::new(),
    }
}
