//! Breadth-first BOM collection from a product-data service.
//!
//! The crawler starts at one top-level part number and walks the structure
//! level by level. Every item moves through
//!
//! ```text
//! Queued → ResolvingIdentifier → FetchingDetails → FetchingStructure → ExpandingChildren → Done
//! ```
//!
//! and the item ends as skipped ([`SkipReason`]) when its last fetch step
//! fails. Failed steps the item recovers from are only counted. All
//! remote access goes through a [`CachedSource`], so a second run over the
//! same cache directory issues no remote calls and produces the same graph.

mod identifier;
mod index;
mod source;
mod stats;

pub use identifier::{IdentifierResolution, IdentifierResolver};
pub use index::{CollectionIndex, INDEX_FILE};
pub use source::CachedSource;
pub use stats::{CrawlStats, CrawlStep, SkipReason, SkippedItem};

use std::collections::{HashSet, VecDeque};
use std::time::Instant;

use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::{CacheKind, FileCache};
use crate::model::{BomGraph, EdgeInsert};
use crate::remote::ProductDataService;
use crate::structure::{attributes_from_record, flatten, has_nested_children, StructureAliases};

/// Which frontier items get a details lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DetailsStrategy {
    /// Every visited part
    Full,
    /// Only the top-level part
    #[default]
    Top,
    /// No details calls; attributes come from structure responses only
    None,
}

impl DetailsStrategy {
    const fn applies_at(self, depth: usize) -> bool {
        match self {
            Self::Full => true,
            Self::Top => depth == 0,
            Self::None => false,
        }
    }
}

/// What a frontier item points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FrontierTarget {
    /// Opaque service identifier, known from a structure response or index
    Identifier { id: String, number: String },
    /// Human-readable part number, identifier not yet known
    Number(String),
}

impl FrontierTarget {
    /// Part number of the target.
    #[must_use]
    pub fn number(&self) -> &str {
        match self {
            Self::Identifier { number, .. } | Self::Number(number) => number,
        }
    }
}

/// One queued unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierItem {
    pub target: FrontierTarget,
    pub depth: usize,
}

/// Crawl tuning.
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Maximum BOM depth below the top part
    pub max_depth: usize,
    /// Largest depth requested in a single structure call
    pub per_call_depth_cap: usize,
    pub details: DetailsStrategy,
    /// Look up details for parts still unnamed after the walk
    pub hydrate_details: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_depth: 5,
            per_call_depth_cap: 3,
            details: DetailsStrategy::Top,
            hydrate_details: false,
        }
    }
}

/// Result of a crawl.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub graph: BomGraph,
    pub index: CollectionIndex,
}

impl CrawlOutcome {
    #[must_use]
    pub const fn stats(&self) -> &CrawlStats {
        &self.index.stats
    }
}

/// Frontier crawler.
pub struct Crawler<S> {
    source: CachedSource<S>,
    resolver: IdentifierResolver,
    aliases: StructureAliases,
    options: CrawlOptions,
}

impl<S: ProductDataService> Crawler<S> {
    /// Create a crawler over an already configured source.
    pub fn new(source: CachedSource<S>, options: CrawlOptions, aliases: StructureAliases) -> Self {
        let resolver = IdentifierResolver::new(aliases.id.clone());
        Self {
            source,
            resolver,
            aliases,
            options,
        }
    }

    /// Convenience constructor with default tuning.
    pub fn with_cache(service: S, cache: FileCache, offline: bool) -> Self {
        Self::new(
            CachedSource::new(cache, service, offline),
            CrawlOptions::default(),
            StructureAliases::default(),
        )
    }

    /// Seed identifier mappings from a previous run.
    #[must_use]
    pub fn seeded(mut self, index: &CollectionIndex) -> Self {
        self.resolver = self.resolver.with_known(&index.number_to_id);
        self
    }

    #[must_use]
    pub const fn options(&self) -> &CrawlOptions {
        &self.options
    }

    /// Crawl from `top` until the frontier is empty.
    pub fn run(&mut self, top: &str) -> CrawlOutcome {
        let start = Instant::now();
        let mut stats = CrawlStats::new();
        let mut graph = BomGraph::new();
        let top = top.trim();
        graph.ensure_part(top);

        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier: VecDeque<FrontierItem> = VecDeque::new();
        visited.insert(top.to_string());
        frontier.push_back(FrontierItem {
            target: self.target_for(top, None),
            depth: 0,
        });

        tracing::info!(
            top,
            max_depth = self.options.max_depth,
            offline = self.source.is_offline(),
            "Starting crawl"
        );

        while let Some(item) = frontier.pop_front() {
            stats.nodes_visited += 1;
            let children = self.process(&item, &mut graph, &mut stats);
            if item.depth >= self.options.max_depth {
                continue;
            }
            for (child, id) in children {
                if visited.insert(child.clone()) {
                    let target = self.target_for(&child, id);
                    frontier.push_back(FrontierItem {
                        target,
                        depth: item.depth + 1,
                    });
                }
            }
        }

        if self.options.hydrate_details {
            self.hydrate_details(&mut graph, &mut stats);
        }

        stats.duration = start.elapsed();
        stats.log_summary();

        CrawlOutcome {
            graph,
            index: CollectionIndex {
                top: top.to_string(),
                number_to_id: self.resolver.known().clone(),
                stats,
                generated_at: Utc::now(),
            },
        }
    }

    fn target_for(&self, number: &str, id: Option<String>) -> FrontierTarget {
        match id.or_else(|| self.resolver.known_identifier(number).map(str::to_string)) {
            Some(id) => FrontierTarget::Identifier {
                id,
                number: number.to_string(),
            },
            None => FrontierTarget::Number(number.to_string()),
        }
    }

    /// Run one item through its states. Returns the direct children of the
    /// item's part with their identifiers, when known.
    fn process(
        &mut self,
        item: &FrontierItem,
        graph: &mut BomGraph,
        stats: &mut CrawlStats,
    ) -> Vec<(String, Option<String>)> {
        let number = item.target.number().to_string();

        // ResolvingIdentifier
        let id = match &item.target {
            FrontierTarget::Identifier { id, .. } => Some(id.clone()),
            FrontierTarget::Number(number) => {
                match self.resolver.resolve(number, &mut self.source, stats) {
                    Ok(resolution) => Some(resolution.identifier),
                    Err(reason) => {
                        stats.record_failure(number, CrawlStep::Identifier, reason);
                        None
                    }
                }
            }
        };

        // FetchingDetails
        let details = if self.options.details.applies_at(item.depth) {
            self.fetch_details(&number, id.as_deref(), graph, stats)
        } else {
            Ok(())
        };

        // FetchingStructure
        let remaining = self.options.max_depth.saturating_sub(item.depth);
        if remaining == 0 {
            if let Err(reason) = details {
                stats.record_skip(&number, CrawlStep::Details, reason);
            }
            return Vec::new();
        }
        let requested = remaining.min(self.options.per_call_depth_cap.max(1));
        let response = match self.fetch_structure(&number, id.as_deref(), requested, stats) {
            Ok(response) => response,
            Err(reason) => {
                stats.record_skip(&number, CrawlStep::Structure, reason);
                return Vec::new();
            }
        };

        // ExpandingChildren
        let flat = flatten(&response, Some(&number), &self.aliases);
        if flat.truncated {
            stats.truncated_walks += 1;
        }
        for (part, attributes) in &flat.fragments {
            stats.fields_filled += graph.merge_part(part, attributes);
        }
        for edge in &flat.edges {
            match graph.add_edge(&edge.parent, &edge.child) {
                EdgeInsert::Added => stats.edges_added += 1,
                EdgeInsert::SelfLoop => stats.self_loops += 1,
                EdgeInsert::Duplicate => {}
            }
        }
        for (part, identifier) in &flat.identifiers {
            self.resolver.record(part, identifier);
        }

        flat.children_of(&number)
            .map(|child| {
                let id = flat.identifiers.get(child).cloned();
                (child.to_string(), id)
            })
            .collect()
    }

    fn fetch_details(
        &mut self,
        number: &str,
        id: Option<&str>,
        graph: &mut BomGraph,
        stats: &mut CrawlStats,
    ) -> Result<(), SkipReason> {
        let result = match id {
            Some(id) => self.source.fetch(CacheKind::DetailsById, id, stats),
            None => self.source.fetch(CacheKind::DetailsByNumber, number, stats),
        };
        let details = result.map_err(|reason| {
            stats.record_failure(number, CrawlStep::Details, reason);
            reason
        })?;
        stats.details_fetched += 1;
        let record = first_record(&details);
        stats.fields_filled +=
            graph.merge_part(number, &attributes_from_record(record, &self.aliases));
        Ok(())
    }

    fn fetch_structure(
        &mut self,
        number: &str,
        id: Option<&str>,
        depth: usize,
        stats: &mut CrawlStats,
    ) -> Result<Value, SkipReason> {
        let by_number = CacheKind::StructureByNumber { depth };
        let first = match id {
            Some(id) => self.source.fetch(CacheKind::StructureById { depth }, id, stats),
            None => self.source.fetch(by_number, number, stats),
        };
        let response = first.map_err(|reason| {
            stats.record_failure(number, CrawlStep::Structure, reason);
            reason
        })?;
        stats.structures_fetched += 1;

        // A multi-level request answered with a single level: try by number.
        if id.is_some() && depth > 1 && !has_nested_children(&response, &self.aliases) {
            stats.structure_refetches += 1;
            match self.source.fetch(by_number, number, stats) {
                Ok(deeper) if has_nested_children(&deeper, &self.aliases) => {
                    tracing::debug!(part = %number, depth, "Using structure re-fetched by number");
                    return Ok(deeper);
                }
                Ok(_) => {}
                Err(reason) => stats.record_failure(number, CrawlStep::Structure, reason),
            }
        }
        Ok(response)
    }

    /// Look up details for every part that still has no name.
    ///
    /// Uses the known identifier when there is one, the part number
    /// otherwise. Failures are logged and leave the part as it is.
    pub fn hydrate_details(&mut self, graph: &mut BomGraph, stats: &mut CrawlStats) {
        let unnamed: Vec<String> = graph.unnamed_parts().map(str::to_string).collect();
        if unnamed.is_empty() {
            return;
        }
        tracing::info!("Hydrating details for {} unnamed parts", unnamed.len());

        for number in unnamed {
            let result = match self.resolver.known_identifier(&number).map(str::to_string) {
                Some(id) => self.source.fetch(CacheKind::DetailsById, &id, stats),
                None => self.source.fetch(CacheKind::DetailsByNumber, &number, stats),
            };
            match result {
                Ok(details) => {
                    stats.details_fetched += 1;
                    let record = first_record(&details);
                    stats.fields_filled +=
                        graph.merge_part(&number, &attributes_from_record(record, &self.aliases));
                }
                Err(reason) => {
                    tracing::debug!(part = %number, reason = %reason, "No details for part");
                }
            }
        }
    }
}

/// Details answers are sometimes wrapped in a one-element list.
fn first_record(details: &Value) -> &Value {
    match details {
        Value::Array(items) => items.first().unwrap_or(details),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{OfflineService, RemoteError, RemoteResult};
    use serde_json::json;
    use tempfile::TempDir;

    /// A -> B -> C, with B also reachable as a duplicate under A.
    struct Tree;

    impl ProductDataService for Tree {
        fn search(&self, number: &str, _limit: usize) -> RemoteResult {
            Ok(json!([{ "oid": format!("OR:{number}") }]))
        }
        fn get_details(&self, id: &str) -> RemoteResult {
            Ok(json!({"Number": id.trim_start_matches("OR:"), "Name": format!("Part {id}")}))
        }
        fn get_details_by_number(&self, _number: &str) -> RemoteResult {
            Err(RemoteError::NotFound)
        }
        fn get_substructure(&self, id: &str, _depth: usize) -> RemoteResult {
            match id {
                "OR:A" => Ok(json!({"Number": "A", "Components": [
                    {"Number": "B", "PartId": "OR:B", "Components": [{"Number": "C"}]},
                    {"Number": "B", "PartId": "OR:B"}
                ]})),
                "OR:B" => Ok(json!({"Number": "B", "Components": [{"Number": "C"}]})),
                _ => Err(RemoteError::NotFound),
            }
        }
        fn get_substructure_by_number(&self, _number: &str, _depth: usize) -> RemoteResult {
            Err(RemoteError::NotFound)
        }
    }

    #[test]
    fn test_crawl_small_tree() {
        let dir = TempDir::new().unwrap();
        let mut crawler = Crawler::with_cache(Tree, FileCache::new(dir.path()).unwrap(), false);
        let outcome = crawler.run("A");

        assert_eq!(outcome.graph.edge_count(), 2);
        assert!(outcome.graph.edges.contains("A", "B"));
        assert!(outcome.graph.edges.contains("B", "C"));
        assert_eq!(outcome.graph.part("A").map(|p| p.label()), Some("Part OR:A"));
        assert_eq!(outcome.index.number_to_id["B"], "OR:B");
        assert_eq!(outcome.stats().nodes_visited, 3);
    }

    #[test]
    fn test_depth_zero_fetches_no_structure() {
        let dir = TempDir::new().unwrap();
        let options = CrawlOptions {
            max_depth: 0,
            ..Default::default()
        };
        let source = CachedSource::new(FileCache::new(dir.path()).unwrap(), Tree, false);
        let mut crawler = Crawler::new(source, options, StructureAliases::default());
        let outcome = crawler.run("A");
        assert_eq!(outcome.graph.edge_count(), 0);
        assert_eq!(outcome.stats().structures_fetched, 0);
        assert_eq!(outcome.stats().details_fetched, 1);
    }

    #[test]
    fn test_offline_empty_cache_skips_top() {
        let dir = TempDir::new().unwrap();
        let mut crawler =
            Crawler::with_cache(OfflineService, FileCache::new(dir.path()).unwrap(), true);
        let outcome = crawler.run("A");
        assert_eq!(outcome.graph.part_count(), 1);
        assert!(outcome.graph.edges.is_empty());
        let stats = outcome.stats();
        assert_eq!(stats.skipped.len(), 1);
        assert_eq!(stats.skipped[0].step, CrawlStep::Structure);
        assert_eq!(stats.skipped_by_reason()[&SkipReason::OfflineMiss], 1);
        assert_eq!(stats.failed_calls[&CrawlStep::Identifier], 1);
        assert_eq!(stats.failed_calls[&CrawlStep::Details], 1);
        assert_eq!(stats.failed_calls[&CrawlStep::Structure], 1);
        assert_eq!(stats.remote_calls, 0);
    }

    #[test]
    fn test_first_record_unwraps_lists() {
        let list = json!([{"Name": "X"}]);
        assert_eq!(first_record(&list), &json!({"Name": "X"}));
        let empty = json!([]);
        assert_eq!(first_record(&empty), &json!([]));
    }
}
