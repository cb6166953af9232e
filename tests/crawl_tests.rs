//! Integration tests for cached BOM collection.
//!
//! An in-memory product-data service stands in for the remote system and
//! counts every call, so cache behaviour can be asserted exactly.

use std::cell::Cell;

use bom_tools::cache::FileCache;
use bom_tools::crawl::{
    CachedSource, CrawlOptions, CrawlStep, Crawler, DetailsStrategy, SkipReason,
};
use bom_tools::remote::{OfflineService, ProductDataService, RemoteError, RemoteResult};
use bom_tools::structure::StructureAliases;
use indexmap::IndexMap;
use serde_json::{json, Value};
use tempfile::TempDir;

// ============================================================================
// Test Fixtures
// ============================================================================

/// In-memory service over a fixed part table.
struct FixtureService {
    /// number → (name, children)
    parts: IndexMap<String, (String, Vec<String>)>,
    /// Part numbers whose search returns two candidates
    duplicated: Vec<String>,
    /// Whether structure nodes carry names
    names_in_structure: bool,
    /// Part numbers whose details lookups answer "not found"
    without_details: Vec<String>,
    calls: Cell<usize>,
    searches: Cell<usize>,
}

impl FixtureService {
    fn new(parts: &[(&str, &str, &[&str])]) -> Self {
        Self {
            parts: parts
                .iter()
                .map(|(number, name, children)| {
                    (
                        (*number).to_string(),
                        (
                            (*name).to_string(),
                            children.iter().map(|c| (*c).to_string()).collect(),
                        ),
                    )
                })
                .collect(),
            duplicated: Vec::new(),
            names_in_structure: true,
            without_details: Vec::new(),
            calls: Cell::new(0),
            searches: Cell::new(0),
        }
    }

    fn tick(&self) {
        self.calls.set(self.calls.get() + 1);
    }

    fn details(&self, number: &str) -> RemoteResult {
        if self.without_details.iter().any(|n| n == number) {
            return Err(RemoteError::NotFound);
        }
        let (name, _) = self.parts.get(number).ok_or(RemoteError::NotFound)?;
        Ok(json!({"Number": number, "Name": name, "State": "RELEASED"}))
    }

    fn node(&self, number: &str, depth: usize) -> Value {
        let (name, children) = &self.parts[number];
        let components: Vec<Value> = if depth == 0 {
            Vec::new()
        } else {
            children.iter().map(|c| self.node(c, depth - 1)).collect()
        };
        let mut node = json!({
            "PartId": format!("OR:{number}"),
            "Number": number,
            "Components": components,
        });
        if self.names_in_structure {
            node["Name"] = json!(name);
        }
        node
    }

    fn structure(&self, number: &str, depth: usize) -> RemoteResult {
        if !self.parts.contains_key(number) {
            return Err(RemoteError::NotFound);
        }
        Ok(self.node(number, depth))
    }
}

impl ProductDataService for FixtureService {
    fn search(&self, number: &str, _limit: usize) -> RemoteResult {
        self.tick();
        self.searches.set(self.searches.get() + 1);
        if !self.parts.contains_key(number) {
            return Ok(json!([]));
        }
        let mut hits = vec![json!({"oid": format!("OR:{number}"), "Number": number})];
        if self.duplicated.iter().any(|d| d == number) {
            hits.push(json!({"oid": format!("OR:{number}-ALT"), "Number": number}));
        }
        Ok(Value::Array(hits))
    }

    fn get_details(&self, id: &str) -> RemoteResult {
        self.tick();
        let number = id.strip_prefix("OR:").ok_or(RemoteError::NotFound)?;
        self.details(number.trim_end_matches("-ALT"))
    }

    fn get_details_by_number(&self, number: &str) -> RemoteResult {
        self.tick();
        self.details(number)
    }

    fn get_substructure(&self, id: &str, depth: usize) -> RemoteResult {
        self.tick();
        let number = id.strip_prefix("OR:").ok_or(RemoteError::NotFound)?;
        self.structure(number.trim_end_matches("-ALT"), depth)
    }

    fn get_substructure_by_number(&self, number: &str, depth: usize) -> RemoteResult {
        self.tick();
        self.structure(number, depth)
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

/// TOP → A, B; A → C, D; B → D; C → E
fn diamond_service() -> FixtureService {
    FixtureService::new(&[
        ("TOP", "Top Assembly", &["A", "B"]),
        ("A", "Frame", &["C", "D"]),
        ("B", "Housing", &["D"]),
        ("C", "Bracket", &["E"]),
        ("D", "Bolt", &[]),
        ("E", "Washer", &[]),
    ])
}

/// Answers one structure level for `A` and "not found" for every other
/// structure call, including the by-number re-fetch of `A`.
struct SparseService {
    calls: Cell<usize>,
}

impl SparseService {
    fn tick(&self) {
        self.calls.set(self.calls.get() + 1);
    }
}

impl ProductDataService for SparseService {
    fn search(&self, number: &str, _limit: usize) -> RemoteResult {
        self.tick();
        Ok(json!([{ "oid": format!("OR:{number}") }]))
    }

    fn get_details(&self, id: &str) -> RemoteResult {
        self.tick();
        Ok(json!({ "Name": format!("Part {id}") }))
    }

    fn get_details_by_number(&self, _number: &str) -> RemoteResult {
        self.tick();
        Err(RemoteError::NotFound)
    }

    fn get_substructure(&self, id: &str, _depth: usize) -> RemoteResult {
        self.tick();
        match id {
            "OR:A" => Ok(json!({
                "Number": "A",
                "Components": [{ "Number": "B", "PartId": "OR:B" }]
            })),
            _ => Err(RemoteError::NotFound),
        }
    }

    fn get_substructure_by_number(&self, _number: &str, _depth: usize) -> RemoteResult {
        self.tick();
        Ok(json!({}))
    }
}

fn crawler<S: ProductDataService>(
    service: S,
    cache_dir: &std::path::Path,
    offline: bool,
    options: CrawlOptions,
) -> Crawler<S> {
    let cache = FileCache::new(cache_dir).unwrap();
    Crawler::new(
        CachedSource::new(cache, service, offline),
        options,
        StructureAliases::default(),
    )
}

// ============================================================================
// Collection
// ============================================================================

#[test]
fn test_collects_full_tree() {
    let tmp = TempDir::new().unwrap();
    let service = diamond_service();

    let outcome = crawler(&service, tmp.path(), false, CrawlOptions::default()).run("TOP");
    let graph = &outcome.graph;

    assert_eq!(graph.part_count(), 6);
    assert_eq!(graph.edge_count(), 6);
    for (parent, child) in [
        ("TOP", "A"),
        ("TOP", "B"),
        ("A", "C"),
        ("A", "D"),
        ("B", "D"),
        ("C", "E"),
    ] {
        assert!(graph.edges.contains(parent, child), "missing {parent} -> {child}");
    }
    assert_eq!(graph.part("TOP").unwrap().label(), "Top Assembly");
    assert_eq!(graph.part("E").unwrap().label(), "Washer");

    let stats = outcome.stats();
    assert_eq!(stats.nodes_visited, 6);
    assert!(stats.skipped.is_empty());
    assert_eq!(stats.ambiguous_identifiers, 0);
    // Only the top part needs a search; children arrive with identifiers
    assert_eq!(service.searches.get(), 1);
    assert_eq!(outcome.index.number_to_id.get("D").map(String::as_str), Some("OR:D"));
}

#[test]
fn test_second_run_is_served_from_cache() {
    let tmp = TempDir::new().unwrap();
    let service = diamond_service();

    let first = crawler(&service, tmp.path(), false, CrawlOptions::default()).run("TOP");
    let calls_after_first = service.calls.get();
    assert!(calls_after_first > 0);

    let second = crawler(&service, tmp.path(), false, CrawlOptions::default()).run("TOP");

    assert_eq!(service.calls.get(), calls_after_first);
    assert_eq!(second.stats().remote_calls, 0);
    assert_eq!(second.stats().cache_misses, 0);
    assert_eq!(first.graph.content_hash(), second.graph.content_hash());
}

#[test]
fn test_offline_rerun_reproduces_graph() {
    let tmp = TempDir::new().unwrap();
    let service = diamond_service();
    let first = crawler(&service, tmp.path(), false, CrawlOptions::default()).run("TOP");

    let offline = crawler(OfflineService, tmp.path(), true, CrawlOptions::default()).run("TOP");

    assert!(offline.stats().skipped.is_empty());
    assert_eq!(offline.stats().remote_calls, 0);
    assert_eq!(first.graph.content_hash(), offline.graph.content_hash());
}

#[test]
fn test_offline_with_empty_cache_skips() {
    let tmp = TempDir::new().unwrap();
    let outcome = crawler(OfflineService, tmp.path(), true, CrawlOptions::default()).run("TOP");

    assert_eq!(outcome.graph.part_count(), 1);
    assert_eq!(outcome.graph.edge_count(), 0);
    let stats = outcome.stats();
    assert_eq!(stats.nodes_visited, 1);
    assert_eq!(stats.skipped.len(), 1);
    assert_eq!(stats.skipped_by_reason().get(&SkipReason::OfflineMiss), Some(&1));
    assert_eq!(stats.failed_call_count(), 3);
}

#[test]
fn test_unavailable_service_is_skipped_not_fatal() {
    let tmp = TempDir::new().unwrap();
    let outcome = crawler(OfflineService, tmp.path(), false, CrawlOptions::default()).run("TOP");

    assert_eq!(outcome.graph.part_count(), 1);
    let by_reason = outcome.stats().skipped_by_reason();
    assert_eq!(by_reason.get(&SkipReason::RemoteUnavailable), Some(&1));
    assert_eq!(outcome.stats().skipped.len(), 1);
    assert_eq!(outcome.stats().remote_calls, 0);
}

#[test]
fn test_depth_bound() {
    let tmp = TempDir::new().unwrap();
    let service = FixtureService::new(&[
        ("A", "a", &["B"]),
        ("B", "b", &["C"]),
        ("C", "c", &["D"]),
        ("D", "d", &[]),
    ]);
    let options = CrawlOptions {
        max_depth: 2,
        ..CrawlOptions::default()
    };

    let outcome = crawler(&service, tmp.path(), false, options).run("A");

    let mut parts: Vec<&str> = outcome.graph.parts.keys().map(String::as_str).collect();
    parts.sort_unstable();
    assert_eq!(parts, vec!["A", "B", "C"]);
    assert!(outcome.graph.edges.contains("B", "C"));
    assert!(!outcome.graph.edges.contains("C", "D"));
}

#[test]
fn test_per_call_cap_still_reaches_full_depth() {
    let tmp = TempDir::new().unwrap();
    let service = FixtureService::new(&[
        ("A", "a", &["B"]),
        ("B", "b", &["C"]),
        ("C", "c", &["D"]),
        ("D", "d", &["E"]),
        ("E", "e", &[]),
    ]);
    let options = CrawlOptions {
        max_depth: 10,
        per_call_depth_cap: 1,
        ..CrawlOptions::default()
    };

    let outcome = crawler(&service, tmp.path(), false, options).run("A");

    assert_eq!(outcome.graph.edge_count(), 4);
    assert!(outcome.graph.edges.contains("D", "E"));
    assert_eq!(outcome.stats().structure_refetches, 0);
}

#[test]
fn test_ambiguous_search_uses_first_candidate() {
    let tmp = TempDir::new().unwrap();
    let mut service = diamond_service();
    service.duplicated.push("TOP".into());

    let outcome = crawler(&service, tmp.path(), false, CrawlOptions::default()).run("TOP");

    assert_eq!(outcome.stats().ambiguous_identifiers, 1);
    assert_eq!(
        outcome.index.number_to_id.get("TOP").map(String::as_str),
        Some("OR:TOP")
    );
    assert_eq!(outcome.graph.edge_count(), 6);
}

#[test]
fn test_unknown_top_part_falls_back_to_number() {
    let tmp = TempDir::new().unwrap();
    let service = diamond_service();

    let outcome = crawler(&service, tmp.path(), false, CrawlOptions::default()).run("MISSING");

    assert_eq!(outcome.graph.part_count(), 1);
    let stats = outcome.stats();
    assert_eq!(stats.skipped.len(), 1);
    assert_eq!(stats.skipped[0].step, CrawlStep::Structure);
    assert_eq!(stats.skipped_by_reason().get(&SkipReason::NotFound), Some(&1));
    assert_eq!(stats.failed_calls.get(&CrawlStep::Identifier), Some(&1));
    assert_eq!(stats.failed_calls.get(&CrawlStep::Details), Some(&1));
}

#[test]
fn test_not_found_answers_are_cached() {
    let tmp = TempDir::new().unwrap();
    let service = SparseService {
        calls: Cell::new(0),
    };

    let first = crawler(&service, tmp.path(), false, CrawlOptions::default()).run("A");
    // search, details, structure of A, re-fetch of A by number, structure of B
    assert_eq!(service.calls.get(), 5);
    assert_eq!(first.graph.edge_count(), 1);
    assert_eq!(first.stats().structure_refetches, 1);
    assert_eq!(first.stats().skipped.len(), 1);
    assert_eq!(first.stats().skipped[0].target, "B");

    let second = crawler(&service, tmp.path(), false, CrawlOptions::default()).run("A");
    assert_eq!(service.calls.get(), 5);
    assert_eq!(second.stats().remote_calls, 0);
    assert_eq!(second.stats().cache_misses, 0);
    assert_eq!(second.stats().skipped, first.stats().skipped);
    assert_eq!(first.graph.content_hash(), second.graph.content_hash());

    let offline = crawler(OfflineService, tmp.path(), true, CrawlOptions::default()).run("A");
    assert_eq!(
        offline.stats().skipped_by_reason().get(&SkipReason::NotFound),
        Some(&1)
    );
    assert_eq!(first.graph.content_hash(), offline.graph.content_hash());
}

#[test]
fn test_failed_details_with_structure_is_not_skipped() {
    let tmp = TempDir::new().unwrap();
    let mut service = diamond_service();
    service.without_details.push("A".into());
    let options = CrawlOptions {
        details: DetailsStrategy::Full,
        ..CrawlOptions::default()
    };

    let outcome = crawler(&service, tmp.path(), false, options).run("TOP");

    let stats = outcome.stats();
    assert_eq!(outcome.graph.edge_count(), 6);
    assert!(stats.skipped.is_empty());
    assert_eq!(stats.failed_calls.get(&CrawlStep::Details), Some(&1));
    assert_eq!(stats.details_fetched, 5);
}

#[test]
fn test_seeded_index_skips_search() {
    let first_cache = TempDir::new().unwrap();
    let service = diamond_service();
    let first = crawler(&service, first_cache.path(), false, CrawlOptions::default()).run("TOP");

    let fresh_cache = TempDir::new().unwrap();
    let service = diamond_service();
    let seeded = crawler(&service, fresh_cache.path(), false, CrawlOptions::default())
        .seeded(&first.index)
        .run("TOP");

    assert_eq!(service.searches.get(), 0);
    assert_eq!(first.graph.content_hash(), seeded.graph.content_hash());
}

#[test]
fn test_hydrate_names_unnamed_parts() {
    let tmp = TempDir::new().unwrap();
    let mut service = diamond_service();
    service.names_in_structure = false;

    let plain = CrawlOptions {
        details: DetailsStrategy::None,
        ..CrawlOptions::default()
    };
    let outcome = crawler(&service, tmp.path(), false, plain.clone()).run("TOP");
    assert_eq!(outcome.graph.unnamed_parts().count(), 6);

    let hydrating = CrawlOptions {
        hydrate_details: true,
        ..plain
    };
    let outcome = crawler(&service, tmp.path(), false, hydrating).run("TOP");
    assert_eq!(outcome.graph.unnamed_parts().count(), 0);
    assert_eq!(outcome.graph.part("C").unwrap().label(), "Bracket");
    assert_eq!(outcome.stats().details_fetched, 6);
}

#[test]
fn test_full_details_strategy_fetches_every_part() {
    let tmp = TempDir::new().unwrap();
    let service = diamond_service();
    let options = CrawlOptions {
        details: DetailsStrategy::Full,
        ..CrawlOptions::default()
    };

    let outcome = crawler(&service, tmp.path(), false, options).run("TOP");

    assert_eq!(outcome.stats().details_fetched, 6);
    assert_eq!(
        outcome.graph.part("D").unwrap().attributes.state.as_deref(),
        Some("RELEASED")
    );
}
