//! Integration tests for graph persistence, derived relations, subgraph
//! extraction and export.

use std::collections::{BTreeSet, HashSet};

use bom_tools::derive::DerivedRelations;
use bom_tools::export::{GraphExport, JsonBundleSink, NTriplesSink, DEFAULT_BATCH_SIZE};
use bom_tools::extract::{extract_subgraph, ExtractOptions};
use bom_tools::model::{BomGraph, Edge, EdgeSet, PartAttributes};
use tempfile::TempDir;

// ============================================================================
// Test Fixtures
// ============================================================================

/// Three-level product with a shared fastener and one cycle.
///
/// ```text
/// CAR ─┬─ BODY ──┬─ DOOR ── BOLT
///      │         └─ BOLT
///      └─ ENGINE ─┬─ PUMP ⇄ VALVE
///                 └─ BOLT
/// ```
fn product_graph() -> BomGraph {
    let mut graph = BomGraph::new();
    for (parent, child) in [
        ("CAR", "BODY"),
        ("CAR", "ENGINE"),
        ("BODY", "DOOR"),
        ("BODY", "BOLT"),
        ("DOOR", "BOLT"),
        ("ENGINE", "PUMP"),
        ("ENGINE", "BOLT"),
        ("PUMP", "VALVE"),
        ("VALVE", "PUMP"),
    ] {
        graph.add_edge(parent, child);
    }
    graph.merge_part("CAR", &PartAttributes::new().with_name("Car"));
    graph.merge_part(
        "BOLT",
        &PartAttributes::new().with_name("Bolt \"M8\"").with_state("RELEASED"),
    );
    graph
}

/// Every (descendant, ancestor) pair by plain DFS, self pairs excluded.
fn reachability(edges: &EdgeSet) -> BTreeSet<(String, String)> {
    let adjacency = edges.adjacency();
    let mut pairs = BTreeSet::new();
    for start in adjacency.keys() {
        let mut seen = HashSet::new();
        let mut stack: Vec<&str> = adjacency[start].clone();
        while let Some(node) = stack.pop() {
            if !seen.insert(node) {
                continue;
            }
            if node != *start {
                pairs.insert((node.to_string(), (*start).to_string()));
            }
            if let Some(children) = adjacency.get(node) {
                stack.extend(children.iter().copied());
            }
        }
    }
    pairs
}

fn as_pairs(edges: &[Edge]) -> BTreeSet<(String, String)> {
    edges
        .iter()
        .map(|e| (e.parent.clone(), e.child.clone()))
        .collect()
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_save_load_preserves_content() {
    let tmp = TempDir::new().unwrap();
    let graph = product_graph();
    graph.save(tmp.path()).unwrap();

    let loaded = BomGraph::load(tmp.path()).unwrap();

    assert_eq!(loaded.part_count(), graph.part_count());
    assert_eq!(loaded.edge_count(), 9);
    assert_eq!(loaded.content_hash(), graph.content_hash());
    assert_eq!(loaded.part("CAR").unwrap().label(), "Car");
}

#[test]
fn test_content_hash_ignores_discovery_order() {
    let forward = product_graph();

    let mut backward = BomGraph::new();
    let edges: Vec<Edge> = forward.edges.iter().cloned().collect();
    for edge in edges.iter().rev() {
        backward.add_edge(&edge.parent, &edge.child);
    }
    backward.merge_part(
        "BOLT",
        &PartAttributes::new().with_name("Bolt \"M8\"").with_state("RELEASED"),
    );
    backward.merge_part("CAR", &PartAttributes::new().with_name("Car"));

    assert_eq!(forward.content_hash(), backward.content_hash());

    backward.add_edge("CAR", "SPARE");
    assert_ne!(forward.content_hash(), backward.content_hash());
}

// ============================================================================
// Derived relations
// ============================================================================

#[test]
fn test_closure_matches_reachability() {
    let graph = product_graph();
    let derived = DerivedRelations::build(&graph.edges).unwrap();

    assert_eq!(as_pairs(&derived.part_of_assembly), reachability(&graph.edges));
    assert_eq!(derived.cyclic_components, 1);
    assert!(as_pairs(&derived.part_of_assembly).contains(&("BOLT".to_string(), "CAR".to_string())));
    assert!(as_pairs(&derived.part_of_assembly).contains(&("PUMP".to_string(), "VALVE".to_string())));
    assert!(!derived.part_of_assembly.iter().any(Edge::is_self_loop));
}

#[test]
fn test_used_in_is_exact_inverse() {
    let graph = product_graph();
    let derived = DerivedRelations::build(&graph.edges).unwrap();

    let inverse: BTreeSet<(String, String)> = graph
        .edges
        .iter()
        .map(|e| (e.child.clone(), e.parent.clone()))
        .collect();
    assert_eq!(as_pairs(&derived.used_in), inverse);
}

// ============================================================================
// Subgraph extraction
// ============================================================================

#[test]
fn test_subgraph_bounds() {
    let graph = product_graph();

    let full = extract_subgraph(&graph.edges, "CAR", &ExtractOptions::default());
    assert_eq!(full.nodes.len(), 7);
    assert_eq!(full.nodes["BOLT"], 2);

    let shallow = extract_subgraph(
        &graph.edges,
        "CAR",
        &ExtractOptions {
            max_depth: Some(1),
            max_children: None,
        },
    );
    assert_eq!(shallow.nodes.len(), 3);
    assert!(shallow.nodes.values().all(|depth| *depth <= 1));

    let narrow = extract_subgraph(
        &graph.edges,
        "CAR",
        &ExtractOptions {
            max_depth: None,
            max_children: Some(1),
        },
    );
    for node in narrow.nodes.keys() {
        assert!(narrow.edges.iter().filter(|e| &e.parent == node).count() <= 1);
    }
    assert!(narrow.nodes.contains_key("BODY"));
    assert!(!narrow.nodes.contains_key("ENGINE"));
}

#[test]
fn test_subgraph_stats() {
    let graph = product_graph();
    let subgraph = extract_subgraph(&graph.edges, "CAR", &ExtractOptions::default());
    let stats = subgraph.stats(1);

    assert_eq!(stats.node_count, 7);
    assert_eq!(stats.max_depth, 3);
    assert_eq!(stats.parts_per_level.get(&0), Some(&1));
    assert_eq!(stats.most_children.len(), 1);
}

// ============================================================================
// Export
// ============================================================================

#[test]
fn test_json_export_is_idempotent() {
    let graph = product_graph();
    let export =
        GraphExport::from_graph(&graph).with_derived(DerivedRelations::build(&graph.edges).unwrap());

    let mut sink = JsonBundleSink::new();
    let stats = export.write_to(&mut sink, 2).unwrap();
    let first = sink.bundle().clone();
    export.write_to(&mut sink, DEFAULT_BATCH_SIZE).unwrap();

    assert_eq!(sink.bundle(), &first);
    assert_eq!(stats.parts, graph.part_count());
    assert_eq!(stats.relations["has_component"], 9);
    assert_eq!(stats.relations["used_in"], 9);
    assert_eq!(first.parts["BOLT"].state.as_deref(), Some("RELEASED"));

    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("bundle.json");
    sink.save(&path).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(value["relations"]["has_component"].as_array().unwrap().len(), 9);
}

#[test]
fn test_ntriples_export() {
    let graph = product_graph();
    let mut sink = NTriplesSink::new(Vec::new());
    let stats = GraphExport::from_graph(&graph)
        .write_to(&mut sink, DEFAULT_BATCH_SIZE)
        .unwrap();

    // 9 edges + CAR name + BOLT name and state
    assert_eq!(sink.triples(), 12);
    assert_eq!(stats.relations.len(), 1);

    let text = String::from_utf8(sink.into_inner()).unwrap();
    assert_eq!(text.lines().count(), 12);
    assert!(text.lines().all(|line| line.ends_with(" .")));
    assert!(text.contains("<urn:part:CAR> <urn:ontology:hasComponent> <urn:part:BODY> ."));
    assert!(text.contains(r#"<urn:part:BOLT> <urn:ontology:name> "Bolt \"M8\"" ."#));
}

#[test]
fn test_ntriples_escape_part_numbers() {
    let mut graph = BomGraph::new();
    graph.add_edge("A 1/2", "B#3");
    let mut sink = NTriplesSink::new(Vec::new());
    GraphExport::from_graph(&graph)
        .write_to(&mut sink, DEFAULT_BATCH_SIZE)
        .unwrap();

    let text = String::from_utf8(sink.into_inner()).unwrap();
    assert_eq!(
        text.trim_end(),
        "<urn:part:A%201%2F2> <urn:ontology:hasComponent> <urn:part:B%233> ."
    );
}
