//! Bounded subgraph extraction for visualization.

use std::collections::VecDeque;

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::{Edge, EdgeSet};

/// Bounds for [`extract_subgraph`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ExtractOptions {
    /// Deepest level to include (root is level 0)
    pub max_depth: Option<usize>,
    /// Children enqueued per node, in source order
    pub max_children: Option<usize>,
}

/// A bounded part of the BOM below one root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subgraph {
    pub root: String,
    /// Part number → depth at which it was first reached
    pub nodes: IndexMap<String, usize>,
    /// Edges between included nodes that were followed during the walk
    pub edges: Vec<Edge>,
}

/// Breadth-first extraction from `root`.
///
/// Each node keeps the depth at which it was first reached. Children of a
/// node at `max_depth` are not enqueued, and at most `max_children` children
/// of each node are followed.
#[must_use]
pub fn extract_subgraph(edges: &EdgeSet, root: &str, options: &ExtractOptions) -> Subgraph {
    let adjacency = edges.adjacency();
    let mut nodes = IndexMap::new();
    let mut kept = Vec::new();
    let mut queue = VecDeque::new();

    nodes.insert(root.to_string(), 0);
    queue.push_back((root, 0usize));

    while let Some((node, depth)) = queue.pop_front() {
        if options.max_depth.is_some_and(|max| depth >= max) {
            continue;
        }
        let Some(children) = adjacency.get(node) else {
            continue;
        };
        let limit = options.max_children.unwrap_or(usize::MAX);
        for child in children.iter().take(limit) {
            kept.push(Edge::new(node, *child));
            if !nodes.contains_key(*child) {
                nodes.insert((*child).to_string(), depth + 1);
                queue.push_back((*child, depth + 1));
            }
        }
    }

    Subgraph {
        root: root.to_string(),
        nodes,
        edges: kept,
    }
}

impl Subgraph {
    /// Statistics over the extracted nodes and edges.
    #[must_use]
    pub fn stats(&self, top: usize) -> SubgraphStats {
        let mut per_level: IndexMap<usize, usize> = IndexMap::new();
        for depth in self.nodes.values() {
            *per_level.entry(*depth).or_insert(0) += 1;
        }
        per_level.sort_keys();

        let mut children: IndexMap<&str, usize> = IndexMap::new();
        for edge in &self.edges {
            *children.entry(edge.parent.as_str()).or_insert(0) += 1;
        }
        let mut widest: Vec<(String, usize)> = children
            .into_iter()
            .map(|(part, count)| (part.to_string(), count))
            .collect();
        widest.sort_by(|a, b| b.1.cmp(&a.1));
        widest.truncate(top);

        SubgraphStats {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            max_depth: self.nodes.values().copied().max().unwrap_or(0),
            parts_per_level: per_level,
            most_children: widest,
        }
    }
}

/// Summary of a [`Subgraph`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubgraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub max_depth: usize,
    pub parts_per_level: IndexMap<usize, usize>,
    /// Parts with the most children, largest first
    pub most_children: Vec<(String, usize)>,
}

impl SubgraphStats {
    pub fn log_summary(&self) {
        tracing::info!(
            "Subgraph: {} nodes, {} edges, max depth {}",
            self.node_count,
            self.edge_count,
            self.max_depth
        );
    }
}
