//! The collected BOM graph: parts plus component edges.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{EdgeInsert, EdgeSet, PartAttributes, PartRecord};
use crate::error::{BomError, ErrorContext, Result};
use crate::utils::unordered_hash;

/// File name of the persisted part map.
pub const PARTS_FILE: &str = "parts.json";
/// File name of the persisted edge list.
pub const EDGES_FILE: &str = "edges.json";

/// Parts keyed by number, plus the deduplicated edge set.
///
/// This is the common output of both the remote crawler and the tabular
/// parsers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomGraph {
    /// Part records in first-seen order
    pub parts: IndexMap<String, PartRecord>,
    /// Component edges
    pub edges: EdgeSet,
}

impl BomGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an observation of a part.
    ///
    /// The first sighting creates the record; later sightings only fill gaps.
    /// Returns the number of attributes filled.
    pub fn merge_part(&mut self, number: &str, observation: &PartAttributes) -> usize {
        if let Some(existing) = self.parts.get_mut(number) {
            return existing.merge(observation);
        }
        let filled = usize::from(!observation.is_empty());
        self.parts.insert(
            number.to_string(),
            PartRecord::with_attributes(number, observation.clone()),
        );
        filled
    }

    /// Make sure a record exists for `number`, without attributes if new.
    pub fn ensure_part(&mut self, number: &str) {
        if !self.parts.contains_key(number) {
            self.parts
                .insert(number.to_string(), PartRecord::new(number));
        }
    }

    /// Insert an edge, creating bare records for both endpoints.
    pub fn add_edge(&mut self, parent: &str, child: &str) -> EdgeInsert {
        let outcome = self.edges.insert(parent, child);
        if outcome != EdgeInsert::SelfLoop {
            self.ensure_part(parent);
            self.ensure_part(child);
        }
        outcome
    }

    #[must_use]
    pub fn part(&self, number: &str) -> Option<&PartRecord> {
        self.parts.get(number)
    }

    #[must_use]
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Numbers of parts that have no name yet.
    pub fn unnamed_parts(&self) -> impl Iterator<Item = &str> {
        self.parts
            .values()
            .filter(|p| p.attributes.name.is_none())
            .map(|p| p.number.as_str())
    }

    /// Order-insensitive hash over parts and edges.
    ///
    /// Two graphs with the same part map and edge set hash equal regardless
    /// of discovery order, which makes it a cheap equality check between
    /// collection runs.
    #[must_use]
    pub fn content_hash(&self) -> u64 {
        let parts = self.parts.values().map(|part| {
            let mut record = b"p:".to_vec();
            record.extend(serde_json::to_vec(part).unwrap_or_default());
            record
        });
        let edges = self
            .edges
            .iter()
            .map(|edge| format!("e:{}\u{1f}{}", edge.parent, edge.child).into_bytes());
        unordered_hash(parts.chain(edges))
    }

    /// Write `parts.json` and `edges.json` into `dir`.
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir).map_err(|e| BomError::io(dir, e))?;
        write_json(&dir.join(PARTS_FILE), &self.parts)?;
        write_json(&dir.join(EDGES_FILE), &self.edges)?;
        Ok(())
    }

    /// Load a graph previously written by [`BomGraph::save`].
    ///
    /// A missing `parts.json` yields bare records for every edge endpoint.
    pub fn load(dir: &Path) -> Result<Self> {
        let edges: EdgeSet = read_json(&dir.join(EDGES_FILE))?;
        let parts_path = dir.join(PARTS_FILE);
        let parts: IndexMap<String, PartRecord> = if parts_path.exists() {
            read_json(&parts_path)?
        } else {
            IndexMap::new()
        };

        let mut graph = Self { parts, edges };
        let endpoints: Vec<String> = graph
            .edges
            .part_numbers()
            .into_iter()
            .map(str::to_string)
            .collect();
        for number in endpoints {
            graph.ensure_part(&number);
        }
        Ok(graph)
    }
}

pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(|e| BomError::io(path, e))
}

pub(crate) fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).map_err(|e| BomError::io(path, e))?;
    serde_json::from_str(&text).with_context(|| format!("reading {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> BomGraph {
        let mut graph = BomGraph::new();
        graph.merge_part("A", &PartAttributes::new().with_name("Assembly"));
        graph.add_edge("A", "B");
        graph.add_edge("B", "C");
        graph
    }

    #[test]
    fn test_add_edge_creates_parts() {
        let graph = sample();
        assert_eq!(graph.part_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.part("A").map(PartRecord::label), Some("Assembly"));
        assert_eq!(graph.unnamed_parts().collect::<Vec<_>>(), vec!["B", "C"]);
    }

    #[test]
    fn test_self_loop_creates_nothing() {
        let mut graph = BomGraph::new();
        assert_eq!(graph.add_edge("X", "X"), EdgeInsert::SelfLoop);
        assert_eq!(graph.part_count(), 0);
    }

    #[test]
    fn test_content_hash_ignores_order() {
        let a = sample();

        let mut b = BomGraph::new();
        b.add_edge("B", "C");
        b.add_edge("A", "B");
        b.merge_part("A", &PartAttributes::new().with_name("Assembly"));

        assert_eq!(a.content_hash(), b.content_hash());

        b.merge_part("C", &PartAttributes::new().with_name("Screw"));
        assert_ne!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let graph = sample();
        graph.save(dir.path()).unwrap();

        let loaded = BomGraph::load(dir.path()).unwrap();
        assert_eq!(loaded, graph);
    }

    #[test]
    fn test_load_without_parts_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(EDGES_FILE),
            r#"[{"parent":"A","child":"B"}]"#,
        )
        .unwrap();

        let graph = BomGraph::load(dir.path()).unwrap();
        assert_eq!(graph.part_count(), 2);
        assert!(graph.edges.contains("A", "B"));
    }
}
