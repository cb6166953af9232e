//! Parent→child component edges.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// A directed "has component" relationship.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    /// Assembly part number
    pub parent: String,
    /// Component part number
    pub child: String,
}

impl Edge {
    pub fn new(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
        }
    }

    /// The edge with parent and child swapped.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            parent: self.child.clone(),
            child: self.parent.clone(),
        }
    }

    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.parent == self.child
    }
}

/// Outcome of inserting into an [`EdgeSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeInsert {
    /// New edge stored
    Added,
    /// Already present; nothing changed
    Duplicate,
    /// Parent equals child; rejected
    SelfLoop,
}

/// Deduplicated, insertion-ordered set of edges.
///
/// Self-loops are never stored. Iteration order is first-insertion order,
/// which keeps children in source order for [`EdgeSet::children_of`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Edge>", into = "Vec<Edge>")]
pub struct EdgeSet {
    edges: IndexSet<Edge>,
}

impl EdgeSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an edge, rejecting self-loops.
    pub fn insert(&mut self, parent: &str, child: &str) -> EdgeInsert {
        if parent == child {
            tracing::warn!(part = parent, "Rejected self-loop edge");
            return EdgeInsert::SelfLoop;
        }
        if self.edges.insert(Edge::new(parent, child)) {
            EdgeInsert::Added
        } else {
            EdgeInsert::Duplicate
        }
    }

    /// Insert an existing [`Edge`] value.
    pub fn insert_edge(&mut self, edge: &Edge) -> EdgeInsert {
        self.insert(&edge.parent, &edge.child)
    }

    #[must_use]
    pub fn contains(&self, parent: &str, child: &str) -> bool {
        self.edges.contains(&Edge::new(parent, child))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Children of `parent`, in insertion order.
    pub fn children_of<'a>(&'a self, parent: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.parent == parent)
            .map(|e| e.child.as_str())
    }

    /// Every part number mentioned by an edge, in first-seen order.
    #[must_use]
    pub fn part_numbers(&self) -> IndexSet<&str> {
        let mut numbers = IndexSet::new();
        for edge in &self.edges {
            numbers.insert(edge.parent.as_str());
            numbers.insert(edge.child.as_str());
        }
        numbers
    }

    /// Adjacency list (parent → children) in source order.
    #[must_use]
    pub fn adjacency(&self) -> indexmap::IndexMap<&str, Vec<&str>> {
        let mut adjacency: indexmap::IndexMap<&str, Vec<&str>> = indexmap::IndexMap::new();
        for edge in &self.edges {
            adjacency
                .entry(edge.parent.as_str())
                .or_default()
                .push(edge.child.as_str());
        }
        adjacency
    }
}

impl<'a> IntoIterator for &'a EdgeSet {
    type Item = &'a Edge;
    type IntoIter = indexmap::set::Iter<'a, Edge>;

    fn into_iter(self) -> Self::IntoIter {
        self.edges.iter()
    }
}

impl From<Vec<Edge>> for EdgeSet {
    fn from(edges: Vec<Edge>) -> Self {
        edges.into_iter().collect()
    }
}

impl From<EdgeSet> for Vec<Edge> {
    fn from(set: EdgeSet) -> Self {
        set.edges.into_iter().collect()
    }
}

impl FromIterator<Edge> for EdgeSet {
    fn from_iter<I: IntoIterator<Item = Edge>>(iter: I) -> Self {
        let mut set = Self::new();
        for edge in iter {
            set.insert_edge(&edge);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_and_self_loop() {
        let mut edges = EdgeSet::new();
        assert_eq!(edges.insert("A", "B"), EdgeInsert::Added);
        assert_eq!(edges.insert("A", "B"), EdgeInsert::Duplicate);
        assert_eq!(edges.insert("A", "A"), EdgeInsert::SelfLoop);
        assert_eq!(edges.len(), 1);
        assert!(!edges.contains("A", "A"));
    }

    #[test]
    fn test_children_in_source_order() {
        let mut edges = EdgeSet::new();
        edges.insert("A", "C");
        edges.insert("B", "X");
        edges.insert("A", "B");
        let children: Vec<_> = edges.children_of("A").collect();
        assert_eq!(children, vec!["C", "B"]);
    }

    #[test]
    fn test_from_iter_drops_self_loops() {
        let set: EdgeSet = vec![Edge::new("A", "B"), Edge::new("B", "B"), Edge::new("A", "B")]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_serde_as_list() {
        let mut edges = EdgeSet::new();
        edges.insert("A", "B");
        let json = serde_json::to_string(&edges).unwrap();
        assert_eq!(json, r#"[{"parent":"A","child":"B"}]"#);
    }
}
