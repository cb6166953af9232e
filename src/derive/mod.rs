//! Relations derived from the component edges.
//!
//! - `used_in`: every `has_component` edge reversed.
//! - `part_of_assembly`: one `(descendant, ancestor)` pair for every part
//!   reachable below another, i.e. the transitive closure read upwards.
//!
//! The closure is computed over the condensation of the graph (strongly
//! connected components), so cyclic BOM data terminates. Parts in the same
//! cycle are each other's ancestors; self pairs are dropped.

use std::collections::HashMap;

use indexmap::IndexSet;
use pathfinding::directed::strongly_connected_components::strongly_connected_components;
use pathfinding::directed::topological_sort::topological_sort;
use serde::Serialize;

use crate::error::{BomError, OptionContext, Result};
use crate::model::{Edge, EdgeSet};

/// Derived relation sets. Each relation is an [`Edge`] read as
/// `(subject, object)`: `used_in` holds `(child, parent)` and
/// `part_of_assembly` holds `(descendant, ancestor)`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DerivedRelations {
    pub used_in: Vec<Edge>,
    pub part_of_assembly: Vec<Edge>,
    /// Strongly connected components with more than one part
    pub cyclic_components: usize,
}

impl DerivedRelations {
    /// Build both relation sets from `edges`.
    pub fn build(edges: &EdgeSet) -> Result<Self> {
        let used_in = edges.iter().map(Edge::reversed).collect();
        let closure = Closure::compute(edges)?;
        Ok(Self {
            used_in,
            part_of_assembly: closure.pairs(),
            cyclic_components: closure.cyclic_components(),
        })
    }

    pub fn log_summary(&self) {
        tracing::info!(
            "Derived {} used_in and {} part_of_assembly relations",
            self.used_in.len(),
            self.part_of_assembly.len()
        );
        if self.cyclic_components > 0 {
            tracing::warn!(
                "BOM contains {} cycles; parts in a cycle are treated as mutual ancestors",
                self.cyclic_components
            );
        }
    }
}

/// Descendant sets per strongly connected component.
struct Closure<'a> {
    members: Vec<Vec<&'a str>>,
    descendants: Vec<IndexSet<usize>>,
    order: Vec<&'a str>,
    component_of: HashMap<&'a str, usize>,
}

impl<'a> Closure<'a> {
    fn compute(edges: &'a EdgeSet) -> Result<Self> {
        let adjacency = edges.adjacency();
        let order: Vec<&str> = edges.part_numbers().into_iter().collect();

        let members = strongly_connected_components(&order, |node| {
            adjacency.get(node).cloned().unwrap_or_default()
        });

        let mut component_of = HashMap::with_capacity(order.len());
        for (idx, component) in members.iter().enumerate() {
            for node in component {
                component_of.insert(*node, idx);
            }
        }

        let mut successors: Vec<IndexSet<usize>> = vec![IndexSet::new(); members.len()];
        for edge in edges {
            let from = *component_of
                .get(edge.parent.as_str())
                .with_context_none(|| format!("part {} has no component", edge.parent))?;
            let to = *component_of
                .get(edge.child.as_str())
                .with_context_none(|| format!("part {} has no component", edge.child))?;
            if from != to {
                successors[from].insert(to);
            }
        }

        let roots: Vec<usize> = (0..members.len()).collect();
        let sorted = topological_sort(&roots, |c| {
            successors[*c].iter().copied().collect::<Vec<_>>()
        })
        .map_err(|c| BomError::validation(format!("component {c} of the condensation is cyclic")))?;

        // Children before parents.
        let mut descendants: Vec<IndexSet<usize>> = vec![IndexSet::new(); members.len()];
        for &component in sorted.iter().rev() {
            let mut below = IndexSet::new();
            for &succ in &successors[component] {
                below.insert(succ);
                below.extend(descendants[succ].iter().copied());
            }
            descendants[component] = below;
        }

        Ok(Self {
            members,
            descendants,
            order,
            component_of,
        })
    }

    fn cyclic_components(&self) -> usize {
        self.members.iter().filter(|m| m.len() > 1).count()
    }

    /// `(descendant, ancestor)` pairs, ancestors in part discovery order.
    fn pairs(&self) -> Vec<Edge> {
        let mut pairs = Vec::new();
        for ancestor in &self.order {
            let Some(&component) = self.component_of.get(ancestor) else {
                continue;
            };
            for peer in &self.members[component] {
                if peer != ancestor {
                    pairs.push(Edge::new(*peer, *ancestor));
                }
            }
            for &below in &self.descendants[component] {
                for descendant in &self.members[below] {
                    pairs.push(Edge::new(*descendant, *ancestor));
                }
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges(pairs: &[(&str, &str)]) -> EdgeSet {
        pairs.iter().map(|(p, c)| Edge::new(*p, *c)).collect()
    }

    fn has(relations: &[Edge], subject: &str, object: &str) -> bool {
        relations.iter().any(|e| e.parent == subject && e.child == object)
    }

    #[test]
    fn test_diamond_closure() {
        let set = edges(&[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")]);
        let derived = DerivedRelations::build(&set).unwrap();

        assert_eq!(derived.used_in.len(), 4);
        assert!(has(&derived.used_in, "D", "B"));

        let closure = &derived.part_of_assembly;
        assert_eq!(closure.len(), 5);
        assert!(has(closure, "B", "A"));
        assert!(has(closure, "C", "A"));
        assert!(has(closure, "D", "A"));
        assert!(has(closure, "D", "B"));
        assert!(has(closure, "D", "C"));
        assert_eq!(derived.cyclic_components, 0);
    }

    #[test]
    fn test_cycle_terminates_without_self_pairs() {
        let set = edges(&[("A", "B"), ("B", "C"), ("C", "B"), ("C", "D")]);
        let derived = DerivedRelations::build(&set).unwrap();
        let closure = &derived.part_of_assembly;

        assert_eq!(derived.cyclic_components, 1);
        assert!(closure.iter().all(|e| e.parent != e.child));
        assert!(has(closure, "B", "C"));
        assert!(has(closure, "C", "B"));
        assert!(has(closure, "D", "A"));
        assert!(has(closure, "D", "B"));
        assert!(!has(closure, "A", "B"));
        // A: B, C, D; B: C, D; C: B, D
        assert_eq!(closure.len(), 7);
    }

    #[test]
    fn test_empty() {
        let derived = DerivedRelations::build(&EdgeSet::new()).unwrap();
        assert!(derived.used_in.is_empty());
        assert!(derived.part_of_assembly.is_empty());
    }
}
