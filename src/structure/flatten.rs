//! Depth-first walk over arbitrary structure responses.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use serde_json::{Map, Value};

use super::StructureAliases;
use crate::model::{scalar_string, Edge, FieldAliases, PartAttributes};

/// Result of flattening one structure response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flattened {
    /// Parent→child edges in discovery order, deduplicated
    pub edges: Vec<Edge>,
    /// Attribute observations for every numbered node, in discovery order
    pub fragments: Vec<(String, PartAttributes)>,
    /// Opaque identifiers seen next to a part number
    pub identifiers: IndexMap<String, String>,
    /// Whether the walk hit the recursion bound
    pub truncated: bool,
}

impl Flattened {
    /// Children of `parent` among the flattened edges, in discovery order.
    pub fn children_of<'a>(&'a self, parent: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.parent == parent)
            .map(|e| e.child.as_str())
    }

    /// First part number seen in the response.
    #[must_use]
    pub fn root_number(&self) -> Option<&str> {
        self.fragments.first().map(|(number, _)| number.as_str())
    }
}

struct Walker<'a> {
    aliases: &'a StructureAliases,
    visited: HashSet<*const Map<String, Value>>,
    edges: IndexSet<Edge>,
    fragments: Vec<(String, PartAttributes)>,
    identifiers: IndexMap<String, String>,
    truncated: bool,
}

/// Flatten a structure response into edges and attribute fragments.
///
/// `parent` is the part number the response was requested for; nodes that
/// carry a number different from their parent context produce an edge, and
/// every numbered node becomes the parent context for what lies below it.
/// Each object is walked at most once even when it is reachable through both
/// a children alias and the generic recursion.
#[must_use]
pub fn flatten(value: &Value, parent: Option<&str>, aliases: &StructureAliases) -> Flattened {
    let mut walker = Walker {
        aliases,
        visited: HashSet::new(),
        edges: IndexSet::new(),
        fragments: Vec::new(),
        identifiers: IndexMap::new(),
        truncated: false,
    };
    walker.walk(value, parent, 0);

    if walker.truncated {
        tracing::warn!(
            max_depth = aliases.max_walk_depth,
            "Structure response nested deeper than the walk bound; truncated"
        );
    }

    Flattened {
        edges: walker.edges.into_iter().collect(),
        fragments: walker.fragments,
        identifiers: walker.identifiers,
        truncated: walker.truncated,
    }
}

impl Walker<'_> {
    fn walk(&mut self, value: &Value, parent: Option<&str>, depth: usize) {
        if depth > self.aliases.max_walk_depth {
            self.truncated = true;
            return;
        }
        match value {
            Value::Object(map) => self.walk_object(map, parent, depth),
            Value::Array(items) => {
                for item in items {
                    self.walk(item, parent, depth + 1);
                }
            }
            _ => {}
        }
    }

    fn walk_object(&mut self, map: &Map<String, Value>, parent: Option<&str>, depth: usize) {
        if !self.visited.insert(map as *const Map<String, Value>) {
            return;
        }

        let number = self.aliases.number.lookup(map).and_then(scalar_string);
        let context: Option<String> = match (&number, parent) {
            (Some(number), Some(parent)) => {
                if number != parent {
                    self.edges.insert(Edge::new(parent, number.as_str()));
                }
                Some(number.clone())
            }
            (Some(number), None) => Some(number.clone()),
            (None, parent) => parent.map(str::to_string),
        };

        if let Some(number) = &number {
            self.fragments
                .push((number.clone(), attributes_from_map(map, self.aliases)));
            if let Some(id) = self.aliases.id.lookup(map).and_then(scalar_string) {
                self.identifiers.entry(number.clone()).or_insert(id);
            }
        }

        for key in self.aliases.children.keys() {
            if let Some(Value::Array(items)) = map.get(key) {
                for item in items {
                    self.walk(item, context.as_deref(), depth + 1);
                }
            }
        }
        for nested in map.values() {
            if nested.is_object() || nested.is_array() {
                self.walk(nested, context.as_deref(), depth + 1);
            }
        }
    }
}

/// Whether a response describes more than one level below its root.
///
/// True when some children list contains a node that has a non-empty
/// children list of its own. A depth-N request answered with a single level
/// is detected this way and re-fetched by number.
#[must_use]
pub fn has_nested_children(value: &Value, aliases: &StructureAliases) -> bool {
    nested_check(value, &aliases.children, 0, aliases.max_walk_depth)
}

fn nested_check(value: &Value, children: &FieldAliases, depth: usize, max_depth: usize) -> bool {
    if depth > max_depth {
        return false;
    }
    match value {
        Value::Object(map) => {
            let grandchildren = child_lists(map, children).any(|items| {
                items.iter().any(|item| {
                    item.as_object()
                        .is_some_and(|child| child_lists(child, children).next().is_some())
                })
            });
            grandchildren
                || map
                    .values()
                    .any(|v| nested_check(v, children, depth + 1, max_depth))
        }
        Value::Array(items) => items
            .iter()
            .any(|v| nested_check(v, children, depth + 1, max_depth)),
        _ => false,
    }
}

fn child_lists<'a>(
    map: &'a Map<String, Value>,
    children: &'a FieldAliases,
) -> impl Iterator<Item = &'a Vec<Value>> + 'a {
    children.keys().iter().filter_map(move |key| match map.get(key) {
        Some(Value::Array(items)) if !items.is_empty() => Some(items),
        _ => None,
    })
}

/// Extract part attributes from a details record or structure node.
#[must_use]
pub fn attributes_from_record(value: &Value, aliases: &StructureAliases) -> PartAttributes {
    value
        .as_object()
        .map(|map| attributes_from_map(map, aliases))
        .unwrap_or_default()
}

fn attributes_from_map(map: &Map<String, Value>, aliases: &StructureAliases) -> PartAttributes {
    let get = |field: &FieldAliases| field.lookup(map).and_then(scalar_string);
    PartAttributes {
        name: get(&aliases.name),
        part_type: get(&aliases.part_type),
        state: get(&aliases.state),
        source: get(&aliases.source),
        revision: get(&aliases.revision),
        container: get(&aliases.container),
        view: get(&aliases.view),
        extra: IndexMap::new(),
    }
}
