//! Part links outside the component structure: alternates and documents.

use std::path::Path;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use super::{read_json, write_json, Edge, EdgeInsert};
use crate::error::Result;

/// File name of the persisted link lists.
pub const LINKS_FILE: &str = "links.json";

/// Link type used when an alternates table has no type column.
pub const DEFAULT_ALTERNATE_TYPE: &str = "alternate";

/// A part and a replacement that may stand in for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternateLink {
    pub part: String,
    pub replacement: String,
    pub link_type: String,
}

/// A document that describes a part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescribeLink {
    pub document: String,
    pub part: String,
}

/// Document attributes seen on describe rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
}

impl Document {
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            ..Self::default()
        }
    }

    fn fill_gaps(&mut self, other: &Self) {
        for (mine, theirs) in [
            (&mut self.revision, &other.revision),
            (&mut self.organization, &other.organization),
            (&mut self.container, &other.container),
        ] {
            if mine.is_none() {
                mine.clone_from(theirs);
            }
        }
    }
}

/// Alternate and describe links, deduplicated and in first-seen order.
///
/// Alternate edges run part → replacement; describe edges run
/// document → part. A repeated alternate keeps its first link type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LinkLists", into = "LinkLists")]
pub struct PartLinks {
    alternates: IndexMap<Edge, String>,
    describes: IndexSet<Edge>,
    documents: IndexMap<String, Document>,
}

#[derive(Default, Serialize, Deserialize)]
struct LinkLists {
    #[serde(default)]
    alternates: Vec<AlternateLink>,
    #[serde(default)]
    describes: Vec<DescribeLink>,
    #[serde(default)]
    documents: Vec<Document>,
}

impl PartLinks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `replacement` may stand in for `part`.
    pub fn add_alternate(&mut self, part: &str, replacement: &str, link_type: &str) -> EdgeInsert {
        if part == replacement {
            return EdgeInsert::SelfLoop;
        }
        match self.alternates.entry(Edge::new(part, replacement)) {
            indexmap::map::Entry::Occupied(_) => EdgeInsert::Duplicate,
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(link_type.to_string());
                EdgeInsert::Added
            }
        }
    }

    /// Record that `document` describes `part`. Document attributes from
    /// later rows only fill gaps.
    pub fn add_describe(&mut self, document: &Document, part: &str) -> EdgeInsert {
        self.documents
            .entry(document.number.clone())
            .and_modify(|known| known.fill_gaps(document))
            .or_insert_with(|| document.clone());
        if self.describes.insert(Edge::new(&document.number, part)) {
            EdgeInsert::Added
        } else {
            EdgeInsert::Duplicate
        }
    }

    /// Alternate links with their types.
    pub fn alternates(&self) -> impl Iterator<Item = AlternateLink> + '_ {
        self.alternates.iter().map(|(edge, link_type)| AlternateLink {
            part: edge.parent.clone(),
            replacement: edge.child.clone(),
            link_type: link_type.clone(),
        })
    }

    /// Part → replacement edges.
    pub fn alternate_edges(&self) -> impl Iterator<Item = &Edge> {
        self.alternates.keys()
    }

    /// Document → part edges.
    pub fn describe_edges(&self) -> impl Iterator<Item = &Edge> {
        self.describes.iter()
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    #[must_use]
    pub fn alternate_count(&self) -> usize {
        self.alternates.len()
    }

    #[must_use]
    pub fn describe_count(&self) -> usize {
        self.describes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alternates.is_empty() && self.describes.is_empty()
    }

    /// Persist as `links.json` under `dir`.
    pub fn save(&self, dir: &Path) -> Result<()> {
        write_json(&dir.join(LINKS_FILE), self)
    }

    /// Load `links.json` from `dir`; an absent file yields no links.
    pub fn load_if_present(dir: &Path) -> Result<Self> {
        let path = dir.join(LINKS_FILE);
        if path.exists() {
            read_json(&path)
        } else {
            Ok(Self::default())
        }
    }
}

impl From<LinkLists> for PartLinks {
    fn from(lists: LinkLists) -> Self {
        let mut links = Self::new();
        for alternate in &lists.alternates {
            links.add_alternate(&alternate.part, &alternate.replacement, &alternate.link_type);
        }
        for document in &lists.documents {
            links
                .documents
                .insert(document.number.clone(), document.clone());
        }
        for describe in lists.describes {
            links
                .documents
                .entry(describe.document.clone())
                .or_insert_with(|| Document::new(&describe.document));
            links
                .describes
                .insert(Edge::new(describe.document, describe.part));
        }
        links
    }
}

impl From<PartLinks> for LinkLists {
    fn from(links: PartLinks) -> Self {
        Self {
            alternates: links.alternates().collect(),
            describes: links
                .describes
                .iter()
                .map(|edge| DescribeLink {
                    document: edge.parent.clone(),
                    part: edge.child.clone(),
                })
                .collect(),
            documents: links.documents.into_values().collect(),
        }
    }
}
