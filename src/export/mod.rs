//! Hand-off of a collected graph to a graph store.
//!
//! [`GraphExport`] gathers parts, documents and the relation sets
//! (`has_component`, `used_in`, `part_of_assembly`, plus `has_alternate`
//! and `describes` when link tables were parsed) and writes them to a
//! [`GraphSink`] in fixed-size batches. Two sinks ship with the crate: an
//! in-memory [`JsonBundleSink`] and an [`NTriplesSink`] streaming RDF lines.

mod csv_out;
mod sinks;

pub use csv_out::{write_edges_csv, write_name_bom_csv};
pub use sinks::{JsonBundle, JsonBundleSink, NTriplesSink};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::derive::DerivedRelations;
use crate::error::Result;
use crate::model::{BomGraph, Document, Edge, PartLinks, PartRecord};

/// Rows per sink call.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Relation written to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// parent → child
    HasComponent,
    /// child → parent
    UsedIn,
    /// descendant → ancestor
    PartOfAssembly,
    /// part → replacement
    HasAlternate,
    /// document → part
    Describes,
}

impl RelationKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::HasComponent => "has_component",
            Self::UsedIn => "used_in",
            Self::PartOfAssembly => "part_of_assembly",
            Self::HasAlternate => "has_alternate",
            Self::Describes => "describes",
        }
    }

    /// Ontology predicate name.
    #[must_use]
    pub const fn predicate(&self) -> &'static str {
        match self {
            Self::HasComponent => "hasComponent",
            Self::UsedIn => "usedIn",
            Self::PartOfAssembly => "partOfAssembly",
            Self::HasAlternate => "hasAlternate",
            Self::Describes => "describes",
        }
    }

    /// True when the edge's parent is a document number rather than a part.
    #[must_use]
    pub const fn from_document(&self) -> bool {
        matches!(self, Self::Describes)
    }
}

/// Flat part row as written to a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRow {
    pub number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
}

impl From<&PartRecord> for PartRow {
    fn from(record: &PartRecord) -> Self {
        let attrs = &record.attributes;
        Self {
            number: record.number.clone(),
            name: attrs.name.clone(),
            part_type: attrs
                .part_type
                .clone()
                .or_else(|| attrs.extra.get("part_type").cloned()),
            state: attrs.state.clone(),
            view: attrs.view.clone(),
            source: attrs.source.clone(),
            revision: attrs.revision.clone(),
            container: attrs.container.clone(),
        }
    }
}

/// Write side of a graph store. Calls are idempotent upserts.
pub trait GraphSink {
    fn upsert_parts(&mut self, rows: &[PartRow]) -> Result<()>;

    fn upsert_relations(&mut self, kind: RelationKind, edges: &[Edge]) -> Result<()>;

    fn upsert_documents(&mut self, rows: &[Document]) -> Result<()>;

    /// Flush buffered output.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Counts of what an export wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportStats {
    pub parts: usize,
    pub documents: usize,
    pub relations: IndexMap<String, usize>,
    pub batches: usize,
}

impl ExportStats {
    pub fn log_summary(&self) {
        let relations: usize = self.relations.values().sum();
        tracing::info!(
            "Export complete: {} parts, {} documents, {} relations in {} batches",
            self.parts,
            self.documents,
            relations,
            self.batches
        );
    }
}

/// Everything one export writes.
#[derive(Debug, Clone, Default)]
pub struct GraphExport {
    pub parts: Vec<PartRow>,
    pub documents: Vec<Document>,
    pub relations: IndexMap<RelationKind, Vec<Edge>>,
}

impl GraphExport {
    /// Parts and `has_component` edges only.
    #[must_use]
    pub fn from_graph(graph: &BomGraph) -> Self {
        let mut relations = IndexMap::new();
        relations.insert(
            RelationKind::HasComponent,
            graph.edges.iter().cloned().collect(),
        );
        Self {
            parts: graph.parts.values().map(PartRow::from).collect(),
            documents: Vec::new(),
            relations,
        }
    }

    /// Add `used_in` and `part_of_assembly`.
    #[must_use]
    pub fn with_derived(mut self, derived: DerivedRelations) -> Self {
        self.relations.insert(RelationKind::UsedIn, derived.used_in);
        self.relations
            .insert(RelationKind::PartOfAssembly, derived.part_of_assembly);
        self
    }

    /// Add `has_alternate`, `describes` and the describing documents.
    /// Empty link sets add nothing.
    #[must_use]
    pub fn with_links(mut self, links: &PartLinks) -> Self {
        if links.alternate_count() > 0 {
            self.relations.insert(
                RelationKind::HasAlternate,
                links.alternate_edges().cloned().collect(),
            );
        }
        if links.describe_count() > 0 {
            self.relations.insert(
                RelationKind::Describes,
                links.describe_edges().cloned().collect(),
            );
            self.documents = links.documents().cloned().collect();
        }
        self
    }

    /// Write everything to `sink` in batches of `batch_size`.
    pub fn write_to<K: GraphSink + ?Sized>(&self, sink: &mut K, batch_size: usize) -> Result<ExportStats> {
        let batch_size = batch_size.max(1);
        let mut stats = ExportStats::default();

        for batch in self.parts.chunks(batch_size) {
            sink.upsert_parts(batch)?;
            stats.parts += batch.len();
            stats.batches += 1;
        }
        for batch in self.documents.chunks(batch_size) {
            sink.upsert_documents(batch)?;
            stats.documents += batch.len();
            stats.batches += 1;
        }
        for (kind, edges) in &self.relations {
            for batch in edges.chunks(batch_size) {
                sink.upsert_relations(*kind, batch)?;
                stats.batches += 1;
                tracing::debug!(relation = kind.as_str(), rows = batch.len(), "Wrote batch");
            }
            stats
                .relations
                .insert(kind.as_str().to_string(), edges.len());
        }
        sink.finish()?;
        Ok(stats)
    }
}
