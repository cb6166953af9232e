//! Bundled graph sinks.

use std::io::Write;
use std::path::Path;

use indexmap::{IndexMap, IndexSet};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use super::{GraphSink, PartRow, RelationKind};
use crate::error::{BomError, Result};
use crate::model::{write_json, Document, Edge};

/// In-memory export bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonBundle {
    /// Parts by number; later upserts fill missing fields only
    pub parts: IndexMap<String, PartRow>,
    /// Relations by kind label, deduplicated
    pub relations: IndexMap<String, IndexSet<Edge>>,
    /// Describing documents by number
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub documents: IndexMap<String, Document>,
}

/// Collects upserts into a [`JsonBundle`].
#[derive(Debug, Default)]
pub struct JsonBundleSink {
    bundle: JsonBundle,
}

impl JsonBundleSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn bundle(&self) -> &JsonBundle {
        &self.bundle
    }

    #[must_use]
    pub fn into_bundle(self) -> JsonBundle {
        self.bundle
    }

    /// Write the bundle as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, &self.bundle)
    }
}

impl GraphSink for JsonBundleSink {
    fn upsert_parts(&mut self, rows: &[PartRow]) -> Result<()> {
        for row in rows {
            match self.bundle.parts.get_mut(&row.number) {
                Some(existing) => fill_gaps(existing, row),
                None => {
                    self.bundle.parts.insert(row.number.clone(), row.clone());
                }
            }
        }
        Ok(())
    }

    fn upsert_relations(&mut self, kind: RelationKind, edges: &[Edge]) -> Result<()> {
        self.bundle
            .relations
            .entry(kind.as_str().to_string())
            .or_default()
            .extend(edges.iter().cloned());
        Ok(())
    }

    fn upsert_documents(&mut self, rows: &[Document]) -> Result<()> {
        for row in rows {
            self.bundle
                .documents
                .entry(row.number.clone())
                .or_insert_with(|| row.clone());
        }
        Ok(())
    }
}

fn fill_gaps(existing: &mut PartRow, row: &PartRow) {
    let fields = [
        (&mut existing.name, &row.name),
        (&mut existing.part_type, &row.part_type),
        (&mut existing.state, &row.state),
        (&mut existing.view, &row.view),
        (&mut existing.source, &row.source),
        (&mut existing.revision, &row.revision),
        (&mut existing.container, &row.container),
    ];
    for (slot, value) in fields {
        if slot.as_deref().map_or(true, str::is_empty) {
            if let Some(value) = value {
                *slot = Some(value.clone());
            }
        }
    }
}

/// Characters kept verbatim in part IRIs.
const IRI_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

const PART_PREFIX: &str = "urn:part:";
const DOCUMENT_PREFIX: &str = "urn:document:";
const ONTOLOGY_PREFIX: &str = "urn:ontology:";
const RDF_TYPE: &str = "<http://www.w3.org/1999/02/22-rdf-syntax-ns#type>";

/// Streams N-Triples to a writer.
///
/// Subjects are `urn:part:<percent-encoded number>` or, for documents,
/// `urn:document:<percent-encoded number>`; predicates live under
/// `urn:ontology:`.
pub struct NTriplesSink<W: Write> {
    writer: W,
    triples: usize,
}

impl<W: Write> NTriplesSink<W> {
    pub const fn new(writer: W) -> Self {
        Self { writer, triples: 0 }
    }

    /// Triples written so far.
    #[must_use]
    pub const fn triples(&self) -> usize {
        self.triples
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn emit(&mut self, subject: &str, predicate: &str, object: &str) -> Result<()> {
        self.triple(subject, &format!("<{ONTOLOGY_PREFIX}{predicate}>"), object)
    }

    fn triple(&mut self, subject: &str, predicate: &str, object: &str) -> Result<()> {
        writeln!(self.writer, "{subject} {predicate} {object} .")
            .map_err(|e| BomError::io("<n-triples output>", e))?;
        self.triples += 1;
        Ok(())
    }
}

fn iri(prefix: &str, number: &str) -> String {
    format!("<{prefix}{}>", utf8_percent_encode(number, IRI_ESCAPE))
}

fn part_iri(number: &str) -> String {
    iri(PART_PREFIX, number)
}

fn document_iri(number: &str) -> String {
    iri(DOCUMENT_PREFIX, number)
}

fn literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

impl<W: Write> GraphSink for NTriplesSink<W> {
    fn upsert_parts(&mut self, rows: &[PartRow]) -> Result<()> {
        for row in rows {
            let properties = [
                ("name", &row.name),
                ("hasState", &row.state),
                ("hasView", &row.view),
                ("hasSource", &row.source),
                ("hasRevision", &row.revision),
                ("inContainer", &row.container),
            ];
            for (predicate, value) in properties {
                if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                    self.emit(&part_iri(&row.number), predicate, &literal(value))?;
                }
            }
        }
        Ok(())
    }

    fn upsert_relations(&mut self, kind: RelationKind, edges: &[Edge]) -> Result<()> {
        for edge in edges {
            let subject = if kind.from_document() {
                document_iri(&edge.parent)
            } else {
                part_iri(&edge.parent)
            };
            self.emit(&subject, kind.predicate(), &part_iri(&edge.child))?;
        }
        Ok(())
    }

    fn upsert_documents(&mut self, rows: &[Document]) -> Result<()> {
        for row in rows {
            let subject = document_iri(&row.number);
            self.triple(&subject, RDF_TYPE, &format!("<{ONTOLOGY_PREFIX}Document>"))?;
            let properties = [
                ("hasRevision", &row.revision),
                ("hasOrganization", &row.organization),
                ("inContainer", &row.container),
            ];
            for (predicate, value) in properties {
                if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                    self.emit(&subject, predicate, &literal(value))?;
                }
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| BomError::io("<n-triples output>", e))
    }
}
