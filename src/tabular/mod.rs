//! Tabular BOM input.
//!
//! Spreadsheet and CSV exports come in three shapes:
//!
//! - **Level-indexed**: `Number` + `Level` columns; the parent of a row at
//!   level L is the most recent row at level L−1.
//! - **Number pairs**: explicit parent/child number columns.
//! - **Name pairs**: explicit parent/child *name* columns, resolved to
//!   numbers afterwards by [`crate::resolve`].
//!
//! Two link tables ride alongside the structure: alternates (part plus
//! replacement number) and describes (document number plus part number).
//!
//! Column lookup is case-insensitive and alias-driven ([`TabularAliases`]).
//! A table missing the required columns is skipped with a warning; a row
//! missing required cells is counted and skipped.

mod bom;
mod reader;
mod xref;

pub use bom::{parse_tables, BomShape, LevelOutcome, LevelStack, NameRow, ParsedBom, PartUsage};
pub use reader::{read_csv, read_csv_str};
pub use xref::{parse_parts, CrossReferenceIndex};

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::FieldAliases;

/// A named table of string cells with a header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Table or sheet name
    pub name: String,
    /// Header cells, as found
    pub headers: Vec<String>,
    /// Data rows (may be ragged)
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Lower-cased, trimmed header text → column index. First occurrence wins.
    #[must_use]
    pub fn header_map(&self) -> IndexMap<String, usize> {
        let mut map = IndexMap::new();
        for (i, header) in self.headers.iter().enumerate() {
            let key = header.trim().to_lowercase();
            if !key.is_empty() {
                map.entry(key).or_insert(i);
            }
        }
        map
    }

    /// Trimmed, non-empty cell value.
    #[must_use]
    pub fn cell(row: &[String], column: Option<usize>) -> Option<&str> {
        column
            .and_then(|idx| row.get(idx))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }
}

/// Column aliases for tabular inputs. Matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TabularAliases {
    pub number: FieldAliases,
    pub level: FieldAliases,
    pub name: FieldAliases,
    pub parent_number: FieldAliases,
    pub child_number: FieldAliases,
    pub parent_name: FieldAliases,
    pub child_name: FieldAliases,
    pub part_type: FieldAliases,
    pub source: FieldAliases,
    pub view: FieldAliases,
    pub state: FieldAliases,
    pub revision: FieldAliases,
    pub container: FieldAliases,
    pub quantity: FieldAliases,
    pub unit: FieldAliases,
    pub find_number: FieldAliases,
    pub line_number: FieldAliases,
    pub reference_designators: FieldAliases,
    pub trace_code: FieldAliases,
    pub component_id: FieldAliases,
    pub replacement_number: FieldAliases,
    pub replacement_type: FieldAliases,
    pub document_number: FieldAliases,
    pub document_revision: FieldAliases,
    pub document_organization: FieldAliases,
    pub document_container: FieldAliases,
}

impl Default for TabularAliases {
    fn default() -> Self {
        Self {
            number: FieldAliases::new(["number", "part number"]),
            level: FieldAliases::new(["level"]),
            name: FieldAliases::new(["name", "part name"]),
            parent_number: FieldAliases::new([
                "parent number",
                "parent",
                "number",
                "parent part number",
            ]),
            child_number: FieldAliases::new([
                "child number",
                "child",
                "component id",
                "child part number",
            ]),
            parent_name: FieldAliases::new(["parent name", "name"]),
            child_name: FieldAliases::new(["child name", "component name"]),
            part_type: FieldAliases::new(["type"]),
            source: FieldAliases::new(["source"]),
            view: FieldAliases::new(["view"]),
            state: FieldAliases::new(["state"]),
            revision: FieldAliases::new(["revision"]),
            container: FieldAliases::new(["container"]),
            quantity: FieldAliases::new(["quantity", "qty"]),
            unit: FieldAliases::new(["unit of measure", "unit", "uom"]),
            find_number: FieldAliases::new(["find number"]),
            line_number: FieldAliases::new(["line number"]),
            reference_designators: FieldAliases::new(["reference designators"]),
            trace_code: FieldAliases::new(["trace code"]),
            component_id: FieldAliases::new(["component id"]),
            replacement_number: FieldAliases::new([
                "replacement part number",
                "replacement number",
                "alternate part number",
            ]),
            replacement_type: FieldAliases::new(["replacement type", "alternate type"]),
            document_number: FieldAliases::new(["document number"]),
            document_revision: FieldAliases::new(["document revision"]),
            document_organization: FieldAliases::new([
                "document owning organization",
                "document organization",
            ]),
            document_container: FieldAliases::new(["document container"]),
        }
    }
}

impl TabularAliases {
    /// Every alias that names a structural column. Used to locate the real
    /// header row in exports that carry a preamble.
    pub(crate) fn structural_keys(&self) -> impl Iterator<Item = String> + '_ {
        [
            &self.number,
            &self.level,
            &self.name,
            &self.parent_number,
            &self.child_number,
            &self.parent_name,
            &self.child_name,
            &self.replacement_number,
            &self.document_number,
        ]
        .into_iter()
        .flat_map(|aliases| aliases.keys().iter().map(|k| k.trim().to_lowercase()))
    }
}

/// Counters for a tabular parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabularStats {
    /// Tables recognized and parsed
    pub tables_parsed: usize,
    /// Tables skipped for missing required columns
    pub tables_skipped: usize,
    /// Data rows examined
    pub rows_read: usize,
    /// Rows missing a required cell or with an unparseable level
    pub rows_malformed: usize,
    /// Level-indexed rows with no entry at level − 1
    pub orphan_rows: usize,
    /// Rows whose parent equals the child
    pub self_loops: usize,
    /// Rows repeating an edge already seen
    pub duplicates: usize,
    /// Distinct edges produced
    pub edges_added: usize,
    /// Name-pair rows handed to name resolution
    pub name_rows: usize,
    /// Distinct alternate and describe links produced
    #[serde(default)]
    pub links_added: usize,
    /// Skip messages (table and row) for the summary
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl TabularStats {
    /// Fold another stats object into this one.
    pub fn merge(&mut self, other: &Self) {
        self.tables_parsed += other.tables_parsed;
        self.tables_skipped += other.tables_skipped;
        self.rows_read += other.rows_read;
        self.rows_malformed += other.rows_malformed;
        self.orphan_rows += other.orphan_rows;
        self.self_loops += other.self_loops;
        self.duplicates += other.duplicates;
        self.edges_added += other.edges_added;
        self.name_rows += other.name_rows;
        self.links_added += other.links_added;
        self.warnings.extend(other.warnings.iter().cloned());
    }

    /// Rows that contributed nothing.
    #[must_use]
    pub const fn rows_skipped(&self) -> usize {
        self.rows_malformed + self.orphan_rows + self.self_loops
    }

    /// Log a summary of the parse.
    pub fn log_summary(&self) {
        tracing::info!(
            "Tabular parse: {} tables ({} skipped), {} rows, {} edges, {} links, {} duplicates, {} skipped ({} malformed, {} orphan, {} self-loop)",
            self.tables_parsed,
            self.tables_skipped,
            self.rows_read,
            self.edges_added,
            self.links_added,
            self.duplicates,
            self.rows_skipped(),
            self.rows_malformed,
            self.orphan_rows,
            self.self_loops
        );
        for warning in self.warnings.iter().take(20) {
            tracing::warn!("  {}", warning);
        }
        if self.warnings.len() > 20 {
            tracing::warn!("  ... and {} more", self.warnings.len() - 20);
        }
    }
}
