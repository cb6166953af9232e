//! Tabular BOM parsing: level-indexed, number pairs, name pairs, plus the
//! alternate and describe link tables.

use serde::{Deserialize, Serialize};

use super::{Table, TabularAliases, TabularStats};
use crate::model::{
    normalize_part_number, Document, EdgeInsert, EdgeSet, PartLinks, DEFAULT_ALTERNATE_TYPE,
};

/// Recognized layout of a BOM table, with resolved column indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BomShape {
    /// `Number` + `Level`
    Level { number: usize, level: usize },
    /// Explicit parent/child number columns
    NumberPairs { parent: usize, child: usize },
    /// Explicit parent/child name columns
    NamePairs { parent: usize, child: usize },
    /// Part + replacement number, optional link type
    Alternates {
        part: usize,
        replacement: usize,
        link_type: Option<usize>,
    },
    /// Document number + described part number
    Describes { document: usize, part: usize },
}

impl BomShape {
    /// Detect the table layout. Link tables are recognized first by their
    /// document or replacement column; then level-indexed wins over pairs,
    /// numbers over names.
    #[must_use]
    pub fn detect(table: &Table, aliases: &TabularAliases) -> Option<Self> {
        let headers = table.header_map();
        if let (Some(document), Some(part)) = (
            aliases.document_number.find_column(&headers),
            aliases.number.find_column(&headers),
        ) {
            if document != part {
                return Some(Self::Describes { document, part });
            }
        }
        if let Some(replacement) = aliases.replacement_number.find_column(&headers) {
            let part = aliases
                .child_number
                .find_column(&headers)
                .or_else(|| aliases.number.find_column(&headers))
                .filter(|part| *part != replacement);
            if let Some(part) = part {
                return Some(Self::Alternates {
                    part,
                    replacement,
                    link_type: aliases.replacement_type.find_column(&headers),
                });
            }
        }
        if let (Some(number), Some(level)) = (
            aliases.number.find_column(&headers),
            aliases.level.find_column(&headers),
        ) {
            return Some(Self::Level { number, level });
        }
        if let (Some(parent), Some(child)) = (
            aliases.parent_number.find_column(&headers),
            aliases.child_number.find_column(&headers),
        ) {
            if parent != child {
                return Some(Self::NumberPairs { parent, child });
            }
        }
        if let (Some(parent), Some(child)) = (
            aliases.parent_name.find_column(&headers),
            aliases.child_name.find_column(&headers),
        ) {
            if parent != child {
                return Some(Self::NamePairs { parent, child });
            }
        }
        None
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Level { .. } => "level-indexed",
            Self::NumberPairs { .. } => "number pairs",
            Self::NamePairs { .. } => "name pairs",
            Self::Alternates { .. } => "alternates",
            Self::Describes { .. } => "describes",
        }
    }
}

/// Result of pushing one row onto a [`LevelStack`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelOutcome {
    /// Level 0; no parent
    Root,
    /// Parent is the most recent row at level − 1
    Child(String),
    /// No row at level − 1 yet; the row is rejected
    Orphan,
}

/// Level → part-number stack for level-indexed BOMs.
///
/// The stack always holds a contiguous chain of ancestors, one per level
/// starting at 0. Pushing a row at level L discards every entry at level ≥ L
/// before recording the row, so rows that can no longer be ancestors are
/// forgotten. A rejected orphan leaves the stack untouched.
#[derive(Debug, Clone, Default)]
pub struct LevelStack {
    chain: Vec<String>,
}

impl LevelStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `number` at `level` and report its parent.
    pub fn push(&mut self, number: &str, level: usize) -> LevelOutcome {
        if level > self.chain.len() {
            return LevelOutcome::Orphan;
        }
        self.chain.truncate(level);
        let outcome = match self.chain.last() {
            Some(parent) => LevelOutcome::Child(parent.clone()),
            None => LevelOutcome::Root,
        };
        self.chain.push(number.to_string());
        outcome
    }

    /// Current depth of the ancestor chain.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.chain.len()
    }
}

/// Per-usage attributes captured from a level-indexed row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartUsage {
    pub parent: String,
    pub child: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub find_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_designators: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
}

/// A parent/child pair given by names, pending resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRow {
    pub parent_name: String,
    pub child_name: String,
}

/// Combined output of parsing a set of tables.
#[derive(Debug, Clone, Default)]
pub struct ParsedBom {
    /// Number edges from level-indexed and number-pair tables
    pub edges: EdgeSet,
    /// Usage attributes from level-indexed tables
    pub usages: Vec<PartUsage>,
    /// Name pairs awaiting resolution
    pub name_rows: Vec<NameRow>,
    /// Alternate and describe links
    pub links: PartLinks,
    pub stats: TabularStats,
}

/// Parse every table into edges, usages, name rows and links.
///
/// Tables whose shape cannot be detected are skipped with a warning.
pub fn parse_tables<'a, I>(tables: I, aliases: &TabularAliases) -> ParsedBom
where
    I: IntoIterator<Item = &'a Table>,
{
    let mut parsed = ParsedBom::default();
    for table in tables {
        match BomShape::detect(table, aliases) {
            Some(shape) => {
                tracing::debug!(table = %table.name, shape = shape.label(), "Parsing BOM table");
                parsed.stats.tables_parsed += 1;
                match shape {
                    BomShape::Level { number, level } => {
                        parse_level_table(table, number, level, aliases, &mut parsed);
                    }
                    BomShape::NumberPairs { parent, child } => {
                        parse_number_pairs(table, parent, child, &mut parsed);
                    }
                    BomShape::NamePairs { parent, child } => {
                        parse_name_pairs(table, parent, child, &mut parsed);
                    }
                    BomShape::Alternates {
                        part,
                        replacement,
                        link_type,
                    } => {
                        parse_alternates(table, part, replacement, link_type, &mut parsed);
                    }
                    BomShape::Describes { document, part } => {
                        parse_describes(table, document, part, aliases, &mut parsed);
                    }
                }
            }
            None => {
                tracing::warn!(
                    table = %table.name,
                    columns = ?table.headers,
                    "Table missing required BOM columns; skipped"
                );
                parsed.stats.tables_skipped += 1;
                parsed
                    .stats
                    .warnings
                    .push(format!("{}: missing required BOM columns", table.name));
            }
        }
    }
    parsed
}

fn parse_level(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    if let Ok(level) = raw.parse::<usize>() {
        return Some(level);
    }
    let float: f64 = raw.parse().ok()?;
    if float.fract() == 0.0 && float >= 0.0 && float <= f64::from(u32::MAX) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        return Some(float as usize);
    }
    None
}

fn record_edge(parsed: &mut ParsedBom, table: &str, row_no: usize, parent: &str, child: &str) {
    match parsed.edges.insert(parent, child) {
        EdgeInsert::Added => parsed.stats.edges_added += 1,
        EdgeInsert::Duplicate => parsed.stats.duplicates += 1,
        EdgeInsert::SelfLoop => {
            parsed.stats.self_loops += 1;
            parsed
                .stats
                .warnings
                .push(format!("{table} row {row_no}: self-loop on {parent}"));
        }
    }
}

fn record_link(parsed: &mut ParsedBom, table: &str, row_no: usize, outcome: EdgeInsert, part: &str) {
    match outcome {
        EdgeInsert::Added => parsed.stats.links_added += 1,
        EdgeInsert::Duplicate => parsed.stats.duplicates += 1,
        EdgeInsert::SelfLoop => {
            tracing::warn!(table, row = row_no, part, "Part listed as its own replacement");
            parsed.stats.self_loops += 1;
            parsed
                .stats
                .warnings
                .push(format!("{table} row {row_no}: {part} replaces itself"));
        }
    }
}

fn malformed(parsed: &mut ParsedBom, table: &str, row_no: usize, reason: &str) {
    tracing::warn!(table, row = row_no, reason, "Skipping malformed row");
    parsed.stats.rows_malformed += 1;
    parsed
        .stats
        .warnings
        .push(format!("{table} row {row_no}: {reason}"));
}

fn parse_level_table(
    table: &Table,
    number_col: usize,
    level_col: usize,
    aliases: &TabularAliases,
    parsed: &mut ParsedBom,
) {
    let headers = table.header_map();
    let column = |field: &crate::model::FieldAliases| field.find_column(&headers);
    let usage_columns = [
        column(&aliases.quantity),
        column(&aliases.unit),
        column(&aliases.find_number),
        column(&aliases.line_number),
        column(&aliases.reference_designators),
        column(&aliases.trace_code),
        column(&aliases.component_id),
        column(&aliases.view),
    ];

    let mut stack = LevelStack::new();
    for (idx, row) in table.rows.iter().enumerate() {
        let row_no = idx + 1;
        parsed.stats.rows_read += 1;

        let Some(number) = Table::cell(row, Some(number_col)).map(normalize_part_number) else {
            malformed(parsed, &table.name, row_no, "missing number");
            continue;
        };
        let Some(level) = Table::cell(row, Some(level_col)).and_then(parse_level) else {
            malformed(parsed, &table.name, row_no, "missing or invalid level");
            continue;
        };

        match stack.push(&number, level) {
            LevelOutcome::Root => {}
            LevelOutcome::Orphan => {
                tracing::warn!(
                    table = %table.name,
                    row = row_no,
                    part = %number,
                    level,
                    "Row has no parent at level {}; skipped",
                    level.saturating_sub(1)
                );
                parsed.stats.orphan_rows += 1;
                parsed.stats.warnings.push(format!(
                    "{} row {row_no}: {number} at level {level} has no parent",
                    table.name
                ));
            }
            LevelOutcome::Child(parent) => {
                record_edge(parsed, &table.name, row_no, &parent, &number);
                if parent != number {
                    let cell = |i: usize| Table::cell(row, usage_columns[i]).map(str::to_string);
                    parsed.usages.push(PartUsage {
                        parent,
                        child: number,
                        quantity: cell(0),
                        unit: cell(1),
                        find_number: cell(2),
                        line_number: cell(3),
                        reference_designators: cell(4),
                        trace_code: cell(5),
                        component_id: cell(6),
                        view: cell(7),
                    });
                }
            }
        }
    }
}

fn parse_number_pairs(table: &Table, parent_col: usize, child_col: usize, parsed: &mut ParsedBom) {
    for (idx, row) in table.rows.iter().enumerate() {
        let row_no = idx + 1;
        parsed.stats.rows_read += 1;
        let parent = Table::cell(row, Some(parent_col)).map(normalize_part_number);
        let child = Table::cell(row, Some(child_col)).map(normalize_part_number);
        match (parent, child) {
            (Some(parent), Some(child)) => {
                record_edge(parsed, &table.name, row_no, &parent, &child);
            }
            _ => malformed(parsed, &table.name, row_no, "missing parent or child number"),
        }
    }
}

fn parse_name_pairs(table: &Table, parent_col: usize, child_col: usize, parsed: &mut ParsedBom) {
    for (idx, row) in table.rows.iter().enumerate() {
        let row_no = idx + 1;
        parsed.stats.rows_read += 1;
        match (
            Table::cell(row, Some(parent_col)),
            Table::cell(row, Some(child_col)),
        ) {
            (Some(parent), Some(child)) => {
                parsed.stats.name_rows += 1;
                parsed.name_rows.push(NameRow {
                    parent_name: parent.to_string(),
                    child_name: child.to_string(),
                });
            }
            _ => malformed(parsed, &table.name, row_no, "missing parent or child name"),
        }
    }
}

fn parse_alternates(
    table: &Table,
    part_col: usize,
    replacement_col: usize,
    type_col: Option<usize>,
    parsed: &mut ParsedBom,
) {
    for (idx, row) in table.rows.iter().enumerate() {
        let row_no = idx + 1;
        parsed.stats.rows_read += 1;
        let part = Table::cell(row, Some(part_col)).map(normalize_part_number);
        let replacement = Table::cell(row, Some(replacement_col)).map(normalize_part_number);
        let (Some(part), Some(replacement)) = (part, replacement) else {
            malformed(parsed, &table.name, row_no, "missing part or replacement number");
            continue;
        };
        let link_type = Table::cell(row, type_col).unwrap_or(DEFAULT_ALTERNATE_TYPE);
        let outcome = parsed.links.add_alternate(&part, &replacement, link_type);
        record_link(parsed, &table.name, row_no, outcome, &part);
    }
}

fn parse_describes(
    table: &Table,
    document_col: usize,
    part_col: usize,
    aliases: &TabularAliases,
    parsed: &mut ParsedBom,
) {
    let headers = table.header_map();
    let revision_col = aliases.document_revision.find_column(&headers);
    let organization_col = aliases.document_organization.find_column(&headers);
    let container_col = aliases.document_container.find_column(&headers);

    for (idx, row) in table.rows.iter().enumerate() {
        let row_no = idx + 1;
        parsed.stats.rows_read += 1;
        let part = Table::cell(row, Some(part_col)).map(normalize_part_number);
        let (Some(number), Some(part)) = (Table::cell(row, Some(document_col)), part) else {
            malformed(parsed, &table.name, row_no, "missing document or part number");
            continue;
        };
        let document = Document {
            number: number.to_string(),
            revision: Table::cell(row, revision_col).map(str::to_string),
            organization: Table::cell(row, organization_col).map(str::to_string),
            container: Table::cell(row, container_col).map(str::to_string),
        };
        let outcome = parsed.links.add_describe(&document, &part);
        record_link(parsed, &table.name, row_no, outcome, &part);
    }
}
