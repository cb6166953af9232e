//! Part tables and the number ↔ name cross-reference index.

use indexmap::{IndexMap, IndexSet};

use super::{Table, TabularAliases};
use crate::model::{normalize_part_number, PartAttributes, PartRecord};

/// Part categories recognized from table (sheet) names, checked in order.
const PART_CATEGORIES: &[&str] = &[
    "MechanicalPart",
    "SoftwarePart",
    "Variant",
    "WTPart",
    "BasicNode",
    "StructureNode",
];

fn category_from_table_name(name: &str) -> Option<&'static str> {
    PART_CATEGORIES.iter().copied().find(|c| name.contains(c))
}

/// Read part records from every table that has number and name columns.
///
/// Tables without both columns are passed over (they are usually BOM
/// tables). Repeated numbers fill gaps on the first record.
#[must_use]
pub fn parse_parts<'a, I>(tables: I, aliases: &TabularAliases) -> IndexMap<String, PartRecord>
where
    I: IntoIterator<Item = &'a Table>,
{
    let mut parts: IndexMap<String, PartRecord> = IndexMap::new();
    for table in tables {
        let headers = table.header_map();
        let (Some(number_col), Some(name_col)) = (
            aliases.number.find_column(&headers),
            aliases.name.find_column(&headers),
        ) else {
            tracing::debug!(table = %table.name, "No number/name columns; not a part table");
            continue;
        };
        let type_col = aliases.part_type.find_column(&headers);
        let source_col = aliases.source.find_column(&headers);
        let view_col = aliases.view.find_column(&headers);
        let state_col = aliases.state.find_column(&headers);
        let revision_col = aliases.revision.find_column(&headers);
        let container_col = aliases.container.find_column(&headers);
        let category = category_from_table_name(&table.name);

        let mut read = 0usize;
        for row in &table.rows {
            let Some(number) = Table::cell(row, Some(number_col)).map(normalize_part_number) else {
                continue;
            };
            let text = |col: Option<usize>| Table::cell(row, col).map(str::to_string);
            let mut attributes = PartAttributes {
                name: text(Some(name_col)),
                part_type: text(type_col),
                source: text(source_col).map(|s| s.to_lowercase()),
                view: text(view_col),
                state: text(state_col),
                revision: text(revision_col),
                container: text(container_col),
                extra: IndexMap::new(),
            };
            if let Some(category) = category {
                attributes
                    .extra
                    .insert("part_type".to_string(), category.to_string());
            }

            match parts.get_mut(&number) {
                Some(existing) => {
                    existing.merge(&attributes);
                }
                None => {
                    parts.insert(number.clone(), PartRecord::with_attributes(number, attributes));
                }
            }
            read += 1;
        }
        tracing::debug!(table = %table.name, parts = read, "Read part table");
    }
    parts
}

/// Number → name and name → numbers lookups built from part tables.
///
/// A number keeps the first name it was seen with. A name that maps to more
/// than one distinct number is ambiguous; the index records every candidate
/// and never picks one.
#[derive(Debug, Clone, Default)]
pub struct CrossReferenceIndex {
    number_to_name: IndexMap<String, String>,
    name_to_numbers: IndexMap<String, IndexSet<String>>,
}

impl CrossReferenceIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from part tables.
    #[must_use]
    pub fn build<'a, I>(tables: I, aliases: &TabularAliases) -> Self
    where
        I: IntoIterator<Item = &'a Table>,
    {
        Self::from_parts(&parse_parts(tables, aliases))
    }

    /// Build from already-collected part records (e.g. a crawl's parts).
    #[must_use]
    pub fn from_parts(parts: &IndexMap<String, PartRecord>) -> Self {
        let mut index = Self::new();
        for part in parts.values() {
            if let Some(name) = part.attributes.name.as_deref() {
                index.insert(&part.number, name);
            }
        }
        index
    }

    /// Record a number/name pair.
    pub fn insert(&mut self, number: &str, name: &str) {
        let number = number.trim();
        let name = name.trim();
        if number.is_empty() || name.is_empty() {
            return;
        }
        self.number_to_name
            .entry(number.to_string())
            .or_insert_with(|| name.to_string());
        self.name_to_numbers
            .entry(name.to_string())
            .or_default()
            .insert(number.to_string());
    }

    /// Numbers recorded for `name`, in first-seen order.
    #[must_use]
    pub fn candidates(&self, name: &str) -> Vec<&str> {
        self.name_to_numbers
            .get(name.trim())
            .map(|numbers| numbers.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn name_of(&self, number: &str) -> Option<&str> {
        self.number_to_name.get(number).map(String::as_str)
    }

    #[must_use]
    pub fn contains_number(&self, number: &str) -> bool {
        self.number_to_name.contains_key(number)
    }

    /// Number of distinct part numbers indexed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.number_to_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.number_to_name.is_empty()
    }

    /// Names shared by more than one number.
    pub fn ambiguous_names(&self) -> impl Iterator<Item = (&str, usize)> {
        self.name_to_numbers
            .iter()
            .filter(|(_, numbers)| numbers.len() > 1)
            .map(|(name, numbers)| (name.as_str(), numbers.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str, headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            name,
            headers.iter().map(|s| (*s).to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| (*s).to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_parse_parts_with_category() {
        let t = table(
            "WTPart-Sheet",
            &["Number", "Name", "Source", "State"],
            &[&["100.0", "Frame", "MAKE", "RELEASED"], &["", "Orphan", "", ""]],
        );
        let parts = parse_parts([&t], &TabularAliases::default());
        assert_eq!(parts.len(), 1);
        let frame = &parts["100"];
        assert_eq!(frame.attributes.name.as_deref(), Some("Frame"));
        assert_eq!(frame.attributes.source.as_deref(), Some("make"));
        assert_eq!(frame.attributes.extra["part_type"], "WTPart");
    }

    #[test]
    fn test_non_part_tables_ignored() {
        let t = table("bom", &["Parent Number", "Child Number"], &[&["A", "B"]]);
        assert!(parse_parts([&t], &TabularAliases::default()).is_empty());
    }

    #[test]
    fn test_index_ambiguity() {
        let t = table(
            "parts",
            &["Number", "Name"],
            &[&["1", "Bolt"], &["2", "Bolt"], &["3", "Nut"], &["1", "Bolt M6"]],
        );
        let index = CrossReferenceIndex::build([&t], &TabularAliases::default());

        assert_eq!(index.candidates("Bolt"), vec!["1", "2"]);
        assert_eq!(index.candidates(" Nut "), vec!["3"]);
        assert!(index.candidates("Washer").is_empty());
        assert_eq!(index.name_of("1"), Some("Bolt"));
        assert_eq!(index.ambiguous_names().collect::<Vec<_>>(), vec![("Bolt", 2)]);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_insert_first_name_wins() {
        let mut index = CrossReferenceIndex::new();
        index.insert("7", "Washer");
        index.insert("7", "Washer, flat");
        assert_eq!(index.name_of("7"), Some("Washer"));
        assert_eq!(index.candidates("Washer, flat"), vec!["7"]);
    }
}
