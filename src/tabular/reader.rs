//! CSV table reading with header detection.

use std::path::Path;

use csv::ReaderBuilder;

use super::{TabularAliases, Table};
use crate::error::{BomError, ErrorContext, Result};

/// How many leading rows are searched for the real header.
const HEADER_SEARCH_ROWS: usize = 10;

/// Read a CSV file into a [`Table`] named after the file stem.
pub fn read_csv(path: &Path, aliases: &TabularAliases) -> Result<Table> {
    let text = std::fs::read_to_string(path).map_err(|e| BomError::io(path, e))?;
    let name = path
        .file_stem()
        .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned());
    read_csv_str(&name, &text, aliases).with_context(|| format!("reading {}", path.display()))
}

/// Read CSV text into a [`Table`].
///
/// Exports often carry a few preamble lines before the real header, and
/// sometimes repeat the header as the first data row. The header is the first
/// row (within the first few) that names at least two known structural
/// columns, falling back to the first non-empty row; data rows identical to
/// the header are dropped.
pub fn read_csv_str(name: &str, text: &str, aliases: &TabularAliases) -> Result<Table> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut records: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row: Vec<String> = record.iter().map(str::to_string).collect();
        if row.iter().any(|cell| !cell.is_empty()) {
            records.push(row);
        }
    }

    let Some(header_idx) = find_header_row(&records, aliases) else {
        return Ok(Table::new(name, Vec::new(), Vec::new()));
    };
    if header_idx > 0 {
        tracing::debug!(table = name, skipped = header_idx, "Promoted header past preamble rows");
    }

    let mut rows = records.split_off(header_idx);
    let headers = rows.remove(0);
    let header_key = normalized(&headers);

    let before = rows.len();
    rows.retain(|row| normalized(row) != header_key);
    if rows.len() != before {
        tracing::debug!(
            table = name,
            dropped = before - rows.len(),
            "Dropped duplicated header rows"
        );
    }

    Ok(Table::new(name, headers, rows))
}

fn find_header_row(records: &[Vec<String>], aliases: &TabularAliases) -> Option<usize> {
    if records.is_empty() {
        return None;
    }
    let known: Vec<String> = aliases.structural_keys().collect();
    let position = records.iter().take(HEADER_SEARCH_ROWS).position(|row| {
        let hits = row
            .iter()
            .filter(|cell| known.contains(&cell.trim().to_lowercase()))
            .count();
        hits >= 2
    });
    Some(position.unwrap_or(0))
}

fn normalized(row: &[String]) -> Vec<String> {
    let mut cells: Vec<String> = row.iter().map(|c| c.trim().to_lowercase()).collect();
    while cells.last().is_some_and(String::is_empty) {
        cells.pop();
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_header() {
        let table = read_csv_str(
            "bom",
            "Parent Number,Child Number\nA,B\nA,C\n",
            &TabularAliases::default(),
        )
        .unwrap();
        assert_eq!(table.headers, vec!["Parent Number", "Child Number"]);
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn test_preamble_and_duplicate_header() {
        let text = "\
Report,BOM export\n\
Generated,2024-01-01\n\
\n\
Level,Number,Name\n\
Level,Number,Name\n\
0,R,Root\n\
1,A,Arm\n";
        let table = read_csv_str("BOMSheet1", text, &TabularAliases::default()).unwrap();
        assert_eq!(table.headers, vec!["Level", "Number", "Name"]);
        assert_eq!(table.rows, vec![vec!["0", "R", "Root"], vec!["1", "A", "Arm"]]);
    }

    #[test]
    fn test_ragged_rows_allowed() {
        let table = read_csv_str(
            "t",
            "Number,Name,Type\nA,Arm\nB,Bolt,WTPart,extra\n",
            &TabularAliases::default(),
        )
        .unwrap();
        assert_eq!(table.rows[0].len(), 2);
        assert_eq!(table.rows[1].len(), 4);
    }

    #[test]
    fn test_empty_input() {
        let table = read_csv_str("empty", "", &TabularAliases::default()).unwrap();
        assert!(table.headers.is_empty());
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_read_file_uses_stem() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("WTPart-Sheet.csv");
        std::fs::write(&path, "Number,Name\n100,Frame\n").unwrap();
        let table = read_csv(&path, &TabularAliases::default()).unwrap();
        assert_eq!(table.name, "WTPart-Sheet");
    }
}
