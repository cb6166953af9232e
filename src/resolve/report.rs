//! Resolution report CSV and skip log.

use std::io::Write;
use std::path::Path;

use super::{NameResolution, RowStatus};
use crate::error::{BomError, Result};

/// Write one CSV line per input row with its candidates and status.
///
/// Columns: `parent_name, child_name, parent_candidates, child_candidates,
/// chosen_parent, chosen_child, status`. Candidate lists are `|`-joined.
pub fn write_report_csv(resolution: &NameResolution, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "parent_name",
        "child_name",
        "parent_candidates",
        "child_candidates",
        "chosen_parent",
        "chosen_child",
        "status",
    ])?;
    for outcome in &resolution.outcomes {
        let (chosen_parent, chosen_child) = outcome.chosen().unwrap_or(("", ""));
        let parent_candidates = outcome.parent_candidates.join("|");
        let child_candidates = outcome.child_candidates.join("|");
        writer.write_record([
            outcome.parent_name.as_str(),
            outcome.child_name.as_str(),
            parent_candidates.as_str(),
            child_candidates.as_str(),
            chosen_parent,
            chosen_child,
            outcome.status.as_str(),
        ])?;
    }
    writer.flush().map_err(|e| BomError::io(path, e))?;
    Ok(())
}

/// Write the unknown and ambiguous rows as a plain-text log.
///
/// Returns the number of lines written.
pub fn write_skip_log(resolution: &NameResolution, path: &Path) -> Result<usize> {
    let mut file = std::fs::File::create(path).map_err(|e| BomError::io(path, e))?;
    let mut written = 0;
    for (idx, outcome) in resolution.outcomes.iter().enumerate() {
        if outcome.status == RowStatus::Resolved {
            continue;
        }
        writeln!(
            file,
            "row {}: {} '{}' -> '{}' (parent candidates: {}, child candidates: {})",
            idx + 1,
            outcome.status.as_str(),
            outcome.parent_name,
            outcome.child_name,
            candidate_list(&outcome.parent_candidates),
            candidate_list(&outcome.child_candidates),
        )
        .map_err(|e| BomError::io(path, e))?;
        written += 1;
    }
    Ok(written)
}

fn candidate_list(candidates: &[String]) -> String {
    if candidates.is_empty() {
        "none".to_string()
    } else {
        candidates.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::{NameResolver, ResolutionMode};
    use crate::tabular::{CrossReferenceIndex, NameRow};

    fn resolution() -> NameResolution {
        let mut index = CrossReferenceIndex::new();
        index.insert("1", "Frame");
        index.insert("2", "Bolt");
        index.insert("3", "Bolt");
        index.insert("4", "Nut");
        let rows = vec![
            NameRow {
                parent_name: "Frame".into(),
                child_name: "Nut".into(),
            },
            NameRow {
                parent_name: "Frame".into(),
                child_name: "Bolt".into(),
            },
            NameRow {
                parent_name: "Frame".into(),
                child_name: "Washer".into(),
            },
        ];
        NameResolver::new(&index, ResolutionMode::Lenient)
            .resolve(&rows)
            .unwrap()
    }

    #[test]
    fn test_report_csv() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("report.csv");
        write_report_csv(&resolution(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "Frame,Nut,1,4,1,4,resolved");
        assert_eq!(lines[2], "Frame,Bolt,1,2|3,,,ambiguous");
        assert_eq!(lines[3], "Frame,Washer,1,,,,unknown");
    }

    #[test]
    fn test_skip_log() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("skipped.log");
        let written = write_skip_log(&resolution(), &path).unwrap();
        assert_eq!(written, 2);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("row 2: ambiguous 'Frame' -> 'Bolt'"));
        assert!(text.contains("child candidates: none"));
    }
}
