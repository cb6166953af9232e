//! CSV edge lists.

use std::path::Path;

use crate::error::{BomError, Result};
use crate::model::EdgeSet;
use crate::tabular::NameRow;

/// Write `Parent Number,Child Number` rows. Returns the row count.
pub fn write_edges_csv(edges: &EdgeSet, path: &Path) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["Parent Number", "Child Number"])?;
    for edge in edges {
        writer.write_record([edge.parent.as_str(), edge.child.as_str()])?;
    }
    writer.flush().map_err(|e| BomError::io(path, e))?;
    Ok(edges.len())
}

/// Write `Parent Name,Child Name` rows. Returns the row count.
pub fn write_name_bom_csv(rows: &[NameRow], path: &Path) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["Parent Name", "Child Name"])?;
    for row in rows {
        writer.write_record([row.parent_name.as_str(), row.child_name.as_str()])?;
    }
    writer.flush().map_err(|e| BomError::io(path, e))?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Edge;
    use tempfile::TempDir;

    #[test]
    fn test_edges_csv_reads_back_as_number_pairs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("edges.csv");
        let edges: EdgeSet = vec![Edge::new("1", "2"), Edge::new("1", "3, rev B")].into();
        assert_eq!(write_edges_csv(&edges, &path).unwrap(), 2);

        let aliases = crate::tabular::TabularAliases::default();
        let table = crate::tabular::read_csv(&path, &aliases).unwrap();
        let parsed = crate::tabular::parse_tables([&table], &aliases);
        assert_eq!(parsed.edges, edges);
    }

    #[test]
    fn test_name_bom_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("names.csv");
        let rows = vec![NameRow {
            parent_name: "Frame".into(),
            child_name: "Bolt".into(),
        }];
        write_name_bom_csv(&rows, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Parent Name,Child Name\nFrame,Bolt\n");
    }
}
