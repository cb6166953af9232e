//! Table loading and graph persistence stages.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::PipelineError;
use crate::model::{BomGraph, EdgeSet, PartLinks, LINKS_FILE};
use crate::tabular::{parse_parts, read_csv, Table, TabularAliases};

/// Read every CSV named by `inputs`.
///
/// A directory contributes all of its `.csv` files, in name order.
pub fn load_tables(inputs: &[PathBuf], aliases: &TabularAliases) -> Result<Vec<Table>> {
    let mut tables = Vec::new();
    for input in inputs {
        for path in csv_files(input)? {
            let table = read_csv(&path, aliases).map_err(|source| PipelineError::TablesFailed {
                path: path.display().to_string(),
                source,
            })?;
            tracing::debug!(
                table = %table.name,
                rows = table.rows.len(),
                "Loaded table"
            );
            tables.push(table);
        }
    }
    tracing::info!("Loaded {} tables", tables.len());
    Ok(tables)
}

fn csv_files(input: &Path) -> Result<Vec<PathBuf>> {
    if !input.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(input)
        .with_context(|| format!("Failed to list {}", input.display()))?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Combine part tables and an edge set into one graph.
///
/// Part records come from every table with number and name columns; edge
/// endpoints without such a row get bare records.
#[must_use]
pub fn graph_from_tables(tables: &[Table], edges: &EdgeSet, aliases: &TabularAliases) -> BomGraph {
    let mut graph = BomGraph::new();
    for (number, part) in parse_parts(tables, aliases) {
        graph.merge_part(&number, &part.attributes);
    }
    for edge in edges.iter() {
        graph.add_edge(&edge.parent, &edge.child);
    }
    graph
}

/// Load a graph written by `collect`, `parse-bom` or `resolve-names`.
pub fn load_graph(dir: &Path) -> Result<BomGraph> {
    let graph = BomGraph::load(dir).map_err(|source| PipelineError::GraphMissing {
        dir: dir.display().to_string(),
        source,
    })?;
    tracing::info!(
        "Loaded graph: {} parts, {} edges",
        graph.part_count(),
        graph.edge_count()
    );
    Ok(graph)
}

/// Write `parts.json` and `edges.json` into `dir`.
pub fn save_graph(graph: &BomGraph, dir: &Path, quiet: bool) -> Result<()> {
    graph
        .save(dir)
        .with_context(|| format!("Failed to write graph to {}", dir.display()))?;
    if !quiet {
        tracing::info!(
            "Wrote {} parts and {} edges to {}",
            graph.part_count(),
            graph.edge_count(),
            dir.display()
        );
    }
    Ok(())
}

/// Write alternate and describe links next to a saved graph. Nothing is
/// written when there are none.
pub fn save_links(links: &PartLinks, dir: &Path, quiet: bool) -> Result<()> {
    if links.is_empty() {
        return Ok(());
    }
    links
        .save(dir)
        .with_context(|| format!("Failed to write {}", dir.join(LINKS_FILE).display()))?;
    if !quiet {
        tracing::info!(
            "Wrote {} alternate and {} describe links to {}",
            links.alternate_count(),
            links.describe_count(),
            dir.display()
        );
    }
    Ok(())
}

/// Links saved by `parse-bom`, or none when the directory has no links file.
pub fn load_links(dir: &Path) -> Result<PartLinks> {
    let links = PartLinks::load_if_present(dir)
        .with_context(|| format!("Failed to read {}", dir.join(LINKS_FILE).display()))?;
    if !links.is_empty() {
        tracing::info!(
            "Loaded {} alternate and {} describe links",
            links.alternate_count(),
            links.describe_count()
        );
    }
    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_tables_from_directory() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("b.csv"), "Number,Name\nP-2,Bolt\n").unwrap();
        std::fs::write(tmp.path().join("a.CSV"), "Number,Name\nP-1,Frame\n").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let tables =
            load_tables(&[tmp.path().to_path_buf()], &TabularAliases::default()).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].rows[0][0], "P-1");
    }

    #[test]
    fn test_load_tables_missing_file() {
        let err = load_tables(
            &[PathBuf::from("/nonexistent/bom.csv")],
            &TabularAliases::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/bom.csv"));
    }

    #[test]
    fn test_graph_from_tables_adds_bare_endpoints() {
        let parts = Table::new(
            "WTPart",
            vec!["Number".into(), "Name".into()],
            vec![vec!["P-1".into(), "Frame".into()]],
        );
        let mut edges = EdgeSet::new();
        edges.insert("P-1", "P-2");

        let graph = graph_from_tables(&[parts], &edges, &TabularAliases::default());
        assert_eq!(graph.part_count(), 2);
        assert_eq!(graph.part("P-1").unwrap().label(), "Frame");
        assert_eq!(graph.part("P-2").unwrap().label(), "P-2");
    }

    #[test]
    fn test_load_graph_missing_dir() {
        let tmp = TempDir::new().unwrap();
        let err = load_graph(&tmp.path().join("none")).unwrap_err();
        assert!(err.to_string().starts_with("No graph found in"));
    }
}
