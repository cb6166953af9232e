//! Subgraph command handler.
//!
//! Implements the `subgraph` subcommand: bounded extraction below one part,
//! for visualization.

use crate::extract::{extract_subgraph, ExtractOptions, Subgraph, SubgraphStats};
use crate::pipeline::{exit_codes, load_graph, write_json_output, OutputTarget};
use anyhow::{bail, Result};
use serde::Serialize;
use std::path::PathBuf;

/// Subgraph command configuration
pub struct SubgraphConfig {
    /// Directory holding `parts.json` and `edges.json`
    pub graph_dir: PathBuf,
    /// Root part number (defaults to the single root of the graph)
    pub root: Option<String>,
    pub options: ExtractOptions,
    /// How many parts to list under "most children"
    pub top: usize,
    /// Output file (stdout if not specified)
    pub output: Option<PathBuf>,
    pub quiet: bool,
}

#[derive(Serialize)]
struct SubgraphOutput<'a> {
    #[serde(flatten)]
    subgraph: &'a Subgraph,
    /// Part number → display label for included nodes
    labels: indexmap::IndexMap<&'a str, &'a str>,
    stats: SubgraphStats,
}

/// Run the subgraph command
pub fn run_subgraph(config: &SubgraphConfig) -> Result<i32> {
    let graph = load_graph(&config.graph_dir)?;

    let root = match &config.root {
        Some(root) => root.trim().to_string(),
        None => single_root(&graph)?,
    };
    if graph.part(&root).is_none() {
        bail!("Part {root} is not in the graph at {}", config.graph_dir.display());
    }

    let subgraph = extract_subgraph(&graph.edges, &root, &config.options);
    let stats = subgraph.stats(config.top);
    if !config.quiet {
        stats.log_summary();
    }

    let labels = subgraph
        .nodes
        .keys()
        .filter_map(|number| graph.part(number).map(|p| (number.as_str(), p.label())))
        .collect();
    let output = SubgraphOutput {
        subgraph: &subgraph,
        labels,
        stats,
    };
    write_json_output(
        &output,
        &OutputTarget::from_option(config.output.clone()),
        config.quiet,
    )?;
    Ok(exit_codes::SUCCESS)
}

/// The only part that is nobody's child.
fn single_root(graph: &crate::model::BomGraph) -> Result<String> {
    let roots: Vec<&str> = graph
        .parts
        .keys()
        .map(String::as_str)
        .filter(|number| !graph.edges.iter().any(|e| e.child == *number))
        .collect();
    match roots.as_slice() {
        [root] => Ok((*root).to_string()),
        [] => bail!("Graph has no root part; pass --root"),
        many => bail!(
            "Graph has {} root parts ({}...); pass --root",
            many.len(),
            many.iter().take(3).copied().collect::<Vec<_>>().join(", ")
        ),
    }
}
