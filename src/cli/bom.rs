//! Tabular BOM command handlers.
//!
//! Implements `parse-bom` (number-keyed tables to edges) and `resolve-names`
//! (name-keyed tables resolved through a cross-reference index).

use crate::config::AppConfig;
use crate::export::{write_edges_csv, write_name_bom_csv};
use crate::pipeline::{
    exit_codes, graph_from_tables, load_tables, save_graph, save_links, write_json_output,
    OutputTarget, PipelineError,
};
use crate::resolve::{write_report_csv, write_skip_log, NameResolver};
use crate::tabular::{parse_tables, CrossReferenceIndex};
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Edge list written next to `edges.json` with `--csv`.
pub const EDGES_CSV: &str = "edges.csv";
/// Name pairs found by `parse-bom`, for a later `resolve-names`.
pub const NAME_BOM_CSV: &str = "name_bom.csv";
/// Usage attributes from level-indexed tables.
pub const USAGES_FILE: &str = "usages.json";
/// Per-row resolution report.
pub const REPORT_CSV: &str = "resolution_report.csv";
/// Unknown and ambiguous rows.
pub const SKIP_LOG: &str = "skipped_rows.log";

/// Shared configuration of the tabular commands
pub struct TabularCommandConfig {
    /// CSV files or directories of CSV files
    pub inputs: Vec<PathBuf>,
    /// Output directory
    pub out_dir: PathBuf,
    /// Also write CSV edge lists
    pub csv: bool,
    /// Exit with [`exit_codes::INCOMPLETE`] when any row was skipped
    pub fail_on_skip: bool,
    pub quiet: bool,
}

/// Run the parse-bom command
pub fn run_parse_bom(app: &AppConfig, config: &TabularCommandConfig) -> Result<i32> {
    let aliases = &app.aliases.tabular;
    let tables = load_tables(&config.inputs, aliases)?;
    let parsed = parse_tables(&tables, aliases);
    parsed.stats.log_summary();

    let graph = graph_from_tables(&tables, &parsed.edges, aliases);
    save_graph(&graph, &config.out_dir, config.quiet)?;
    save_links(&parsed.links, &config.out_dir, config.quiet)?;

    if !parsed.usages.is_empty() {
        let target = OutputTarget::File(config.out_dir.join(USAGES_FILE));
        write_json_output(&parsed.usages, &target, config.quiet)?;
    }

    if config.csv {
        let path = config.out_dir.join(EDGES_CSV);
        let rows = write_edges_csv(&parsed.edges, &path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::debug!("Wrote {rows} edge rows to {}", path.display());
    }

    if !parsed.name_rows.is_empty() {
        let path = config.out_dir.join(NAME_BOM_CSV);
        write_name_bom_csv(&parsed.name_rows, &path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(
            "{} name-based BOM rows written to {}; run resolve-names to turn them into edges",
            parsed.name_rows.len(),
            path.display()
        );
    }

    if config.fail_on_skip && parsed.stats.rows_skipped() > 0 {
        return Ok(exit_codes::INCOMPLETE);
    }
    Ok(exit_codes::SUCCESS)
}

/// Run the resolve-names command
pub fn run_resolve_names(app: &AppConfig, config: &TabularCommandConfig) -> Result<i32> {
    let aliases = &app.aliases.tabular;
    let tables = load_tables(&config.inputs, aliases)?;
    let parsed = parse_tables(&tables, aliases);
    parsed.stats.log_summary();

    if parsed.name_rows.is_empty() {
        anyhow::bail!("No name-based BOM rows (Parent Name / Child Name) found in the inputs");
    }

    let index = CrossReferenceIndex::build(&tables, aliases);
    let ambiguous = index.ambiguous_names().count();
    tracing::info!(
        "Cross-reference index: {} part numbers, {} ambiguous names",
        index.len(),
        ambiguous
    );

    let resolver = NameResolver::new(&index, app.resolution.mode())
        .with_number_fallback(app.resolution.number_fallback);
    let resolution = match resolver.resolve(&parsed.name_rows) {
        Ok(resolution) => resolution,
        Err(source) if source.is_resolution() => {
            tracing::error!("{}", PipelineError::ResolutionFailed { source });
            return Ok(exit_codes::RESOLUTION_FAILED);
        }
        Err(e) => return Err(e.into()),
    };
    resolution.log_summary();

    let mut edges = parsed.edges.clone();
    for edge in resolution.edges.iter() {
        edges.insert_edge(edge);
    }
    let graph = graph_from_tables(&tables, &edges, aliases);
    save_graph(&graph, &config.out_dir, config.quiet)?;

    let report = config.out_dir.join(REPORT_CSV);
    write_report_csv(&resolution, &report)
        .with_context(|| format!("Failed to write {}", report.display()))?;
    let skip_log = config.out_dir.join(SKIP_LOG);
    let skipped = write_skip_log(&resolution, &skip_log)
        .with_context(|| format!("Failed to write {}", skip_log.display()))?;
    if skipped > 0 && !config.quiet {
        tracing::info!("Skipped rows listed in {}", skip_log.display());
    }

    if config.csv {
        let path = config.out_dir.join(EDGES_CSV);
        write_edges_csv(&edges, &path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    if config.fail_on_skip && resolution.skipped() > 0 {
        return Ok(exit_codes::INCOMPLETE);
    }
    Ok(exit_codes::SUCCESS)
}
