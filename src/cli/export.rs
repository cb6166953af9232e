//! Export command handler.
//!
//! Implements the `export` subcommand: hand a collected graph to a graph
//! store sink, optionally with derived relations. Links saved by
//! `parse-bom` are exported alongside.

use crate::config::AppConfig;
use crate::derive::DerivedRelations;
use crate::export::{ExportStats, GraphExport, GraphSink, JsonBundleSink, NTriplesSink};
use crate::pipeline::{
    exit_codes, load_graph, load_links, write_json_output, OutputTarget, PipelineError,
};
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Export output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Parts and relations as one JSON document
    #[default]
    Json,
    /// RDF N-Triples
    Ntriples,
}

/// Export command configuration
pub struct ExportCommandConfig {
    /// Directory holding `parts.json` and `edges.json`
    pub graph_dir: PathBuf,
    pub format: ExportFormat,
    /// Output file (stdout if not specified)
    pub output: Option<PathBuf>,
    /// Include `used_in` and `part_of_assembly`
    pub derived: bool,
    pub batch_size: usize,
    pub quiet: bool,
}

impl ExportCommandConfig {
    /// Command settings with `derived` and `batch_size` taken from the config file.
    #[must_use]
    pub fn from_app(app: &AppConfig, graph_dir: PathBuf, format: ExportFormat) -> Self {
        Self {
            graph_dir,
            format,
            output: None,
            derived: app.export.derived,
            batch_size: app.export.batch_size,
            quiet: false,
        }
    }
}

/// Run the export command
pub fn run_export(config: &ExportCommandConfig) -> Result<i32> {
    let graph = load_graph(&config.graph_dir)?;

    let mut export = GraphExport::from_graph(&graph);
    if config.derived {
        let derived = DerivedRelations::build(&graph.edges)
            .map_err(|source| PipelineError::ExportFailed { source })?;
        derived.log_summary();
        export = export.with_derived(derived);
    }
    export = export.with_links(&load_links(&config.graph_dir)?);

    let stats = match config.format {
        ExportFormat::Json => {
            let mut sink = JsonBundleSink::new();
            let stats = write_to_sink(&export, &mut sink, config.batch_size)?;
            let target = OutputTarget::from_option(config.output.clone());
            write_json_output(sink.bundle(), &target, config.quiet)?;
            stats
        }
        ExportFormat::Ntriples => match &config.output {
            Some(path) => {
                let file = std::fs::File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                let mut sink = NTriplesSink::new(BufWriter::new(file));
                let stats = write_to_sink(&export, &mut sink, config.batch_size)?;
                if !config.quiet {
                    tracing::info!("{} triples written to {}", sink.triples(), path.display());
                }
                stats
            }
            None => {
                let stdout = std::io::stdout();
                let mut sink = NTriplesSink::new(stdout.lock());
                let stats = write_to_sink(&export, &mut sink, config.batch_size)?;
                sink.into_inner().flush().context("Failed to flush stdout")?;
                stats
            }
        },
    };

    if !config.quiet {
        stats.log_summary();
    }
    Ok(exit_codes::SUCCESS)
}

fn write_to_sink<K: GraphSink>(
    export: &GraphExport,
    sink: &mut K,
    batch_size: usize,
) -> Result<ExportStats> {
    export
        .write_to(sink, batch_size)
        .map_err(|source| PipelineError::ExportFailed { source }.into())
}
