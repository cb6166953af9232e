//! CLI command handlers.
//!
//! This module provides testable command handlers that are invoked by main.rs.
//! Each handler implements the business logic for a specific CLI subcommand
//! and returns the process exit code.

mod bom;
mod cache;
mod collect;
mod export;
mod subgraph;

pub use bom::{
    run_parse_bom, run_resolve_names, TabularCommandConfig, EDGES_CSV, NAME_BOM_CSV,
    REPORT_CSV, SKIP_LOG, USAGES_FILE,
};
pub use cache::{run_cache_clear, run_cache_stats};
pub use collect::{run_collect, CollectConfig};
pub use export::{run_export, ExportCommandConfig, ExportFormat};
pub use subgraph::{run_subgraph, SubgraphConfig};
