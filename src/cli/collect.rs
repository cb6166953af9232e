//! Collect command handler.
//!
//! Implements the `collect` subcommand: crawl the BOM below one top-level
//! part and write `parts.json`, `edges.json` and `index.json`.

use crate::config::AppConfig;
use crate::pipeline::{build_service, collect_graph, exit_codes};
use anyhow::Result;
use std::path::PathBuf;

/// Collect command configuration
pub struct CollectConfig {
    /// Top-level part number to start from
    pub top: String,
    /// Directory receiving the graph and run index
    pub out_dir: PathBuf,
    /// Exit with [`exit_codes::INCOMPLETE`] when any node was skipped
    pub fail_on_skip: bool,
    pub quiet: bool,
}

/// Run the collect command, returning the desired exit code.
pub fn run_collect(app: &AppConfig, config: &CollectConfig) -> Result<i32> {
    let top = config.top.trim();
    if top.is_empty() {
        anyhow::bail!("Top-level part number must not be empty");
    }

    let service = build_service(app)?;
    let outcome = collect_graph(app, service, top, &config.out_dir)?;
    let stats = outcome.stats();

    if !config.quiet {
        tracing::info!(
            "Collected {} parts and {} edges below {} into {} (graph hash {:016x})",
            outcome.graph.part_count(),
            outcome.graph.edge_count(),
            top,
            config.out_dir.display(),
            outcome.graph.content_hash()
        );
    }

    if config.fail_on_skip && !stats.skipped.is_empty() {
        tracing::warn!("{} frontier items were skipped", stats.skipped.len());
        return Ok(exit_codes::INCOMPLETE);
    }
    Ok(exit_codes::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn offline_config(tmp: &TempDir) -> AppConfig {
        AppConfig::builder()
            .cache_dir(tmp.path().join("cache"))
            .offline(true)
            .build()
    }

    #[test]
    fn test_empty_cache_skip_sets_exit_code() {
        let tmp = TempDir::new().unwrap();
        let config = CollectConfig {
            top: "TOP".into(),
            out_dir: tmp.path().join("out"),
            fail_on_skip: true,
            quiet: true,
        };
        let code = run_collect(&offline_config(&tmp), &config).unwrap();
        assert_eq!(code, exit_codes::INCOMPLETE);
    }

    #[test]
    fn test_skips_tolerated_by_default() {
        let tmp = TempDir::new().unwrap();
        let config = CollectConfig {
            top: "TOP".into(),
            out_dir: tmp.path().join("out"),
            fail_on_skip: false,
            quiet: true,
        };
        let code = run_collect(&offline_config(&tmp), &config).unwrap();
        assert_eq!(code, exit_codes::SUCCESS);
    }

    #[test]
    fn test_blank_top_rejected() {
        let tmp = TempDir::new().unwrap();
        let config = CollectConfig {
            top: "  ".into(),
            out_dir: tmp.path().join("out"),
            fail_on_skip: false,
            quiet: true,
        };
        assert!(run_collect(&offline_config(&tmp), &config).is_err());
    }
}
