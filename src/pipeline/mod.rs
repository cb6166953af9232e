//! Pipeline orchestration for BOM operations.
//!
//! This module provides the shared stages behind the CLI commands: collect a
//! graph from the service, load tables into a graph, resolve names, and write
//! results. Command handlers compose these instead of repeating them.

mod collect;
mod output;
mod tables;

pub use collect::{build_service, collect_graph};
pub use output::{write_json_output, write_output, OutputTarget};
pub use tables::{
    graph_from_tables, load_graph, load_links, load_tables, save_graph, save_links,
};

/// Structured pipeline error types for better diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Input tables could not be read
    #[error("Failed to read tables from {path}: {source}")]
    TablesFailed {
        path: String,
        source: crate::error::BomError,
    },

    /// A collected or parsed graph could not be loaded
    #[error("No graph found in {dir}: {source}")]
    GraphMissing {
        dir: String,
        source: crate::error::BomError,
    },

    /// Strict name resolution rejected the input
    #[error("Name resolution failed: {source}")]
    ResolutionFailed {
        #[source]
        source: crate::error::BomError,
    },

    /// Export to a sink failed
    #[error("Export failed: {source}")]
    ExportFailed {
        #[source]
        source: crate::error::BomError,
    },
}

/// Exit codes for CI/CD integration
pub mod exit_codes {
    /// Success - everything requested was produced
    pub const SUCCESS: i32 = 0;
    /// Completed, but nodes or rows were skipped (with --fail-on-skip)
    pub const INCOMPLETE: i32 = 1;
    /// Strict name resolution found unknown or ambiguous names
    pub const RESOLUTION_FAILED: i32 = 2;
    /// An error occurred
    pub const ERROR: i32 = 3;
}

/// Platform-specific cache directory utilities
pub mod dirs {
    use std::path::PathBuf;

    /// Get the platform-specific cache directory
    #[must_use]
    pub fn cache_dir() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library").join("Caches"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_CACHE_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".cache"))
                })
        }
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".cache"))
        }
    }

    /// Get the default response cache directory
    #[must_use]
    pub fn response_cache_dir() -> PathBuf {
        cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("bom-tools")
            .join("responses")
    }
}
