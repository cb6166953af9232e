//! Cache command handlers.
//!
//! Implements `cache stats` and `cache clear` for the response cache.

use crate::cache::FileCache;
use crate::config::AppConfig;
use crate::pipeline::{exit_codes, write_json_output, write_output, OutputTarget};
use anyhow::{Context, Result};
use std::fmt::Write as _;

fn open(app: &AppConfig) -> Result<FileCache> {
    let dir = app.cache.resolved_dir();
    FileCache::new(&dir).with_context(|| format!("Failed to open cache at {}", dir.display()))
}

/// Print entry counts per kind and total size.
pub fn run_cache_stats(app: &AppConfig, json: bool) -> Result<i32> {
    let cache = open(app)?;
    let stats = cache.stats();

    if json {
        write_json_output(&stats, &OutputTarget::Stdout, true)?;
        return Ok(exit_codes::SUCCESS);
    }

    let mut text = String::new();
    writeln!(text, "Cache directory: {}", cache.dir().display())?;
    writeln!(
        text,
        "Entries: {} ({})",
        stats.total_entries,
        format_size(stats.total_size)
    )?;
    for (kind, count) in &stats.by_kind {
        writeln!(text, "  {kind:<22} {count:>8}")?;
    }
    if stats.not_found_entries > 0 {
        writeln!(text, "Not-found markers: {}", stats.not_found_entries)?;
    }
    write_output(text.trim_end(), &OutputTarget::Stdout, true)?;
    Ok(exit_codes::SUCCESS)
}

/// Remove every cached response.
pub fn run_cache_clear(app: &AppConfig, quiet: bool) -> Result<i32> {
    let cache = open(app)?;
    let removed = cache
        .clear()
        .with_context(|| format!("Failed to clear {}", cache.dir().display()))?;
    if !quiet {
        tracing::info!(
            "Removed {removed} cached responses from {}",
            cache.dir().display()
        );
    }
    Ok(exit_codes::SUCCESS)
}

#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let bytes_f = bytes as f64;
    if bytes_f < KIB {
        format!("{bytes} B")
    } else if bytes_f < KIB * KIB {
        format!("{:.1} KiB", bytes_f / KIB)
    } else {
        format!("{:.1} MiB", bytes_f / (KIB * KIB))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheKind;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KiB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MiB");
    }

    #[test]
    fn test_clear_empties_cache() {
        let tmp = TempDir::new().unwrap();
        let app = AppConfig::builder().cache_dir(tmp.path()).build();
        let cache = FileCache::new(tmp.path()).unwrap();
        cache
            .put(CacheKind::DetailsById, "OR:1", &json!({"name": "Frame"}))
            .unwrap();
        assert_eq!(cache.stats().total_entries, 1);

        assert_eq!(run_cache_clear(&app, true).unwrap(), exit_codes::SUCCESS);
        assert_eq!(cache.stats().total_entries, 0);
    }
}
