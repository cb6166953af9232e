//! Run index persisted next to a collected graph.

use std::path::Path;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::stats::CrawlStats;
use crate::error::Result;
use crate::model::{read_json, write_json};

/// File name of the run index inside an output directory.
pub const INDEX_FILE: &str = "index.json";

/// Summary of one collection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionIndex {
    /// Top-level part number the crawl started from
    pub top: String,
    /// Resolved part number → identifier mappings
    pub number_to_id: IndexMap<String, String>,
    pub stats: CrawlStats,
    pub generated_at: DateTime<Utc>,
}

impl CollectionIndex {
    #[must_use]
    pub fn new(top: impl Into<String>) -> Self {
        Self {
            top: top.into(),
            number_to_id: IndexMap::new(),
            stats: CrawlStats::default(),
            generated_at: Utc::now(),
        }
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir).map_err(|e| crate::error::BomError::io(dir, e))?;
        write_json(&dir.join(INDEX_FILE), self)
    }

    pub fn load(dir: &Path) -> Result<Self> {
        read_json(&dir.join(INDEX_FILE))
    }

    /// Load the index if one exists in `dir`.
    pub fn load_if_present(dir: &Path) -> Result<Option<Self>> {
        if dir.join(INDEX_FILE).exists() {
            Self::load(dir).map(Some)
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        assert!(CollectionIndex::load_if_present(dir.path()).unwrap().is_none());

        let mut index = CollectionIndex::new("100");
        index.number_to_id.insert("100".into(), "OR:1".into());
        index.stats.nodes_visited = 4;
        index.save(dir.path()).unwrap();

        let loaded = CollectionIndex::load_if_present(dir.path()).unwrap().unwrap();
        assert_eq!(loaded.top, "100");
        assert_eq!(loaded.number_to_id["100"], "OR:1");
        assert_eq!(loaded.stats.nodes_visited, 4);
        assert_eq!(loaded.generated_at, index.generated_at);
    }
}
