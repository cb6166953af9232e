//! Collection stage: service selection, cache setup and the crawl itself.

use std::path::Path;

use anyhow::{Context, Result};

use crate::cache::FileCache;
use crate::config::AppConfig;
use crate::crawl::{CachedSource, CollectionIndex, CrawlOutcome, Crawler};
use crate::remote::{OfflineService, ProductDataService};

/// Pick the service a collection run talks to.
///
/// Offline mode, a missing base URL, or a build without the `remote`
/// feature all yield [`OfflineService`].
pub fn build_service(config: &AppConfig) -> Result<Box<dyn ProductDataService>> {
    if config.cache.offline {
        tracing::info!("Offline mode: answering from the response cache only");
        return Ok(Box::new(OfflineService));
    }

    if let Some(client) = remote_client(config)? {
        return Ok(client);
    }

    tracing::warn!("No remote.base_url configured; collecting from the response cache only");
    Ok(Box::new(OfflineService))
}

#[cfg(feature = "remote")]
fn remote_client(config: &AppConfig) -> Result<Option<Box<dyn ProductDataService>>> {
    let Some(client_config) = config.remote.client_config() else {
        return Ok(None);
    };
    let url = client_config.base_url.clone();
    let client = crate::remote::HttpProductClient::new(client_config)
        .context("Failed to create remote client")?;
    match client.health_check() {
        Ok(true) => tracing::info!("Connected to product-data service at {url}"),
        Ok(false) => tracing::warn!("Service at {url} answered with an error status"),
        Err(e) => tracing::warn!("Service at {url} is not reachable: {e}"),
    }
    Ok(Some(Box::new(client)))
}

#[cfg(not(feature = "remote"))]
fn remote_client(config: &AppConfig) -> Result<Option<Box<dyn ProductDataService>>> {
    if config.remote.base_url.is_some() {
        tracing::warn!("Built without the `remote` feature; ignoring remote.base_url");
    }
    Ok(None)
}

/// Crawl from `top` and persist the graph and run index into `out_dir`.
///
/// When `out_dir` already holds an index for the same top part, its
/// identifier mappings seed the new run.
pub fn collect_graph<S: ProductDataService>(
    config: &AppConfig,
    service: S,
    top: &str,
    out_dir: &Path,
) -> Result<CrawlOutcome> {
    let cache_dir = config.cache.resolved_dir();
    let cache = FileCache::new(&cache_dir)
        .with_context(|| format!("Failed to open cache at {}", cache_dir.display()))?;
    tracing::debug!("Response cache: {}", cache_dir.display());

    let offline = config.cache.offline || !service.is_available();
    let source = CachedSource::new(cache, service, offline)
        .with_search_limit(config.crawl.search_limit)
        .with_pause(config.crawl.pause_every, config.crawl.pause());

    let mut crawler = Crawler::new(
        source,
        config.crawl.to_options(),
        config.aliases.structure.clone(),
    );

    let previous = CollectionIndex::load_if_present(out_dir)
        .with_context(|| format!("Failed to read previous index in {}", out_dir.display()))?;
    if let Some(previous) = previous.filter(|p| p.top == top.trim()) {
        tracing::info!(
            "Seeding {} known identifiers from previous run",
            previous.number_to_id.len()
        );
        crawler = crawler.seeded(&previous);
    }

    let outcome = crawler.run(top);

    outcome
        .graph
        .save(out_dir)
        .with_context(|| format!("Failed to write graph to {}", out_dir.display()))?;
    outcome
        .index
        .save(out_dir)
        .with_context(|| format!("Failed to write index to {}", out_dir.display()))?;

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BomGraph, EDGES_FILE, PARTS_FILE};
    use crate::crawl::INDEX_FILE;
    use tempfile::TempDir;

    #[test]
    fn test_offline_config_builds_offline_service() {
        let config = AppConfig::builder().offline(true).build();
        let service = build_service(&config).unwrap();
        assert!(!service.is_available());
        assert_eq!(service.name(), "offline");
    }

    #[test]
    fn test_missing_url_builds_offline_service() {
        let service = build_service(&AppConfig::default()).unwrap();
        assert!(!service.is_available());
    }

    #[test]
    fn test_collect_offline_writes_outputs() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        let config = AppConfig::builder()
            .cache_dir(tmp.path().join("cache"))
            .offline(true)
            .build();

        let outcome = collect_graph(&config, OfflineService, "TOP-1", &out).unwrap();
        assert_eq!(outcome.graph.part_count(), 1);
        assert!(outcome.graph.edges.is_empty());
        assert!(!outcome.stats().skipped.is_empty());

        for file in [PARTS_FILE, EDGES_FILE, INDEX_FILE] {
            assert!(out.join(file).exists(), "{file} missing");
        }
        let reloaded = BomGraph::load(&out).unwrap();
        assert_eq!(reloaded, outcome.graph);
    }
}
