//! Configuration types for bom-tools operations.
//!
//! Provides structured configuration for collection, tabular parsing, name
//! resolution, extraction and export.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::defaults::{
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_RETRIES, DEFAULT_PER_CALL_DEPTH_CAP, DEFAULT_SEARCH_LIMIT,
    DEFAULT_TIMEOUT_SECS,
};
use crate::crawl::{CrawlOptions, DetailsStrategy};
use crate::export::DEFAULT_BATCH_SIZE;
use crate::extract::ExtractOptions;
use crate::remote::RemoteTools;
use crate::resolve::ResolutionMode;
use crate::structure::StructureAliases;
use crate::tabular::TabularAliases;

// ============================================================================
// Unified Application Configuration
// ============================================================================

/// Unified application configuration that can be loaded from CLI args or config files.
///
/// This is the top-level configuration struct that aggregates all configuration
/// options. It can be constructed from CLI arguments, config files, or both
/// (with CLI overriding file settings).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppConfig {
    /// Response cache location and offline mode
    pub cache: CacheConfig,
    /// Crawl depth and detail settings
    pub crawl: CrawlConfig,
    /// Remote product-data service
    pub remote: RemoteConfig,
    /// Name-based BOM resolution
    pub resolution: ResolutionConfig,
    /// Bounded subgraph extraction
    pub extract: ExtractOptions,
    /// Graph-store export
    pub export: ExportConfig,
    /// Field and column aliases
    pub aliases: AliasConfig,
}

impl AppConfig {
    /// Create a new `AppConfig` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an `AppConfig` builder.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

// ============================================================================
// Builder for AppConfig
// ============================================================================

/// Builder for constructing `AppConfig` with fluent API.
#[derive(Debug, Default)]
#[must_use]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Set the cache directory.
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache.dir = Some(dir.into());
        self
    }

    /// Enable offline mode.
    pub const fn offline(mut self, offline: bool) -> Self {
        self.config.cache.offline = offline;
        self
    }

    /// Set the maximum crawl depth.
    pub const fn max_depth(mut self, depth: usize) -> Self {
        self.config.crawl.max_depth = depth;
        self
    }

    /// Set the details strategy.
    pub const fn details(mut self, details: DetailsStrategy) -> Self {
        self.config.crawl.details = details;
        self
    }

    /// Set the remote service base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.remote.base_url = Some(url.into());
        self
    }

    /// Enable strict name resolution.
    pub const fn strict(mut self, strict: bool) -> Self {
        self.config.resolution.strict = strict;
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> AppConfig {
        self.config
    }
}

// ============================================================================
// Cache Configuration
// ============================================================================

/// Response cache settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache directory (defaults to the platform cache directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    /// Never call the remote service; cache misses are skipped
    pub offline: bool,
}

impl CacheConfig {
    /// The configured directory, or the platform default.
    #[must_use]
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(crate::pipeline::dirs::response_cache_dir)
    }
}

// ============================================================================
// Crawl Configuration
// ============================================================================

/// Frontier crawl settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CrawlConfig {
    /// Maximum BOM depth below the top part
    pub max_depth: usize,
    /// Largest depth requested in one structure call
    pub per_call_depth_cap: usize,
    /// Which parts get a details lookup: full, top, none
    pub details: DetailsStrategy,
    /// Candidate limit for part number searches
    pub search_limit: usize,
    /// Pause after this many remote calls (0 disables)
    pub pause_every: usize,
    /// Pause length in milliseconds
    pub pause_ms: u64,
    /// Look up details for parts still unnamed after the crawl
    pub hydrate_details: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            per_call_depth_cap: DEFAULT_PER_CALL_DEPTH_CAP,
            details: DetailsStrategy::default(),
            search_limit: DEFAULT_SEARCH_LIMIT,
            pause_every: 0,
            pause_ms: 0,
            hydrate_details: false,
        }
    }
}

impl CrawlConfig {
    #[must_use]
    pub const fn to_options(&self) -> CrawlOptions {
        CrawlOptions {
            max_depth: self.max_depth,
            per_call_depth_cap: self.per_call_depth_cap,
            details: self.details,
            hydrate_details: self.hydrate_details,
        }
    }

    #[must_use]
    pub const fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

// ============================================================================
// Remote Configuration
// ============================================================================

/// Remote product-data service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RemoteConfig {
    /// Service base URL; without one, collection runs offline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retries for failed requests
    pub max_retries: u8,
    /// BOM view passed to structure calls
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    /// Tool names with fallbacks
    pub tools: RemoteTools,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            view: Some("Design".to_string()),
            tools: RemoteTools::default(),
        }
    }
}

impl RemoteConfig {
    /// HTTP client settings, when a base URL is configured.
    #[cfg(feature = "remote")]
    #[must_use]
    pub fn client_config(&self) -> Option<crate::remote::HttpClientConfig> {
        let base_url = self.base_url.clone()?;
        Some(crate::remote::HttpClientConfig {
            base_url,
            timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
            tools: self.tools.clone(),
            view: self.view.clone(),
        })
    }
}

// ============================================================================
// Resolution Configuration
// ============================================================================

/// Name resolution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Fail on the first unknown or ambiguous name
    pub strict: bool,
    /// Accept a known part number where a name was expected
    pub number_fallback: bool,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            strict: false,
            number_fallback: true,
        }
    }
}

impl ResolutionConfig {
    #[must_use]
    pub const fn mode(&self) -> ResolutionMode {
        if self.strict {
            ResolutionMode::Strict
        } else {
            ResolutionMode::Lenient
        }
    }
}

// ============================================================================
// Export Configuration
// ============================================================================

/// Graph-store export settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ExportConfig {
    /// Rows per sink call
    pub batch_size: usize,
    /// Include `used_in` and `part_of_assembly`
    pub derived: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            derived: true,
        }
    }
}

// ============================================================================
// Alias Configuration
// ============================================================================

/// Field-name aliases for structure responses and tabular columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AliasConfig {
    pub structure: StructureAliases,
    pub tabular: TabularAliases,
}
