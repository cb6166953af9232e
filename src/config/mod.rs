//! Configuration module for bom-tools.
//!
//! This module provides a unified configuration system with:
//! - Type-safe configuration structures
//! - Validation for all configuration values
//! - Named presets for common use cases
//! - YAML config file loading and discovery
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use bom_tools::config::{AppConfig, ConfigPreset};
//!
//! // Use defaults
//! let config = AppConfig::default();
//!
//! // Use a preset
//! let config = AppConfig::from_preset(ConfigPreset::Offline);
//!
//! // Use builder
//! let config = AppConfig::builder()
//!     .base_url("http://localhost:3000")
//!     .max_depth(4)
//!     .strict(true)
//!     .build();
//!
//! // Load from file
//! use bom_tools::config::file::load_or_default;
//! let (config, loaded_from) = load_or_default(None);
//! ```
//!
//! # Configuration File
//!
//! Place a `.bom-tools.yaml` file in your project root or `~/.config/bom-tools/`:
//!
//! ```yaml
//! remote:
//!   base_url: http://localhost:3000
//! crawl:
//!   max_depth: 4
//!   details: full
//! resolution:
//!   strict: true
//! ```

mod defaults;
pub mod file;
mod types;
mod validation;

// Re-export main types
pub use defaults::{
    ConfigPreset, DEFAULT_MAX_DEPTH, DEFAULT_MAX_RETRIES, DEFAULT_PER_CALL_DEPTH_CAP,
    DEFAULT_SEARCH_LIMIT, DEFAULT_TIMEOUT_SECS,
};
pub use types::{
    AliasConfig, AppConfig, AppConfigBuilder, CacheConfig, CrawlConfig, ExportConfig,
    RemoteConfig, ResolutionConfig,
};
pub use validation::{ConfigError, Validatable};

// Re-export file utilities
pub use file::{
    discover_config_file, generate_example_config, load_config_file, load_or_default,
    ConfigFileError,
};

/// Generate a JSON Schema for the `AppConfig` configuration format.
///
/// This schema documents all configuration options that can be set in
/// `.bom-tools.yaml` config files. It can be used by editors for
/// validation and autocompletion.
pub fn generate_json_schema() -> crate::error::Result<String> {
    let schema = schemars::schema_for!(AppConfig);
    Ok(serde_json::to_string_pretty(&schema)?)
}
