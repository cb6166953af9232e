//! Configuration validation for bom-tools.
//!
//! Provides validation traits and implementations for all configuration types.

use super::types::{
    AliasConfig, AppConfig, CacheConfig, CrawlConfig, ExportConfig, RemoteConfig,
};
use crate::extract::ExtractOptions;

// ============================================================================
// Configuration Error
// ============================================================================

/// Error type for configuration validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The field that failed validation
    pub field: String,
    /// Description of the validation error
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Validation Trait
// ============================================================================

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigError>;

    /// Check if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

// ============================================================================
// Validation Implementations
// ============================================================================

impl Validatable for AppConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.cache.validate());
        errors.extend(self.crawl.validate());
        errors.extend(self.remote.validate());
        errors.extend(self.extract.validate());
        errors.extend(self.export.validate());
        errors.extend(self.aliases.validate());
        errors
    }
}

impl Validatable for CacheConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if let Some(dir) = &self.dir {
            if dir.is_file() {
                errors.push(ConfigError::new(
                    "cache.dir",
                    format!("{} is a file, not a directory", dir.display()),
                ));
            }
        }
        errors
    }
}

impl Validatable for CrawlConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.per_call_depth_cap == 0 {
            errors.push(ConfigError::new(
                "crawl.per_call_depth_cap",
                "Must be at least 1",
            ));
        }
        if self.search_limit == 0 {
            errors.push(ConfigError::new("crawl.search_limit", "Must be at least 1"));
        }
        if self.pause_every > 0 && self.pause_ms == 0 {
            errors.push(ConfigError::new(
                "crawl.pause_ms",
                "pause_every is set but pause_ms is 0",
            ));
        }
        errors
    }
}

impl Validatable for RemoteConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if let Some(url) = &self.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                errors.push(ConfigError::new(
                    "remote.base_url",
                    format!("Expected an http(s) URL, got '{url}'"),
                ));
            }
        }
        if self.timeout_secs == 0 {
            errors.push(ConfigError::new("remote.timeout_secs", "Must be at least 1"));
        }
        if self.timeout_secs > 600 {
            errors.push(ConfigError::new(
                "remote.timeout_secs",
                format!("Timeout {}s exceeds the 600s maximum", self.timeout_secs),
            ));
        }
        for (field, names) in [
            ("remote.tools.search", &self.tools.search),
            ("remote.tools.details", &self.tools.details),
            ("remote.tools.structure", &self.tools.structure),
        ] {
            if names.iter().all(|n| n.trim().is_empty()) {
                errors.push(ConfigError::new(field, "At least one tool name is required"));
            }
        }
        errors
    }
}

impl Validatable for ExtractOptions {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.max_children == Some(0) {
            errors.push(ConfigError::new(
                "extract.max_children",
                "0 would extract only the root; omit the limit instead",
            ));
        }
        errors
    }
}

impl Validatable for ExportConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.batch_size == 0 {
            errors.push(ConfigError::new("export.batch_size", "Must be at least 1"));
        }
        errors
    }
}

impl Validatable for AliasConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let required = [
            ("aliases.structure.number", &self.structure.number),
            ("aliases.structure.children", &self.structure.children),
            ("aliases.tabular.number", &self.tabular.number),
            ("aliases.tabular.level", &self.tabular.level),
        ];
        for (field, aliases) in required {
            if aliases.is_empty() {
                errors.push(ConfigError::new(field, "Alias list must not be empty"));
            }
        }
        if self.structure.max_walk_depth == 0 {
            errors.push(ConfigError::new(
                "aliases.structure.max_walk_depth",
                "Must be at least 1",
            ));
        }
        errors
    }
}
