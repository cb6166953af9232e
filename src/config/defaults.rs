//! Default configurations and presets for bom-tools.
//!
//! Provides named presets for common use cases and default values.

use super::types::{AppConfig, CacheConfig, CrawlConfig, ResolutionConfig};
use crate::crawl::DetailsStrategy;

// ============================================================================
// Default Values
// ============================================================================

/// Maximum BOM depth crawled below the top part.
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Largest depth requested in a single structure call.
pub const DEFAULT_PER_CALL_DEPTH_CAP: usize = 3;

/// Candidate limit for part number searches.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Remote request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Retries for failed remote requests.
pub const DEFAULT_MAX_RETRIES: u8 = 3;

// ============================================================================
// Configuration Presets
// ============================================================================

/// Named configuration presets for common use cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPreset {
    /// Default settings suitable for most collections
    Default,
    /// Cache only: never call the remote service
    Offline,
    /// Details for every part, plus hydration of unnamed parts
    Thorough,
    /// Strict name resolution, no number fallback
    Strict,
}

impl ConfigPreset {
    /// Get the preset name as a string.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Offline => "offline",
            Self::Thorough => "thorough",
            Self::Strict => "strict",
        }
    }

    /// Parse a preset from a string name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "default" | "balanced" => Some(Self::Default),
            "offline" | "cache-only" => Some(Self::Offline),
            "thorough" | "full" => Some(Self::Thorough),
            "strict" | "exact" => Some(Self::Strict),
            _ => None,
        }
    }

    /// Get a description of this preset.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Default => "Details for the top part only, lenient name resolution",
            Self::Offline => "Answer every call from the response cache",
            Self::Thorough => "Details for every part and a final hydration pass",
            Self::Strict => "Abort on any unknown or ambiguous part name",
        }
    }

    /// Get all available presets.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Default, Self::Offline, Self::Thorough, Self::Strict]
    }
}

impl std::fmt::Display for ConfigPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Preset Implementations
// ============================================================================

impl AppConfig {
    /// Create an `AppConfig` from a named preset.
    #[must_use]
    pub fn from_preset(preset: ConfigPreset) -> Self {
        match preset {
            ConfigPreset::Default => Self::default(),
            ConfigPreset::Offline => Self {
                cache: CacheConfig {
                    offline: true,
                    ..CacheConfig::default()
                },
                ..Self::default()
            },
            ConfigPreset::Thorough => Self {
                crawl: CrawlConfig {
                    details: DetailsStrategy::Full,
                    hydrate_details: true,
                    ..CrawlConfig::default()
                },
                ..Self::default()
            },
            ConfigPreset::Strict => Self {
                resolution: ResolutionConfig {
                    strict: true,
                    number_fallback: false,
                },
                ..Self::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_names_round_trip() {
        for preset in ConfigPreset::all() {
            assert_eq!(ConfigPreset::from_name(preset.name()), Some(*preset));
        }
        assert_eq!(ConfigPreset::from_name("cache-only"), Some(ConfigPreset::Offline));
        assert_eq!(ConfigPreset::from_name("nope"), None);
    }

    #[test]
    fn test_presets() {
        assert!(AppConfig::from_preset(ConfigPreset::Offline).cache.offline);
        let thorough = AppConfig::from_preset(ConfigPreset::Thorough);
        assert_eq!(thorough.crawl.details, DetailsStrategy::Full);
        assert!(thorough.crawl.hydrate_details);
        assert!(AppConfig::from_preset(ConfigPreset::Strict).resolution.strict);
        assert_eq!(AppConfig::from_preset(ConfigPreset::Default), AppConfig::default());
    }
}
