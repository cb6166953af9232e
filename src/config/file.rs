//! Configuration file discovery and loading.
//!
//! Config files are YAML. An explicit `--config` path wins; otherwise the
//! first `.bom-tools.yaml` (or one of its spellings) found in the working
//! directory, the enclosing git checkout, the user config directory or the
//! home directory is used.

use super::types::AppConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File names tried in every candidate directory, in order.
const CONFIG_FILE_NAMES: &[&str] = &[
    ".bom-tools.yaml",
    ".bom-tools.yml",
    "bom-tools.yaml",
    "bom-tools.yml",
];

/// Directories searched when no explicit path is given, in order.
fn candidate_dirs() -> Vec<PathBuf> {
    let cwd = std::env::current_dir().ok();
    let git_root = cwd.as_deref().and_then(|dir| {
        dir.ancestors()
            .find(|candidate| candidate.join(".git").exists())
            .map(Path::to_path_buf)
    });
    [
        cwd,
        git_root,
        dirs::config_dir().map(|dir| dir.join("bom-tools")),
        dirs::home_dir(),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn find_config_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Locate the config file to use, if any.
#[must_use]
pub fn discover_config_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path.filter(|p| p.exists()) {
        return Some(path.to_path_buf());
    }
    candidate_dirs()
        .iter()
        .find_map(|dir| find_config_in_dir(dir))
}

/// Failure to read a config file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Parse an [`AppConfig`] from a YAML file. Missing keys take defaults.
pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigFileError> {
    if !path.exists() {
        return Err(ConfigFileError::NotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&text)?)
}

/// Load the discovered config file, falling back to defaults.
///
/// A file that exists but cannot be read or parsed is reported with a
/// warning and ignored. The second value is the path actually loaded.
#[must_use]
pub fn load_or_default(explicit_path: Option<&Path>) -> (AppConfig, Option<PathBuf>) {
    let Some(path) = discover_config_file(explicit_path) else {
        return (AppConfig::default(), None);
    };
    match load_config_file(&path) {
        Ok(config) => (config, Some(path)),
        Err(e) => {
            tracing::warn!("Ignoring config file {}: {}", path.display(), e);
            (AppConfig::default(), None)
        }
    }
}

/// Default configuration rendered as a commented YAML file.
#[must_use]
pub fn generate_example_config() -> String {
    let body = serde_yaml::to_string(&AppConfig::default()).unwrap_or_default();
    let mut out = String::from(
        "# bom-tools configuration\n\
         # Save as .bom-tools.yaml next to your data or in ~/.config/bom-tools/\n\n",
    );
    out.push_str(&body);
    out
}
