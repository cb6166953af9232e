//! Unified error types for bom-tools.
//!
//! This module provides the error hierarchy for the library, with rich
//! context for debugging and user-friendly messages.
//!
//! Most failures inside a collection run are *not* errors: a node that cannot
//! be fetched or a malformed row is skipped and counted. The variants here
//! cover the hard stops (strict name resolution, unreadable input files,
//! invalid configuration) and infrastructure failures.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for bom-tools operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BomError {
    /// Errors while reading tabular or structured input
    #[error("Failed to parse input: {context}")]
    Parse {
        context: String,
        #[source]
        source: ParseErrorKind,
    },

    /// Name-to-number resolution failures (strict mode only)
    #[error("Name resolution failed: {context}")]
    Resolution {
        context: String,
        #[source]
        source: ResolutionErrorKind,
    },

    /// Errors talking to the remote product-data service
    #[error("Remote service error: {context}")]
    Remote {
        context: String,
        #[source]
        source: RemoteErrorKind,
    },

    /// Errors in the on-disk cache
    #[error("Cache error: {context}")]
    Cache {
        context: String,
        #[source]
        source: CacheErrorKind,
    },

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Specific parse error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ParseErrorKind {
    #[error("Invalid JSON structure: {0}")]
    InvalidJson(String),

    #[error("Invalid CSV structure: {0}")]
    InvalidCsv(String),
}

/// Specific name-resolution error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ResolutionErrorKind {
    #[error("Unknown part name in BOM: parent '{parent}' / child '{child}'")]
    UnknownName { parent: String, child: String },

    #[error(
        "Ambiguous part name in BOM: parent '{parent}' ({parent_candidates} candidates) / \
         child '{child}' ({child_candidates} candidates)"
    )]
    AmbiguousName {
        parent: String,
        child: String,
        parent_candidates: usize,
        child_candidates: usize,
    },
}

/// Specific remote-service error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RemoteErrorKind {
    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Specific cache error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CacheErrorKind {
    #[error("Cache directory unavailable: {0}")]
    DirectoryUnavailable(String),

    #[error("Failed to write cache entry: {0}")]
    WriteFailed(String),
}

// ============================================================================
// Result type alias
// ============================================================================

/// Convenient Result type for bom-tools operations
pub type Result<T> = std::result::Result<T, BomError>;

// ============================================================================
// Error construction helpers
// ============================================================================

impl BomError {
    /// Create a parse error with context
    pub fn parse(context: impl Into<String>, source: ParseErrorKind) -> Self {
        Self::Parse {
            context: context.into(),
            source,
        }
    }

    /// Create a name-resolution error
    pub fn resolution(context: impl Into<String>, source: ResolutionErrorKind) -> Self {
        Self::Resolution {
            context: context.into(),
            source,
        }
    }

    /// Create a remote-service error
    pub fn remote(context: impl Into<String>, source: RemoteErrorKind) -> Self {
        Self::Remote {
            context: context.into(),
            source,
        }
    }

    /// Create a cache error
    pub fn cache(context: impl Into<String>, source: CacheErrorKind) -> Self {
        Self::Cache {
            context: context.into(),
            source,
        }
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        let message = format!("{source}");
        Self::Io {
            path: Some(path),
            message,
            source,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this error is a strict-mode name resolution stop.
    #[must_use]
    pub const fn is_resolution(&self) -> bool {
        matches!(self, Self::Resolution { .. })
    }
}

// ============================================================================
// Conversions from existing error types
// ============================================================================

impl From<std::io::Error> for BomError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: format!("{err}"),
            source: err,
        }
    }
}

impl From<serde_json::Error> for BomError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(
            "JSON deserialization",
            ParseErrorKind::InvalidJson(err.to_string()),
        )
    }
}

impl From<csv::Error> for BomError {
    fn from(err: csv::Error) -> Self {
        Self::parse("CSV reading", ParseErrorKind::InvalidCsv(err.to_string()))
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// The context string is prepended to the error's existing context,
/// creating a chain that shows the path through the code.
///
/// # Example
///
/// ```ignore
/// use bom_tools::error::ErrorContext;
///
/// fn load_table(path: &Path) -> Result<Table> {
///     read_csv(path).with_context(|| format!("reading BOM table {}", path.display()))
/// }
/// ```
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure (lazy evaluation).
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<BomError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

/// Add context to an error, chaining with any existing context.
fn add_context_to_error(err: BomError, new_ctx: &str) -> BomError {
    match err {
        BomError::Parse {
            context: existing,
            source,
        } => BomError::Parse {
            context: chain_context(new_ctx, &existing),
            source,
        },
        BomError::Resolution {
            context: existing,
            source,
        } => BomError::Resolution {
            context: chain_context(new_ctx, &existing),
            source,
        },
        BomError::Remote {
            context: existing,
            source,
        } => BomError::Remote {
            context: chain_context(new_ctx, &existing),
            source,
        },
        BomError::Cache {
            context: existing,
            source,
        } => BomError::Cache {
            context: chain_context(new_ctx, &existing),
            source,
        },
        BomError::Io {
            path,
            message,
            source,
        } => BomError::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
        BomError::Config(msg) => BomError::Config(chain_context(new_ctx, &msg)),
        BomError::Validation(msg) => BomError::Validation(chain_context(new_ctx, &msg)),
    }
}

/// Chain two context strings together.
///
/// If the existing context is empty, returns just the new context.
/// Otherwise, returns "`new_context`: `existing_context`".
fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}

/// Extension trait for Option types to convert to errors with context.
pub trait OptionContext<T> {
    /// Convert None to an error with the given context.
    fn context_none(self, context: impl Into<String>) -> Result<T>;

    /// Convert None to an error with context from a closure.
    fn with_context_none<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T> OptionContext<T> for Option<T> {
    fn context_none(self, context: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| BomError::Validation(context.into()))
    }

    fn with_context_none<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.ok_or_else(|| BomError::Validation(f().into()))
    }
}
