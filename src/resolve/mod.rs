//! Name → number resolution for name-based BOM rows.
//!
//! Every row is classified before anything is emitted:
//!
//! | Status | Meaning |
//! |---|---|
//! | `Resolved` | both names map to exactly one number |
//! | `Unknown` | at least one name has no candidate |
//! | `Ambiguous` | both names are known and at least one has several candidates |
//!
//! In [`ResolutionMode::Strict`] any unknown or ambiguous row fails the whole
//! resolution; in [`ResolutionMode::Lenient`] such rows are counted and
//! skipped. The resolver never guesses between candidates.

mod report;

pub use report::{write_report_csv, write_skip_log};

use serde::{Deserialize, Serialize};

use crate::error::{BomError, ResolutionErrorKind, Result};
use crate::model::{EdgeInsert, EdgeSet};
use crate::tabular::{CrossReferenceIndex, NameRow};

/// How unresolved rows are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMode {
    /// Abort on the first unknown or ambiguous name
    Strict,
    /// Count and skip unknown or ambiguous rows
    #[default]
    Lenient,
}

/// Classification of one name row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    Resolved,
    Unknown,
    Ambiguous,
}

impl RowStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Resolved => "resolved",
            Self::Unknown => "unknown",
            Self::Ambiguous => "ambiguous",
        }
    }
}

/// Per-row resolution detail, used for the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowOutcome {
    pub parent_name: String,
    pub child_name: String,
    pub parent_candidates: Vec<String>,
    pub child_candidates: Vec<String>,
    pub status: RowStatus,
}

impl RowOutcome {
    /// The chosen (parent, child) numbers, when resolved.
    #[must_use]
    pub fn chosen(&self) -> Option<(&str, &str)> {
        match (
            self.status,
            self.parent_candidates.first(),
            self.child_candidates.first(),
        ) {
            (RowStatus::Resolved, Some(parent), Some(child)) => {
                Some((parent.as_str(), child.as_str()))
            }
            _ => None,
        }
    }
}

/// Result of resolving a batch of name rows.
#[derive(Debug, Clone, Default)]
pub struct NameResolution {
    /// Edges from resolved rows
    pub edges: EdgeSet,
    /// One outcome per input row, in input order
    pub outcomes: Vec<RowOutcome>,
    pub resolved: usize,
    pub unknown: usize,
    pub ambiguous: usize,
    /// Resolved rows whose parent and child mapped to the same number
    pub self_loops: usize,
}

impl NameResolution {
    /// Rows that did not produce an edge candidate.
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.unknown + self.ambiguous
    }

    pub fn log_summary(&self) {
        tracing::info!(
            "Name resolution: {} rows, {} resolved, {} unknown, {} ambiguous, {} edges",
            self.outcomes.len(),
            self.resolved,
            self.unknown,
            self.ambiguous,
            self.edges.len()
        );
        if self.skipped() > 0 {
            tracing::warn!(
                "Skipped {} name-based BOM rows due to unknown or ambiguous names",
                self.skipped()
            );
        }
    }
}

/// Resolves name rows against a [`CrossReferenceIndex`].
#[derive(Debug, Clone, Copy)]
pub struct NameResolver<'a> {
    index: &'a CrossReferenceIndex,
    mode: ResolutionMode,
    number_fallback: bool,
}

impl<'a> NameResolver<'a> {
    #[must_use]
    pub const fn new(index: &'a CrossReferenceIndex, mode: ResolutionMode) -> Self {
        Self {
            index,
            mode,
            number_fallback: true,
        }
    }

    /// Let a name with no index entry that is itself a known part number
    /// resolve to that number.
    #[must_use]
    pub const fn with_number_fallback(mut self, enabled: bool) -> Self {
        self.number_fallback = enabled;
        self
    }

    fn candidates(&self, name: &str) -> Vec<String> {
        let found = self.index.candidates(name);
        if found.is_empty() && self.number_fallback && self.index.contains_number(name.trim()) {
            return vec![name.trim().to_string()];
        }
        found.into_iter().map(str::to_string).collect()
    }

    /// Classify a single row.
    #[must_use]
    pub fn classify(&self, row: &NameRow) -> RowOutcome {
        let parent_candidates = self.candidates(&row.parent_name);
        let child_candidates = self.candidates(&row.child_name);
        let status = if parent_candidates.is_empty() || child_candidates.is_empty() {
            RowStatus::Unknown
        } else if parent_candidates.len() > 1 || child_candidates.len() > 1 {
            RowStatus::Ambiguous
        } else {
            RowStatus::Resolved
        };
        RowOutcome {
            parent_name: row.parent_name.trim().to_string(),
            child_name: row.child_name.trim().to_string(),
            parent_candidates,
            child_candidates,
            status,
        }
    }

    /// Resolve every row.
    ///
    /// # Errors
    ///
    /// In strict mode, returns [`BomError::Resolution`] describing the first
    /// offending row when any row is unknown or ambiguous. No edges are
    /// produced in that case.
    pub fn resolve<'r, I>(&self, rows: I) -> Result<NameResolution>
    where
        I: IntoIterator<Item = &'r NameRow>,
    {
        let mut resolution = NameResolution::default();
        for row in rows {
            let outcome = self.classify(row);
            match outcome.status {
                RowStatus::Resolved => resolution.resolved += 1,
                RowStatus::Unknown => resolution.unknown += 1,
                RowStatus::Ambiguous => resolution.ambiguous += 1,
            }
            resolution.outcomes.push(outcome);
        }

        if self.mode == ResolutionMode::Strict && resolution.skipped() > 0 {
            return Err(strict_failure(&resolution));
        }

        for outcome in &resolution.outcomes {
            if let Some((parent, child)) = outcome.chosen() {
                if resolution.edges.insert(parent, child) == EdgeInsert::SelfLoop {
                    resolution.self_loops += 1;
                }
            } else {
                tracing::debug!(
                    parent = %outcome.parent_name,
                    child = %outcome.child_name,
                    status = outcome.status.as_str(),
                    "Skipping unresolved BOM row"
                );
            }
        }
        Ok(resolution)
    }
}

fn strict_failure(resolution: &NameResolution) -> BomError {
    let (row_no, first) = resolution
        .outcomes
        .iter()
        .enumerate()
        .find(|(_, o)| o.status != RowStatus::Resolved)
        .map_or((0, None), |(i, o)| (i + 1, Some(o)));

    let context = format!(
        "{} unknown and {} ambiguous of {} rows; first at row {}",
        resolution.unknown,
        resolution.ambiguous,
        resolution.outcomes.len(),
        row_no
    );
    let kind = match first {
        Some(o) if o.status == RowStatus::Ambiguous => ResolutionErrorKind::AmbiguousName {
            parent: o.parent_name.clone(),
            child: o.child_name.clone(),
            parent_candidates: o.parent_candidates.len(),
            child_candidates: o.child_candidates.len(),
        },
        Some(o) => ResolutionErrorKind::UnknownName {
            parent: o.parent_name.clone(),
            child: o.child_name.clone(),
        },
        None => ResolutionErrorKind::UnknownName {
            parent: String::new(),
            child: String::new(),
        },
    };
    BomError::resolution(context, kind)
}
