//! Part records and fill-only-gaps attribute merging.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Descriptive attributes of a part.
///
/// Every field is optional: sources disagree on what they expose, and a
/// record is built up from several partial observations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartAttributes {
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Type tag (e.g. `WTPart`, `MechanicalPart`)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub part_type: Option<String>,
    /// Lifecycle state (e.g. `RELEASED`, `INWORK`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Source / make-or-buy flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Revision label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    /// Logical container (library, product, organization)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    /// BOM view (Design, Manufacturing, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    /// Attributes that are not modeled explicitly
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub extra: IndexMap<String, String>,
}

impl PartAttributes {
    /// Create empty attributes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = non_empty(name.into());
        self
    }

    /// Set the lifecycle state.
    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = non_empty(state.into());
        self
    }

    /// Whether no attribute is populated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.part_type.is_none()
            && self.state.is_none()
            && self.source.is_none()
            && self.revision.is_none()
            && self.container.is_none()
            && self.view.is_none()
            && self.extra.is_empty()
    }

    /// Merge `other` into `self`, filling only empty fields.
    ///
    /// A populated field is never replaced, so when two observations disagree
    /// the first one seen wins. Per field the final value does not depend on
    /// merge order as long as at most one observation populates it.
    ///
    /// Returns the number of fields that were filled.
    pub fn merge_gaps(&mut self, other: &Self) -> usize {
        let mut filled = 0;
        filled += fill(&mut self.name, &other.name);
        filled += fill(&mut self.part_type, &other.part_type);
        filled += fill(&mut self.state, &other.state);
        filled += fill(&mut self.source, &other.source);
        filled += fill(&mut self.revision, &other.revision);
        filled += fill(&mut self.container, &other.container);
        filled += fill(&mut self.view, &other.view);
        for (key, value) in &other.extra {
            if value.trim().is_empty() {
                continue;
            }
            let slot = self.extra.entry(key.clone()).or_default();
            if slot.trim().is_empty() {
                slot.clone_from(value);
                filled += 1;
            }
        }
        filled
    }
}

fn fill(slot: &mut Option<String>, candidate: &Option<String>) -> usize {
    let empty = slot.as_deref().map_or(true, |s| s.trim().is_empty());
    match candidate {
        Some(value) if empty && !value.trim().is_empty() => {
            *slot = Some(value.clone());
            1
        }
        _ => 0,
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// A part, keyed by its human-readable number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRecord {
    /// Part number (unique within a collection run)
    pub number: String,
    /// Accumulated attributes
    #[serde(flatten)]
    pub attributes: PartAttributes,
}

impl PartRecord {
    /// Create a record with no attributes.
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            attributes: PartAttributes::default(),
        }
    }

    /// Create a record from an initial observation.
    pub fn with_attributes(number: impl Into<String>, attributes: PartAttributes) -> Self {
        Self {
            number: number.into(),
            attributes,
        }
    }

    /// Fill empty attributes from a later observation.
    pub fn merge(&mut self, observation: &PartAttributes) -> usize {
        self.attributes.merge_gaps(observation)
    }

    /// Label for display: the name when known, else the number.
    #[must_use]
    pub fn label(&self) -> &str {
        self.attributes.name.as_deref().unwrap_or(&self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_fills_only_gaps() {
        let mut first = PartAttributes::new().with_name("Bracket");
        let second = PartAttributes::new().with_state("RELEASED");

        assert_eq!(first.merge_gaps(&second), 1);
        assert_eq!(first.name.as_deref(), Some("Bracket"));
        assert_eq!(first.state.as_deref(), Some("RELEASED"));
    }

    #[test]
    fn test_merge_order_independent() {
        let a = PartAttributes::new().with_name("Bracket");
        let b = PartAttributes::new().with_state("RELEASED");

        let mut forward = PartRecord::new("P-1");
        forward.merge(&a);
        forward.merge(&b);

        let mut backward = PartRecord::new("P-1");
        backward.merge(&b);
        backward.merge(&a);

        assert_eq!(forward, backward);
        assert_eq!(forward.attributes.name.as_deref(), Some("Bracket"));
        assert_eq!(forward.attributes.state.as_deref(), Some("RELEASED"));
    }

    #[test]
    fn test_first_seen_wins_on_conflict() {
        let mut record = PartRecord::new("P-1");
        record.merge(&PartAttributes::new().with_name("Bracket"));
        record.merge(&PartAttributes::new().with_name("Bracket, Left"));
        assert_eq!(record.label(), "Bracket");
    }

    #[test]
    fn test_empty_string_counts_as_gap() {
        let mut attrs = PartAttributes {
            name: Some("   ".into()),
            ..Default::default()
        };
        attrs.merge_gaps(&PartAttributes::new().with_name("Frame"));
        assert_eq!(attrs.name.as_deref(), Some("Frame"));
    }

    #[test]
    fn test_extra_bag_fills_missing_keys() {
        let mut attrs = PartAttributes::default();
        attrs.extra.insert("part_type".into(), "Variant".into());

        let mut other = PartAttributes::default();
        other.extra.insert("part_type".into(), "WTPart".into());
        other.extra.insert("uom".into(), "ea".into());

        assert_eq!(attrs.merge_gaps(&other), 1);
        assert_eq!(attrs.extra["part_type"], "Variant");
        assert_eq!(attrs.extra["uom"], "ea");
    }

    #[test]
    fn test_label_falls_back_to_number() {
        assert_eq!(PartRecord::new("0001").label(), "0001");
    }
}
