//! Ordered field-name aliases.
//!
//! Product-data responses and tabular exports name the same logical field in
//! different ways (`Number`, `number`, `PartNumber`, ...). A [`FieldAliases`]
//! is an ordered list of candidate keys for one logical field; lookups check
//! the candidates in order and the first match wins.

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ordered list of candidate keys for one logical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct FieldAliases(Vec<String>);

impl FieldAliases {
    /// Build from a list of keys, preserving order.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(Into::into).collect())
    }

    /// Candidate keys in lookup order.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Exact-match lookup in a JSON object.
    ///
    /// Candidates whose value is `null` are passed over so that a later alias
    /// can still match. A candidate such as `Identity.Name` that is not a key
    /// of the object is tried as a dotted path into nested objects.
    #[must_use]
    pub fn lookup<'a>(&self, object: &'a Map<String, Value>) -> Option<&'a Value> {
        self.0
            .iter()
            .filter_map(|key| object.get(key).or_else(|| lookup_path(object, key)))
            .find(|value| !value.is_null())
    }

    /// Whether `key` is one of the candidates (exact match).
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|k| k == key)
    }

    /// Case-insensitive lookup of a column index in a header map.
    ///
    /// `headers` maps lower-cased, trimmed header text to column index.
    #[must_use]
    pub fn find_column(&self, headers: &IndexMap<String, usize>) -> Option<usize> {
        self.0
            .iter()
            .find_map(|key| headers.get(&key.trim().to_lowercase()).copied())
    }
}

fn lookup_path<'a>(object: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let (head, rest) = path.split_once('.')?;
    let nested = object.get(head)?.as_object()?;
    nested.get(rest).or_else(|| lookup_path(nested, rest))
}

impl From<&[&str]> for FieldAliases {
    fn from(keys: &[&str]) -> Self {
        Self::new(keys.iter().copied())
    }
}

/// Render a JSON scalar as a trimmed, non-empty string.
///
/// Objects of the shape `{"Value": x}` / `{"value": x}` (enumerated fields in
/// OData-style payloads) unwrap to `x`. Integral floats render without the
/// fractional part so that `12.0` and `12` name the same part.
#[must_use]
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(normalize_part_number(&n.to_string())),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) => map
            .get("Value")
            .or_else(|| map.get("value"))
            .and_then(scalar_string),
        Value::Null | Value::Array(_) => None,
    }
}

/// Normalize a part-number cell: trim, and drop a `.0` suffix from numbers
/// that spreadsheets turned into floats.
#[must_use]
pub fn normalize_part_number(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(integral) = trimmed.strip_suffix(".0") {
        let digits = integral.strip_prefix('-').unwrap_or(integral);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return integral.to_string();
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_alias_wins() {
        let aliases = FieldAliases::new(["Number", "number", "PartNumber"]);
        let value = json!({"PartNumber": "P-2", "Number": "P-1"});
        let found = aliases.lookup(value.as_object().unwrap());
        assert_eq!(found, Some(&json!("P-1")));
    }

    #[test]
    fn test_null_alias_falls_through() {
        let aliases = FieldAliases::new(["Number", "PartNumber"]);
        let value = json!({"Number": null, "PartNumber": "P-9"});
        assert_eq!(
            aliases.lookup(value.as_object().unwrap()),
            Some(&json!("P-9"))
        );
    }

    #[test]
    fn test_dotted_path_lookup() {
        let aliases = FieldAliases::new(["Name", "Identity.Name", "@odata.type"]);
        let nested = json!({"Identity": {"Name": "Bracket"}});
        assert_eq!(
            aliases.lookup(nested.as_object().unwrap()),
            Some(&json!("Bracket"))
        );

        let dotted_key = json!({"@odata.type": "#PTC.ProdMgmt.WTPart"});
        assert_eq!(
            aliases.lookup(dotted_key.as_object().unwrap()),
            Some(&json!("#PTC.ProdMgmt.WTPart"))
        );
    }

    #[test]
    fn test_find_column_case_insensitive() {
        let mut headers = IndexMap::new();
        headers.insert("parent number".to_string(), 0);
        headers.insert("child number".to_string(), 1);
        let aliases = FieldAliases::new(["Child Number", "Child"]);
        assert_eq!(aliases.find_column(&headers), Some(1));
    }

    #[test]
    fn test_scalar_string() {
        assert_eq!(scalar_string(&json!("  Bracket ")), Some("Bracket".into()));
        assert_eq!(scalar_string(&json!("   ")), None);
        assert_eq!(scalar_string(&json!(1200.0)), Some("1200".into()));
        assert_eq!(scalar_string(&json!({"Value": "RELEASED"})), Some("RELEASED".into()));
        assert_eq!(scalar_string(&json!({"Display": "x"})), None);
        assert_eq!(scalar_string(&json!([1, 2])), None);
    }

    #[test]
    fn test_normalize_part_number() {
        assert_eq!(normalize_part_number(" 0000123.0 "), "0000123");
        assert_eq!(normalize_part_number("12.5"), "12.5");
        assert_eq!(normalize_part_number("ABC.0"), "ABC.0");
        assert_eq!(normalize_part_number("101 HELI"), "101 HELI");
    }

    #[test]
    fn test_normalize_keeps_dashed_numbers() {
        assert_eq!(normalize_part_number("1-2.0"), "1-2.0");
        assert_eq!(normalize_part_number("12--.0"), "12--.0");
        assert_eq!(normalize_part_number("-.0"), "-.0");
        assert_eq!(normalize_part_number("-3.0"), "-3");
        assert_eq!(normalize_part_number("12.0"), "12");
    }
}
