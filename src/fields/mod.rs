// src/fields/mod.rs

mod audit;
mod gst;

use crate::document::DocumentType;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use tracing::warn;

/// Named values extracted (and possibly reviewed) for one document.
///
/// Entries keep insertion order, which is the order they are reviewed,
/// reported and stored in. A value of `None` means the parser found nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    entries: Vec<(String, Option<String>)>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing an existing value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: Option<String>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// The field's value, or `None` if absent or null.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Absent, null and empty all count as missing.
    pub fn is_missing(&self, name: &str) -> bool {
        self.get(name).is_none_or(str::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// How many fields hold a non-empty value, out of all fields.
    pub fn coverage(&self) -> (usize, usize) {
        let filled = self
            .entries
            .iter()
            .filter(|(_, v)| v.as_deref().is_some_and(|s| !s.is_empty()))
            .count();
        (filled, self.len())
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for FieldSet {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        let mut set = FieldSet::new();
        for (name, value) in iter {
            set.insert(name, value);
        }
        set
    }
}

impl Serialize for FieldSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FieldSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldSetVisitor;

        impl<'de> Visitor<'de> for FieldSetVisitor {
            type Value = FieldSet;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of field names to string or null")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FieldSet, A::Error> {
                let mut set = FieldSet::new();
                while let Some((name, value)) = access.next_entry::<String, Option<String>>()? {
                    set.insert(name, value);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(FieldSetVisitor)
    }
}

/// Extract the fields of `doc_type` from raw document text.
///
/// Never fails: unsupported types yield an empty set, unmatched GST fields
/// are `None`, unmatched audit fields are `""`.
pub fn parse_fields(text: &str, doc_type: DocumentType) -> FieldSet {
    match doc_type {
        DocumentType::GstInvoice => gst::extract(text),
        DocumentType::AuditReport => audit::extract(text),
        DocumentType::LegalContract | DocumentType::RegulatoryFiling => {
            warn!(doc_type = %doc_type, "Parsing for '{doc_type}' not yet implemented.");
            FieldSet::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_order_and_replaces() {
        let mut set = FieldSet::new();
        set.insert("b", Some("1".to_string()));
        set.insert("a", None);
        set.insert("b", Some("2".to_string()));

        let names: Vec<&str> = set.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(set.get("b"), Some("2"));
        assert_eq!(set.get("a"), None);
    }

    #[test]
    fn test_missing_covers_absent_null_and_empty() {
        let set: FieldSet = [
            ("null", None),
            ("empty", Some(String::new())),
            ("full", Some("x".to_string())),
        ]
        .into_iter()
        .collect();

        assert!(set.is_missing("null"));
        assert!(set.is_missing("empty"));
        assert!(set.is_missing("absent"));
        assert!(!set.is_missing("full"));
        assert_eq!(set.coverage(), (1, 3));
    }

    #[test]
    fn test_json_keeps_field_order() {
        let set: FieldSet = [
            ("total_amount", Some("1.00".to_string())),
            ("gstin", None),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"total_amount":"1.00","gstin":null}"#);

        let back: FieldSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn test_unsupported_types_parse_to_empty_set() {
        let text = "GSTIN: 27AAAAA0000A1Z5 Invoice No: INV-001";
        assert!(parse_fields(text, DocumentType::LegalContract).is_empty());
        assert!(parse_fields(text, DocumentType::RegulatoryFiling).is_empty());
    }

    #[test]
    fn test_dispatches_by_doc_type() {
        let gst = parse_fields("", DocumentType::GstInvoice);
        assert_eq!(gst.len(), 3);
        let audit = parse_fields("", DocumentType::AuditReport);
        assert_eq!(audit.len(), 9);
    }
}
