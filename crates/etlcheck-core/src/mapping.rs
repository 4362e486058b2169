use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use schemars::r#gen::SchemaGenerator;
use schemars::schema::Schema;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Ordered source-column → target-column mapping.
///
/// Insertion order is preserved through (de)serialization and defines the
/// order in which derived rules are considered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    entries: Vec<(String, String)>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the target for `source`, keeping its original position.
    pub fn insert(&mut self, source: impl Into<String>, target: impl Into<String>) {
        let source = source.into();
        let target = target.into();
        match self.entries.iter_mut().find(|(key, _)| *key == source) {
            Some(entry) => entry.1 = target,
            None => self.entries.push((source, target)),
        }
    }

    pub fn get(&self, source: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == source)
            .map(|(_, target)| target.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(source, target)| (source.as_str(), target.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>, T: Into<String>> FromIterator<(S, T)> for ColumnMapping {
    fn from_iter<I: IntoIterator<Item = (S, T)>>(iter: I) -> Self {
        let mut mapping = ColumnMapping::new();
        for (source, target) in iter {
            mapping.insert(source, target);
        }
        mapping
    }
}

impl Serialize for ColumnMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (source, target) in &self.entries {
            map.serialize_entry(source, target)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ColumnMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(MappingVisitor)
    }
}

struct MappingVisitor;

impl<'de> Visitor<'de> for MappingVisitor {
    type Value = ColumnMapping;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an object of source column to target column")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut mapping = ColumnMapping::new();
        while let Some((source, target)) = access.next_entry::<String, String>()? {
            mapping.insert(source, target);
        }
        Ok(mapping)
    }
}

impl JsonSchema for ColumnMapping {
    fn schema_name() -> String {
        "ColumnMapping".to_string()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        <BTreeMap<String, String>>::json_schema(generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_document_order() {
        let mapping: ColumnMapping =
            serde_json::from_str(r#"{"Zeta": "z", "Alpha": "a", "Mid": "m"}"#).expect("parse");
        let sources = mapping.iter().map(|(source, _)| source).collect::<Vec<_>>();
        assert_eq!(sources, vec!["Zeta", "Alpha", "Mid"]);
        assert_eq!(
            serde_json::to_string(&mapping).expect("serialize"),
            r#"{"Zeta":"z","Alpha":"a","Mid":"m"}"#
        );
    }

    #[test]
    fn reinsert_keeps_position() {
        let mut mapping = ColumnMapping::from_iter([("a", "x"), ("b", "y")]);
        mapping.insert("a", "w");
        assert_eq!(mapping.iter().collect::<Vec<_>>(), vec![("a", "w"), ("b", "y")]);
    }
}
