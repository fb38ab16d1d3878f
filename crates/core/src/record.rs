//! Record structure for Cairn.
//!
//! A record is an ordered field map owned by exactly one table. Records point
//! at each other only through id values, never by reference.

use crate::value::Value;
use alloc::collections::btree_map::{self, BTreeMap};
use alloc::string::String;

/// Name of the field every record is keyed by.
pub const ID_FIELD: &str = "id";

/// A record in a table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a record from a field map.
    pub fn from_fields(fields: BTreeMap<String, Value>) -> Self {
        Self { fields }
    }

    /// Builder-style field assignment.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Returns the record id, if it carries a usable one.
    #[inline]
    pub fn id(&self) -> Option<&Value> {
        self.fields.get(ID_FIELD).filter(|v| v.is_valid_id())
    }

    /// Gets a field value.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Sets a field value, returning the previous one.
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(name.into(), value)
    }

    /// Removes a field.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Returns true if the field is present (even if null).
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterates fields in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.fields.iter()
    }

    /// Returns the field map.
    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Consumes the record into its field map.
    pub fn into_fields(self) -> BTreeMap<String, Value> {
        self.fields
    }

    /// Returns the number of fields.
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no fields.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.fields)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builder() {
        let record = Record::new().with("id", "m1").with("name", "Master");
        assert_eq!(record.id(), Some(&Value::from("m1")));
        assert_eq!(record.get("name"), Some(&Value::from("Master")));
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_record_invalid_id() {
        let record = Record::new().with("id", 1.5f64);
        assert!(record.id().is_none());
        assert!(Record::new().id().is_none());
    }

    #[test]
    fn test_record_set_and_remove() {
        let mut record = Record::new().with("id", 1i64);
        assert_eq!(record.set("name", Value::from("a")), None);
        assert_eq!(record.set("name", Value::from("b")), Some(Value::from("a")));
        assert!(record.contains("name"));
        assert_eq!(record.remove("name"), Some(Value::from("b")));
        assert!(!record.contains("name"));
    }

    #[test]
    fn test_record_from_iter_is_ordered() {
        let record: Record = [("z", 1i64), ("a", 2i64)].into_iter().collect();
        let names: alloc::vec::Vec<&str> = record.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, ["a", "z"]);
    }
}
