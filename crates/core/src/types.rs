//! Column type definitions for Cairn.
//!
//! This module defines the semantic types a column can declare.

use crate::value::Value;
use core::fmt;

/// Semantic column types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Any numeric value (integer or floating point)
    Number,
    /// 64-bit signed integer
    Integer,
    /// UTF-8 string
    String,
    /// Boolean type (true/false)
    Boolean,
    /// Date and time stored as Unix timestamp (milliseconds)
    DateTime,
    /// Nested structured data (object or list)
    Object,
}

impl ColumnType {
    /// Returns the schema keyword for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Number => "NUMBER",
            ColumnType::Integer => "INTEGER",
            ColumnType::String => "STRING",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::DateTime => "DATE_TIME",
            ColumnType::Object => "OBJECT",
        }
    }

    /// Parses a schema keyword.
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "NUMBER" => Some(ColumnType::Number),
            "INTEGER" => Some(ColumnType::Integer),
            "STRING" => Some(ColumnType::String),
            "BOOLEAN" => Some(ColumnType::Boolean),
            "DATE_TIME" => Some(ColumnType::DateTime),
            "OBJECT" => Some(ColumnType::Object),
            _ => None,
        }
    }

    /// Returns whether a non-null value fits this type.
    ///
    /// Null is handled by the column's nullable flag, not here.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (ColumnType::Number, Value::Number(_))
                | (ColumnType::Number, Value::Integer(_))
                | (ColumnType::Integer, Value::Integer(_))
                | (ColumnType::String, Value::String(_))
                | (ColumnType::Boolean, Value::Boolean(_))
                | (ColumnType::DateTime, Value::DateTime(_))
                | (ColumnType::Object, Value::Object(_))
                | (ColumnType::Object, Value::List(_))
        )
    }

    /// Returns whether values of this type can serve as record ids.
    pub fn is_id_type(&self) -> bool {
        matches!(self, ColumnType::String | ColumnType::Integer)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::collections::BTreeMap;
    use alloc::vec;

    #[test]
    fn test_column_type_keywords() {
        for ty in [
            ColumnType::Number,
            ColumnType::Integer,
            ColumnType::String,
            ColumnType::Boolean,
            ColumnType::DateTime,
            ColumnType::Object,
        ] {
            assert_eq!(ColumnType::parse(ty.as_str()), Some(ty));
        }
        assert_eq!(ColumnType::parse("FLOAT"), None);
    }

    #[test]
    fn test_accepts() {
        assert!(ColumnType::Number.accepts(&Value::Integer(1)));
        assert!(ColumnType::Number.accepts(&Value::Number(1.5)));
        assert!(!ColumnType::Integer.accepts(&Value::Number(1.0)));
        assert!(ColumnType::DateTime.accepts(&Value::DateTime(0)));
        assert!(!ColumnType::DateTime.accepts(&Value::Integer(0)));
        assert!(ColumnType::Object.accepts(&Value::List(vec![])));
        assert!(ColumnType::Object.accepts(&Value::Object(BTreeMap::new())));
        assert!(!ColumnType::String.accepts(&Value::Null));
    }

    #[test]
    fn test_id_types() {
        assert!(ColumnType::String.is_id_type());
        assert!(ColumnType::Integer.is_id_type());
        assert!(!ColumnType::Number.is_id_type());
    }
}
