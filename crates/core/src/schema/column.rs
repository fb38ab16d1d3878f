//! Column definition for Cairn table schemas.

use crate::types::ColumnType;
use alloc::string::String;

/// Reference from a column to the table its values point at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForeignKeyRef {
    /// Referenced table name.
    pub table: String,
}

impl ForeignKeyRef {
    /// Creates a foreign key reference.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }
}

/// A column definition in a table schema.
#[derive(Clone, Debug)]
pub struct Column {
    /// Column name.
    name: String,
    /// Semantic type of the column.
    column_type: ColumnType,
    /// Whether this column allows null or missing values.
    nullable: bool,
    /// Optional foreign-key reference.
    foreign_key: Option<ForeignKeyRef>,
    /// Column position in the table (0-based).
    index: usize,
}

impl Column {
    /// Creates a new, non-nullable column definition.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: false,
            foreign_key: None,
            index: 0,
        }
    }

    /// Sets whether this column is nullable.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Sets the foreign-key reference.
    pub fn foreign_key(mut self, table: impl Into<String>) -> Self {
        self.foreign_key = Some(ForeignKeyRef::new(table));
        self
    }

    /// Sets the column position.
    pub(crate) fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Returns the column name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the semantic type.
    #[inline]
    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    /// Returns whether this column is nullable.
    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Returns the foreign-key reference, if any.
    #[inline]
    pub fn get_foreign_key(&self) -> Option<&ForeignKeyRef> {
        self.foreign_key.as_ref()
    }

    /// Returns the column position.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.column_type == other.column_type
    }
}
