//! Index declarations.
//!
//! Indexes are part of the schema surface only: they are validated and kept
//! on the table definition, but queries always scan.

use alloc::string::String;
use alloc::vec::Vec;

/// Direction of an index key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    /// Parses `ASC` / `DESC`.
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "ASC" => Some(Order::Asc),
            "DESC" => Some(Order::Desc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

/// One key of an index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedColumn {
    pub name: String,
    pub order: Order,
}

impl IndexedColumn {
    pub fn new(name: impl Into<String>, order: Order) -> Self {
        Self {
            name: name.into(),
            order,
        }
    }
}

/// A declared index: a name, its ordered keys and a uniqueness flag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexDef {
    name: String,
    columns: Vec<IndexedColumn>,
    unique: bool,
}

impl IndexDef {
    pub fn new(name: impl Into<String>, columns: Vec<IndexedColumn>, unique: bool) -> Self {
        Self {
            name: name.into(),
            columns,
            unique,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn columns(&self) -> &[IndexedColumn] {
        &self.columns
    }

    #[inline]
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Returns true if `column` is one of the keys.
    pub fn covers(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c.name == column)
    }
}
