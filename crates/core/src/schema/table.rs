//! Table definition for Cairn schemas.

use super::column::Column;
use super::index::{IndexDef, IndexedColumn, Order};
use super::relation::Relation;
use crate::error::{Error, Result};
use crate::record::ID_FIELD;
use crate::types::ColumnType;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// A table definition in the schema.
#[derive(Clone, Debug)]
pub struct Table {
    /// Table name.
    name: String,
    /// Column definitions.
    columns: Vec<Column>,
    /// Primary key column names, in key order.
    primary_key: Vec<String>,
    /// Index definitions.
    indexes: Vec<IndexDef>,
    /// Relation declarations.
    relations: Vec<Relation>,
}

impl Table {
    /// Creates a table with the given name and columns and nothing else.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        let columns = columns
            .into_iter()
            .enumerate()
            .map(|(i, c)| c.with_index(i))
            .collect();

        Self {
            name: name.into(),
            columns,
            primary_key: Vec::new(),
            indexes: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Returns the table name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the columns.
    #[inline]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the primary key columns.
    #[inline]
    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    /// Returns the indexes.
    #[inline]
    pub fn indexes(&self) -> &[IndexDef] {
        &self.indexes
    }

    /// Returns the relation declarations.
    #[inline]
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// Gets a column by name.
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Gets a relation by its include name.
    pub fn get_relation(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.name() == name)
    }

    /// Type of the `id` column, if declared.
    pub fn id_type(&self) -> Option<ColumnType> {
        self.get_column(ID_FIELD).map(Column::column_type)
    }

    /// Adds a column unless one with the same name exists.
    pub(crate) fn ensure_column(&mut self, column: Column) {
        if self.get_column(column.name()).is_none() {
            let index = self.columns.len();
            self.columns.push(column.with_index(index));
        }
    }
}

/// Builder for table definitions.
pub struct TableBuilder {
    name: String,
    columns: Vec<Column>,
    primary_key: Vec<String>,
    indexes: Vec<IndexDef>,
    relations: Vec<Relation>,
}

impl TableBuilder {
    /// Creates a new table builder.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        check_naming_rules(&name)?;
        Ok(Self {
            name,
            columns: Vec::new(),
            primary_key: Vec::new(),
            indexes: Vec::new(),
            relations: Vec::new(),
        })
    }

    /// Adds a column to the table.
    pub fn add_column(mut self, name: impl Into<String>, column_type: ColumnType) -> Result<Self> {
        let name = name.into();
        check_naming_rules(&name)?;
        if self.has_column(&name) {
            return Err(Error::invalid_schema(format!(
                "Column already exists: {}.{}",
                self.name, name
            )));
        }
        self.columns.push(Column::new(name, column_type));
        Ok(self)
    }

    /// Marks columns as nullable. Unknown names are ignored.
    pub fn add_nullable(mut self, columns: &[&str]) -> Self {
        for name in columns {
            if let Some(col) = self.columns.iter_mut().find(|c| c.name() == *name) {
                *col = col.clone().nullable(true);
            }
        }
        self
    }

    /// Declares that `column` holds ids of records in `table`.
    pub fn add_foreign_key(mut self, column: &str, table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        match self.columns.iter_mut().find(|c| c.name() == column) {
            Some(col) => *col = col.clone().foreign_key(table),
            None => return Err(self.column_not_found(column)),
        }
        Ok(self)
    }

    /// Sets the primary key.
    pub fn add_primary_key(mut self, columns: &[&str]) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::invalid_schema(format!(
                "Primary key of {} has no columns",
                self.name
            )));
        }
        for name in columns {
            if !self.has_column(name) {
                return Err(self.column_not_found(name));
            }
        }
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        Ok(self)
    }

    /// Adds an index with ascending keys.
    pub fn add_index(self, name: impl Into<String>, columns: &[&str], unique: bool) -> Result<Self> {
        let keys: Vec<(&str, Order)> = columns.iter().map(|c| (*c, Order::Asc)).collect();
        self.add_ordered_index(name, &keys, unique)
    }

    /// Adds an index whose keys carry their own direction.
    pub fn add_ordered_index(
        mut self,
        name: impl Into<String>,
        keys: &[(&str, Order)],
        unique: bool,
    ) -> Result<Self> {
        let name = name.into();
        check_naming_rules(&name)?;
        if self.indexes.iter().any(|i| i.name() == name) {
            return Err(Error::invalid_schema(format!(
                "Index already exists: {}.{}",
                self.name, name
            )));
        }
        if keys.is_empty() {
            return Err(Error::invalid_schema(format!(
                "Index {}.{} has no columns",
                self.name, name
            )));
        }
        for (col, _) in keys {
            if !self.has_column(col) {
                return Err(self.column_not_found(col));
            }
        }

        let keys = keys
            .iter()
            .map(|(col, order)| IndexedColumn::new(*col, *order))
            .collect();
        self.indexes.push(IndexDef::new(name, keys, unique));
        Ok(self)
    }

    /// Adds a relation declaration.
    ///
    /// Only the local side is checked here: a belongs-to foreign key must be
    /// a declared column unless the table declares no columns at all. Target
    /// tables are resolved by the catalog.
    pub fn add_relation(mut self, relation: Relation) -> Result<Self> {
        check_naming_rules(relation.name())?;
        if self.relations.iter().any(|r| r.name() == relation.name()) {
            return Err(Error::invalid_schema(format!(
                "Relation already exists: {}.{}",
                self.name,
                relation.name()
            )));
        }
        if let Relation::BelongsTo { foreign_key, .. } = &relation {
            if !self.columns.is_empty() && !self.has_column(foreign_key) {
                return Err(self.column_not_found(foreign_key));
            }
        }
        self.relations.push(relation);
        Ok(self)
    }

    /// Builds the table definition.
    pub fn build(self) -> Result<Table> {
        let columns = self
            .columns
            .into_iter()
            .enumerate()
            .map(|(i, c)| c.with_index(i))
            .collect();

        let table = Table {
            name: self.name,
            columns,
            primary_key: self.primary_key,
            indexes: self.indexes,
            relations: self.relations,
        };
        check_id_column(&table)?;
        Ok(table)
    }

    fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name() == name)
    }

    fn column_not_found(&self, name: &str) -> Error {
        Error::invalid_schema(format!("Column not found: {}.{}", self.name, name))
    }
}

/// Rejects an `id` column whose type cannot hold record ids.
pub(crate) fn check_id_column(table: &Table) -> Result<()> {
    match table.id_type() {
        Some(ty) if !ty.is_id_type() => Err(Error::invalid_schema(format!(
            "Column {}.{} must be STRING or INTEGER, got {}",
            table.name(),
            ID_FIELD,
            ty
        ))),
        _ => Ok(()),
    }
}

/// Validates that a name is a plain identifier.
pub(crate) fn check_naming_rules(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return Err(Error::invalid_schema("Name cannot be empty")),
    };
    if !first.is_ascii_alphabetic() && first != '_' {
        return Err(Error::invalid_schema(format!(
            "Name must start with letter or underscore: {}",
            name
        )));
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(Error::invalid_schema(format!(
            "Name contains invalid characters: {}",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewports() -> Table {
        TableBuilder::new("Viewports")
            .unwrap()
            .add_column("id", ColumnType::String)
            .unwrap()
            .add_column("masterId", ColumnType::String)
            .unwrap()
            .add_nullable(&["masterId"])
            .add_foreign_key("masterId", "Masters")
            .unwrap()
            .add_primary_key(&["id"])
            .unwrap()
            .add_index("byMaster", &["masterId"], false)
            .unwrap()
            .add_relation(Relation::belongs_to("master", "Masters", "masterId"))
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_table_builder() {
        let table = viewports();
        assert_eq!(table.name(), "Viewports");
        assert_eq!(table.columns().len(), 2);
        assert_eq!(table.primary_key(), ["id"]);
        assert_eq!(table.indexes().len(), 1);
        assert_eq!(table.id_type(), Some(ColumnType::String));
        assert_eq!(table.get_column("masterId").map(|c| c.index()), Some(1));
        assert!(table.get_column("masterId").unwrap().is_nullable());
        assert!(table.get_relation("master").is_some());
        assert!(table.get_relation("masters").is_none());
    }

    #[test]
    fn test_invalid_column_name() {
        let result = TableBuilder::new("test")
            .unwrap()
            .add_column("123invalid", ColumnType::Integer);
        assert!(result.is_err());
        assert!(TableBuilder::new("").is_err());
        assert!(TableBuilder::new("a.b").is_err());
    }

    #[test]
    fn test_duplicate_column() {
        let result = TableBuilder::new("test")
            .unwrap()
            .add_column("id", ColumnType::String)
            .unwrap()
            .add_column("id", ColumnType::String);
        assert!(matches!(result, Err(Error::InvalidSchema { .. })));
    }

    #[test]
    fn test_primary_key_requires_column() {
        let result = TableBuilder::new("test")
            .unwrap()
            .add_column("id", ColumnType::String)
            .unwrap()
            .add_primary_key(&["key"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_belongs_to_requires_local_column() {
        let result = TableBuilder::new("Viewports")
            .unwrap()
            .add_column("id", ColumnType::String)
            .unwrap()
            .add_relation(Relation::belongs_to("master", "Masters", "masterId"));
        assert!(result.is_err());
    }

    #[test]
    fn test_id_column_type() {
        let result = TableBuilder::new("Points")
            .unwrap()
            .add_column("id", ColumnType::Number)
            .unwrap()
            .build();
        assert!(matches!(result, Err(Error::InvalidSchema { .. })));

        let table = TableBuilder::new("Points")
            .unwrap()
            .add_column("id", ColumnType::Integer)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(table.id_type(), Some(ColumnType::Integer));
    }

    #[test]
    fn test_schemaless_belongs_to() {
        let table = TableBuilder::new("Notes")
            .unwrap()
            .add_relation(Relation::belongs_to("master", "Masters", "masterId"))
            .unwrap()
            .build()
            .unwrap();
        assert!(table.columns().is_empty());
        assert!(table.get_relation("master").is_some());
    }

    #[test]
    fn test_duplicate_relation() {
        let result = TableBuilder::new("Masters")
            .unwrap()
            .add_column("id", ColumnType::String)
            .unwrap()
            .add_relation(Relation::has_many("viewports", "Viewports", "masterId"))
            .unwrap()
            .add_relation(Relation::has_one("viewports", "Viewports", "masterId"));
        assert!(result.is_err());
    }

    #[test]
    fn test_ordered_index() {
        let table = TableBuilder::new("Masters")
            .unwrap()
            .add_column("id", ColumnType::String)
            .unwrap()
            .add_column("createdAt", ColumnType::DateTime)
            .unwrap()
            .add_ordered_index("byCreated", &[("createdAt", Order::Desc)], false)
            .unwrap()
            .build()
            .unwrap();
        let index = &table.indexes()[0];
        assert!(index.covers("createdAt"));
        assert_eq!(index.columns()[0].order, Order::Desc);

        let empty = TableBuilder::new("Masters").unwrap().add_ordered_index("none", &[], false);
        assert!(matches!(empty, Err(Error::InvalidSchema { .. })));
        let missing = TableBuilder::new("Masters").unwrap().add_index("byX", &["x"], false);
        assert!(missing.is_err());
    }
}
