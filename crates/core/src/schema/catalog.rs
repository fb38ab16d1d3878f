//! Schema registry.
//!
//! The catalog owns every table definition of a store, resolves relation
//! targets by name and synthesises the junction tables that many-to-many
//! relations go through.

use super::column::Column;
use super::relation::Relation;
use super::table::{check_id_column, check_naming_rules, Table};
use crate::error::{Error, Result};
use crate::record::ID_FIELD;
use crate::types::ColumnType;
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

/// A named set of table definitions, as declared by the caller.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    /// Schema name.
    pub name: String,
    /// Declared tables.
    pub tables: Vec<Table>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
        }
    }

    /// Builder-style table addition.
    pub fn table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }
}

/// Immutable registry of table definitions.
#[derive(Clone, Debug)]
pub struct Catalog {
    name: String,
    tables: BTreeMap<String, Table>,
    junctions: BTreeSet<String>,
}

impl Catalog {
    /// Validates a schema and registers its tables.
    pub fn new(schema: Schema) -> Result<Self> {
        check_naming_rules(&schema.name)?;

        let mut tables = BTreeMap::new();
        for table in schema.tables {
            check_id_column(&table)?;
            let name = String::from(table.name());
            if tables.insert(name.clone(), table).is_some() {
                return Err(Error::invalid_schema(format!(
                    "Table already exists: {}",
                    name
                )));
            }
        }

        check_foreign_keys(&tables)?;
        let junctions = register_junctions(&mut tables)?;
        check_key_types(&tables)?;

        tracing::debug!(
            schema = %schema.name,
            tables = tables.len(),
            junctions = junctions.len(),
            "schema registered"
        );

        Ok(Self {
            name: schema.name,
            tables,
            junctions,
        })
    }

    /// Returns the schema name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a table definition.
    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::unknown_table(name))
    }

    /// Returns true if the table is registered.
    #[inline]
    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Looks up a relation declared on `table`.
    pub fn relation(&self, table: &str, name: &str) -> Result<&Relation> {
        self.table(table)?
            .get_relation(name)
            .ok_or_else(|| Error::unknown_relation(table, name))
    }

    /// Iterates table names in name order, junctions included.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Iterates table definitions in name order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// Returns true if the table mediates a many-to-many relation.
    pub fn is_junction(&self, name: &str) -> bool {
        self.junctions.contains(name)
    }

    /// Number of registered tables.
    #[inline]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if nothing is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

fn check_foreign_keys(tables: &BTreeMap<String, Table>) -> Result<()> {
    for table in tables.values() {
        for column in table.columns() {
            if let Some(fk) = column.get_foreign_key() {
                if !tables.contains_key(&fk.table) {
                    return Err(Error::unknown_table(fk.table.as_str()));
                }
            }
        }

        for relation in table.relations() {
            let target = tables
                .get(relation.target())
                .ok_or_else(|| Error::unknown_table(relation.target()))?;
            match relation {
                Relation::HasOne { foreign_key, .. } | Relation::HasMany { foreign_key, .. }
                    if !target.columns().is_empty() && target.get_column(foreign_key).is_none() =>
                {
                    return Err(Error::invalid_schema(format!(
                        "Relation {}.{} expects column {}.{}",
                        table.name(),
                        relation.name(),
                        target.name(),
                        foreign_key
                    )));
                }
                _ => {}
            }
        }
    }
    Ok(())
}

/// Every declared key column must share the type of the ids it refers to.
fn check_key_types(tables: &BTreeMap<String, Table>) -> Result<()> {
    for table in tables.values() {
        for column in table.columns() {
            if let Some(fk) = column.get_foreign_key() {
                check_key_type(tables, table, column.name(), &fk.table)?;
            }
        }

        for relation in table.relations() {
            match relation {
                Relation::BelongsTo {
                    table: target,
                    foreign_key,
                    ..
                } => check_key_type(tables, table, foreign_key, target)?,
                Relation::HasOne {
                    table: target,
                    foreign_key,
                    ..
                }
                | Relation::HasMany {
                    table: target,
                    foreign_key,
                    ..
                } => {
                    if let Some(owner) = tables.get(target) {
                        check_key_type(tables, owner, foreign_key, table.name())?;
                    }
                }
                Relation::ManyToMany {
                    table: target,
                    through,
                    local_key,
                    remote_key,
                    ..
                } => {
                    if let Some(junction) = tables.get(through) {
                        check_key_type(tables, junction, local_key, table.name())?;
                        check_key_type(tables, junction, remote_key, target)?;
                    }
                }
            }
        }
    }
    Ok(())
}

fn check_key_type(
    tables: &BTreeMap<String, Table>,
    owner: &Table,
    column: &str,
    referenced: &str,
) -> Result<()> {
    let key = match owner.get_column(column) {
        Some(key) => key.column_type(),
        None => return Ok(()),
    };
    match tables.get(referenced).and_then(Table::id_type) {
        Some(id) if id != key => Err(Error::invalid_schema(format!(
            "Column {}.{} is {} but {}.{} is {}",
            owner.name(),
            column,
            key,
            referenced,
            ID_FIELD,
            id
        ))),
        _ => Ok(()),
    }
}

/// Creates or completes the junction table of every many-to-many relation.
fn register_junctions(tables: &mut BTreeMap<String, Table>) -> Result<BTreeSet<String>> {
    let mut pending = Vec::new();
    for table in tables.values() {
        for relation in table.relations() {
            if let Relation::ManyToMany {
                table: target,
                through,
                local_key,
                remote_key,
                ..
            } = relation
            {
                let local_type = id_type_of(tables, table.name());
                let remote_type = id_type_of(tables, target);
                pending.push((
                    through.clone(),
                    Column::new(local_key.clone(), local_type).foreign_key(table.name()),
                    Column::new(remote_key.clone(), remote_type).foreign_key(target.clone()),
                ));
            }
        }
    }

    let mut junctions = BTreeSet::new();
    for (through, local, remote) in pending {
        check_naming_rules(&through)?;
        let junction = tables.entry(through.clone()).or_insert_with(|| {
            Table::new(through.clone(), alloc::vec![Column::new(ID_FIELD, ColumnType::String)])
        });
        junction.ensure_column(local);
        junction.ensure_column(remote);
        junctions.insert(through);
    }
    Ok(junctions)
}

fn id_type_of(tables: &BTreeMap<String, Table>, name: &str) -> ColumnType {
    tables
        .get(name)
        .and_then(Table::id_type)
        .unwrap_or(ColumnType::String)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TableBuilder;

    fn masters() -> Table {
        TableBuilder::new("Masters")
            .unwrap()
            .add_column("id", ColumnType::String)
            .unwrap()
            .add_primary_key(&["id"])
            .unwrap()
            .add_relation(Relation::many_to_many(
                "viewports",
                "Viewports",
                "MasterViewportJunction",
                "masterId",
                "viewportId",
            ))
            .unwrap()
            .build()
            .unwrap()
    }

    fn viewports() -> Table {
        TableBuilder::new("Viewports")
            .unwrap()
            .add_column("id", ColumnType::Integer)
            .unwrap()
            .add_relation(Relation::many_to_many(
                "masters",
                "Masters",
                "MasterViewportJunction",
                "viewportId",
                "masterId",
            ))
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_implicit_junction() {
        let catalog = Catalog::new(Schema::new("app").table(masters()).table(viewports())).unwrap();

        assert_eq!(catalog.len(), 3);
        assert!(catalog.is_junction("MasterViewportJunction"));
        assert!(!catalog.is_junction("Masters"));

        let junction = catalog.table("MasterViewportJunction").unwrap();
        assert_eq!(junction.columns().len(), 3);
        assert_eq!(junction.id_type(), Some(ColumnType::String));
        assert_eq!(
            junction.get_column("viewportId").map(|c| c.column_type()),
            Some(ColumnType::Integer)
        );
        assert_eq!(
            junction.get_column("masterId").map(|c| c.column_type()),
            Some(ColumnType::String)
        );
    }

    #[test]
    fn test_cyclic_relations_resolve_by_name() {
        let catalog = Catalog::new(Schema::new("app").table(masters()).table(viewports())).unwrap();
        assert_eq!(catalog.relation("Masters", "viewports").unwrap().target(), "Viewports");
        assert_eq!(catalog.relation("Viewports", "masters").unwrap().target(), "Masters");
    }

    #[test]
    fn test_unknown_lookups() {
        let catalog = Catalog::new(Schema::new("app").table(masters()).table(viewports())).unwrap();
        assert_eq!(catalog.table("Nope").unwrap_err(), Error::unknown_table("Nope"));
        assert_eq!(
            catalog.relation("Masters", "nope").unwrap_err(),
            Error::unknown_relation("Masters", "nope")
        );
    }

    #[test]
    fn test_missing_relation_target() {
        let result = Catalog::new(Schema::new("app").table(masters()));
        assert_eq!(result.unwrap_err(), Error::unknown_table("Viewports"));
    }

    #[test]
    fn test_duplicate_table() {
        let result = Catalog::new(
            Schema::new("app")
                .table(masters())
                .table(viewports())
                .table(viewports()),
        );
        assert!(matches!(result, Err(Error::InvalidSchema { .. })));
    }

    fn integer_masters() -> Table {
        TableBuilder::new("Masters")
            .unwrap()
            .add_column("id", ColumnType::Integer)
            .unwrap()
            .add_relation(Relation::has_many("notes", "Notes", "masterId"))
            .unwrap()
            .build()
            .unwrap()
    }

    fn notes(key: ColumnType) -> Table {
        TableBuilder::new("Notes")
            .unwrap()
            .add_column("id", ColumnType::Integer)
            .unwrap()
            .add_column("masterId", key)
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_key_type_mismatch() {
        let result = Catalog::new(
            Schema::new("app")
                .table(integer_masters())
                .table(notes(ColumnType::Number)),
        );
        assert!(matches!(result, Err(Error::InvalidSchema { .. })));

        let catalog = Catalog::new(
            Schema::new("app")
                .table(integer_masters())
                .table(notes(ColumnType::Integer)),
        );
        assert!(catalog.is_ok());
    }

    #[test]
    fn test_belongs_to_key_type_mismatch() {
        let notes = TableBuilder::new("Notes")
            .unwrap()
            .add_column("id", ColumnType::String)
            .unwrap()
            .add_column("masterId", ColumnType::String)
            .unwrap()
            .add_relation(Relation::belongs_to("master", "Masters", "masterId"))
            .unwrap()
            .build()
            .unwrap();
        let masters = TableBuilder::new("Masters")
            .unwrap()
            .add_column("id", ColumnType::Integer)
            .unwrap()
            .build()
            .unwrap();
        let result = Catalog::new(Schema::new("app").table(masters).table(notes));
        assert!(matches!(result, Err(Error::InvalidSchema { .. })));
    }

    #[test]
    fn test_explicit_junction_key_type_mismatch() {
        let junction = TableBuilder::new("MasterViewportJunction")
            .unwrap()
            .add_column("id", ColumnType::String)
            .unwrap()
            .add_column("masterId", ColumnType::String)
            .unwrap()
            .add_column("viewportId", ColumnType::String)
            .unwrap()
            .build()
            .unwrap();
        let result = Catalog::new(
            Schema::new("app")
                .table(masters())
                .table(viewports())
                .table(junction),
        );
        assert!(matches!(result, Err(Error::InvalidSchema { .. })));
    }

    #[test]
    fn test_number_id_rejected() {
        let points = Table::new("Points", alloc::vec![Column::new(ID_FIELD, ColumnType::Number)]);
        let result = Catalog::new(Schema::new("app").table(points));
        assert!(matches!(result, Err(Error::InvalidSchema { .. })));
    }

    #[test]
    fn test_schemaless_has_many_target() {
        let notes = TableBuilder::new("Notes").unwrap().build().unwrap();
        let catalog = Catalog::new(Schema::new("app").table(integer_masters()).table(notes)).unwrap();
        assert_eq!(catalog.relation("Masters", "notes").unwrap().target(), "Notes");
    }

    #[test]
    fn test_has_many_requires_target_column() {
        let masters = TableBuilder::new("Masters")
            .unwrap()
            .add_column("id", ColumnType::String)
            .unwrap()
            .add_relation(Relation::has_many("viewports", "Viewports", "masterId"))
            .unwrap()
            .build()
            .unwrap();
        let viewports = TableBuilder::new("Viewports")
            .unwrap()
            .add_column("id", ColumnType::String)
            .unwrap()
            .build()
            .unwrap();
        let result = Catalog::new(Schema::new("app").table(masters).table(viewports));
        assert!(matches!(result, Err(Error::InvalidSchema { .. })));
    }
}
