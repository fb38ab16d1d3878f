//! Schema definitions for Cairn.
//!
//! Columns, tables, indexes, relation declarations and the [`Catalog`] that
//! registers them for a store.

mod catalog;
mod column;
mod index;
mod relation;
mod table;

pub use catalog::{Catalog, Schema};
pub use column::{Column, ForeignKeyRef};
pub use index::{IndexDef, IndexedColumn, Order};
pub use relation::{Cardinality, Relation, RelationKind};
pub use table::{Table, TableBuilder};
