//! Cairn Core - Core types and schema definitions for the Cairn store.
//!
//! This crate provides the foundational types shared by every other Cairn crate:
//!
//! - `ColumnType`: Semantic column types (NUMBER, INTEGER, STRING, BOOLEAN, DATE_TIME, OBJECT)
//! - `Value`: Runtime values stored in record fields
//! - `Record`: A field map keyed by an `id` field
//! - `Checksum`: Content checksums for records, tables and query shapes
//! - `schema`: Schema definitions (Column, Table, Relation, Catalog)
//! - `Error`: Error types for store operations
//!
//! # Example
//!
//! ```rust
//! use cairn_core::{ColumnType, Record, Value, Checksum};
//! use cairn_core::schema::{Catalog, Relation, Schema, TableBuilder};
//!
//! let masters = TableBuilder::new("Masters")
//!     .unwrap()
//!     .add_column("id", ColumnType::String)
//!     .unwrap()
//!     .add_relation(Relation::many_to_many(
//!         "viewports",
//!         "Viewports",
//!         "MasterViewportJunction",
//!         "masterId",
//!         "viewportId",
//!     ))
//!     .unwrap()
//!     .build()
//!     .unwrap();
//! let viewports = TableBuilder::new("Viewports")
//!     .unwrap()
//!     .add_column("id", ColumnType::String)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let catalog = Catalog::new(Schema::new("app").table(masters).table(viewports)).unwrap();
//! assert!(catalog.is_junction("MasterViewportJunction"));
//!
//! let record = Record::new().with("id", "m1");
//! assert_eq!(record.id(), Some(&Value::from("m1")));
//! assert_eq!(Checksum::of(&record), Checksum::of(&record.clone()));
//! ```

#![no_std]

extern crate alloc;

mod digest;
mod error;
mod record;
pub mod schema;
mod types;
mod value;

pub use digest::{Checksum, Digest, Digestible};
pub use error::{Error, Result};
pub use record::{Record, ID_FIELD};
pub use types::ColumnType;
pub use value::Value;
