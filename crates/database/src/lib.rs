//! Cairn Database - the public API of the Cairn in-memory relational store.
//!
//! This crate ties the schema registry, table state, query executors and
//! live queries together behind one store context.
//!
//! # Core Components
//!
//! - `Database`: store context; runs queries and observes live queries
//! - `Config`: store label and validation switches
//! - `convert`: JSON schema, query, predicate and record input
//! - `wasm` (feature `wasm`): JavaScript bindings
//!
//! # Example
//!
//! ```
//! use cairn_database::{convert, Database};
//! use serde_json::json;
//!
//! let schema = convert::schema_from_json(r#"{
//!     "name": "studio",
//!     "tables": [
//!         {"name": "Masters", "columns": [{"name": "id", "type": "STRING"}],
//!          "relations": [["MTM", "viewports", {"tableName": "Viewports",
//!             "through": "MasterViewportJunction", "localKey": "masterId", "remoteKey": "viewportId"}]]},
//!         {"name": "Viewports", "columns": [{"name": "id", "type": "STRING"}]}
//!     ]
//! }"#).unwrap();
//! let db = Database::new(schema).unwrap();
//!
//! let insert = convert::query_from_json(db.catalog(), &json!(["INSERT", "Masters", [{"id": "m1"}]])).unwrap();
//! db.execute(&insert).unwrap();
//!
//! let select = convert::query_from_json(
//!     db.catalog(),
//!     &json!(["SELECT", "Masters", {"columns": [], "includes": ["viewports"]}]),
//! ).unwrap();
//! let rows = db.execute(&select).unwrap();
//! assert_eq!(rows.rows().map(|r| r.len()), Some(1));
//! ```

pub mod config;
pub mod convert;
pub mod database;
#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::Config;
pub use convert::{
    predicate_from_json, query_from_json, record_from_json, row_to_json, rows_to_json,
    schema_from_json, schema_from_value, value_from_json, value_to_json,
};
pub use database::Database;
#[cfg(feature = "wasm")]
pub use wasm::{JsDatabase, JsSubscription};

pub use cairn_core::schema::{Catalog, Relation, RelationKind, Schema, TableBuilder};
pub use cairn_core::{Checksum, ColumnType, Error, Record, Result, Value};
pub use cairn_query::ast::{
    DestroyQuery, InsertQuery, Predicate, Query, SelectCriterion, SelectQuery, UpdateQuery,
};
pub use cairn_query::{Included, QueryOutput, ResultRow};
pub use cairn_reactive::{Subscription, SubscriptionState};
