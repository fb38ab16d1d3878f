//! Cairn Query - Query algebra and executors for the Cairn relational store.
//!
//! This crate provides query execution:
//!
//! - `ast`: Query forms (select/insert/update/destroy) and predicate trees
//! - `compile`: Predicate trees to record filters
//! - `executor`: Include resolution across the four relation kinds and the
//!   select/insert/update/destroy executors
//! - `context`: Execution context (catalog, store, validation switches)
//! - `result`: Shaped result rows
//!
//! # Example
//!
//! ```rust
//! use cairn_core::schema::{Catalog, Schema, TableBuilder};
//! use cairn_core::{ColumnType, Record, Value};
//! use cairn_query::ast::{InsertQuery, Predicate, SelectCriterion, SelectQuery};
//! use cairn_query::context::ExecutionContext;
//! use cairn_query::executor::{execute_insert, execute_select};
//! use cairn_storage::Store;
//!
//! let table = TableBuilder::new("Viewports")
//!     .unwrap()
//!     .add_column("id", ColumnType::String)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//! let catalog = Catalog::new(Schema::new("app").table(table)).unwrap();
//! let store = Store::from_catalog(&catalog);
//! let ctx = ExecutionContext::new(&catalog, &store);
//!
//! let insert = InsertQuery::new("Viewports", vec![Record::new().with("id", "v1")]);
//! execute_insert(&ctx, &insert).unwrap();
//!
//! let select = SelectQuery::new(
//!     "Viewports",
//!     SelectCriterion::new().predicate(Predicate::eq("id", "v1")),
//! );
//! let rows = execute_select(&ctx, &select).unwrap();
//! assert_eq!(rows[0].id(), Some(&Value::from("v1")));
//! ```

#![no_std]

extern crate alloc;

pub mod ast;
pub mod context;
pub mod executor;
pub mod result;

pub use ast::{compile, Predicate, Query, QueryHash, SelectQuery};
pub use context::{ExecutionContext, ValidationOptions};
pub use result::{Included, QueryOutput, ResultRow};
