//! Cairn Reactive - live query subscriptions.
//!
//! A live query is a select query plus a handler. The handler is invoked
//! after every commit that touches one of the tables the query reads from
//! and carries no payload; callers re-run the query to see the new result.
//!
//! # Core Concepts
//!
//! - `DependencySet`: the tables a query result is computed from
//! - `SubscriptionRegistry`: live query shapes keyed by fingerprint
//! - `Subscription`: handle with an idempotent `unsubscribe`
//!
//! # Example
//!
//! ```
//! use cairn_core::schema::{Catalog, Schema, TableBuilder};
//! use cairn_core::{ColumnType, Record};
//! use cairn_query::SelectQuery;
//! use cairn_reactive::{observe, SubscriptionRegistry};
//! use cairn_storage::Store;
//! use std::cell::{Cell, RefCell};
//! use std::rc::Rc;
//!
//! let table = TableBuilder::new("Masters").unwrap()
//!     .add_column("id", ColumnType::String).unwrap()
//!     .build().unwrap();
//! let catalog = Catalog::new(Schema::new("app").table(table)).unwrap();
//! let store = Rc::new(Store::from_catalog(&catalog));
//! let registry = Rc::new(RefCell::new(SubscriptionRegistry::new()));
//!
//! let hits = Rc::new(Cell::new(0));
//! let counter = hits.clone();
//! let sub = observe(&catalog, &store, &registry, &SelectQuery::all("Masters"), move || {
//!     counter.set(counter.get() + 1);
//! }).unwrap();
//!
//! store.write_record("Masters", Record::new().with("id", "m1")).unwrap();
//! assert_eq!(hits.get(), 1);
//! sub.unsubscribe().unwrap();
//! ```

#![no_std]

extern crate alloc;

pub mod dependency;
pub mod registry;
pub mod subscription;

pub use dependency::{dependency_tables, dirty_tables, is_dirty, DependencySet};
pub use registry::SubscriptionRegistry;
pub use subscription::{observe, Subscription, SubscriptionState};
