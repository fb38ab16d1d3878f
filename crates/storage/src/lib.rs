//! Cairn Storage - Storage accessor for the Cairn relational store.
//!
//! This crate provides the storage layer:
//!
//! - `Store`: All table state, atomic commits and commit notification
//! - `TableState`: Records, per-record checksums and the aggregate checksum of one table
//! - `Commit` / `Patch` / `Path`: Path-addressed replace operations
//! - `WatchRegistry`: Commit callbacks keyed by `WatchId`
//!
//! # Example
//!
//! ```rust
//! use cairn_core::{Record, Value};
//! use cairn_storage::Store;
//!
//! let store = Store::new("app");
//! store.create_table("Viewports").unwrap();
//!
//! let commit = store
//!     .write_record("Viewports", Record::new().with("id", "v1"))
//!     .unwrap();
//! assert_eq!(commit.tables().into_iter().collect::<Vec<_>>(), ["Viewports"]);
//! assert!(store.record("Viewports", &Value::from("v1")).unwrap().is_some());
//! ```

#![no_std]

extern crate alloc;

pub mod commit;
pub mod store;
pub mod table_state;
pub mod watch;

pub use commit::{Commit, Patch, PatchValue, Path};
pub use store::{RecordChange, Store};
pub use table_state::TableState;
pub use watch::{WatchFn, WatchId, WatchRegistry};
