//! The store: all table state plus commit notification.
//!
//! Every mutation goes through [`Store::commit`]. A commit is validated and
//! applied to staged copies of the tables it touches, checked against the
//! checksum invariant, and only then swapped in. Watches are notified after
//! the swap, with no borrow of the store held, so callbacks may read the
//! store, commit again, or remove watches.

use crate::commit::{Commit, Patch, Path};
use crate::table_state::TableState;
use crate::watch::{WatchId, WatchRegistry};
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use cairn_core::schema::Catalog;
use cairn_core::{Checksum, Error, Record, Result, Value};
use core::cell::RefCell;

/// One record-level change inside a batched modification.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordChange {
    /// Write the record under its own id, replacing any existing one.
    Put(Record),
    /// Remove the record with this id, if present.
    Delete(Value),
}

/// In-memory table state with atomic path-addressed commits.
pub struct Store {
    name: String,
    tables: RefCell<BTreeMap<String, TableState>>,
    watches: RefCell<WatchRegistry>,
}

impl Store {
    /// Creates a store with no tables.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: RefCell::new(BTreeMap::new()),
            watches: RefCell::new(WatchRegistry::new()),
        }
    }

    /// Creates a store with an empty table for every catalog entry.
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let tables = catalog
            .table_names()
            .map(|name| (name.to_string(), TableState::new()))
            .collect();
        Self {
            name: catalog.name().to_string(),
            tables: RefCell::new(tables),
            watches: RefCell::new(WatchRegistry::new()),
        }
    }

    /// Returns the store name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates an empty table.
    pub fn create_table(&self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        let mut tables = self.tables_mut()?;
        if tables.contains_key(&name) {
            return Err(Error::invalid_schema(alloc::format!(
                "Table already exists: {}",
                name
            )));
        }
        tables.insert(name, TableState::new());
        Ok(())
    }

    /// Checks if a table exists.
    pub fn has_table(&self, name: &str) -> bool {
        self.tables.borrow().contains_key(name)
    }

    /// Returns all table names.
    pub fn table_names(&self) -> Vec<String> {
        self.tables.borrow().keys().cloned().collect()
    }

    /// Runs `f` against the current state of a table.
    ///
    /// The store cannot commit while `f` runs.
    pub fn with_table<R>(&self, table: &str, f: impl FnOnce(&TableState) -> R) -> Result<R> {
        let tables = self.tables.borrow();
        let state = tables.get(table).ok_or_else(|| Error::unknown_table(table))?;
        Ok(f(state))
    }

    /// Returns every record of a table in id order.
    pub fn records(&self, table: &str) -> Result<Vec<Rc<Record>>> {
        self.with_table(table, |state| state.iter().cloned().collect())
    }

    /// Gets a record by id.
    pub fn record(&self, table: &str, id: &Value) -> Result<Option<Rc<Record>>> {
        self.with_table(table, |state| state.get(id).cloned())
    }

    /// Returns the stored checksum of a record.
    pub fn record_checksum(&self, table: &str, id: &Value) -> Result<Option<Checksum>> {
        self.with_table(table, |state| state.record_checksum(id))
    }

    /// Returns the aggregate checksum of a table.
    pub fn table_checksum(&self, table: &str) -> Result<Checksum> {
        self.with_table(table, TableState::checksum)
    }

    /// Returns the number of records in a table.
    pub fn len(&self, table: &str) -> Result<usize> {
        self.with_table(table, TableState::len)
    }

    /// Writes one record under its id as a single commit.
    pub fn write_record(&self, table: &str, record: Record) -> Result<Commit> {
        self.modify_records(table, alloc::vec![RecordChange::Put(record)])
    }

    /// Deletes one record as a single commit. Missing ids commit nothing.
    pub fn delete_record(&self, table: &str, id: &Value) -> Result<Commit> {
        self.modify_records(table, alloc::vec![RecordChange::Delete(id.clone())])
    }

    /// Applies several record changes to one table as a single commit.
    ///
    /// The commit carries the record patches, their checksum patches and one
    /// aggregate checksum patch. Deletes of absent ids are dropped; if nothing
    /// remains, nothing is committed and an empty commit is returned.
    pub fn modify_records(&self, table: &str, changes: Vec<RecordChange>) -> Result<Commit> {
        let commit = self.with_table(table, |state| build_commit(table, state, changes))??;
        self.commit(commit)
    }

    /// Validates and applies a commit atomically, then notifies watches.
    ///
    /// Either every patch is applied or none is. A commit that would leave a
    /// record checksum or table checksum out of step with the content it
    /// covers is rejected with [`Error::InvalidPatch`].
    pub fn commit(&self, commit: Commit) -> Result<Commit> {
        if commit.is_empty() {
            return Ok(commit);
        }

        {
            let mut tables = self.tables_mut()?;
            let mut staged: BTreeMap<&str, TableState> = BTreeMap::new();
            let mut touched: BTreeMap<&str, BTreeSet<&Value>> = BTreeMap::new();

            for patch in commit.patches() {
                let table = patch.path.table();
                if !staged.contains_key(table) {
                    let state = tables.get(table).ok_or_else(|| Error::unknown_table(table))?;
                    staged.insert(table, state.clone());
                }
                if let Some(state) = staged.get_mut(table) {
                    state.apply(patch)?;
                }
                if let Some(id) = patch.path.id() {
                    touched.entry(table).or_default().insert(id);
                }
            }

            for (table, state) in &staged {
                let ids = touched.get(table).into_iter().flatten().copied();
                if !state.verify(ids) {
                    let path = Path::TableChecksum {
                        table: table.to_string(),
                    };
                    return Err(Error::invalid_patch(
                        path.to_string(),
                        "checksums do not match table content",
                    ));
                }
            }

            for (table, state) in staged {
                if let Some(slot) = tables.get_mut(table) {
                    *slot = state;
                }
            }
        }

        tracing::debug!(
            store = %self.name,
            tables = ?commit.tables(),
            patches = commit.len(),
            "commit applied"
        );
        self.dispatch(&commit);
        Ok(commit)
    }

    /// Registers a callback invoked after every applied commit.
    pub fn watch(&self, callback: impl Fn(&Commit) + 'static) -> WatchId {
        self.watches.borrow_mut().add(Rc::new(callback))
    }

    /// Removes a watch. Returns false if it was not registered.
    pub fn unwatch(&self, id: WatchId) -> bool {
        self.watches.borrow_mut().remove(id)
    }

    /// Returns true if the watch is registered.
    pub fn is_watching(&self, id: WatchId) -> bool {
        self.watches.borrow().contains(id)
    }

    /// Number of registered watches.
    pub fn watch_count(&self) -> usize {
        self.watches.borrow().len()
    }

    fn dispatch(&self, commit: &Commit) {
        let snapshot = self.watches.borrow().snapshot();
        for (id, callback) in snapshot {
            let active = self.watches.borrow().contains(id);
            if !active {
                tracing::trace!(watch = %id, "watch removed during dispatch");
                continue;
            }
            callback(commit);
        }
    }

    fn tables_mut(&self) -> Result<core::cell::RefMut<'_, BTreeMap<String, TableState>>> {
        self.tables
            .try_borrow_mut()
            .map_err(|_| Error::invalid_operation("store is borrowed by a reader"))
    }
}

impl core::fmt::Debug for Store {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.name)
            .field("tables", &self.table_names())
            .field("watches", &self.watch_count())
            .finish()
    }
}

fn build_commit(table: &str, state: &TableState, changes: Vec<RecordChange>) -> Result<Commit> {
    let mut commit = Commit::new();
    let mut checksums: Vec<(Value, Option<Checksum>)> = Vec::with_capacity(changes.len());

    for change in changes {
        match change {
            RecordChange::Put(record) => {
                let id = record.id().cloned().ok_or_else(|| Error::invalid_record_id(table))?;
                let checksum = Checksum::of(&record);
                commit.push(Patch::put_record(table, id.clone(), Rc::new(record)));
                commit.push(Patch::put_record_checksum(table, id.clone(), checksum));
                checksums.push((id, Some(checksum)));
            }
            RecordChange::Delete(id) => {
                let pending = checksums.iter().any(|(pending, _)| *pending == id);
                if !state.contains(&id) && !pending {
                    continue;
                }
                commit.push(Patch::delete_record(table, id.clone()));
                commit.push(Patch::delete_record_checksum(table, id.clone()));
                checksums.push((id, None));
            }
        }
    }

    if commit.is_empty() {
        return Ok(commit);
    }
    let total = state.checksum_with(checksums.iter().map(|(id, checksum)| (id, *checksum)));
    commit.push(Patch::put_table_checksum(table, total));
    Ok(commit)
}
