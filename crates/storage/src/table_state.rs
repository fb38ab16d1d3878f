//! Per-table state.
//!
//! A table keeps its records keyed by id, a checksum per record, and one
//! aggregate checksum over all record checksums. State is only mutated by
//! applying patches, which the [`Store`](crate::Store) validates first.

use crate::commit::{Patch, PatchValue, Path};
use alloc::collections::btree_map::{self, BTreeMap};
use alloc::rc::Rc;
use alloc::string::ToString;
use cairn_core::{Checksum, Error, Record, Result, Value};

/// Records, record checksums and the aggregate checksum of one table.
#[derive(Clone, Debug)]
pub struct TableState {
    records: BTreeMap<Value, Rc<Record>>,
    checksums: BTreeMap<Value, Checksum>,
    checksum: Checksum,
}

impl TableState {
    /// Creates an empty table state.
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            checksums: BTreeMap::new(),
            checksum: Checksum::aggregate(core::iter::empty()),
        }
    }

    /// Returns the number of records.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the table holds no records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Gets a record by id.
    #[inline]
    pub fn get(&self, id: &Value) -> Option<&Rc<Record>> {
        self.records.get(id)
    }

    /// Returns true if a record with this id exists.
    #[inline]
    pub fn contains(&self, id: &Value) -> bool {
        self.records.contains_key(id)
    }

    /// Iterates records in id order.
    pub fn iter(&self) -> btree_map::Values<'_, Value, Rc<Record>> {
        self.records.values()
    }

    /// Returns the stored checksum of a record.
    #[inline]
    pub fn record_checksum(&self, id: &Value) -> Option<Checksum> {
        self.checksums.get(id).copied()
    }

    /// Returns the aggregate checksum.
    #[inline]
    pub fn checksum(&self) -> Checksum {
        self.checksum
    }

    /// Aggregate of the current per-record checksums.
    pub fn compute_checksum(&self) -> Checksum {
        Checksum::aggregate(self.checksums.values().copied())
    }

    /// Aggregate that would result from replacing the given record checksums.
    ///
    /// `None` entries drop the checksum of that id.
    pub fn checksum_with<'a, I>(&self, changes: I) -> Checksum
    where
        I: IntoIterator<Item = (&'a Value, Option<Checksum>)>,
    {
        let mut overlay: BTreeMap<&Value, Option<Checksum>> = BTreeMap::new();
        for (id, checksum) in changes {
            overlay.insert(id, checksum);
        }
        let kept = self
            .checksums
            .iter()
            .filter(|(id, _)| !overlay.contains_key(id))
            .map(|(_, checksum)| *checksum);
        let changed = overlay.values().filter_map(|checksum| *checksum);
        Checksum::aggregate(kept.chain(changed))
    }

    /// Returns true if every stored checksum matches the content it covers.
    pub fn is_consistent(&self) -> bool {
        self.records.len() == self.checksums.len()
            && self.records.iter().all(|(id, record)| {
                self.checksums.get(id) == Some(&Checksum::of(record.as_ref()))
            })
            && self.checksum == self.compute_checksum()
    }

    /// Checks the slots of the given ids plus the aggregate.
    pub(crate) fn verify<'a, I>(&self, ids: I) -> bool
    where
        I: IntoIterator<Item = &'a Value>,
    {
        self.records.len() == self.checksums.len()
            && ids.into_iter().all(|id| {
                match (self.records.get(id), self.checksums.get(id)) {
                    (Some(record), Some(checksum)) => *checksum == Checksum::of(record.as_ref()),
                    (None, None) => true,
                    _ => false,
                }
            })
            && self.checksum == self.compute_checksum()
    }

    /// Applies one patch addressed to this table.
    pub(crate) fn apply(&mut self, patch: &Patch) -> Result<()> {
        match (&patch.path, &patch.value) {
            (Path::Record { id, .. }, Some(PatchValue::Record(record))) => {
                if record.id() != Some(id) {
                    return Err(Error::invalid_patch(
                        patch.path.to_string(),
                        "record id does not match path",
                    ));
                }
                self.records.insert(id.clone(), record.clone());
            }
            (Path::Record { id, .. }, None) => {
                self.records.remove(id);
            }
            (Path::RecordChecksum { id, .. }, Some(PatchValue::Checksum(checksum))) => {
                self.checksums.insert(id.clone(), *checksum);
            }
            (Path::RecordChecksum { id, .. }, None) => {
                self.checksums.remove(id);
            }
            (Path::TableChecksum { .. }, Some(PatchValue::Checksum(checksum))) => {
                self.checksum = *checksum;
            }
            (Path::TableChecksum { .. }, None) => {
                return Err(Error::invalid_patch(
                    patch.path.to_string(),
                    "table checksum cannot be deleted",
                ));
            }
            (path, Some(_)) => {
                return Err(Error::invalid_patch(
                    path.to_string(),
                    "value kind does not match path",
                ));
            }
        }
        Ok(())
    }
}

impl Default for TableState {
    fn default() -> Self {
        Self::new()
    }
}
