//! Path-addressed commits.
//!
//! A commit is an ordered list of replace patches. Each patch addresses one
//! slot of the store by path and carries the new value, or `None` to delete
//! the slot. Paths always start with the table name, so the set of tables a
//! commit touched can be read off without looking at the values.

use alloc::collections::BTreeSet;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use cairn_core::{Checksum, Record, Value};
use core::fmt;

/// Path segment under which records are kept.
pub const RECORDS_SEGMENT: &str = "value";
/// Path segment under which per-record checksums are kept.
pub const CHECKSUMS_SEGMENT: &str = "checksums";
/// Path segment holding the aggregate table checksum.
pub const CHECKSUM_SEGMENT: &str = "checksum";

/// Address of one slot in the store.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Path {
    /// `<table>/value/<id>`
    Record { table: String, id: Value },
    /// `<table>/checksums/<id>`
    RecordChecksum { table: String, id: Value },
    /// `<table>/checksum`
    TableChecksum { table: String },
}

impl Path {
    /// Returns the table this path points into.
    #[inline]
    pub fn table(&self) -> &str {
        match self {
            Path::Record { table, .. }
            | Path::RecordChecksum { table, .. }
            | Path::TableChecksum { table } => table,
        }
    }

    /// Returns the record id for record-level paths.
    pub fn id(&self) -> Option<&Value> {
        match self {
            Path::Record { id, .. } | Path::RecordChecksum { id, .. } => Some(id),
            Path::TableChecksum { .. } => None,
        }
    }

    /// Returns the path as a list of string segments.
    pub fn segments(&self) -> Vec<String> {
        match self {
            Path::Record { table, id } => {
                vec![table.clone(), RECORDS_SEGMENT.into(), id.to_string()]
            }
            Path::RecordChecksum { table, id } => {
                vec![table.clone(), CHECKSUMS_SEGMENT.into(), id.to_string()]
            }
            Path::TableChecksum { table } => vec![table.clone(), CHECKSUM_SEGMENT.into()],
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Path::Record { table, id } => write!(f, "{}/{}/{}", table, RECORDS_SEGMENT, id),
            Path::RecordChecksum { table, id } => {
                write!(f, "{}/{}/{}", table, CHECKSUMS_SEGMENT, id)
            }
            Path::TableChecksum { table } => write!(f, "{}/{}", table, CHECKSUM_SEGMENT),
        }
    }
}

/// New content of a slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatchValue {
    Record(Rc<Record>),
    Checksum(Checksum),
}

/// A single replace operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Patch {
    /// Slot being replaced.
    pub path: Path,
    /// New content; `None` deletes the slot.
    pub value: Option<PatchValue>,
}

impl Patch {
    /// Replaces the record stored under `id`.
    pub fn put_record(table: impl Into<String>, id: Value, record: Rc<Record>) -> Self {
        Self {
            path: Path::Record {
                table: table.into(),
                id,
            },
            value: Some(PatchValue::Record(record)),
        }
    }

    /// Removes the record stored under `id`.
    pub fn delete_record(table: impl Into<String>, id: Value) -> Self {
        Self {
            path: Path::Record {
                table: table.into(),
                id,
            },
            value: None,
        }
    }

    /// Replaces the checksum of record `id`.
    pub fn put_record_checksum(table: impl Into<String>, id: Value, checksum: Checksum) -> Self {
        Self {
            path: Path::RecordChecksum {
                table: table.into(),
                id,
            },
            value: Some(PatchValue::Checksum(checksum)),
        }
    }

    /// Removes the checksum of record `id`.
    pub fn delete_record_checksum(table: impl Into<String>, id: Value) -> Self {
        Self {
            path: Path::RecordChecksum {
                table: table.into(),
                id,
            },
            value: None,
        }
    }

    /// Replaces the aggregate checksum of a table.
    pub fn put_table_checksum(table: impl Into<String>, checksum: Checksum) -> Self {
        Self {
            path: Path::TableChecksum {
                table: table.into(),
            },
            value: Some(PatchValue::Checksum(checksum)),
        }
    }

    /// Returns true if this patch deletes its slot.
    #[inline]
    pub fn is_delete(&self) -> bool {
        self.value.is_none()
    }
}

/// An ordered batch of patches applied atomically.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Commit {
    patches: Vec<Patch>,
}

impl Commit {
    /// Creates an empty commit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a patch.
    pub fn push(&mut self, patch: Patch) {
        self.patches.push(patch);
    }

    /// Returns the patches in application order.
    #[inline]
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    /// Iterates the changed paths in application order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.patches.iter().map(|p| &p.path)
    }

    /// Names of the tables this commit touches.
    pub fn tables(&self) -> BTreeSet<&str> {
        self.paths().map(Path::table).collect()
    }

    /// Returns the number of patches.
    #[inline]
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    /// Returns true if there is nothing to apply.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }
}

impl From<Vec<Patch>> for Commit {
    fn from(patches: Vec<Patch>) -> Self {
        Self { patches }
    }
}

impl FromIterator<Patch> for Commit {
    fn from_iter<I: IntoIterator<Item = Patch>>(iter: I) -> Self {
        Self {
            patches: iter.into_iter().collect(),
        }
    }
}
