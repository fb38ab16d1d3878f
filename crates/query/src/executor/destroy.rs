//! Destroy execution.

use crate::ast::{compile, DestroyQuery};
use crate::context::ExecutionContext;
use alloc::vec::Vec;
use cairn_core::{Error, Result};
use cairn_storage::RecordChange;

/// Removes every matching record and its checksum in one commit.
///
/// Requires a predicate; use an empty `$and` to match every record.
/// Nothing is committed when no record matches. Returns the number of
/// removed records.
pub fn execute_destroy(ctx: &ExecutionContext<'_>, query: &DestroyQuery) -> Result<usize> {
    let table = ctx.table(&query.table)?;
    let predicate = query
        .predicate
        .as_ref()
        .ok_or_else(|| Error::missing_predicate(table.name()))?;

    let filter = compile(Some(predicate));
    let doomed: Vec<RecordChange> = ctx.store().with_table(table.name(), |state| {
        state
            .iter()
            .filter(|record| filter(record))
            .filter_map(|record| record.id().cloned())
            .map(RecordChange::Delete)
            .collect()
    })?;

    if doomed.is_empty() {
        return Ok(0);
    }
    let count = doomed.len();
    ctx.store().modify_records(table.name(), doomed)?;
    Ok(count)
}
