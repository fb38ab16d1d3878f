//! Update execution.

use super::validate::validate_record;
use crate::ast::{compile, UpdateQuery};
use crate::context::ExecutionContext;
use alloc::format;
use alloc::vec::Vec;
use cairn_core::{Error, Record, Result, ID_FIELD};
use cairn_storage::RecordChange;

/// Assigns the query values on every matching record in one commit.
///
/// Requires a predicate. The id of a record cannot be changed. Every updated
/// record is validated before anything is written; nothing is committed when
/// no record matches. Returns the number of updated records.
pub fn execute_update(ctx: &ExecutionContext<'_>, query: &UpdateQuery) -> Result<usize> {
    let table = ctx.table(&query.table)?;
    let predicate = query
        .predicate
        .as_ref()
        .ok_or_else(|| Error::missing_predicate(table.name()))?;
    if query.values.iter().any(|(column, _)| column == ID_FIELD) {
        return Err(Error::invalid_operation(format!(
            "Cannot update {} of records in {}",
            ID_FIELD,
            table.name()
        )));
    }

    let filter = compile(Some(predicate));
    let updated: Vec<Record> = ctx.store().with_table(table.name(), |state| {
        state
            .iter()
            .filter(|record| filter(record))
            .map(|record| {
                let mut record = Record::clone(record);
                for (column, value) in &query.values {
                    record.set(column.clone(), value.clone());
                }
                record
            })
            .collect()
    })?;

    if updated.is_empty() {
        return Ok(0);
    }
    for record in &updated {
        validate_record(table, record, ctx.options())?;
    }

    let count = updated.len();
    let changes = updated.into_iter().map(RecordChange::Put).collect();
    ctx.store().modify_records(table.name(), changes)?;
    Ok(count)
}
