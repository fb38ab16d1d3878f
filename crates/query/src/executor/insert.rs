//! Insert execution.

use super::validate::validate_record;
use crate::ast::InsertQuery;
use crate::context::ExecutionContext;
use cairn_core::Result;

/// Upserts every row by id, one commit per row.
///
/// Rows are validated one at a time just before they are written, so a
/// failing row leaves the rows before it committed. Returns the number of
/// rows written.
pub fn execute_insert(ctx: &ExecutionContext<'_>, query: &InsertQuery) -> Result<usize> {
    let table = ctx.table(&query.table)?;
    for record in &query.rows {
        validate_record(table, record, ctx.options())?;
        ctx.store().write_record(table.name(), record.clone())?;
    }
    Ok(query.rows.len())
}
