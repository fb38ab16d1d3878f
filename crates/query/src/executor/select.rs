//! Select execution.

use super::include::resolve_includes;
use crate::ast::{compile, SelectQuery};
use crate::context::ExecutionContext;
use crate::result::ResultRow;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use cairn_core::{Record, Result};

/// Runs a select against the current store state.
///
/// Filters the base table, resolves the requested includes for the matching
/// records and attaches them to each row in requested order. Rows come back
/// in id order. `columns`, `order`, `limit` and `skip` do not shape the
/// result.
pub fn execute_select(ctx: &ExecutionContext<'_>, query: &SelectQuery) -> Result<Vec<ResultRow>> {
    let table = ctx.table(&query.table)?;
    let criterion = &query.criterion;

    if criterion.order.is_some() || criterion.limit.is_some() || criterion.skip.is_some() {
        tracing::debug!(
            table = table.name(),
            "order, limit and skip are not applied to select results"
        );
    }

    let filter = compile(criterion.predicate.as_ref());
    let base: Vec<Rc<Record>> = ctx.store().with_table(table.name(), |state| {
        state.iter().filter(|record| filter(record)).cloned().collect()
    })?;

    let includes = resolve_includes(ctx, table, &base, &criterion.includes)?;

    let rows = base
        .into_iter()
        .map(|record| {
            let attached = includes
                .iter()
                .map(|include| (String::from(include.name()), include.attach(record.id())))
                .collect();
            ResultRow::new(record, attached)
        })
        .collect();
    Ok(rows)
}
