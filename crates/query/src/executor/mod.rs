//! Query executor module.

mod destroy;
mod include;
mod insert;
mod select;
mod update;
mod validate;

pub use destroy::execute_destroy;
pub use include::{resolve_includes, IncludeResult};
pub use insert::execute_insert;
pub use select::execute_select;
pub use update::execute_update;
pub use validate::validate_record;

use crate::ast::Query;
use crate::context::ExecutionContext;
use crate::result::QueryOutput;
use cairn_core::Result;

/// Runs any query against the current store state.
pub fn execute(ctx: &ExecutionContext<'_>, query: &Query) -> Result<QueryOutput> {
    match query {
        Query::Select(q) => execute_select(ctx, q).map(QueryOutput::Rows),
        Query::Insert(q) => execute_insert(ctx, q).map(QueryOutput::Affected),
        Query::Update(q) => execute_update(ctx, q).map(QueryOutput::Affected),
        Query::Destroy(q) => execute_destroy(ctx, q).map(QueryOutput::Affected),
    }
}
