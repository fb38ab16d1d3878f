//! Dependency sets and dirty-table detection.
//!
//! A live query depends on its own table and on every table its includes
//! read: the target of each include, and for many-to-many includes the
//! junction table as well. A commit is relevant to the query when it touches
//! any of those tables.

use alloc::collections::BTreeSet;
use alloc::string::String;
use cairn_core::schema::Catalog;
use cairn_core::Result;
use cairn_query::SelectQuery;
use cairn_storage::Commit;

/// Names of the tables a query result is computed from.
pub type DependencySet = BTreeSet<String>;

/// Computes the dependency set of a select query.
///
/// Fails with `UnknownTable` or `UnknownRelation` when the query does not fit
/// the schema.
pub fn dependency_tables(catalog: &Catalog, query: &SelectQuery) -> Result<DependencySet> {
    let mut tables = DependencySet::new();
    tables.insert(catalog.table(&query.table)?.name().into());

    for include in &query.criterion.includes {
        let relation = catalog.relation(&query.table, include)?;
        tables.insert(relation.target().into());
        if let Some(junction) = relation.junction() {
            tables.insert(junction.into());
        }
    }
    Ok(tables)
}

/// Tables touched by a commit: the first segment of every changed path.
pub fn dirty_tables(commit: &Commit) -> BTreeSet<&str> {
    commit.tables()
}

/// Returns true if the commit touched any table in the dependency set.
pub fn is_dirty(dependencies: &DependencySet, commit: &Commit) -> bool {
    commit
        .paths()
        .any(|path| dependencies.contains(path.table()))
}
