//! AST module for queries and predicates.

mod predicate;
mod query;

pub use predicate::{compile, Predicate, PredicateKind, RecordFilter};
pub use query::{
    DestroyQuery, InsertQuery, Query, QueryHash, QueryKind, SelectCriterion, SelectQuery,
    UpdateQuery,
};
