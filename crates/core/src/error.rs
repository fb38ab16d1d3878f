//! Error types for Cairn.

use crate::types::ColumnType;
use alloc::string::String;
use core::fmt;

/// Result type alias for Cairn operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for Cairn store operations.
///
/// Every failure is synchronous and surfaces to the caller of the offending
/// operation; nothing is retried internally.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// A query or relation references a table absent from the schema.
    UnknownTable {
        name: String,
    },
    /// An include name is not declared on the table's relation list.
    UnknownRelation {
        table: String,
        relation: String,
    },
    /// A predicate tag outside `$eq`, `$neq`, `$and`, `$or`.
    InvalidPredicateKind {
        kind: String,
    },
    /// Update or destroy was issued without a predicate.
    MissingPredicate {
        table: String,
    },
    /// Unsubscribing or adding a handler for a watch id with no registration.
    MissingSubscriptionState {
        watch_id: u64,
    },
    /// Invalid schema definition.
    InvalidSchema {
        message: String,
    },
    /// A record field is not a declared column of its table.
    UnknownColumn {
        table: String,
        column: String,
    },
    /// A value does not fit the column's semantic type.
    TypeMismatch {
        table: String,
        column: String,
        expected: ColumnType,
    },
    /// Null or missing value for a non-nullable column.
    NullConstraint {
        table: String,
        column: String,
    },
    /// The record has no usable `id` field.
    InvalidRecordId {
        table: String,
    },
    /// A commit patch is malformed.
    InvalidPatch {
        path: String,
        message: String,
    },
    /// Query input could not be understood.
    InvalidQuery {
        message: String,
    },
    /// Invalid operation.
    InvalidOperation {
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownTable { name } => write!(f, "Unknown table: {}", name),
            Error::UnknownRelation { table, relation } => {
                write!(f, "Relation {} not declared on table {}", relation, table)
            }
            Error::InvalidPredicateKind { kind } => write!(f, "Invalid predicate kind: {}", kind),
            Error::MissingPredicate { table } => {
                write!(f, "Predicate required for mutation of table {}", table)
            }
            Error::MissingSubscriptionState { watch_id } => {
                write!(f, "No subscription state for watch {}", watch_id)
            }
            Error::InvalidSchema { message } => write!(f, "Invalid schema: {}", message),
            Error::UnknownColumn { table, column } => {
                write!(f, "Column {} not declared on table {}", column, table)
            }
            Error::TypeMismatch {
                table,
                column,
                expected,
            } => write!(
                f,
                "Type mismatch on {}.{}: expected {}",
                table, column, expected
            ),
            Error::NullConstraint { table, column } => {
                write!(f, "Null constraint violation on {}.{}", table, column)
            }
            Error::InvalidRecordId { table } => {
                write!(f, "Record in table {} has no string or integer id", table)
            }
            Error::InvalidPatch { path, message } => {
                write!(f, "Invalid patch at {}: {}", path, message)
            }
            Error::InvalidQuery { message } => write!(f, "Invalid query: {}", message),
            Error::InvalidOperation { message } => write!(f, "Invalid operation: {}", message),
        }
    }
}

impl core::error::Error for Error {}

impl Error {
    /// Creates an unknown table error.
    pub fn unknown_table(name: impl Into<String>) -> Self {
        Error::UnknownTable { name: name.into() }
    }

    /// Creates an unknown relation error.
    pub fn unknown_relation(table: impl Into<String>, relation: impl Into<String>) -> Self {
        Error::UnknownRelation {
            table: table.into(),
            relation: relation.into(),
        }
    }

    /// Creates an invalid predicate kind error.
    pub fn invalid_predicate_kind(kind: impl Into<String>) -> Self {
        Error::InvalidPredicateKind { kind: kind.into() }
    }

    /// Creates a missing predicate error.
    pub fn missing_predicate(table: impl Into<String>) -> Self {
        Error::MissingPredicate {
            table: table.into(),
        }
    }

    /// Creates a missing subscription state error.
    pub fn missing_subscription_state(watch_id: u64) -> Self {
        Error::MissingSubscriptionState { watch_id }
    }

    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Error::InvalidSchema {
            message: message.into(),
        }
    }

    /// Creates an unknown column error.
    pub fn unknown_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Error::UnknownColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(
        table: impl Into<String>,
        column: impl Into<String>,
        expected: ColumnType,
    ) -> Self {
        Error::TypeMismatch {
            table: table.into(),
            column: column.into(),
            expected,
        }
    }

    /// Creates a null constraint error.
    pub fn null_constraint(table: impl Into<String>, column: impl Into<String>) -> Self {
        Error::NullConstraint {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Creates an invalid record id error.
    pub fn invalid_record_id(table: impl Into<String>) -> Self {
        Error::InvalidRecordId {
            table: table.into(),
        }
    }

    /// Creates an invalid patch error.
    pub fn invalid_patch(path: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidPatch {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid query error.
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Error::InvalidQuery {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Error::InvalidOperation {
            message: message.into(),
        }
    }
}
