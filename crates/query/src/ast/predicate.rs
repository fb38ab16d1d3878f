//! Predicate trees and their compiled record filters.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use cairn_core::{Digest, Digestible, Error, Record, Result, Value};
use core::fmt;

/// Predicate node kinds, named by their tag in query input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PredicateKind {
    Eq,
    Neq,
    And,
    Or,
}

impl PredicateKind {
    /// Returns the input tag (`$eq`, `$neq`, `$and`, `$or`).
    pub fn as_str(&self) -> &'static str {
        match self {
            PredicateKind::Eq => "$eq",
            PredicateKind::Neq => "$neq",
            PredicateKind::And => "$and",
            PredicateKind::Or => "$or",
        }
    }

    /// Parses an input tag.
    pub fn parse(tag: &str) -> Result<Self> {
        match tag {
            "$eq" => Ok(PredicateKind::Eq),
            "$neq" => Ok(PredicateKind::Neq),
            "$and" => Ok(PredicateKind::And),
            "$or" => Ok(PredicateKind::Or),
            other => Err(Error::invalid_predicate_kind(other)),
        }
    }

    fn tag(&self) -> u8 {
        match self {
            PredicateKind::Eq => 0,
            PredicateKind::Neq => 1,
            PredicateKind::And => 2,
            PredicateKind::Or => 3,
        }
    }
}

impl fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declarative predicate over one record.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// `record[column]` strictly equals `value`.
    Eq { column: String, value: Value },
    /// `record[column]` does not equal `value`.
    Neq { column: String, value: Value },
    /// Every child matches. An empty list matches everything.
    And(Vec<Predicate>),
    /// Some child matches. An empty list matches nothing.
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn neq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Neq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn and(children: Vec<Predicate>) -> Self {
        Predicate::And(children)
    }

    pub fn or(children: Vec<Predicate>) -> Self {
        Predicate::Or(children)
    }

    /// Returns the node kind.
    pub fn kind(&self) -> PredicateKind {
        match self {
            Predicate::Eq { .. } => PredicateKind::Eq,
            Predicate::Neq { .. } => PredicateKind::Neq,
            Predicate::And(_) => PredicateKind::And,
            Predicate::Or(_) => PredicateKind::Or,
        }
    }

    /// Evaluates the predicate against a record.
    ///
    /// A missing field never equals anything, so `Eq` fails and `Neq` holds.
    pub fn eval(&self, record: &Record) -> bool {
        match self {
            Predicate::Eq { column, value } => record.get(column) == Some(value),
            Predicate::Neq { column, value } => record.get(column) != Some(value),
            Predicate::And(children) => children.iter().all(|p| p.eval(record)),
            Predicate::Or(children) => children.iter().any(|p| p.eval(record)),
        }
    }

    /// Returns the columns referenced anywhere in the tree.
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Predicate::Eq { column, .. } | Predicate::Neq { column, .. } => {
                if !out.contains(&column.as_str()) {
                    out.push(column);
                }
            }
            Predicate::And(children) | Predicate::Or(children) => {
                for child in children {
                    child.collect_columns(out);
                }
            }
        }
    }
}

impl Digestible for Predicate {
    fn digest(&self, digest: &mut Digest) {
        digest.write_tag(self.kind().tag());
        match self {
            Predicate::Eq { column, value } | Predicate::Neq { column, value } => {
                digest.write_str(column);
                value.digest(digest);
            }
            Predicate::And(children) | Predicate::Or(children) => children.digest(digest),
        }
    }
}

/// A compiled record filter.
pub type RecordFilter = Box<dyn Fn(&Record) -> bool>;

/// Compiles a predicate tree into a record filter.
///
/// An absent predicate matches every record.
pub fn compile(predicate: Option<&Predicate>) -> RecordFilter {
    match predicate {
        None => Box::new(|_: &Record| true),
        Some(predicate) => compile_node(predicate),
    }
}

fn compile_node(predicate: &Predicate) -> RecordFilter {
    match predicate {
        Predicate::Eq { column, value } => {
            let (column, value) = (column.clone(), value.clone());
            Box::new(move |record: &Record| record.get(&column) == Some(&value))
        }
        Predicate::Neq { column, value } => {
            let (column, value) = (column.clone(), value.clone());
            Box::new(move |record: &Record| record.get(&column) != Some(&value))
        }
        Predicate::And(children) => {
            let children: Vec<RecordFilter> = children.iter().map(compile_node).collect();
            Box::new(move |record: &Record| children.iter().all(|f| f(record)))
        }
        Predicate::Or(children) => {
            let children: Vec<RecordFilter> = children.iter().map(compile_node).collect();
            Box::new(move |record: &Record| children.iter().any(|f| f(record)))
        }
    }
}
