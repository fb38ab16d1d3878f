//! The query algebra.

use super::predicate::Predicate;
use alloc::string::String;
use alloc::vec::Vec;
use cairn_core::schema::Order;
use cairn_core::{Checksum, Digest, Digestible, Error, Record, Result, Value};
use core::fmt;

/// The four query forms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Select,
    Update,
    Insert,
    Destroy,
}

impl QueryKind {
    /// Returns the input tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Select => "SELECT",
            QueryKind::Update => "UPDATE",
            QueryKind::Insert => "INSERT",
            QueryKind::Destroy => "DESTROY",
        }
    }

    /// Parses an input tag.
    pub fn parse(tag: &str) -> Result<Self> {
        match tag {
            "SELECT" => Ok(QueryKind::Select),
            "UPDATE" => Ok(QueryKind::Update),
            "INSERT" => Ok(QueryKind::Insert),
            "DESTROY" => Ok(QueryKind::Destroy),
            other => Err(Error::invalid_query(alloc::format!(
                "Unknown query kind: {}",
                other
            ))),
        }
    }

    /// Maps the numeric form of the tag.
    pub fn from_code(code: u64) -> Result<Self> {
        match code {
            0 => Ok(QueryKind::Select),
            1 => Ok(QueryKind::Update),
            2 => Ok(QueryKind::Insert),
            3 => Ok(QueryKind::Destroy),
            other => Err(Error::invalid_query(alloc::format!(
                "Unknown query kind: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a select query.
///
/// `order`, `limit` and `skip` are accepted and carried but not applied;
/// `columns` does not project, full records are returned.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectCriterion {
    pub columns: Vec<String>,
    pub includes: Vec<String>,
    pub predicate: Option<Predicate>,
    pub order: Option<(String, Order)>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
}

impl SelectCriterion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn include(mut self, name: impl Into<String>) -> Self {
        self.includes.push(name.into());
        self
    }

    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn order(mut self, column: impl Into<String>, order: Order) -> Self {
        self.order = Some((column.into(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }
}

/// A select query.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectQuery {
    pub table: String,
    pub criterion: SelectCriterion,
}

impl SelectQuery {
    pub fn new(table: impl Into<String>, criterion: SelectCriterion) -> Self {
        Self {
            table: table.into(),
            criterion,
        }
    }

    /// Selects every record of a table.
    pub fn all(table: impl Into<String>) -> Self {
        Self::new(table, SelectCriterion::new())
    }

    /// Structural hash of the query.
    ///
    /// Two queries with the same table, columns, includes, predicate and
    /// paging fields share a fingerprint.
    pub fn fingerprint(&self) -> QueryHash {
        QueryHash(Checksum::of(self))
    }
}

impl Digestible for SelectQuery {
    fn digest(&self, digest: &mut Digest) {
        let c = &self.criterion;
        digest.write_str(QueryKind::Select.as_str());
        digest.write_str(&self.table);
        c.columns.digest(digest);
        c.includes.digest(digest);
        c.predicate.digest(digest);
        match &c.order {
            None => digest.write_tag(0),
            Some((column, order)) => {
                digest.write_tag(1);
                digest.write_str(column);
                digest.write_tag(matches!(order, Order::Desc) as u8);
            }
        }
        for bound in [c.limit, c.skip] {
            bound.map(|n| Value::Integer(n as i64)).digest(digest);
        }
    }
}

/// Structural hash identifying a select query shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryHash(Checksum);

impl QueryHash {
    /// Returns the underlying checksum.
    #[inline]
    pub fn checksum(&self) -> Checksum {
        self.0
    }
}

impl fmt::Display for QueryHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.0.to_hex();
        f.write_str(&hex[..12])
    }
}

/// An insert query. Rows are upserted by id.
#[derive(Clone, Debug, PartialEq)]
pub struct InsertQuery {
    pub table: String,
    pub rows: Vec<Record>,
}

impl InsertQuery {
    pub fn new(table: impl Into<String>, rows: Vec<Record>) -> Self {
        Self {
            table: table.into(),
            rows,
        }
    }
}

/// An update query: assigns `values` on every record matching `predicate`.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateQuery {
    pub table: String,
    pub values: Vec<(String, Value)>,
    pub predicate: Option<Predicate>,
}

impl UpdateQuery {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            values: Vec::new(),
            predicate: None,
        }
    }

    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.push((column.into(), value.into()));
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }
}

/// A destroy query: removes every record matching `predicate`.
#[derive(Clone, Debug, PartialEq)]
pub struct DestroyQuery {
    pub table: String,
    pub predicate: Option<Predicate>,
}

impl DestroyQuery {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            predicate: None,
        }
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }
}

/// Any query.
#[derive(Clone, Debug, PartialEq)]
pub enum Query {
    Select(SelectQuery),
    Insert(InsertQuery),
    Update(UpdateQuery),
    Destroy(DestroyQuery),
}

impl Query {
    /// Returns the query kind.
    pub fn kind(&self) -> QueryKind {
        match self {
            Query::Select(_) => QueryKind::Select,
            Query::Insert(_) => QueryKind::Insert,
            Query::Update(_) => QueryKind::Update,
            Query::Destroy(_) => QueryKind::Destroy,
        }
    }

    /// Returns the table the query addresses.
    pub fn table(&self) -> &str {
        match self {
            Query::Select(q) => &q.table,
            Query::Insert(q) => &q.table,
            Query::Update(q) => &q.table,
            Query::Destroy(q) => &q.table,
        }
    }
}

impl From<SelectQuery> for Query {
    fn from(query: SelectQuery) -> Self {
        Query::Select(query)
    }
}

impl From<InsertQuery> for Query {
    fn from(query: InsertQuery) -> Self {
        Query::Insert(query)
    }
}

impl From<UpdateQuery> for Query {
    fn from(query: UpdateQuery) -> Self {
        Query::Update(query)
    }
}

impl From<DestroyQuery> for Query {
    fn from(query: DestroyQuery) -> Self {
        Query::Destroy(query)
    }
}
