//! Shaped query results.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use cairn_core::{Record, Value};

/// A related record set attached to a result row.
#[derive(Clone, Debug, PartialEq)]
pub enum Included {
    /// Belongs-to / has-one: the related record, if any.
    One(Option<Rc<Record>>),
    /// Has-many / many-to-many: every related record, possibly none.
    Many(Vec<Rc<Record>>),
}

impl Included {
    /// Returns the single related record of a singular include.
    pub fn one(&self) -> Option<&Rc<Record>> {
        match self {
            Included::One(record) => record.as_ref(),
            Included::Many(_) => None,
        }
    }

    /// Returns the related records; a singular include yields zero or one.
    pub fn records(&self) -> &[Rc<Record>] {
        match self {
            Included::One(Some(record)) => core::slice::from_ref(record),
            Included::One(None) => &[],
            Included::Many(records) => records,
        }
    }

    /// Flattens into a value: `Null` or an object for singular includes,
    /// a list of objects for plural ones.
    pub fn to_value(&self) -> Value {
        match self {
            Included::One(None) => Value::Null,
            Included::One(Some(record)) => Value::from(Record::clone(record)),
            Included::Many(records) => Value::List(
                records
                    .iter()
                    .map(|r| Value::from(Record::clone(r)))
                    .collect(),
            ),
        }
    }
}

/// One row of a select result: the base record plus its includes in the
/// order they were requested.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultRow {
    record: Rc<Record>,
    includes: Vec<(String, Included)>,
}

impl ResultRow {
    pub fn new(record: Rc<Record>, includes: Vec<(String, Included)>) -> Self {
        Self { record, includes }
    }

    /// Returns the base record.
    #[inline]
    pub fn record(&self) -> &Rc<Record> {
        &self.record
    }

    /// Returns the base record id.
    #[inline]
    pub fn id(&self) -> Option<&Value> {
        self.record.id()
    }

    /// Gets a field of the base record.
    #[inline]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.record.get(field)
    }

    /// Gets an include by name.
    pub fn include(&self, name: &str) -> Option<&Included> {
        self.includes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, included)| included)
    }

    /// Returns the includes in requested order.
    #[inline]
    pub fn includes(&self) -> &[(String, Included)] {
        &self.includes
    }

    /// Flattens into one object value with includes stored under their names.
    pub fn to_value(&self) -> Value {
        let mut fields = Record::clone(&self.record).into_fields();
        for (name, included) in &self.includes {
            fields.insert(name.clone(), included.to_value());
        }
        Value::Object(fields)
    }
}

/// Result of executing any query.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryOutput {
    /// Rows returned by a select.
    Rows(Vec<ResultRow>),
    /// Number of records written or removed.
    Affected(usize),
}

impl QueryOutput {
    /// Returns the rows of a select.
    pub fn rows(&self) -> Option<&[ResultRow]> {
        match self {
            QueryOutput::Rows(rows) => Some(rows),
            QueryOutput::Affected(_) => None,
        }
    }

    /// Returns the affected count of a mutation.
    pub fn affected(&self) -> Option<usize> {
        match self {
            QueryOutput::Rows(_) => None,
            QueryOutput::Affected(n) => Some(*n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_row_to_value() {
        let master = Rc::new(Record::new().with("id", "m1"));
        let row = ResultRow::new(
            Rc::new(Record::new().with("id", "v1")),
            vec![
                ("masters".into(), Included::Many(vec![master.clone()])),
                ("owner".into(), Included::One(None)),
            ],
        );

        let value = row.to_value();
        let fields = value.as_object().unwrap();
        assert_eq!(fields.get("id"), Some(&Value::from("v1")));
        assert_eq!(fields.get("owner"), Some(&Value::Null));
        assert_eq!(
            fields.get("masters"),
            Some(&Value::List(vec![Value::from(Record::clone(&master))]))
        );
    }

    #[test]
    fn test_include_lookup() {
        let master = Rc::new(Record::new().with("id", "m1"));
        let row = ResultRow::new(
            Rc::new(Record::new().with("id", "v1")),
            vec![("master".into(), Included::One(Some(master.clone())))],
        );
        assert_eq!(row.include("master").and_then(Included::one), Some(&master));
        assert_eq!(row.include("master").map(|i| i.records().len()), Some(1));
        assert!(row.include("masters").is_none());
    }
}
