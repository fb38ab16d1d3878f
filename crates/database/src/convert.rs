//! Conversion between JSON input and Cairn's internal types.
//!
//! Schemas, queries, predicates and records arrive as JSON documents in the
//! tuple-shaped form applications write by hand:
//!
//! - query: `[kind, table, payload]` where `kind` is `"SELECT"`, `"UPDATE"`,
//!   `"INSERT"`, `"DESTROY"` or the matching code `0..=3`
//! - predicate: `["$eq", column, value]`, `["$neq", column, value]`,
//!   `["$and", [..]]`, `["$or", [..]]`
//! - relation: `[kind, name, opts]` or `{kind, name, opts}` with `kind` one
//!   of `"HM"`, `"BT"`, `"H1"`, `"MTM"` or the codes `0..=3`
//!
//! Values are typed against the column they are written to when the column
//! is declared: `DATE_TIME` columns take integer milliseconds and `NUMBER`
//! columns always hold floating point numbers.

use cairn_core::schema::{Catalog, Order, Relation, RelationKind, Schema, Table, TableBuilder};
use cairn_core::{ColumnType, Error, Record, Result, Value};
use cairn_query::ast::{
    DestroyQuery, InsertQuery, Predicate, PredicateKind, Query, QueryKind, SelectCriterion,
    SelectQuery, UpdateQuery,
};
use cairn_query::ResultRow;
use serde::Deserialize;
use serde_json::{Map, Number, Value as Json};
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
struct SchemaDef {
    name: String,
    #[serde(default)]
    tables: Vec<TableDef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableDef {
    name: String,
    #[serde(default)]
    primary_key: Vec<String>,
    #[serde(default)]
    columns: Vec<ColumnDef>,
    #[serde(default)]
    indexes: Vec<IndexDef>,
    #[serde(default)]
    relations: Vec<RelationDef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ColumnDef {
    name: String,
    #[serde(rename = "type")]
    column_type: String,
    #[serde(default)]
    nullable: bool,
    #[serde(default)]
    foreign_key: Option<ForeignKeyDef>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ForeignKeyDef {
    Ref {
        #[serde(rename = "ref")]
        table: String,
    },
    Table(String),
}

impl ForeignKeyDef {
    fn table(&self) -> &str {
        match self {
            ForeignKeyDef::Ref { table } | ForeignKeyDef::Table(table) => table,
        }
    }
}

#[derive(Debug, Deserialize)]
struct IndexDef {
    name: String,
    columns: Vec<IndexColumnDef>,
    #[serde(default)]
    unique: bool,
}

/// `"col"` or `["col", "ASC"]`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IndexColumnDef {
    Name(String),
    Ordered(Vec<String>),
}

impl IndexColumnDef {
    fn key(&self) -> Result<(&str, Order)> {
        let (name, order) = match self {
            IndexColumnDef::Name(name) => (Some(name.as_str()), None),
            IndexColumnDef::Ordered(parts) => (
                parts.first().map(String::as_str),
                parts.get(1).map(String::as_str),
            ),
        };
        let name = name.ok_or_else(|| Error::invalid_schema("index column is empty"))?;
        let order = match order {
            None => Order::Asc,
            Some(keyword) => Order::parse(keyword).ok_or_else(|| {
                Error::invalid_schema(format!("Unknown index order {} on {}", keyword, name))
            })?,
        };
        Ok((name, order))
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RelationDef {
    Tuple(Json, String, RelationOpts),
    Object {
        #[serde(alias = "type")]
        kind: Json,
        name: String,
        #[serde(default)]
        opts: RelationOpts,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelationOpts {
    table_name: Option<String>,
    foreign_key: Option<String>,
    through: Option<String>,
    local_key: Option<String>,
    remote_key: Option<String>,
}

/// Parses a schema document.
pub fn schema_from_json(json: &str) -> Result<Schema> {
    let def: SchemaDef =
        serde_json::from_str(json).map_err(|e| Error::invalid_schema(e.to_string()))?;
    schema_from_def(def)
}

/// Parses an already decoded schema document.
pub fn schema_from_value(json: Json) -> Result<Schema> {
    let def: SchemaDef =
        serde_json::from_value(json).map_err(|e| Error::invalid_schema(e.to_string()))?;
    schema_from_def(def)
}

fn schema_from_def(def: SchemaDef) -> Result<Schema> {
    let mut schema = Schema::new(def.name);
    for table in def.tables {
        schema = schema.table(table_from_def(table)?);
    }
    Ok(schema)
}

fn table_from_def(def: TableDef) -> Result<Table> {
    let mut builder = TableBuilder::new(def.name.as_str())?;

    for column in &def.columns {
        let column_type = ColumnType::parse(&column.column_type).ok_or_else(|| {
            Error::invalid_schema(format!(
                "Unknown column type {} for {}.{}",
                column.column_type, def.name, column.name
            ))
        })?;
        builder = builder.add_column(column.name.as_str(), column_type)?;
    }

    let nullable: Vec<&str> = def
        .columns
        .iter()
        .filter(|c| c.nullable)
        .map(|c| c.name.as_str())
        .collect();
    builder = builder.add_nullable(&nullable);

    for column in &def.columns {
        if let Some(fk) = &column.foreign_key {
            builder = builder.add_foreign_key(&column.name, fk.table())?;
        }
    }

    if !def.primary_key.is_empty() {
        let keys: Vec<&str> = def.primary_key.iter().map(String::as_str).collect();
        builder = builder.add_primary_key(&keys)?;
    }

    for index in &def.indexes {
        let keys = index
            .columns
            .iter()
            .map(IndexColumnDef::key)
            .collect::<Result<Vec<_>>>()?;
        builder = builder.add_ordered_index(index.name.as_str(), &keys, index.unique)?;
    }

    for relation in def.relations {
        builder = builder.add_relation(relation_from_def(&def.name, relation)?)?;
    }

    builder.build()
}

fn relation_kind(kind: &Json) -> Option<RelationKind> {
    match kind {
        Json::String(keyword) => RelationKind::parse(keyword),
        Json::Number(code) => match code.as_u64()? {
            0 => Some(RelationKind::HasMany),
            1 => Some(RelationKind::BelongsTo),
            2 => Some(RelationKind::HasOne),
            3 => Some(RelationKind::ManyToMany),
            _ => None,
        },
        _ => None,
    }
}

fn relation_from_def(table: &str, def: RelationDef) -> Result<Relation> {
    let (kind, name, opts) = match def {
        RelationDef::Tuple(kind, name, opts) => (kind, name, opts),
        RelationDef::Object { kind, name, opts } => (kind, name, opts),
    };
    let kind = relation_kind(&kind).ok_or_else(|| {
        Error::invalid_schema(format!("Unknown relation kind {} on {}.{}", kind, table, name))
    })?;

    let option = |value: Option<String>, field: &str| {
        value.ok_or_else(|| {
            Error::invalid_schema(format!(
                "Relation {}.{} ({}) is missing {}",
                table,
                name,
                kind.as_str(),
                field
            ))
        })
    };

    let target = option(opts.table_name, "tableName")?;
    let relation = match kind {
        RelationKind::BelongsTo => {
            Relation::belongs_to(name.as_str(), target, option(opts.foreign_key, "foreignKey")?)
        }
        RelationKind::HasOne => {
            Relation::has_one(name.as_str(), target, option(opts.foreign_key, "foreignKey")?)
        }
        RelationKind::HasMany => {
            Relation::has_many(name.as_str(), target, option(opts.foreign_key, "foreignKey")?)
        }
        RelationKind::ManyToMany => Relation::many_to_many(
            name.as_str(),
            target,
            option(opts.through, "through")?,
            option(opts.local_key, "localKey")?,
            option(opts.remote_key, "remoteKey")?,
        ),
    };
    Ok(relation)
}

/// Parses a query tuple against the schema.
///
/// The table must exist; record and predicate values are typed by its
/// columns.
pub fn query_from_json(catalog: &Catalog, json: &Json) -> Result<Query> {
    let parts = json
        .as_array()
        .ok_or_else(|| Error::invalid_query("query must be a [kind, table, payload] tuple"))?;

    let kind = match parts.first() {
        Some(Json::String(tag)) => QueryKind::parse(tag)?,
        Some(Json::Number(code)) => QueryKind::from_code(
            code.as_u64()
                .ok_or_else(|| Error::invalid_query(format!("Unknown query kind: {}", code)))?,
        )?,
        _ => return Err(Error::invalid_query("query kind must be a string or code")),
    };
    let name = parts
        .get(1)
        .and_then(Json::as_str)
        .ok_or_else(|| Error::invalid_query("query table must be a string"))?;
    let table = catalog.table(name)?;
    let payload = parts.get(2).unwrap_or(&Json::Null);

    let query = match kind {
        QueryKind::Select => SelectQuery::new(name, criterion_from_json(table, payload)?).into(),
        QueryKind::Insert => {
            let rows = match payload {
                Json::Array(rows) => rows
                    .iter()
                    .map(|row| record_from_json(Some(table), row))
                    .collect::<Result<Vec<_>>>()?,
                Json::Object(_) => vec![record_from_json(Some(table), payload)?],
                _ => return Err(Error::invalid_query("insert rows must be an array")),
            };
            InsertQuery::new(name, rows).into()
        }
        QueryKind::Update => {
            let mut update = UpdateQuery::new(name);
            match payload.get("values") {
                Some(Json::Array(pairs)) => {
                    for pair in pairs {
                        let (column, value) = match pair.as_array().map(Vec::as_slice) {
                            Some([Json::String(column), value]) => (column, value),
                            _ => {
                                return Err(Error::invalid_query(
                                    "update values must be [column, value] pairs",
                                ))
                            }
                        };
                        update = update.set(column.as_str(), column_value(table, column, value)?);
                    }
                }
                Some(Json::Object(fields)) => {
                    for (column, value) in fields {
                        update = update.set(column.as_str(), column_value(table, column, value)?);
                    }
                }
                None | Some(Json::Null) => {}
                Some(_) => return Err(Error::invalid_query("update values must be a list")),
            }
            update.predicate = optional_predicate(table, payload)?;
            update.into()
        }
        QueryKind::Destroy => {
            let mut destroy = DestroyQuery::new(name);
            destroy.predicate = optional_predicate(table, payload)?;
            destroy.into()
        }
    };
    Ok(query)
}

fn optional_predicate(table: &Table, payload: &Json) -> Result<Option<Predicate>> {
    match payload.get("predicate") {
        None | Some(Json::Null) => Ok(None),
        Some(json) => predicate_from_json(Some(table), json).map(Some),
    }
}

fn criterion_from_json(table: &Table, payload: &Json) -> Result<SelectCriterion> {
    let mut criterion = SelectCriterion::new();
    if payload.is_null() {
        return Ok(criterion);
    }
    if !payload.is_object() {
        return Err(Error::invalid_query("select criterion must be an object"));
    }

    if let Some(columns) = payload.get("columns") {
        criterion = criterion.columns(string_list(columns, "columns")?);
    }
    if let Some(includes) = payload.get("includes") {
        for include in string_list(includes, "includes")? {
            criterion = criterion.include(include);
        }
    }
    criterion.predicate = optional_predicate(table, payload)?;

    match payload.get("order") {
        None | Some(Json::Null) => {}
        Some(order) => {
            let (column, direction) = match order.as_array().map(Vec::as_slice) {
                Some([Json::String(column)]) => (column, Order::Asc),
                Some([Json::String(column), Json::String(direction)]) => (
                    column,
                    Order::parse(direction).ok_or_else(|| {
                        Error::invalid_query(format!("Unknown order direction: {}", direction))
                    })?,
                ),
                _ => return Err(Error::invalid_query("order must be [column, ASC|DESC]")),
            };
            criterion = criterion.order(column.as_str(), direction);
        }
    }
    if let Some(limit) = count(payload, "limit")? {
        criterion = criterion.limit(limit);
    }
    if let Some(skip) = count(payload, "skip")? {
        criterion = criterion.skip(skip);
    }
    Ok(criterion)
}

fn string_list(json: &Json, field: &str) -> Result<Vec<String>> {
    json.as_array()
        .and_then(|items| {
            items
                .iter()
                .map(|item| item.as_str().map(String::from))
                .collect::<Option<Vec<_>>>()
        })
        .ok_or_else(|| Error::invalid_query(format!("{} must be a list of strings", field)))
}

fn count(payload: &Json, field: &str) -> Result<Option<usize>> {
    match payload.get(field) {
        None | Some(Json::Null) => Ok(None),
        Some(json) => json
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| Error::invalid_query(format!("{} must be a non-negative integer", field))),
    }
}

/// Parses a predicate tuple. With a table, compared values are typed by
/// the column they are compared against.
pub fn predicate_from_json(table: Option<&Table>, json: &Json) -> Result<Predicate> {
    let parts = json
        .as_array()
        .ok_or_else(|| Error::invalid_query("predicate must be a tuple"))?;
    let kind = match parts.first() {
        Some(Json::String(tag)) => PredicateKind::parse(tag)?,
        Some(Json::Number(code)) => match code.as_u64() {
            Some(0) => PredicateKind::And,
            Some(1) => PredicateKind::Or,
            Some(2) => PredicateKind::Eq,
            _ => return Err(Error::invalid_predicate_kind(code.to_string())),
        },
        Some(other) => return Err(Error::invalid_predicate_kind(other.to_string())),
        None => return Err(Error::invalid_query("predicate tuple is empty")),
    };

    match kind {
        PredicateKind::Eq | PredicateKind::Neq => {
            let column = parts
                .get(1)
                .and_then(Json::as_str)
                .ok_or_else(|| Error::invalid_query("predicate column must be a string"))?;
            let value = parts.get(2).unwrap_or(&Json::Null);
            let value = match table {
                Some(table) => column_value(table, column, value)?,
                None => value_from_json(value, None)?,
            };
            Ok(match kind {
                PredicateKind::Eq => Predicate::eq(column, value),
                _ => Predicate::neq(column, value),
            })
        }
        PredicateKind::And | PredicateKind::Or => {
            let children = parts
                .get(1)
                .and_then(Json::as_array)
                .ok_or_else(|| Error::invalid_query("compound predicate needs a list"))?
                .iter()
                .map(|child| predicate_from_json(table, child))
                .collect::<Result<Vec<_>>>()?;
            Ok(match kind {
                PredicateKind::And => Predicate::and(children),
                _ => Predicate::or(children),
            })
        }
    }
}

fn column_value(table: &Table, column: &str, json: &Json) -> Result<Value> {
    value_from_json(json, table.get_column(column).map(|c| c.column_type()))
}

/// Parses a record object. With a table, field values are typed by their
/// declared columns.
pub fn record_from_json(table: Option<&Table>, json: &Json) -> Result<Record> {
    let fields = json
        .as_object()
        .ok_or_else(|| Error::invalid_query("record must be an object"))?;
    let mut record = Record::new();
    for (name, value) in fields {
        let value = match table {
            Some(table) => column_value(table, name, value)?,
            None => value_from_json(value, None)?,
        };
        record.set(name.as_str(), value);
    }
    Ok(record)
}

/// Converts a JSON value, typed by `expected` when given.
///
/// Values that do not fit the expected type are converted as if untyped and
/// left for record validation to reject.
pub fn value_from_json(json: &Json, expected: Option<ColumnType>) -> Result<Value> {
    match (expected, json) {
        (Some(ColumnType::DateTime), Json::Number(n)) => {
            if let Some(ms) = n.as_i64() {
                return Ok(Value::DateTime(ms));
            }
            if let Some(ms) = n.as_f64().filter(|ms| ms.is_finite()) {
                return Ok(Value::DateTime(ms.trunc() as i64));
            }
        }
        (Some(ColumnType::Number), Json::Number(n)) => {
            if let Some(f) = n.as_f64() {
                return Ok(Value::Number(f));
            }
        }
        (Some(ColumnType::Integer), Json::Number(n)) => {
            if let Some(i) = n.as_i64() {
                return Ok(Value::Integer(i));
            }
            if let Some(f) = n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64) {
                return Ok(Value::Integer(f as i64));
            }
        }
        _ => {}
    }

    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Boolean(*b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => Value::List(
            items
                .iter()
                .map(|item| value_from_json(item, None))
                .collect::<Result<Vec<_>>>()?,
        ),
        Json::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(k, v)| Ok((k.clone(), value_from_json(v, None)?)))
                .collect::<Result<BTreeMap<_, _>>>()?,
        ),
    })
}

/// Converts a value to JSON. Date-times become integer milliseconds and
/// non-finite numbers become `null`.
pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Boolean(b) => Json::Bool(*b),
        Value::Integer(i) | Value::DateTime(i) => Json::Number(Number::from(*i)),
        Value::Number(f) => Number::from_f64(*f).map_or(Json::Null, Json::Number),
        Value::String(s) => Json::String(s.clone()),
        Value::List(items) => Json::Array(items.iter().map(value_to_json).collect()),
        Value::Object(fields) => Json::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect::<Map<_, _>>(),
        ),
    }
}

/// Converts a result row to one object with includes under their names.
pub fn row_to_json(row: &ResultRow) -> Json {
    value_to_json(&row.to_value())
}

/// Converts select output to a JSON array.
pub fn rows_to_json(rows: &[ResultRow]) -> Json {
    Json::Array(rows.iter().map(row_to_json).collect())
}
