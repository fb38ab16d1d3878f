//! JavaScript bindings.
//!
//! Schemas and queries cross the boundary as plain JS values in the JSON
//! shapes accepted by [`crate::convert`]; results come back as plain arrays
//! and objects.

use crate::convert::{query_from_json, rows_to_json, schema_from_value, value_to_json};
use crate::database::Database;
use cairn_core::Error;
use cairn_query::ast::Query;
use cairn_query::{QueryOutput, SelectQuery};
use cairn_reactive::Subscription;
use serde::Serialize;
use serde_json::Value as Json;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

fn js_error(err: Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn from_js(value: JsValue) -> Result<Json, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(JsValue::from)
}

fn to_js(json: &Json) -> Result<JsValue, JsValue> {
    json.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}

fn output_to_js(output: QueryOutput) -> Result<JsValue, JsValue> {
    match output {
        QueryOutput::Rows(rows) => to_js(&rows_to_json(&rows)),
        QueryOutput::Affected(n) => Ok(JsValue::from_f64(n as f64)),
    }
}

/// Database handle exposed to JavaScript.
#[wasm_bindgen(js_name = Database)]
pub struct JsDatabase {
    inner: Database,
}

impl JsDatabase {
    fn parse(&self, query: JsValue) -> Result<Query, JsValue> {
        query_from_json(self.inner.catalog(), &from_js(query)?).map_err(js_error)
    }

    fn parse_select(&self, query: JsValue) -> Result<SelectQuery, JsValue> {
        match self.parse(query)? {
            Query::Select(select) => Ok(select),
            other => Err(js_error(Error::invalid_query(format!(
                "expected a SELECT query, got {}",
                other.kind().as_str()
            )))),
        }
    }
}

#[wasm_bindgen(js_class = Database)]
impl JsDatabase {
    /// Creates a database from a schema document.
    #[wasm_bindgen(constructor)]
    pub fn new(schema: JsValue) -> Result<JsDatabase, JsValue> {
        let schema = schema_from_value(from_js(schema)?).map_err(js_error)?;
        let inner = Database::new(schema).map_err(js_error)?;
        Ok(Self { inner })
    }

    #[wasm_bindgen(getter)]
    pub fn name(&self) -> String {
        self.inner.name().to_string()
    }

    /// Runs a query tuple of any kind.
    pub fn execute(&self, query: JsValue) -> Result<JsValue, JsValue> {
        let query = self.parse(query)?;
        output_to_js(self.inner.execute(&query).map_err(js_error)?)
    }

    pub fn select(&self, query: JsValue) -> Result<JsValue, JsValue> {
        let query = self.parse_select(query)?;
        to_js(&rows_to_json(&self.inner.select(&query).map_err(js_error)?))
    }

    /// Builds a zero-argument function that re-runs the query on each call.
    #[wasm_bindgen(js_name = getQuery)]
    pub fn get_query(&self, query: JsValue) -> Result<js_sys::Function, JsValue> {
        let query = self.parse(query)?;
        let db = self.inner.clone();
        let run = Closure::wrap(Box::new(move || -> Result<JsValue, JsValue> {
            output_to_js(db.execute(&query).map_err(js_error)?)
        }) as Box<dyn Fn() -> Result<JsValue, JsValue>>);
        let js_fn: js_sys::Function = run.as_ref().unchecked_ref::<js_sys::Function>().clone();
        run.forget();
        Ok(js_fn)
    }

    /// Calls `handler` with no arguments after every commit that touches a
    /// table the select reads from.
    pub fn observe(
        &self,
        query: JsValue,
        handler: js_sys::Function,
    ) -> Result<JsSubscription, JsValue> {
        let query = self.parse_select(query)?;
        let inner = self
            .inner
            .observe(&query, move || {
                if let Err(err) = handler.call0(&JsValue::NULL) {
                    tracing::warn!(error = ?err, "live query handler threw");
                }
            })
            .map_err(js_error)?;
        Ok(JsSubscription { inner })
    }

    /// Aggregate checksum of a table as hex.
    #[wasm_bindgen(js_name = tableChecksum)]
    pub fn table_checksum(&self, table: &str) -> Result<String, JsValue> {
        self.inner
            .table_checksum(table)
            .map(|checksum| checksum.to_hex())
            .map_err(js_error)
    }

    /// Fetches one record by id, or `null`.
    pub fn record(&self, table: &str, id: JsValue) -> Result<JsValue, JsValue> {
        let id = crate::convert::value_from_json(&from_js(id)?, None).map_err(js_error)?;
        match self.inner.record(table, &id).map_err(js_error)? {
            Some(record) => to_js(&value_to_json(&cairn_core::Value::from((*record).clone()))),
            None => Ok(JsValue::NULL),
        }
    }
}

/// Live query handle exposed to JavaScript.
#[wasm_bindgen(js_name = Subscription)]
pub struct JsSubscription {
    inner: Subscription,
}

#[wasm_bindgen(js_class = Subscription)]
impl JsSubscription {
    /// Stops notifications. Safe to call more than once.
    pub fn unsubscribe(&self) -> Result<(), JsValue> {
        self.inner.unsubscribe().map_err(js_error)
    }

    #[wasm_bindgen(getter, js_name = isActive)]
    pub fn is_active(&self) -> bool {
        self.inner.is_active()
    }
}
