//! Database - the store context every operation runs against.
//!
//! A `Database` owns the schema registry, the table state and the live query
//! registry. Nothing is global: two databases in one process share no state.
//! Cloning a `Database` yields another handle to the same store.

use crate::config::Config;
use cairn_core::schema::{Catalog, Schema};
use cairn_core::{Checksum, Record, Result, Value};
use cairn_query::ast::{DestroyQuery, InsertQuery, Query, SelectQuery, UpdateQuery};
use cairn_query::executor::{execute, execute_destroy, execute_insert, execute_select, execute_update};
use cairn_query::{ExecutionContext, QueryOutput, ResultRow};
use cairn_reactive::{observe, Subscription, SubscriptionRegistry};
use cairn_storage::Store;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// The main database interface.
///
/// Provides methods for:
/// - Running select, insert, update and destroy queries
/// - Building re-invocable query callables
/// - Observing live queries
#[derive(Clone)]
pub struct Database {
    catalog: Rc<Catalog>,
    store: Rc<Store>,
    subscriptions: Rc<RefCell<SubscriptionRegistry>>,
    config: Rc<Config>,
}

impl Database {
    /// Registers `schema` and creates an empty store for it, labelled with
    /// the schema name.
    pub fn new(schema: Schema) -> Result<Self> {
        let config = Config::new(schema.name.clone());
        Self::with_config(schema, config)
    }

    /// Like [`Database::new`] with explicit settings.
    pub fn with_config(schema: Schema, config: Config) -> Result<Self> {
        let catalog = Catalog::new(schema)?;
        let store = Store::from_catalog(&catalog);
        tracing::debug!(
            store = config.name.as_str(),
            tables = catalog.len(),
            strict_columns = config.strict_columns,
            "database opened"
        );
        Ok(Self {
            catalog: Rc::new(catalog),
            store: Rc::new(store),
            subscriptions: Rc::new(RefCell::new(SubscriptionRegistry::new())),
            config: Rc::new(config),
        })
    }

    /// Returns the store label.
    #[inline]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    #[inline]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[inline]
    pub fn store(&self) -> &Rc<Store> {
        &self.store
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn context(&self) -> ExecutionContext<'_> {
        ExecutionContext::new(&self.catalog, &self.store).with_options(self.config.validation())
    }

    /// Runs a select against the current state.
    pub fn select(&self, query: &SelectQuery) -> Result<Vec<ResultRow>> {
        execute_select(&self.context(), query)
    }

    /// Upserts rows by id, one commit per row. Returns the number written.
    pub fn insert(&self, query: &InsertQuery) -> Result<usize> {
        execute_insert(&self.context(), query)
    }

    /// Updates every matching record in one commit. Returns the number updated.
    pub fn update(&self, query: &UpdateQuery) -> Result<usize> {
        execute_update(&self.context(), query)
    }

    /// Removes every matching record in one commit. Returns the number removed.
    pub fn destroy(&self, query: &DestroyQuery) -> Result<usize> {
        execute_destroy(&self.context(), query)
    }

    /// Runs any query.
    pub fn execute(&self, query: &Query) -> Result<QueryOutput> {
        execute(&self.context(), query)
    }

    /// Builds a callable that runs `query` against the latest state on every
    /// invocation.
    pub fn get_select(&self, query: SelectQuery) -> impl Fn() -> Result<Vec<ResultRow>> {
        let db = self.clone();
        move || db.select(&query)
    }

    /// Builds a callable that re-applies `query` on every invocation.
    pub fn get_insert(&self, query: InsertQuery) -> impl Fn() -> Result<usize> {
        let db = self.clone();
        move || db.insert(&query)
    }

    pub fn get_update(&self, query: UpdateQuery) -> impl Fn() -> Result<usize> {
        let db = self.clone();
        move || db.update(&query)
    }

    pub fn get_destroy(&self, query: DestroyQuery) -> impl Fn() -> Result<usize> {
        let db = self.clone();
        move || db.destroy(&query)
    }

    /// Calls `handler` after every commit that touches a table `query`
    /// reads from.
    pub fn observe<F>(&self, query: &SelectQuery, handler: F) -> Result<Subscription>
    where
        F: Fn() + 'static,
    {
        observe(&self.catalog, &self.store, &self.subscriptions, query, handler)
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.borrow().handler_count()
    }

    /// Aggregate checksum of a table.
    pub fn table_checksum(&self, table: &str) -> Result<Checksum> {
        self.catalog.table(table)?;
        self.store.table_checksum(table)
    }

    /// Fetches one record by id.
    pub fn record(&self, table: &str, id: &Value) -> Result<Option<Rc<Record>>> {
        self.catalog.table(table)?;
        self.store.record(table, id)
    }

    /// Number of records in a table.
    pub fn len(&self, table: &str) -> Result<usize> {
        self.catalog.table(table)?;
        self.store.len(table)
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.config.name)
            .field("tables", &self.catalog.table_names().collect::<Vec<_>>())
            .field("subscriptions", &self.subscription_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_core::schema::TableBuilder;
    use cairn_core::{ColumnType, Error};
    use cairn_query::ast::{Predicate, SelectCriterion};
    use std::cell::Cell;

    fn db() -> Database {
        let notes = TableBuilder::new("Notes")
            .unwrap()
            .add_column("id", ColumnType::String)
            .unwrap()
            .add_column("body", ColumnType::String)
            .unwrap()
            .build()
            .unwrap();
        Database::new(Schema::new("notes").table(notes)).unwrap()
    }

    fn note(id: &str, body: &str) -> Record {
        Record::new().with("id", id).with("body", body)
    }

    #[test]
    fn test_built_select_sees_latest_state() {
        let db = db();
        let select = db.get_select(SelectQuery::all("Notes"));
        assert!(select().unwrap().is_empty());

        db.insert(&InsertQuery::new("Notes", vec![note("n1", "a")])).unwrap();
        assert_eq!(select().unwrap().len(), 1);
        db.insert(&InsertQuery::new("Notes", vec![note("n2", "b")])).unwrap();
        assert_eq!(select().unwrap().len(), 2);
    }

    #[test]
    fn test_built_mutations() {
        let db = db();
        let insert = db.get_insert(InsertQuery::new("Notes", vec![note("n1", "a")]));
        assert_eq!(insert(), Ok(1));
        assert_eq!(insert(), Ok(1));
        assert_eq!(db.len("Notes"), Ok(1));

        let update = db.get_update(
            UpdateQuery::new("Notes")
                .set("body", "z")
                .filter(Predicate::eq("id", "n1")),
        );
        assert_eq!(update(), Ok(1));
        assert_eq!(
            db.record("Notes", &Value::from("n1")).unwrap().and_then(|r| r.get("body").cloned()),
            Some(Value::from("z"))
        );

        let destroy = db.get_destroy(DestroyQuery::new("Notes").filter(Predicate::eq("id", "n1")));
        assert_eq!(destroy(), Ok(1));
        assert_eq!(destroy(), Ok(0));
    }

    #[test]
    fn test_config_applies_to_executors() {
        let notes = TableBuilder::new("Notes")
            .unwrap()
            .add_column("id", ColumnType::String)
            .unwrap()
            .build()
            .unwrap();
        let schema = Schema::new("notes").table(notes);
        let strict = Database::new(schema.clone()).unwrap();
        let lenient = Database::with_config(schema, Config::new("lenient").strict_columns(false)).unwrap();

        let query = InsertQuery::new("Notes", vec![note("n1", "extra")]);
        assert_eq!(strict.insert(&query), Err(Error::unknown_column("Notes", "body")));
        assert_eq!(lenient.insert(&query), Ok(1));
        assert_eq!(lenient.name(), "lenient");
    }

    #[test]
    fn test_clones_share_state() {
        let db = db();
        let other = db.clone();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let sub = other
            .observe(
                &SelectQuery::new("Notes", SelectCriterion::new().predicate(Predicate::eq("body", "a"))),
                move || counter.set(counter.get() + 1),
            )
            .unwrap();
        assert_eq!(db.subscription_count(), 1);

        db.insert(&InsertQuery::new("Notes", vec![note("n1", "b")])).unwrap();
        assert_eq!(hits.get(), 1);
        sub.unsubscribe().unwrap();
        assert_eq!(db.subscription_count(), 0);
    }

    #[test]
    fn test_unknown_table() {
        let db = db();
        assert_eq!(db.table_checksum("Nope"), Err(Error::unknown_table("Nope")));
        assert_eq!(
            db.select(&SelectQuery::all("Nope")).unwrap_err(),
            Error::unknown_table("Nope")
        );
    }
}
