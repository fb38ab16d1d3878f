//! Live queries over a many-to-many association.
//!
//! The handler re-runs the select it observes, the way an application
//! refreshes a view.

use cairn_core::schema::{Catalog, Relation, Schema, TableBuilder};
use cairn_core::{ColumnType, Record, Value};
use cairn_query::ast::{InsertQuery, SelectCriterion, SelectQuery};
use cairn_query::executor::{execute_insert, execute_select};
use cairn_query::ExecutionContext;
use cairn_reactive::{dependency_tables, observe, SubscriptionRegistry};
use cairn_storage::{Commit, Store};
use std::cell::Cell;
use std::cell::RefCell;
use std::rc::Rc;

fn catalog() -> Catalog {
    let masters = TableBuilder::new("Masters")
        .unwrap()
        .add_column("id", ColumnType::String)
        .unwrap()
        .add_relation(Relation::many_to_many(
            "viewports",
            "Viewports",
            "MasterViewportJunction",
            "masterId",
            "viewportId",
        ))
        .unwrap()
        .add_relation(Relation::has_many("notes", "Notes", "masterId"))
        .unwrap()
        .build()
        .unwrap();
    let viewports = TableBuilder::new("Viewports")
        .unwrap()
        .add_column("id", ColumnType::String)
        .unwrap()
        .build()
        .unwrap();
    let notes = TableBuilder::new("Notes")
        .unwrap()
        .add_column("id", ColumnType::String)
        .unwrap()
        .add_column("masterId", ColumnType::String)
        .unwrap()
        .build()
        .unwrap();
    let audit = TableBuilder::new("Audit")
        .unwrap()
        .add_column("id", ColumnType::Integer)
        .unwrap()
        .build()
        .unwrap();
    Catalog::new(
        Schema::new("studio")
            .table(masters)
            .table(viewports)
            .table(notes)
            .table(audit),
    )
    .unwrap()
}

fn query() -> SelectQuery {
    SelectQuery::new("Masters", SelectCriterion::new().include("viewports"))
}

fn viewport_ids(catalog: &Catalog, store: &Store) -> Vec<Vec<Value>> {
    let ctx = ExecutionContext::new(catalog, store);
    execute_select(&ctx, &query())
        .unwrap()
        .iter()
        .map(|row| {
            row.include("viewports")
                .map(|included| {
                    included
                        .records()
                        .iter()
                        .filter_map(|r| r.id().cloned())
                        .collect()
                })
                .unwrap_or_default()
        })
        .collect()
}

fn insert(catalog: &Catalog, store: &Store, table: &str, row: Record) {
    let ctx = ExecutionContext::new(catalog, store);
    execute_insert(&ctx, &InsertQuery::new(table, vec![row])).unwrap();
}

#[test]
fn test_dependency_set_includes_junction() {
    let catalog = catalog();
    let deps = dependency_tables(&catalog, &query()).unwrap();
    let names: Vec<&str> = deps.iter().map(String::as_str).collect();
    assert_eq!(names, ["MasterViewportJunction", "Masters", "Viewports"]);
}

#[test]
fn test_handler_sees_fresh_results() {
    let catalog = Rc::new(catalog());
    let store = Rc::new(Store::from_catalog(&catalog));
    let registry = Rc::new(RefCell::new(SubscriptionRegistry::new()));
    let snapshots: Rc<RefCell<Vec<Vec<Vec<Value>>>>> = Rc::new(RefCell::new(Vec::new()));

    let handler_catalog = catalog.clone();
    let handler_store = Rc::downgrade(&store);
    let handler_snapshots = snapshots.clone();
    let sub = observe(&catalog, &store, &registry, &query(), move || {
        if let Some(store) = handler_store.upgrade() {
            handler_snapshots
                .borrow_mut()
                .push(viewport_ids(&handler_catalog, &store));
        }
    })
    .unwrap();

    insert(&catalog, &store, "Masters", Record::new().with("id", "m1"));
    insert(&catalog, &store, "Viewports", Record::new().with("id", "v1"));
    insert(
        &catalog,
        &store,
        "MasterViewportJunction",
        Record::new()
            .with("id", "m1.v1")
            .with("masterId", "m1")
            .with("viewportId", "v1"),
    );
    insert(&catalog, &store, "Audit", Record::new().with("id", 1i64));

    let seen = snapshots.borrow();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0], vec![Vec::<Value>::new()]);
    assert_eq!(seen[1], vec![Vec::<Value>::new()]);
    assert_eq!(seen[2], vec![vec![Value::from("v1")]]);
    drop(seen);

    sub.unsubscribe().unwrap();
    insert(&catalog, &store, "Masters", Record::new().with("id", "m2"));
    assert_eq!(snapshots.borrow().len(), 3);
}

#[test]
fn test_subscriptions_survive_each_other() {
    let catalog = catalog();
    let store = Rc::new(Store::from_catalog(&catalog));
    let registry = Rc::new(RefCell::new(SubscriptionRegistry::new()));
    let hits = Rc::new(RefCell::new(Vec::new()));

    let subs: Vec<_> = (0..3)
        .map(|n| {
            let hits = hits.clone();
            observe(&catalog, &store, &registry, &query(), move || {
                hits.borrow_mut().push(n)
            })
            .unwrap()
        })
        .collect();
    assert_eq!(registry.borrow().query_count(), 1);
    assert_eq!(registry.borrow().handler_count(), 3);

    subs[1].unsubscribe().unwrap();
    subs[1].unsubscribe().unwrap();
    insert(&catalog, &store, "Viewports", Record::new().with("id", "v1"));
    assert_eq!(*hits.borrow(), vec![0, 2]);

    for sub in &subs {
        sub.unsubscribe().unwrap();
    }
    assert_eq!(registry.borrow().query_count(), 0);
    assert_eq!(store.watch_count(), 0);
}

#[test]
fn test_one_notification_per_commit() {
    let catalog = catalog();
    let store = Rc::new(Store::from_catalog(&catalog));
    let registry = Rc::new(RefCell::new(SubscriptionRegistry::new()));
    let hits = Rc::new(Cell::new(0));

    let handler_hits = hits.clone();
    let query = SelectQuery::new("Masters", SelectCriterion::new().include("notes"));
    let _sub = observe(&catalog, &store, &registry, &query, move || {
        handler_hits.set(handler_hits.get() + 1)
    })
    .unwrap();

    // Record each table's patches against an identical empty store, then
    // apply them together.
    let scratch = Store::from_catalog(&catalog);
    let masters = scratch
        .write_record("Masters", Record::new().with("id", "m1"))
        .unwrap();
    let notes = scratch
        .write_record(
            "Notes",
            Record::new().with("id", "n1").with("masterId", "m1"),
        )
        .unwrap();
    let combined: Commit = masters
        .patches()
        .iter()
        .chain(notes.patches())
        .cloned()
        .collect();

    let applied = store.commit(combined).unwrap();
    assert_eq!(applied.tables().into_iter().collect::<Vec<_>>(), ["Masters", "Notes"]);
    assert_eq!(hits.get(), 1);
    assert_eq!(store.table_checksum("Notes"), scratch.table_checksum("Notes"));
}
