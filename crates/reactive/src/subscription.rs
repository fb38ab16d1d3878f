//! Live query subscriptions.
//!
//! `observe` attaches a handler to a select query. The handler runs after
//! every commit that touches a table in the query's dependency set and is
//! expected to re-run the query itself; it receives no payload.

use crate::dependency::is_dirty;
use crate::registry::SubscriptionRegistry;
use alloc::rc::{Rc, Weak};
use cairn_core::schema::Catalog;
use cairn_core::{Error, Result};
use cairn_query::{QueryHash, SelectQuery};
use cairn_storage::{Commit, Store, WatchId};
use core::cell::{Cell, RefCell};
use core::fmt;

/// Lifecycle of a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubscriptionState {
    Active,
    Unregistered,
}

/// Handle returned by [`observe`].
///
/// Dropping the handle does not stop notifications; call
/// [`Subscription::unsubscribe`].
pub struct Subscription {
    watch_id: WatchId,
    hash: QueryHash,
    store: Weak<Store>,
    registry: Weak<RefCell<SubscriptionRegistry>>,
    state: Cell<SubscriptionState>,
}

/// Subscribes `handler` to changes that affect `query`.
///
/// The query is checked against the schema first, so an unknown table or
/// relation fails here rather than on the first notification. Each call
/// yields its own subscription even for an identical query.
pub fn observe<F>(
    catalog: &Catalog,
    store: &Rc<Store>,
    registry: &Rc<RefCell<SubscriptionRegistry>>,
    query: &SelectQuery,
    handler: F,
) -> Result<Subscription>
where
    F: Fn() + 'static,
{
    let (hash, dependencies) = registry
        .try_borrow()
        .map_err(|_| Error::invalid_operation("subscription registry is busy"))?
        .dependencies(catalog, query)?;

    let watched = dependencies.clone();
    let watch_id = store.watch(move |commit: &Commit| {
        if is_dirty(&watched, commit) {
            tracing::trace!(query = %hash, changes = commit.len(), "live query dirty");
            handler();
        }
    });

    let registered = registry
        .try_borrow_mut()
        .map_err(|_| Error::invalid_operation("subscription registry is busy"))
        .and_then(|mut registry| {
            registry.add_handler(store, hash, query, dependencies, watch_id)
        });
    if let Err(err) = registered {
        store.unwatch(watch_id);
        return Err(err);
    }

    tracing::debug!(
        table = query.table.as_str(),
        query = %hash,
        watch = %watch_id,
        "live query observed"
    );

    Ok(Subscription {
        watch_id,
        hash,
        store: Rc::downgrade(store),
        registry: Rc::downgrade(registry),
        state: Cell::new(SubscriptionState::Active),
    })
}

impl Subscription {
    /// Stops notifications.
    ///
    /// Calling it again, or after the database is gone, is a no-op.
    /// Unsubscribing inside a notification takes effect for the rest of
    /// that dispatch.
    pub fn unsubscribe(&self) -> Result<()> {
        if self.state.get() == SubscriptionState::Unregistered {
            return Ok(());
        }

        if let Some(store) = self.store.upgrade() {
            store.unwatch(self.watch_id);
        }
        if let Some(registry) = self.registry.upgrade() {
            let mut registry = registry
                .try_borrow_mut()
                .map_err(|_| Error::invalid_operation("subscription registry is busy"))?;
            if registry.contains(self.watch_id) {
                registry.remove_handler(self.watch_id)?;
            }
        }

        self.state.set(SubscriptionState::Unregistered);
        tracing::debug!(query = %self.hash, watch = %self.watch_id, "live query unsubscribed");
        Ok(())
    }

    /// Returns true until [`Subscription::unsubscribe`] succeeds.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.state.get() == SubscriptionState::Active
    }

    #[inline]
    pub fn state(&self) -> SubscriptionState {
        self.state.get()
    }

    #[inline]
    pub fn watch_id(&self) -> WatchId {
        self.watch_id
    }

    /// Fingerprint of the observed query.
    #[inline]
    pub fn hash(&self) -> QueryHash {
        self.hash
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("watch_id", &self.watch_id)
            .field("hash", &self.hash)
            .field("state", &self.state.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use cairn_core::schema::{Relation, Schema, TableBuilder};
    use cairn_core::{ColumnType, Record};
    use cairn_query::ast::SelectCriterion;

    struct Fixture {
        catalog: Catalog,
        store: Rc<Store>,
        registry: Rc<RefCell<SubscriptionRegistry>>,
    }

    fn fixture() -> Fixture {
        let masters = TableBuilder::new("Masters")
            .unwrap()
            .add_column("id", ColumnType::String)
            .unwrap()
            .add_relation(Relation::has_many("notes", "Notes", "masterId"))
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
        let other = TableBuilder::new("Other")
            .unwrap()
            .add_column("id", ColumnType::String)
            .unwrap()
            .build()
            .unwrap();
        let catalog =
            Catalog::new(Schema::new("app").table(masters).table(notes).table(other)).unwrap();
        let store = Rc::new(Store::from_catalog(&catalog));
        Fixture {
            catalog,
            store,
            registry: Rc::new(RefCell::new(SubscriptionRegistry::new())),
        }
    }

    fn counter() -> (Rc<Cell<usize>>, impl Fn() + 'static) {
        let count = Rc::new(Cell::new(0));
        let handle = count.clone();
        (count, move || handle.set(handle.get() + 1))
    }

    fn masters_with_notes() -> SelectQuery {
        SelectQuery::new("Masters", SelectCriterion::default().include("notes"))
    }

    #[test]
    fn test_notifies_on_dependency_tables_only() {
        let fx = fixture();
        let (count, handler) = counter();
        let sub = observe(&fx.catalog, &fx.store, &fx.registry, &masters_with_notes(), handler)
            .unwrap();
        assert!(sub.is_active());

        fx.store.write_record("Other", Record::new().with("id", "o1")).unwrap();
        assert_eq!(count.get(), 0);
        fx.store.write_record("Masters", Record::new().with("id", "m1")).unwrap();
        assert_eq!(count.get(), 1);
        fx.store
            .write_record("Notes", Record::new().with("id", "n1").with("masterId", "m1"))
            .unwrap();
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let fx = fixture();
        let (count, handler) = counter();
        let sub = observe(&fx.catalog, &fx.store, &fx.registry, &masters_with_notes(), handler)
            .unwrap();

        assert_eq!(sub.unsubscribe(), Ok(()));
        assert_eq!(sub.unsubscribe(), Ok(()));
        assert_eq!(sub.state(), SubscriptionState::Unregistered);
        assert_eq!(fx.store.watch_count(), 0);
        assert_eq!(fx.registry.borrow().query_count(), 0);

        fx.store.write_record("Masters", Record::new().with("id", "m1")).unwrap();
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_identical_queries_are_independent() {
        let fx = fixture();
        let (first_count, first) = counter();
        let (second_count, second) = counter();
        let query = masters_with_notes();
        let a = observe(&fx.catalog, &fx.store, &fx.registry, &query, first).unwrap();
        let b = observe(&fx.catalog, &fx.store, &fx.registry, &query, second).unwrap();
        assert_eq!(a.hash(), b.hash());
        assert_ne!(a.watch_id(), b.watch_id());
        assert_eq!(fx.registry.borrow().handlers_for(&a.hash()), 2);

        a.unsubscribe().unwrap();
        fx.store.write_record("Masters", Record::new().with("id", "m1")).unwrap();
        assert_eq!(first_count.get(), 0);
        assert_eq!(second_count.get(), 1);
        assert!(b.is_active());
    }

    #[test]
    fn test_invalid_query_registers_nothing() {
        let fx = fixture();
        let (_, handler) = counter();
        let query = SelectQuery::new("Masters", SelectCriterion::default().include("missing"));
        let err = observe(&fx.catalog, &fx.store, &fx.registry, &query, handler).unwrap_err();
        assert_eq!(err, Error::unknown_relation("Masters", "missing"));
        assert_eq!(fx.store.watch_count(), 0);
        assert_eq!(fx.registry.borrow().handler_count(), 0);
    }

    #[test]
    fn test_unsubscribe_inside_handler() {
        let fx = fixture();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let calls = Rc::new(Cell::new(0));

        let inner_slot = slot.clone();
        let inner_calls = calls.clone();
        let sub = observe(
            &fx.catalog,
            &fx.store,
            &fx.registry,
            &SelectQuery::all("Masters"),
            move || {
                inner_calls.set(inner_calls.get() + 1);
                if let Some(sub) = inner_slot.borrow().as_ref() {
                    sub.unsubscribe().unwrap();
                }
            },
        )
        .unwrap();
        *slot.borrow_mut() = Some(sub);

        let ids: Vec<&str> = alloc::vec!["m1", "m2"];
        for id in ids {
            fx.store.write_record("Masters", Record::new().with("id", id)).unwrap();
        }
        assert_eq!(calls.get(), 1);
        assert!(!slot.borrow().as_ref().map_or(true, Subscription::is_active));
    }

    #[test]
    fn test_unsubscribe_after_store_dropped() {
        let fx = fixture();
        let (_, handler) = counter();
        let sub = observe(&fx.catalog, &fx.store, &fx.registry, &SelectQuery::all("Masters"), handler)
            .unwrap();
        drop(fx);
        assert_eq!(sub.unsubscribe(), Ok(()));
        assert!(!sub.is_active());
    }
}
