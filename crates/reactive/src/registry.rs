//! Subscription bookkeeping.
//!
//! The registry maps each live query shape (by fingerprint) to its
//! dependency set and to the watch ids of the subscriptions observing it.
//! Subscriptions to the same shape share one dependency computation; each
//! keeps its own watch id, so removing one never affects another.

use crate::dependency::{dependency_tables, DependencySet};
use alloc::collections::BTreeSet;
use alloc::rc::Rc;
use cairn_core::schema::Catalog;
use cairn_core::{Error, Result};
use cairn_query::{QueryHash, SelectQuery};
use cairn_storage::{Store, WatchId};
use hashbrown::HashMap;

#[derive(Debug)]
struct QueryEntry {
    query: SelectQuery,
    dependencies: Rc<DependencySet>,
    watches: BTreeSet<WatchId>,
}

/// Live query shapes and the watches observing them.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    queries: HashMap<QueryHash, QueryEntry>,
    watches: HashMap<WatchId, QueryHash>,
}

impl SubscriptionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the fingerprint and dependency set of a query.
    ///
    /// A shape that is already live reuses its stored dependency set.
    pub fn dependencies(
        &self,
        catalog: &Catalog,
        query: &SelectQuery,
    ) -> Result<(QueryHash, Rc<DependencySet>)> {
        let hash = query.fingerprint();
        if let Some(entry) = self.queries.get(&hash) {
            return Ok((hash, entry.dependencies.clone()));
        }
        Ok((hash, Rc::new(dependency_tables(catalog, query)?)))
    }

    /// Records that `watch_id` observes the query shape `hash`.
    ///
    /// The watch must be live on `store`; otherwise this fails with
    /// [`Error::MissingSubscriptionState`] and nothing is recorded.
    pub fn add_handler(
        &mut self,
        store: &Store,
        hash: QueryHash,
        query: &SelectQuery,
        dependencies: Rc<DependencySet>,
        watch_id: WatchId,
    ) -> Result<()> {
        if !store.is_watching(watch_id) {
            return Err(Error::missing_subscription_state(watch_id.get()));
        }
        if self.watches.contains_key(&watch_id) {
            return Err(Error::invalid_operation(alloc::format!(
                "watch {} is already registered",
                watch_id
            )));
        }
        self.queries
            .entry(hash)
            .or_insert_with(|| QueryEntry {
                query: query.clone(),
                dependencies,
                watches: BTreeSet::new(),
            })
            .watches
            .insert(watch_id);
        self.watches.insert(watch_id, hash);
        Ok(())
    }

    /// Removes the registration of `watch_id` and returns its query shape.
    ///
    /// The shape is forgotten once its last watch is removed. Fails with
    /// [`Error::MissingSubscriptionState`] if the watch is not registered.
    pub fn remove_handler(&mut self, watch_id: WatchId) -> Result<QueryHash> {
        let hash = self
            .watches
            .remove(&watch_id)
            .ok_or_else(|| Error::missing_subscription_state(watch_id.get()))?;
        let entry = self
            .queries
            .get_mut(&hash)
            .ok_or_else(|| Error::missing_subscription_state(watch_id.get()))?;
        entry.watches.remove(&watch_id);
        if entry.watches.is_empty() {
            self.queries.remove(&hash);
        }
        Ok(hash)
    }

    /// Returns true if the watch is registered.
    #[inline]
    pub fn contains(&self, watch_id: WatchId) -> bool {
        self.watches.contains_key(&watch_id)
    }

    /// Number of live query shapes.
    #[inline]
    pub fn query_count(&self) -> usize {
        self.queries.len()
    }

    /// Number of registered watches across all shapes.
    #[inline]
    pub fn handler_count(&self) -> usize {
        self.watches.len()
    }

    /// Number of watches observing one shape.
    pub fn handlers_for(&self, hash: &QueryHash) -> usize {
        self.queries.get(hash).map_or(0, |entry| entry.watches.len())
    }

    /// Returns the live query registered under a fingerprint.
    pub fn query(&self, hash: &QueryHash) -> Option<&SelectQuery> {
        self.queries.get(hash).map(|entry| &entry.query)
    }
}
