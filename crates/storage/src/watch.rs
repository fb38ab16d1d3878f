//! Commit-notification registrations.

use crate::commit::Commit;
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

/// Identifier of one watch registration.
///
/// Ids are handed out in increasing order, so sorting by id gives
/// registration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WatchId(u64);

impl WatchId {
    /// Returns the raw id.
    #[inline]
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// Callback invoked with every applied commit.
pub type WatchFn = Rc<dyn Fn(&Commit)>;

/// Registered watches in registration order.
#[derive(Default)]
pub struct WatchRegistry {
    next_id: u64,
    watches: BTreeMap<WatchId, WatchFn>,
}

impl WatchRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback under a fresh id.
    pub fn add(&mut self, callback: WatchFn) -> WatchId {
        self.next_id += 1;
        let id = WatchId(self.next_id);
        self.watches.insert(id, callback);
        id
    }

    /// Removes a registration. Returns false if it was not registered.
    pub fn remove(&mut self, id: WatchId) -> bool {
        self.watches.remove(&id).is_some()
    }

    /// Returns true if the id is registered.
    #[inline]
    pub fn contains(&self, id: WatchId) -> bool {
        self.watches.contains_key(&id)
    }

    /// Number of registrations.
    #[inline]
    pub fn len(&self) -> usize {
        self.watches.len()
    }

    /// Returns true if nothing is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }

    /// Copies out the current registrations for dispatch.
    pub fn snapshot(&self) -> Vec<(WatchId, WatchFn)> {
        self.watches
            .iter()
            .map(|(id, callback)| (*id, callback.clone()))
            .collect()
    }
}

impl fmt::Debug for WatchRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRegistry")
            .field("next_id", &self.next_id)
            .field("watches", &self.watches.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_follow_registration_order() {
        let mut registry = WatchRegistry::new();
        let a = registry.add(Rc::new(|_: &Commit| {}));
        let b = registry.add(Rc::new(|_: &Commit| {}));
        assert!(a < b);

        let order: Vec<WatchId> = registry.snapshot().into_iter().map(|(id, _)| id).collect();
        assert_eq!(order, [a, b]);
    }

    #[test]
    fn test_remove_is_reported_once() {
        let mut registry = WatchRegistry::new();
        let id = registry.add(Rc::new(|_: &Commit| {}));
        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut registry = WatchRegistry::new();
        let a = registry.add(Rc::new(|_: &Commit| {}));
        registry.remove(a);
        let b = registry.add(Rc::new(|_: &Commit| {}));
        assert_ne!(a, b);
    }
}
