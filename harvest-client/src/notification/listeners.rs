//! Listener registry keyed by handle

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use shared::models::Notification;

type Listener = Arc<dyn Fn(&Notification) + Send + Sync>;

/// Handle returned by registration, used to unregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerHandle(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: BTreeMap<u64, Listener>,
}

#[derive(Default)]
pub(crate) struct ListenerSet {
    registry: Mutex<Registry>,
}

impl ListenerSet {
    pub(crate) fn add(&self, listener: Listener) -> ListenerHandle {
        let mut registry = self.registry.lock();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.listeners.insert(id, listener);
        ListenerHandle(id)
    }

    pub(crate) fn remove(&self, handle: ListenerHandle) -> bool {
        self.registry.lock().listeners.remove(&handle.0).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.registry.lock().listeners.len()
    }

    /// Call every listener registered at the time of the call, once each
    ///
    /// Listeners run outside the lock and may (un)register others. One removed
    /// while the dispatch is running is skipped if it has not been called yet.
    pub(crate) fn dispatch(&self, notification: &Notification) -> usize {
        let snapshot: Vec<(u64, Listener)> = self
            .registry
            .lock()
            .listeners
            .iter()
            .map(|(id, l)| (*id, l.clone()))
            .collect();
        let mut delivered = 0;
        for (id, listener) in &snapshot {
            if !self.registry.lock().listeners.contains_key(id) {
                continue;
            }
            listener(notification);
            delivered += 1;
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::NotificationKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter(set: &ListenerSet) -> (ListenerHandle, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let handle = set.add(Arc::new(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        }));
        (handle, hits)
    }

    #[test]
    fn test_handles_are_distinct_and_removable() {
        let set = ListenerSet::default();
        let (a, hits_a) = counter(&set);
        let (b, hits_b) = counter(&set);
        assert_ne!(a, b);

        let n = Notification::new("u1", NotificationKind::NewOrder, "hi");
        assert_eq!(set.dispatch(&n), 2);

        assert!(set.remove(a));
        assert!(!set.remove(a));
        assert_eq!(set.dispatch(&n), 1);

        assert_eq!(hits_a.load(Ordering::SeqCst), 1);
        assert_eq!(hits_b.load(Ordering::SeqCst), 2);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_listener_removed_mid_dispatch_is_skipped() {
        let set = Arc::new(ListenerSet::default());
        let victim: Arc<Mutex<Option<ListenerHandle>>> = Arc::new(Mutex::new(None));

        let (set_ref, victim_ref) = (set.clone(), victim.clone());
        let first = set.add(Arc::new(move |_| {
            if let Some(handle) = victim_ref.lock().take() {
                set_ref.remove(handle);
            }
        }));
        let (second, hits) = counter(&set);
        *victim.lock() = Some(second);

        let n = Notification::new("u1", NotificationKind::NewOrder, "hi");
        assert_eq!(set.dispatch(&n), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(set.len(), 1);

        // Break the set -> listener -> set cycle
        assert!(set.remove(first));
    }
}
