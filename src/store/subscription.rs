use indexmap::IndexMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// A zero-argument change callback.
///
/// Listeners carry no payload; they re-read the store when notified. Clones
/// share identity, so subscribing a clone of an already subscribed listener
/// does not add a second entry.
///
/// Capture a [`WeakStore`](crate::WeakStore) to read the store from inside
/// the callback. A captured `Store` clone forms a cycle through the store's
/// listener set and neither is ever released.
#[derive(Clone)]
pub struct Listener(Arc<dyn Fn() + Send + Sync>);

impl Listener {
    /// Wrap a callback into a listener with a fresh identity.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke the callback.
    pub fn call(&self) {
        (self.0)()
    }

    pub(crate) fn key(&self) -> ListenerKey {
        ListenerKey(Arc::as_ptr(&self.0) as *const () as usize)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener").field(&self.key().0).finish()
    }
}

/// Identity of a listener: the address of its shared allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ListenerKey(usize);

/// The subscription set, in insertion order and unique by identity.
pub(crate) struct Listeners {
    name: Option<String>,
    set: RwLock<IndexMap<ListenerKey, Listener>>,
}

impl Listeners {
    pub(crate) fn new(name: Option<String>) -> Self {
        Self {
            name,
            set: RwLock::new(IndexMap::new()),
        }
    }

    /// Add a listener. Returns false if it was already present.
    pub(crate) fn insert(&self, listener: &Listener) -> bool {
        let mut set = self.set.write();
        let key = listener.key();
        if set.contains_key(&key) {
            return false;
        }
        set.insert(key, listener.clone());
        true
    }

    /// Remove a listener. Returns false if it was not present.
    pub(crate) fn remove(&self, key: ListenerKey) -> bool {
        // shift_remove keeps the notification order of the remaining entries
        let removed = self.set.write().shift_remove(&key).is_some();
        if removed {
            tracing::debug!(store = self.name.as_deref(), "listener unsubscribed");
        }
        removed
    }

    pub(crate) fn contains(&self, key: ListenerKey) -> bool {
        self.set.read().contains_key(&key)
    }

    pub(crate) fn len(&self) -> usize {
        self.set.read().len()
    }

    /// Copy the current set so callbacks run without the lock held.
    pub(crate) fn snapshot(&self) -> Vec<(ListenerKey, Listener)> {
        self.set
            .read()
            .iter()
            .map(|(key, listener)| (*key, listener.clone()))
            .collect()
    }
}

/// Unsubscribe handle returned by [`Store::subscribe`](crate::Store::subscribe).
///
/// Dropping the handle leaves the listener subscribed; convert it with
/// [`into_guard`](Subscription::into_guard) to tie the subscription to a scope.
#[must_use = "the handle is the only way to unsubscribe this listener"]
pub struct Subscription {
    listener: Listener,
    listeners: Weak<Listeners>,
    done: AtomicBool,
}

impl Subscription {
    pub(crate) fn new(listener: Listener, listeners: &Arc<Listeners>) -> Self {
        Self {
            listener,
            listeners: Arc::downgrade(listeners),
            done: AtomicBool::new(false),
        }
    }

    /// Remove the listener from the store.
    ///
    /// Only the first call has an effect; later calls, or calls after the
    /// store is gone, do nothing.
    pub fn unsubscribe(&self) {
        if self.done.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.remove(self.listener.key());
        }
    }

    /// The subscribed listener.
    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    /// Unsubscribe automatically when the returned guard is dropped.
    pub fn into_guard(self) -> SubscriptionGuard {
        SubscriptionGuard(self)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("listener", &self.listener)
            .field("done", &self.done.load(Ordering::SeqCst))
            .finish()
    }
}

/// RAII guard for a subscription.
#[derive(Debug)]
pub struct SubscriptionGuard(Subscription);

impl SubscriptionGuard {
    /// Unsubscribe now instead of on drop.
    pub fn unsubscribe(&self) {
        self.0.unsubscribe();
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.0.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn clones_share_identity() {
        let a = Listener::new(|| {});
        let b = Listener::new(|| {});
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn insert_is_unique_by_identity() {
        let listeners = Listeners::new(None);
        let listener = Listener::new(|| {});

        assert!(listeners.insert(&listener));
        assert!(!listeners.insert(&listener.clone()));
        assert_eq!(listeners.len(), 1);
    }

    #[test]
    fn remove_keeps_order_of_the_rest() {
        let listeners = Listeners::new(None);
        let a = Listener::new(|| {});
        let b = Listener::new(|| {});
        let c = Listener::new(|| {});
        for listener in [&a, &b, &c] {
            listeners.insert(listener);
        }

        assert!(listeners.remove(b.key()));
        assert!(!listeners.remove(b.key()));

        let order: Vec<_> = listeners.snapshot().into_iter().map(|(key, _)| key).collect();
        assert_eq!(order, vec![a.key(), c.key()]);
    }

    #[test]
    fn second_unsubscribe_does_not_remove_a_resubscription() {
        let listeners = Arc::new(Listeners::new(None));
        let listener = Listener::new(|| {});

        listeners.insert(&listener);
        let first = Subscription::new(listener.clone(), &listeners);
        first.unsubscribe();
        assert!(!listeners.contains(listener.key()));

        listeners.insert(&listener);
        first.unsubscribe();
        assert!(listeners.contains(listener.key()));
    }

    #[test]
    fn guard_unsubscribes_on_drop() {
        let listeners = Arc::new(Listeners::new(None));
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let listener = Listener::new(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        listeners.insert(&listener);
        {
            let _guard = Subscription::new(listener.clone(), &listeners).into_guard();
            assert_eq!(listeners.len(), 1);
        }
        assert_eq!(listeners.len(), 0);

        listener.call();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_after_store_is_gone_is_a_no_op() {
        let listeners = Arc::new(Listeners::new(None));
        let listener = Listener::new(|| {});
        listeners.insert(&listener);
        let subscription = Subscription::new(listener, &listeners);

        drop(listeners);
        subscription.unsubscribe();
    }
}
