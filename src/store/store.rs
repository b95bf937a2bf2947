use parking_lot::{ReentrantMutex, RwLock};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use super::config::{ListenerFailurePolicy, StoreConfig};
use super::subscription::{Listener, Listeners, Subscription};
use crate::aggregate::{Aggregate, Update};
use crate::error::{Result, StoreError};

/// Shared store state.
struct Inner<S> {
    config: StoreConfig,
    state: RwLock<Arc<S>>,
    listeners: Arc<Listeners>,
    // Held for a whole write, updater and listeners included. Re-entrant so a
    // listener or updater on the writing thread can write again.
    writing: ReentrantMutex<()>,
}

impl<S: Aggregate> Inner<S> {
    fn new(config: StoreConfig, initial: S) -> Self {
        let listeners = Arc::new(Listeners::new(config.name.clone()));
        Self {
            config,
            state: RwLock::new(Arc::new(initial)),
            listeners,
            writing: ReentrantMutex::new(()),
        }
    }

    fn name(&self) -> Option<&str> {
        self.config.name.as_deref()
    }

    fn snapshot(&self) -> Arc<S> {
        Arc::clone(&*self.state.read())
    }

    /// Compute the partial from the current snapshot, merge it into the
    /// snapshot current after the updater returns, install the result and
    /// run one notification round.
    fn apply<F>(&self, resolve: F) -> Result<()>
    where
        F: FnOnce(&S) -> S::Partial,
    {
        let _writing = self.writing.lock();

        let partial = resolve(&self.snapshot());
        // the updater may have written; merge into what it left behind
        let next = self.snapshot().merge(partial)?;
        *self.state.write() = Arc::new(next);

        self.notify();
        Ok(())
    }

    fn notify(&self) {
        let round = self.listeners.snapshot();
        tracing::trace!(store = self.name(), listeners = round.len(), "notifying listeners");

        for (key, listener) in round {
            // Unsubscribed by an earlier listener in this round.
            if !self.listeners.contains(key) {
                continue;
            }

            match self.config.listener_failure {
                ListenerFailurePolicy::Propagate => listener.call(),
                ListenerFailurePolicy::Isolate => {
                    let result = panic::catch_unwind(AssertUnwindSafe(|| listener.call()));
                    if let Err(payload) = result {
                        tracing::error!(
                            store = self.name(),
                            panic = panic_message(&*payload),
                            "listener panicked"
                        );
                    }
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}

/// An observable state container.
///
/// A store holds one immutable snapshot of an [`Aggregate`] at a time. Writes
/// shallow-merge a partial into a new snapshot, install it, then notify every
/// subscribed [`Listener`] once before returning.
///
/// Cloning a store is cheap and yields another handle to the same state.
///
/// # Examples
///
/// ```
/// use tincan_store::{aggregate, Store};
/// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
///
/// aggregate! {
///     #[derive(Clone, Debug, PartialEq)]
///     pub struct Counter => CounterPatch {
///         pub count: i32,
///     }
/// }
///
/// let store = Store::new(Counter { count: 1 });
/// let calls = Arc::new(AtomicUsize::new(0));
/// let calls_clone = calls.clone();
///
/// let subscription = store.subscribe_fn(move || {
///     calls_clone.fetch_add(1, Ordering::SeqCst);
/// });
///
/// store.update(|prev| CounterPatch::default().count(prev.count + 1)).unwrap();
/// assert_eq!(store.get().count, 2);
/// assert_eq!(calls.load(Ordering::SeqCst), 1);
///
/// subscription.unsubscribe();
/// store.set(CounterPatch::default().count(10)).unwrap();
/// assert_eq!(calls.load(Ordering::SeqCst), 1);
/// ```
pub struct Store<S> {
    inner: Arc<Inner<S>>,
}

impl<S: Aggregate> Store<S> {
    /// Create a store holding `initial`.
    pub fn new(initial: S) -> Self {
        Self::builder().build(initial)
    }

    /// Create a store whose initial state is built by `factory`.
    ///
    /// The factory runs once, before this returns, and receives the store's
    /// [`Writer`]. The writer may be cloned into the state (for example into
    /// action closures); writing through it while the factory is still
    /// running returns [`StoreError::Uninitialized`].
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: FnOnce(&Writer<S>) -> S,
    {
        Self::builder().build_with(factory)
    }

    /// Start configuring a store.
    pub fn builder() -> StoreBuilder<S> {
        StoreBuilder::new()
    }

    /// Get the current snapshot.
    ///
    /// Repeated calls without an intervening write return the same snapshot.
    pub fn get(&self) -> Arc<S> {
        self.inner.snapshot()
    }

    /// Read the current snapshot through a function.
    ///
    /// No lock is held while `f` runs, so it may write to the store.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&S) -> R,
    {
        let state = self.inner.snapshot();
        f(&state)
    }

    /// Apply an update and notify listeners.
    ///
    /// On error the state is left unchanged and no listener is notified.
    ///
    /// The store's write lock is held until every listener has returned. It
    /// is re-entrant, so listeners may read and write on the same thread, but
    /// a listener that waits on a write made by another thread deadlocks.
    pub fn write<'a>(&self, update: impl Into<Update<'a, S>>) -> Result<()> {
        let update = update.into();
        self.inner.apply(|prev| update.resolve(prev))
    }

    /// Overwrite the fields present in `partial`.
    pub fn set(&self, partial: S::Partial) -> Result<()> {
        self.inner.apply(|_| partial)
    }

    /// Compute the fields to overwrite from the state before the write.
    ///
    /// `f` runs while this write holds the store's write lock. A write it
    /// makes on the same thread is applied and notified first; the fields
    /// returned by `f` are then merged on top of it.
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&S) -> S::Partial,
    {
        self.inner.apply(f)
    }

    /// Subscribe a listener to state changes.
    ///
    /// A listener that is already subscribed is not added again. The listener
    /// is not called now; the first call happens on the next write.
    ///
    /// The store owns its listeners, so a listener that needs to read the
    /// store should capture [`Store::downgrade`] rather than a clone; a clone
    /// keeps the store and its listeners alive forever.
    pub fn subscribe(&self, listener: &Listener) -> Subscription {
        if self.inner.listeners.insert(listener) {
            tracing::debug!(
                store = self.inner.name(),
                listeners = self.inner.listeners.len(),
                "listener subscribed"
            );
        }
        Subscription::new(listener.clone(), &self.inner.listeners)
    }

    /// Subscribe a callback as a new listener.
    pub fn subscribe_fn<F>(&self, f: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.subscribe(&Listener::new(f))
    }

    /// Get a handle that does not keep the store alive.
    pub fn downgrade(&self) -> WeakStore<S> {
        WeakStore {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Get a weak write handle.
    pub fn writer(&self) -> Writer<S> {
        Writer {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Whether `listener` is currently subscribed.
    pub fn is_subscribed(&self, listener: &Listener) -> bool {
        self.inner.listeners.contains(listener.key())
    }

    /// Number of subscribed listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// The configuration this store was built with.
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// The store name, if configured.
    pub fn name(&self) -> Option<&str> {
        self.inner.name()
    }
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Aggregate + fmt::Debug> fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.inner.name())
            .field("state", &self.inner.snapshot())
            .field("listeners", &self.inner.listeners.len())
            .finish()
    }
}

/// A non-owning store handle, see [`Store::downgrade`].
pub struct WeakStore<S> {
    inner: Weak<Inner<S>>,
}

impl<S> WeakStore<S> {
    /// Get the store back if it is still alive.
    pub fn upgrade(&self) -> Option<Store<S>> {
        self.inner.upgrade().map(|inner| Store { inner })
    }
}

impl<S> Clone for WeakStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for WeakStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakStore")
            .field("live", &(self.inner.strong_count() > 0))
            .finish()
    }
}

/// A weak handle that writes to a store.
///
/// Writers do not keep the store alive. Writing after the store is dropped,
/// or from inside the factory that builds its initial state, returns
/// [`StoreError::Uninitialized`].
pub struct Writer<S> {
    inner: Weak<Inner<S>>,
}

impl<S: Aggregate> Writer<S> {
    fn upgrade(&self) -> Result<Arc<Inner<S>>> {
        self.inner.upgrade().ok_or(StoreError::Uninitialized)
    }

    /// Apply an update. See [`Store::write`].
    pub fn write<'a>(&self, update: impl Into<Update<'a, S>>) -> Result<()> {
        let update = update.into();
        self.upgrade()?.apply(|prev| update.resolve(prev))
    }

    /// Overwrite the fields present in `partial`. See [`Store::set`].
    pub fn set(&self, partial: S::Partial) -> Result<()> {
        self.upgrade()?.apply(|_| partial)
    }

    /// Compute the fields to overwrite. See [`Store::update`].
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&S) -> S::Partial,
    {
        self.upgrade()?.apply(f)
    }
}

impl<S> Clone for Writer<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for Writer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Writer")
            .field("live", &(self.inner.strong_count() > 0))
            .finish()
    }
}

/// Builder for a configured [`Store`].
pub struct StoreBuilder<S> {
    config: StoreConfig,
    _state: PhantomData<fn() -> S>,
}

impl<S: Aggregate> StoreBuilder<S> {
    fn new() -> Self {
        Self {
            config: StoreConfig::default(),
            _state: PhantomData,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Name the store in log records.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = Some(name.into());
        self
    }

    /// Set how listener panics are handled.
    pub fn listener_failure(mut self, policy: ListenerFailurePolicy) -> Self {
        self.config.listener_failure = policy;
        self
    }

    /// Build a store holding `initial`.
    pub fn build(self, initial: S) -> Store<S> {
        self.build_with(|_| initial)
    }

    /// Build a store whose initial state comes from `factory`.
    /// See [`Store::with_factory`].
    pub fn build_with<F>(self, factory: F) -> Store<S>
    where
        F: FnOnce(&Writer<S>) -> S,
    {
        let config = self.config;
        let inner = Arc::new_cyclic(|weak| {
            let writer = Writer {
                inner: Weak::clone(weak),
            };
            Inner::new(config, factory(&writer))
        });
        tracing::debug!(store = inner.name(), "store created");
        Store { inner }
    }
}

impl<S: Aggregate> Default for StoreBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}
