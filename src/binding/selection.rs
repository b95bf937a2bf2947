use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

use crate::aggregate::Aggregate;
use crate::store::{Listener, Store, SubscriptionGuard};

/// A selected projection of a store that tracks changes.
///
/// The selector is evaluated once on creation and again after every write.
/// The change callback fires only when the newly selected value differs from
/// the previous one. Dropping the selection unsubscribes it.
pub struct Selection<T> {
    value: Arc<RwLock<T>>,
    _subscription: SubscriptionGuard,
}

impl<T> Selection<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn new<S, Sel, C>(store: &Store<S>, selector: Sel, on_change: C) -> Self
    where
        S: Aggregate,
        Sel: Fn(&S) -> T + Send + Sync + 'static,
        C: Fn(&T) + Send + Sync + 'static,
    {
        let value = Arc::new(RwLock::new(store.read(&selector)));

        let weak = store.downgrade();
        let current = Arc::clone(&value);
        let listener = Listener::new(move || {
            let Some(store) = weak.upgrade() else {
                return;
            };
            let next = store.read(&selector);

            let mut current = current.write();
            if *current == next {
                return;
            }
            *current = next.clone();
            drop(current);

            on_change(&next);
        });

        Self {
            value,
            _subscription: store.subscribe(&listener).into_guard(),
        }
    }

    /// The last selected value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Read the last selected value without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read())
    }
}

impl<T: fmt::Debug> fmt::Debug for Selection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selection")
            .field("value", &*self.value.read())
            .finish()
    }
}

impl<S: Aggregate> Store<S> {
    /// Track `selector(state)` and call `on_change` when it changes.
    ///
    /// # Examples
    ///
    /// ```
    /// use tincan_store::{aggregate, Store};
    /// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
    ///
    /// aggregate! {
    ///     #[derive(Clone)]
    ///     pub struct Profile => ProfilePatch {
    ///         pub user_name: String,
    ///         pub counter: i32,
    ///     }
    /// }
    ///
    /// let store = Store::new(Profile { user_name: String::new(), counter: 1 });
    /// let renders = Arc::new(AtomicUsize::new(0));
    /// let renders_clone = renders.clone();
    ///
    /// let name = store.select(
    ///     |state: &Profile| state.user_name.clone(),
    ///     move |_| {
    ///         renders_clone.fetch_add(1, Ordering::SeqCst);
    ///     },
    /// );
    ///
    /// store.set(ProfilePatch::default().counter(2)).unwrap();
    /// assert_eq!(renders.load(Ordering::SeqCst), 0);
    ///
    /// store.set(ProfilePatch::default().user_name("Debs")).unwrap();
    /// assert_eq!(renders.load(Ordering::SeqCst), 1);
    /// assert_eq!(name.get(), "Debs");
    /// ```
    pub fn select<T, Sel, C>(&self, selector: Sel, on_change: C) -> Selection<T>
    where
        T: Clone + PartialEq + Send + Sync + 'static,
        Sel: Fn(&S) -> T + Send + Sync + 'static,
        C: Fn(&T) + Send + Sync + 'static,
    {
        Selection::new(self, selector, on_change)
    }
}
