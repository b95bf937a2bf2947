//! The observable store.
//!
//! A [`Store`] holds the current state snapshot and the subscription set.
//! Writes shallow-merge a partial into a new snapshot and notify listeners
//! synchronously before returning.

mod config;
mod store;
mod subscription;

pub use config::{ListenerFailurePolicy, StoreConfig};
pub use store::{Store, StoreBuilder, WeakStore, Writer};
pub use subscription::{Listener, Subscription, SubscriptionGuard};
