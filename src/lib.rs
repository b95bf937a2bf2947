//! # Tincan Store
//!
//! A minimal observable state container for Rust.
//!
//! ## Store
//!
//! - `Store<S>` - holds an immutable snapshot of an aggregate, replaced on every write
//! - Partial updates shallow-merged into the current state
//! - Synchronous listener notification, one round per write
//! - Unsubscribe handles and RAII guards
//!
//! ## Aggregates
//!
//! - `Aggregate` - the shallow merge contract
//! - `aggregate!` - declares a state struct and its partial companion
//! - `serde_json::Map` - dynamically shaped state
//!
//! ## Binding
//!
//! - `Selection<T>` - a selected projection that reports changes to a UI layer

pub mod aggregate;
pub mod binding;
pub mod error;
pub mod store;

// Re-export main types for convenience
pub use aggregate::{Aggregate, Update};
pub use binding::Selection;
pub use error::{Result, StoreError};
pub use store::{
    Listener, ListenerFailurePolicy, Store, StoreBuilder, StoreConfig, Subscription,
    SubscriptionGuard, WeakStore, Writer,
};
