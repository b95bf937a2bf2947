/// What a write does when a listener panics during its notification round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListenerFailurePolicy {
    /// Catch the panic, log it and keep notifying the remaining listeners.
    #[default]
    Isolate,
    /// Stop the round and resume the panic out of the write. The new state
    /// has already been installed when this happens.
    Propagate,
}

/// Store configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Label attached to the store's log records.
    pub name: Option<String>,

    /// Listener panic handling.
    pub listener_failure: ListenerFailurePolicy,
}

impl StoreConfig {
    /// Set the store name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the listener failure policy.
    pub fn with_listener_failure(mut self, policy: ListenerFailurePolicy) -> Self {
        self.listener_failure = policy;
        self
    }
}
