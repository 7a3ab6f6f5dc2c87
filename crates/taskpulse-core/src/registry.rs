//! Subscription listener registry
//!
//! Holds one cancellation handle per subscription key so the same live query
//! is never subscribed twice. The registry is an ordinary value owned by the
//! caller; dropping it cancels everything it still holds.

use std::collections::HashMap;
use tracing::debug;

/// Cancellation handle for a live subscription.
pub trait Unsubscribe: Send {
    fn unsubscribe(self: Box<Self>);
}

impl<F> Unsubscribe for F
where
    F: FnOnce() + Send,
{
    fn unsubscribe(self: Box<Self>) {
        (*self)()
    }
}

#[derive(Default)]
pub struct ListenerRegistry {
    listeners: HashMap<String, Box<dyn Unsubscribe>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `handle` under `key`. A handle already registered under the same
    /// key is cancelled first; returns `true` when that happened.
    pub fn register<H>(&mut self, key: impl Into<String>, handle: H) -> bool
    where
        H: Unsubscribe + 'static,
    {
        let key = key.into();
        let replaced = match self.listeners.insert(key.clone(), Box::new(handle)) {
            Some(previous) => {
                previous.unsubscribe();
                true
            }
            None => false,
        };
        debug!(target: "taskpulse::registry", key = %key, replaced, "listener registered");
        replaced
    }

    /// Cancel and forget the listener under `key`.
    pub fn unregister(&mut self, key: &str) -> bool {
        match self.listeners.remove(key) {
            Some(handle) => {
                handle.unsubscribe();
                debug!(target: "taskpulse::registry", key, "listener unregistered");
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.listeners.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.listeners.keys().map(String::as_str)
    }

    /// Cancel every listener.
    pub fn clear(&mut self) {
        for (_, handle) in self.listeners.drain() {
            handle.unsubscribe();
        }
    }
}

impl Drop for ListenerRegistry {
    fn drop(&mut self) {
        self.clear();
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("keys", &self.listeners.keys().collect::<Vec<_>>())
            .finish()
    }
}
