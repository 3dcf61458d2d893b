//! Listener registry with explicit subscription handles.
//!
//! `subscribe` returns a [`Subscription`]; dropping it or calling
//! [`Subscription::unsubscribe`] removes the listener. Unsubscribing twice
//! is a no-op.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registry<T> {
    next_id: AtomicU64,
    entries: RwLock<Vec<(u64, Listener<T>)>>,
}

trait Detach: Send + Sync {
    fn detach(&self, id: u64) -> bool;
}

impl<T> Detach for Registry<T> {
    fn detach(&self, id: u64) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }
}

/// A set of listeners for values of type `T`.
pub struct Listeners<T> {
    registry: Arc<Registry<T>>,
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self {
            registry: Arc::new(Registry {
                next_id: AtomicU64::new(1),
                entries: RwLock::new(Vec::new()),
            }),
        }
    }
}

impl<T: 'static> Listeners<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener`. It stays registered while the returned handle
    /// lives.
    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry.entries.write().push((id, Arc::new(listener)));
        let registry: Arc<dyn Detach> = self.registry.clone();
        Subscription {
            id,
            registry: Arc::downgrade(&registry),
            active: true,
        }
    }

    /// Call every listener with `value`.
    ///
    /// Listeners run outside the registry lock, so they may subscribe or
    /// unsubscribe.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<Listener<T>> = self
            .registry
            .entries
            .read()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in snapshot {
            listener(value);
        }
    }

    pub fn len(&self) -> usize {
        self.registry.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle for one registered listener.
pub struct Subscription {
    id: u64,
    registry: Weak<dyn Detach>,
    active: bool,
}

impl Subscription {
    /// Remove the listener. Returns true only on the call that removed it.
    pub fn unsubscribe(&mut self) -> bool {
        if !std::mem::replace(&mut self.active, false) {
            return false;
        }
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.detach(self.id))
    }

    pub fn is_active(&self) -> bool {
        self.active && self.registry.strong_count() > 0
    }

    /// Give up the handle but keep the listener registered for the
    /// registry's lifetime.
    pub fn detach(mut self) {
        self.active = false;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
