// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Process-wide registry for GPU-backed resources referenced by nodes.
//!
//! The registry is created once at application start, shared with every
//! [`Scene`](crate::node::Scene) as an `Arc`, and torn down explicitly with
//! [`shutdown`](ResourceRegistry::shutdown). It never touches the GPU itself:
//! it counts holders and invokes the disposer supplied at construction
//! exactly once per resource.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use kurbo::Size;
use tracing::debug;

use crate::error::SceneError;

/// An opaque handle to a registered resource (texture, buffer, etc.).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceKey(pub u64);

impl fmt::Debug for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceKey({})", self.0)
    }
}

type Disposer = Box<dyn Fn(ResourceKey) + Send + Sync>;

#[derive(Debug)]
struct Entry {
    display_size: Size,
    holders: u32,
}

#[derive(Debug, Default)]
struct RegistryState {
    entries: HashMap<ResourceKey, Entry>,
    next_key: u64,
    disposed: u64,
}

/// Holder-counted resource registry with a one-shot disposal contract.
pub struct ResourceRegistry {
    state: Mutex<RegistryState>,
    disposer: Disposer,
}

impl fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new(|_| {})
    }
}

impl ResourceRegistry {
    /// Creates a registry that calls `disposer` when a resource is released
    /// for the last time.
    pub fn new(disposer: impl Fn(ResourceKey) + Send + Sync + 'static) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            disposer: Box::new(disposer),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a resource with the given display size. It starts with no
    /// holders.
    pub fn register(&self, display_size: Size) -> ResourceKey {
        let mut state = self.state();
        let key = ResourceKey(state.next_key);
        state.next_key += 1;
        state.entries.insert(
            key,
            Entry {
                display_size,
                holders: 0,
            },
        );
        key
    }

    /// Returns the display size of a live resource.
    pub fn display_size(&self, key: ResourceKey) -> Result<Size, SceneError> {
        self.state()
            .entries
            .get(&key)
            .map(|entry| entry.display_size)
            .ok_or(SceneError::UnknownResource(key))
    }

    /// Returns whether `key` is registered and not yet disposed.
    #[must_use]
    pub fn is_live(&self, key: ResourceKey) -> bool {
        self.state().entries.contains_key(&key)
    }

    /// Adds a holder.
    pub fn retain(&self, key: ResourceKey) -> Result<(), SceneError> {
        let mut state = self.state();
        let entry = state
            .entries
            .get_mut(&key)
            .ok_or(SceneError::UnknownResource(key))?;
        entry.holders += 1;
        Ok(())
    }

    /// Drops a holder, disposing the resource when none remain.
    ///
    /// Returns `true` if this call disposed the resource.
    pub fn release(&self, key: ResourceKey) -> Result<bool, SceneError> {
        let dispose = {
            let mut state = self.state();
            let entry = state
                .entries
                .get_mut(&key)
                .ok_or(SceneError::UnknownResource(key))?;
            entry.holders = entry.holders.saturating_sub(1);
            if entry.holders == 0 {
                state.entries.remove(&key);
                state.disposed += 1;
                true
            } else {
                false
            }
        };
        if dispose {
            debug!(?key, "disposing resource");
            (self.disposer)(key);
        }
        Ok(dispose)
    }

    /// Disposes every remaining resource regardless of holders.
    ///
    /// Returns how many resources were disposed.
    pub fn shutdown(&self) -> usize {
        let keys: Vec<ResourceKey> = {
            let mut state = self.state();
            let mut keys: Vec<_> = state.entries.drain().map(|(key, _)| key).collect();
            keys.sort_unstable();
            state.disposed += keys.len() as u64;
            keys
        };
        for &key in &keys {
            (self.disposer)(key);
        }
        debug!(count = keys.len(), "resource registry shut down");
        keys.len()
    }

    /// Total number of resources disposed so far.
    #[must_use]
    pub fn disposed_count(&self) -> u64 {
        self.state().disposed
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting_registry() -> (ResourceRegistry, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let registry = ResourceRegistry::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (registry, count)
    }

    #[test]
    fn last_release_disposes_once() {
        let (registry, disposed) = counting_registry();
        let key = registry.register(Size::new(64.0, 32.0));
        registry.retain(key).unwrap();
        registry.retain(key).unwrap();

        assert!(!registry.release(key).unwrap());
        assert!(registry.release(key).unwrap());
        assert_eq!(disposed.load(Ordering::SeqCst), 1);
        assert!(!registry.is_live(key));
        assert_eq!(
            registry.release(key),
            Err(SceneError::UnknownResource(key)),
            "a disposed resource cannot be released again"
        );
        assert_eq!(disposed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn shutdown_disposes_remaining() {
        let (registry, disposed) = counting_registry();
        let a = registry.register(Size::new(1.0, 1.0));
        let _b = registry.register(Size::new(2.0, 2.0));
        registry.retain(a).unwrap();

        assert_eq!(registry.shutdown(), 2);
        assert_eq!(disposed.load(Ordering::SeqCst), 2);
        assert_eq!(registry.shutdown(), 0, "second shutdown has nothing left");
        assert_eq!(registry.disposed_count(), 2);
    }

    #[test]
    fn display_size_lookup() {
        let registry = ResourceRegistry::default();
        let key = registry.register(Size::new(128.0, 64.0));
        assert_eq!(registry.display_size(key), Ok(Size::new(128.0, 64.0)));
        assert!(registry.display_size(ResourceKey(99)).is_err());
    }
}
