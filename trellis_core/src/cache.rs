// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Memoizing cache cell for derived quantities.
//!
//! A [`Cached`] holds the last computed value together with a validity bit.
//! Reads go through [`get`](Cached::get) (valid value only) or
//! [`get_or_update`](Cached::get_or_update) (recompute if invalid). The stale
//! value survives invalidation and stays reachable through
//! [`last_known`](Cached::last_known); the layout resolver falls back to it
//! when it has to break a dependency cycle.
//!
//! Recomputations and effective invalidations are counted so callers can
//! observe that unchanged inputs never trigger work.

/// A cached value with an explicit validity flag.
#[derive(Clone, Debug)]
pub struct Cached<T> {
    value: T,
    valid: bool,
    computations: u64,
    invalidations: u64,
}

impl<T: Default> Default for Cached<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Cached<T> {
    /// Creates an invalid cell seeded with `initial` as its last-known value.
    #[must_use]
    pub const fn new(initial: T) -> Self {
        Self {
            value: initial,
            valid: false,
            computations: 0,
            invalidations: 0,
        }
    }

    /// Returns whether the cached value is current.
    #[inline]
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// Returns the value if it is current.
    #[inline]
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.valid.then_some(&self.value)
    }

    /// Returns the most recently stored value, current or not.
    #[inline]
    #[must_use]
    pub const fn last_known(&self) -> &T {
        &self.value
    }

    /// Stores a freshly computed value and marks the cell valid.
    pub fn set(&mut self, value: T) -> &T {
        self.value = value;
        self.valid = true;
        self.computations += 1;
        &self.value
    }

    /// Returns the current value, recomputing it with `compute` first if the
    /// cell is invalid.
    pub fn get_or_update(&mut self, compute: impl FnOnce() -> T) -> &T {
        if !self.valid {
            self.set(compute());
        }
        &self.value
    }

    /// Marks the value stale.
    ///
    /// Returns `true` if the cell was valid before the call. Invalidating an
    /// already-invalid cell is a no-op.
    pub fn invalidate(&mut self) -> bool {
        let was_valid = self.valid;
        if was_valid {
            self.valid = false;
            self.invalidations += 1;
        }
        was_valid
    }

    /// Number of times a value has been stored.
    #[inline]
    #[must_use]
    pub const fn computations(&self) -> u64 {
        self.computations
    }

    /// Number of valid → invalid transitions.
    #[inline]
    #[must_use]
    pub const fn invalidations(&self) -> u64 {
        self.invalidations
    }
}
