// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! An explicit cached-or-absent slot for remotely fetched values.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;

#[cfg(test)]
#[path = "./cache_test.rs"]
mod cache_test;

/// A value fetched on demand and kept until the next explicit refresh.
///
/// Nothing is fetched implicitly: [`Cached::get`] only reads, and
/// [`Cached::get_or_refresh`] fetches only while the slot is empty.
/// Concurrent refreshes are allowed and the last one to finish wins.
pub struct Cached<T> {
    slot: ArcSwapOption<T>,
}

impl<T> Cached<T> {
    pub fn empty() -> Self {
        Self {
            slot: ArcSwapOption::empty(),
        }
    }

    pub fn with_value(value: T) -> Self {
        Self {
            slot: ArcSwapOption::from_pointee(value),
        }
    }

    /// The cached value, if one has been fetched.
    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.load_full()
    }

    pub fn is_cached(&self) -> bool {
        self.slot.load().is_some()
    }

    /// Fetch unconditionally and replace whatever is cached.
    pub fn refresh<E, F>(&self, fetch: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let value = Arc::new(fetch()?);
        self.slot.store(Some(Arc::clone(&value)));
        Ok(value)
    }

    /// Return the cached value, fetching it first if the slot is empty.
    pub fn get_or_refresh<E, F>(&self, fetch: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        match self.get() {
            Some(value) => Ok(value),
            None => self.refresh(fetch),
        }
    }

    /// Drop the cached value.
    pub fn clear(&self) {
        self.slot.store(None);
    }
}

impl<T> Default for Cached<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Clone for Cached<T> {
    fn clone(&self) -> Self {
        Self {
            slot: ArcSwapOption::new(self.get()),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Cached<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(value) => f.debug_tuple("Cached").field(&value).finish(),
            None => f.write_str("Cached(<absent>)"),
        }
    }
}
