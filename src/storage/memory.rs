//! In-memory storage backend for testing.
//!
//! Provides [`InMemoryStorage`], a thread-safe in-memory implementation of
//! the cart storage traits. Ideal for unit and integration tests where file
//! I/O is undesirable.

use std::sync::{Mutex, MutexGuard};

#[cfg(feature = "async")]
use core::future::{self, Future};

use crate::cart::CartItem;
use crate::error::{Result, WholesaleError};

/// Thread-safe in-memory cart storage.
///
/// This type implements both [`super::CartStorage`] (async) and
/// [`super::BlockingCartStorage`] (blocking), providing a zero-setup
/// backend for tests and for sessions that should not outlive the process.
///
/// # Example
///
/// ```rust
/// use wholesale_rs::storage::InMemoryStorage;
///
/// let storage = InMemoryStorage::new();
/// assert_eq!(storage.saves(), 0);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    /// All state behind a single mutex for thread-safe interior mutability.
    inner: Mutex<Inner>,
}

/// Inner mutable state.
#[derive(Debug, Default)]
struct Inner {
    /// Stored cart lines.
    items: Vec<CartItem>,
    /// Number of completed saves, including clears.
    saves: usize,
}

impl InMemoryStorage {
    /// Creates an empty storage.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage pre-filled with `items`, as if they had been saved
    /// by an earlier session.
    #[inline]
    #[must_use]
    pub fn with_items(items: Vec<CartItem>) -> Self {
        Self {
            inner: Mutex::new(Inner { items, saves: 0 }),
        }
    }

    /// Number of writes (saves and clears) performed so far.
    ///
    /// Returns `0` if the internal lock is poisoned.
    #[inline]
    #[must_use]
    pub fn saves(&self) -> usize {
        self.lock().map_or(0, |inner| inner.saves)
    }

    /// Acquires the inner lock.
    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|err| WholesaleError::Storage(err.to_string().into()))
    }

    /// Returns a copy of the stored lines.
    fn read_items(&self) -> Result<Vec<CartItem>> {
        Ok(self.lock()?.items.clone())
    }

    /// Replaces the stored lines.
    fn write_items(&self, items: Vec<CartItem>) -> Result<()> {
        let mut inner = self.lock()?;
        inner.items = items;
        inner.saves = inner.saves.saturating_add(1);
        Ok(())
    }
}

#[cfg(feature = "blocking")]
impl super::BlockingCartStorage for InMemoryStorage {
    #[inline]
    fn cart_items(&self) -> Result<Vec<CartItem>> {
        self.read_items()
    }

    #[inline]
    fn save_cart_items(&self, items: Vec<CartItem>) -> Result<()> {
        self.write_items(items)
    }

    #[inline]
    fn clear_cart(&self) -> Result<()> {
        self.write_items(Vec::new())
    }
}

#[cfg(feature = "async")]
impl super::CartStorage for InMemoryStorage {
    #[inline]
    fn cart_items(&self) -> impl Future<Output = Result<Vec<CartItem>>> + Send {
        future::ready(self.read_items())
    }

    #[inline]
    fn save_cart_items(&self, items: Vec<CartItem>) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.write_items(items))
    }

    #[inline]
    fn clear_cart(&self) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.write_items(Vec::new()))
    }
}
