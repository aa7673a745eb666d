//! # Memtable Module
//!
//! The mutable, in-memory write buffer of the storage engine: an ordered
//! map from key to value, keys unique and compared lexicographically by
//! byte, last write wins.
//!
//! ## Design Invariants
//!
//! - Key order matches the on-disk SSTable key order, so a drained
//!   memtable streams straight into a table builder.
//! - Iteration yields a snapshot taken under the read lock; producing a
//!   fresh iterator restarts from the beginning.
//! - The engine mutates a memtable only while it is *active*; once rotated
//!   into a [`FrozenMemtable`] it is read-only by construction.
//!
//! ## Representation
//!
//! A `BTreeMap` behind an `RwLock`. Expected O(log n) put/get, O(1)
//! iterator advance, concurrent readers.

// ------------------------------------------------------------------------------------------------
// Unit tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests;

// ------------------------------------------------------------------------------------------------
// Includes
// ------------------------------------------------------------------------------------------------

use std::{collections::BTreeMap, sync::RwLock};

use thiserror::Error;
use tracing::trace;

// ------------------------------------------------------------------------------------------------
// Error Types
// ------------------------------------------------------------------------------------------------

/// Represents possible errors returned by [`Memtable`] operations.
#[derive(Debug, Error)]
pub enum MemtableError {
    /// Internal invariant violation or poisoned lock.
    #[error("internal error: {0}")]
    Internal(String),
}

// ------------------------------------------------------------------------------------------------
// Memtable Core
// ------------------------------------------------------------------------------------------------

/// Internal shared state of the memtable.
struct MemtableInner {
    /// Ordered key-value entries.
    tree: BTreeMap<Vec<u8>, Vec<u8>>,

    /// Approximate in-memory footprint (key + value bytes).
    approximate_size: usize,
}

/// An ordered, last-write-wins, in-memory map of byte-string keys to
/// byte-string values.
///
/// # Concurrency
/// - Writers acquire an exclusive lock
/// - Readers may proceed concurrently
pub struct Memtable {
    inner: RwLock<MemtableInner>,
}

impl Memtable {
    /// Creates a new, empty memtable.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemtableInner {
                tree: BTreeMap::new(),
                approximate_size: 0,
            }),
        }
    }

    /// Inserts or updates a key, overwriting any previous value.
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<(), MemtableError> {
        let key_len = key.len();
        let value_len = value.len();

        let mut guard = self
            .inner
            .write()
            .map_err(|_| MemtableError::Internal("rwlock poisoned".into()))?;

        match guard.tree.insert(key, value) {
            Some(old) => {
                guard.approximate_size -= old.len();
                guard.approximate_size += value_len;
            }
            None => guard.approximate_size += key_len + value_len,
        }

        trace!(key_len, value_len, "memtable put");
        Ok(())
    }

    /// Returns the value stored for `key`, if any.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, MemtableError> {
        let guard = self
            .inner
            .read()
            .map_err(|_| MemtableError::Internal("rwlock poisoned".into()))?;
        Ok(guard.tree.get(key).cloned())
    }

    /// Returns the number of live entries.
    pub fn len(&self) -> Result<usize, MemtableError> {
        let guard = self
            .inner
            .read()
            .map_err(|_| MemtableError::Internal("rwlock poisoned".into()))?;
        Ok(guard.tree.len())
    }

    /// Returns `true` when the memtable holds no entries.
    pub fn is_empty(&self) -> Result<bool, MemtableError> {
        Ok(self.len()? == 0)
    }

    /// Returns the approximate byte footprint of the stored entries.
    ///
    /// The engine compares this against its write-buffer threshold to
    /// decide when to kick a background flush.
    pub fn approximate_size(&self) -> Result<usize, MemtableError> {
        let guard = self
            .inner
            .read()
            .map_err(|_| MemtableError::Internal("rwlock poisoned".into()))?;
        Ok(guard.approximate_size)
    }

    /// Returns an iterator over a snapshot of the entries in ascending key
    /// order.
    ///
    /// The snapshot is taken under the read lock; later mutations are not
    /// reflected. Produce a fresh iterator to restart.
    pub fn iter(&self) -> Result<std::vec::IntoIter<(Vec<u8>, Vec<u8>)>, MemtableError> {
        let guard = self
            .inner
            .read()
            .map_err(|_| MemtableError::Internal("rwlock poisoned".into()))?;
        let entries: Vec<(Vec<u8>, Vec<u8>)> = guard
            .tree
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(entries.into_iter())
    }

    /// Converts this mutable memtable into an immutable [`FrozenMemtable`].
    ///
    /// Consumes `self`, preventing any further writes.
    pub fn frozen(self) -> FrozenMemtable {
        FrozenMemtable { memtable: self }
    }
}

impl Default for Memtable {
    fn default() -> Self {
        Self::new()
    }
}

// ------------------------------------------------------------------------------------------------
// Frozen Memtable
// ------------------------------------------------------------------------------------------------

/// An immutable, read-only view of a memtable.
///
/// This type represents a memtable that is in the process of being flushed
/// to an on-disk SSTable; it exposes only read APIs.
pub struct FrozenMemtable {
    memtable: Memtable,
}

impl FrozenMemtable {
    /// Returns the value stored for `key`, if any.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, MemtableError> {
        self.memtable.get(key)
    }

    /// Returns the number of entries.
    pub fn len(&self) -> Result<usize, MemtableError> {
        self.memtable.len()
    }

    /// Returns `true` when the memtable holds no entries.
    pub fn is_empty(&self) -> Result<bool, MemtableError> {
        self.memtable.is_empty()
    }

    /// Returns an ascending snapshot iterator over the entries.
    pub fn iter(&self) -> Result<std::vec::IntoIter<(Vec<u8>, Vec<u8>)>, MemtableError> {
        self.memtable.iter()
    }
}
