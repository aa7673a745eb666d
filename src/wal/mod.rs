//! Write-Ahead Logging (WAL) Module
//!
//! An append-only, **fsync-on-write**, CRC-protected log of key-value
//! records. The engine appends every write here before touching the
//! memtable, which makes acknowledged writes durable and recoverable after
//! a crash.
//!
//! # On-disk layout
//!
//! ```text
//! [SEQ_LE (8)][KEY_LEN_LE (4)][VAL_LEN_LE (4)][CRC32_LE (4)][KEY][VALUE]
//! [SEQ_LE (8)][KEY_LEN_LE (4)][VAL_LEN_LE (4)][CRC32_LE (4)][KEY][VALUE]
//! ...
//! ```
//!
//! - `SEQ` — monotonically increasing sequence number. Numbering continues
//!   across log rotation; it exists so operators can reason about what has
//!   been persisted, not for ordering across files.
//! - `CRC32` — CRC32-IEEE computed over `key || value`.
//!
//! # Recovery policy
//!
//! [`Wal::recover`] replays from the start of the file, applying records
//! last-write-wins, and stops **without error** at the first of: end of
//! file, a short header, a short key or value payload, or a checksum
//! mismatch. This truncates the torn tail a crash mid-write leaves behind,
//! which is the only corruption the engine expects; damage in the middle of
//! the file also ends replay at that point.
//!
//! # Concurrency model
//!
//! - Appends are serialized through an internal `Arc<Mutex<File>>`;
//!   concurrent callers observe a total order matching sequence numbers.
//! - Recovery reads through its own file handle and never disturbs the
//!   append position.
//!
//! # Guarantees
//!
//! - **Durability:** every [`Wal::write`] ends with an `fsync` via
//!   [`File::sync_all`] before returning.
//! - **Integrity:** record checksums are verified during replay.
//! - **Crash tolerance:** replay stops cleanly at a truncated or corrupt
//!   record and returns everything before it.

// ------------------------------------------------------------------------------------------------
// Unit tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests;

// ------------------------------------------------------------------------------------------------
// Includes
// ------------------------------------------------------------------------------------------------

use std::{
    collections::BTreeMap,
    fs::{File, OpenOptions},
    io::{self, BufReader, Read, Write},
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use crc32fast::Hasher as Crc32;
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

/// Size of the fixed record header: seq (8) + key_len (4) + val_len (4) + crc (4).
pub(crate) const RECORD_HEADER_SIZE: usize = 8 + 4 + 4 + 4;

// ------------------------------------------------------------------------------------------------
// Error Types
// ------------------------------------------------------------------------------------------------

/// Errors returned by WAL operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WalError {
    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Key or value exceeds the u32 length a frame can describe.
    #[error("record size exceeds limit ({0} bytes)")]
    RecordTooLarge(usize),

    /// Internal consistency or locking error.
    #[error("internal error: {0}")]
    Internal(String),
}

// ------------------------------------------------------------------------------------------------
// WAL Core
// ------------------------------------------------------------------------------------------------

/// A durable, thread-safe write-ahead log of key-value records.
///
/// See the [module-level documentation](self) for the on-disk format,
/// recovery policy, and guarantees.
#[derive(Debug)]
pub struct Wal {
    /// Append handle, shared and serialized across writer threads.
    inner_file: Arc<Mutex<File>>,

    /// Path to the WAL file on disk.
    path: PathBuf,

    /// The next sequence number to assign. Seeded by [`Wal::recover`] and
    /// carried across rotations by the engine.
    next_seq: AtomicU64,
}

impl Wal {
    /// Opens (or creates) a WAL file for appending.
    ///
    /// The file is opened with `O_APPEND | O_CREATE | O_WRONLY` semantics.
    /// `first_seq` is the sequence number the next [`Wal::write`] will use;
    /// pass the previous log's [`Wal::next_seq`] when rotating so numbering
    /// stays monotonic across the process lifetime.
    pub fn open<P: AsRef<Path>>(path: P, first_seq: u64) -> Result<Self, WalError> {
        let path_ref = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path_ref)?;

        info!(path = %path_ref.display(), first_seq, "WAL opened");

        Ok(Self {
            inner_file: Arc::new(Mutex::new(file)),
            path: path_ref.to_path_buf(),
            next_seq: AtomicU64::new(first_seq),
        })
    }

    /// Appends one record and fsyncs the file before returning.
    ///
    /// Returns the sequence number assigned to the record. Callers are
    /// serialized; the order of sequence numbers matches the order records
    /// land in the file.
    pub fn write(&self, key: &[u8], value: &[u8]) -> Result<u64, WalError> {
        if u32::try_from(key.len()).is_err() {
            return Err(WalError::RecordTooLarge(key.len()));
        }
        if u32::try_from(value.len()).is_err() {
            return Err(WalError::RecordTooLarge(value.len()));
        }

        let checksum = compute_crc(&[key, value]);

        let mut guard = self
            .inner_file
            .lock()
            .map_err(|_| WalError::Internal("mutex poisoned".into()))?;

        // Assigned under the file lock so sequence order matches file order.
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);

        let mut header = [0u8; RECORD_HEADER_SIZE];
        header[0..8].copy_from_slice(&seq.to_le_bytes());
        header[8..12].copy_from_slice(&(key.len() as u32).to_le_bytes());
        header[12..16].copy_from_slice(&(value.len() as u32).to_le_bytes());
        header[16..20].copy_from_slice(&checksum.to_le_bytes());

        guard.write_all(&header)?;
        guard.write_all(key)?;
        guard.write_all(value)?;
        guard.sync_all()?;

        trace!(
            seq,
            key_len = key.len(),
            val_len = value.len(),
            crc = format_args!("{checksum:08x}"),
            "WAL record appended"
        );
        Ok(seq)
    }

    /// Replays the log from the start and returns the restored mapping.
    ///
    /// Records are applied last-write-wins. Replay stops cleanly at the
    /// first torn or corrupt record (see the module docs); everything read
    /// before that point is returned. The highest sequence number observed
    /// seeds the counter used by subsequent [`Wal::write`] calls.
    pub fn recover(&self) -> Result<BTreeMap<Vec<u8>, Vec<u8>>, WalError> {
        debug!(path = %self.path.display(), "WAL replay started");

        let mut reader = BufReader::new(File::open(&self.path)?);
        let mut entries: BTreeMap<Vec<u8>, Vec<u8>> = BTreeMap::new();
        let mut max_seq: u64 = 0;
        let mut records: usize = 0;

        loop {
            let mut header = [0u8; RECORD_HEADER_SIZE];
            match reader.read_exact(&mut header) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    trace!(records, "WAL replay reached end of file");
                    break;
                }
                Err(e) => return Err(WalError::Io(e)),
            }

            let seq = u64_le(&header[0..8]);
            let key_len = u32_le(&header[8..12]) as usize;
            let val_len = u32_le(&header[12..16]) as usize;
            let stored_checksum = u32_le(&header[16..20]);

            // Lengths from a torn tail are untrusted; a bounded read keeps
            // a garbage length from forcing a giant allocation.
            let key = match read_payload(&mut reader, key_len)? {
                Some(key) => key,
                None => {
                    warn!(seq, key_len, "WAL truncated record (partial key); stopping replay");
                    break;
                }
            };

            let value = match read_payload(&mut reader, val_len)? {
                Some(value) => value,
                None => {
                    warn!(seq, val_len, "WAL truncated record (partial value); stopping replay");
                    break;
                }
            };

            if compute_crc(&[&key, &value]) != stored_checksum {
                warn!(seq, "WAL record checksum mismatch; stopping replay");
                break;
            }

            if seq > max_seq {
                max_seq = seq;
            }
            records += 1;
            entries.insert(key, value);
        }

        // Seed the counter past everything we saw.
        let next = self.next_seq.load(Ordering::SeqCst);
        if max_seq >= next {
            self.next_seq.store(max_seq + 1, Ordering::SeqCst);
        }

        info!(
            path = %self.path.display(),
            records,
            keys = entries.len(),
            max_seq,
            "WAL recovery complete"
        );
        Ok(entries)
    }

    /// Flushes pending writes to disk.
    pub fn sync(&self) -> Result<(), WalError> {
        let guard = self
            .inner_file
            .lock()
            .map_err(|_| WalError::Internal("mutex poisoned".into()))?;
        guard.sync_all()?;
        Ok(())
    }

    /// Returns the sequence number the next [`Wal::write`] will be assigned.
    pub fn next_seq(&self) -> u64 {
        self.next_seq.load(Ordering::SeqCst)
    }

    /// Get the path of the underlying WAL file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current on-disk file size in bytes.
    pub fn file_size(&self) -> Result<u64, WalError> {
        let guard = self
            .inner_file
            .lock()
            .map_err(|_| WalError::Internal("mutex poisoned".into()))?;
        Ok(guard.metadata()?.len())
    }
}

impl Drop for Wal {
    fn drop(&mut self) {
        match self.inner_file.lock() {
            Ok(guard) => {
                if let Err(e) = guard.sync_all() {
                    error!(path = %self.path.display(), error = %e, "WAL sync failed on drop");
                }
            }
            Err(poisoned) => {
                let file = poisoned.into_inner();
                if let Err(e) = file.sync_all() {
                    error!(path = %self.path.display(), error = %e, "WAL sync failed on drop (poisoned lock)");
                } else {
                    warn!(path = %self.path.display(), "WAL synced after poisoned lock");
                }
            }
        }
    }
}

/// Reads exactly `len` payload bytes, returning `None` when the file ends
/// first. The buffer grows with the actual bytes read, never with the
/// claimed length.
fn read_payload<R: Read>(reader: &mut R, len: usize) -> Result<Option<Vec<u8>>, WalError> {
    let mut payload = Vec::with_capacity(len.min(1 << 20));
    let read = reader.take(len as u64).read_to_end(&mut payload)?;
    if read < len {
        return Ok(None);
    }
    Ok(Some(payload))
}

// ------------------------------------------------------------------------------------------------
// CRC helpers
// ------------------------------------------------------------------------------------------------

/// Computes a CRC32 checksum over one or more byte slices.
fn compute_crc(parts: &[&[u8]]) -> u32 {
    let mut hasher = Crc32::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize()
}

// ------------------------------------------------------------------------------------------------
// Fixed-width decode helpers
// ------------------------------------------------------------------------------------------------

/// Decodes a little-endian u64 from an 8-byte slice.
fn u64_le(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

/// Decodes a little-endian u32 from a 4-byte slice.
fn u32_le(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}
