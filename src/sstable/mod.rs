//! Sorted String Table (SSTable) Module
//!
//! An SSTable is an **immutable**, sorted, on-disk file of key-value
//! records. Updates never touch a finished file; newer data lands in newer
//! tables, and [`merge`] folds overlapping tables together.
//!
//! # On-disk layout
//!
//! ```text
//! ┌ data block ──────────────────────────────────────────────┐
//! │ [KEY_LEN_LE (4)][VAL_LEN_LE (4)][KEY][VALUE]   repeated  │
//! ├ sparse index ────────────────────────────────────────────┤
//! │ [COUNT_LE (4)]                                           │
//! │ [KEY_LEN_LE (4)][KEY][OFFSET_LE (8, i64)]      repeated  │
//! ├ footer ──────────────────────────────────────────────────┤
//! │ [INDEX_OFFSET_LE (8)]                                    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! - Data records are stored in strictly ascending key order.
//! - An index entry is emitted for the first record and then whenever at
//!   least [`INDEX_INTERVAL`] bytes of data block have accumulated since
//!   the previous entry, so a point lookup binary-searches the index and
//!   scans at most one interval of records.
//! - The footer is the last 8 bytes of the file and holds the byte offset
//!   where the index begins — which is also the exclusive upper bound of
//!   the data block.
//!
//! # Sub-modules
//!
//! - [`builder`] — [`SstWriter`] streams sorted records into a temp file
//!   and atomically renames it on finish.
//! - [`iterator`] — [`TableIterator`] scans the data block through an
//!   independent file handle.
//! - [`merge`] — heap-based k-way merge with per-key deduplication.
//!
//! # Concurrency model
//!
//! - Finished SSTables are immutable; any number of readers may share one.
//! - Point lookups serialize on the reader's internal file handle; every
//!   [`TableIterator`] owns its own handle, so iteration never perturbs
//!   the seek position used by [`SstReader::get`].

// ------------------------------------------------------------------------------------------------
// Sub-modules
// ------------------------------------------------------------------------------------------------

pub mod builder;
pub mod iterator;
pub mod merge;


pub use builder::SstWriter;
pub use iterator::TableIterator;
pub use merge::merge;

// ------------------------------------------------------------------------------------------------
// Includes
// ------------------------------------------------------------------------------------------------

use std::{
    fs::File,
    io::{self, BufReader, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
    sync::{
        Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};

use thiserror::Error;
use tracing::{debug, trace};

// ------------------------------------------------------------------------------------------------
// Constants
// ------------------------------------------------------------------------------------------------

/// Minimum number of data-block bytes between two sparse index entries.
pub(crate) const INDEX_INTERVAL: u64 = 1024;

/// Size of the footer: the u64 index offset.
pub(crate) const FOOTER_SIZE: u64 = 8;

/// Size of a data record header: key_len (4) + val_len (4).
pub(crate) const RECORD_HEADER_SIZE: u64 = 8;

// ------------------------------------------------------------------------------------------------
// Error Types
// ------------------------------------------------------------------------------------------------

/// Errors returned by SSTable operations (read, write, merge).
#[derive(Debug, Error)]
pub enum SstError {
    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file does not decode as a valid SSTable.
    #[error("corrupt sstable: {0}")]
    Corruption(String),

    /// Key or value exceeds the u32 length a record can describe.
    #[error("record size exceeds limit ({0} bytes)")]
    RecordTooLarge(usize),

    /// Internal consistency or locking error.
    #[error("internal error: {0}")]
    Internal(String),
}

// ------------------------------------------------------------------------------------------------
// Sparse index
// ------------------------------------------------------------------------------------------------

/// One sparse index entry: the first key at `offset` within the data block.
#[derive(Debug)]
pub(crate) struct IndexEntry {
    pub(crate) key: Vec<u8>,
    pub(crate) offset: u64,
}

// ------------------------------------------------------------------------------------------------
// SstReader
// ------------------------------------------------------------------------------------------------

/// Read handle for a finished SSTable.
///
/// Opening a reader loads the footer and the full sparse index into
/// memory; point lookups then seek the shared file handle, and
/// [`SstReader::iter`] opens an independent handle per iterator.
#[derive(Debug)]
pub struct SstReader {
    /// Handle used by point lookups, serialized across callers.
    file: Mutex<File>,

    /// Path to the table, used to open iterator handles.
    path: PathBuf,

    /// Sparse index, ascending by key.
    index: Vec<IndexEntry>,

    /// Start of the index region; exclusive upper bound of the data block.
    index_offset: u64,

    /// Total file size in bytes, captured at open.
    file_size: u64,
}

impl SstReader {
    /// Opens a finished SSTable and loads its sparse index.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SstError> {
        let path_ref = path.as_ref();
        let mut file = File::open(path_ref)?;
        let file_size = file.metadata()?.len();

        if file_size < FOOTER_SIZE {
            return Err(SstError::Corruption(format!(
                "file too small for footer ({file_size} bytes)"
            )));
        }

        file.seek(SeekFrom::Start(file_size - FOOTER_SIZE))?;
        let index_offset = read_u64(&mut file)?;
        if index_offset > file_size - FOOTER_SIZE {
            return Err(SstError::Corruption(format!(
                "index offset {index_offset} out of bounds (file size {file_size})"
            )));
        }

        file.seek(SeekFrom::Start(index_offset))?;
        let index = load_index(&mut BufReader::new(&mut file))?;

        debug!(
            path = %path_ref.display(),
            file_size,
            index_offset,
            index_entries = index.len(),
            "sstable opened"
        );

        Ok(Self {
            file: Mutex::new(file),
            path: path_ref.to_path_buf(),
            index,
            index_offset,
            file_size,
        })
    }

    /// Point lookup.
    ///
    /// Binary-searches the sparse index for the greatest entry with
    /// `key <= target` (falling back to offset 0 when the target sorts
    /// before every indexed key), then scans records forward. The scan
    /// stops early as soon as it sees a key greater than the target,
    /// because the data block is sorted.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, SstError> {
        let partition = self.index.partition_point(|e| e.key.as_slice() <= key);
        let start = if partition == 0 {
            0
        } else {
            self.index[partition - 1].offset
        };

        let mut file = self
            .file
            .lock()
            .map_err(|_| SstError::Internal("mutex poisoned".into()))?;
        file.seek(SeekFrom::Start(start))?;

        let mut pos = start;
        while pos < self.index_offset {
            let mut header = [0u8; RECORD_HEADER_SIZE as usize];
            file.read_exact(&mut header)
                .map_err(|e| truncated(e, "record header"))?;
            let key_len = u32_le(&header[0..4]) as usize;
            let val_len = u32_le(&header[4..8]) as usize;

            let mut record_key = vec![0u8; key_len];
            file.read_exact(&mut record_key)
                .map_err(|e| truncated(e, "record key"))?;

            pos += RECORD_HEADER_SIZE + key_len as u64 + val_len as u64;

            match record_key.as_slice().cmp(key) {
                std::cmp::Ordering::Equal => {
                    let mut value = vec![0u8; val_len];
                    file.read_exact(&mut value)
                        .map_err(|e| truncated(e, "record value"))?;
                    trace!(key_len, val_len, "sstable point lookup hit");
                    return Ok(Some(value));
                }
                // Sorted file: the target cannot appear further on.
                std::cmp::Ordering::Greater => return Ok(None),
                std::cmp::Ordering::Less => {
                    file.seek(SeekFrom::Current(val_len as i64))?;
                }
            }
        }

        Ok(None)
    }

    /// Returns a forward iterator over the data block.
    ///
    /// Each iterator opens its own file handle, so concurrent iteration
    /// does not disturb the position used by [`SstReader::get`].
    pub fn iter(&self) -> Result<TableIterator, SstError> {
        TableIterator::open(&self.path, self.index_offset)
    }

    /// Total file size in bytes, as captured when the reader was opened.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Path of the underlying table file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Decodes the sparse index region from its start.
fn load_index<R: Read>(reader: &mut R) -> Result<Vec<IndexEntry>, SstError> {
    let count = read_u32(reader).map_err(|e| truncated(e, "index count"))? as usize;
    // The count is untrusted until the entries decode; cap the preallocation.
    let mut index = Vec::with_capacity(count.min(1 << 16));

    let mut last_offset: u64 = 0;
    for _ in 0..count {
        let key_len = read_u32(reader).map_err(|e| truncated(e, "index key length"))? as usize;
        let mut key = vec![0u8; key_len];
        reader
            .read_exact(&mut key)
            .map_err(|e| truncated(e, "index key"))?;
        let offset = read_i64(reader).map_err(|e| truncated(e, "index offset"))?;
        if offset < 0 || (offset as u64) < last_offset {
            return Err(SstError::Corruption(format!(
                "index offset {offset} not ascending"
            )));
        }
        last_offset = offset as u64;
        index.push(IndexEntry {
            key,
            offset: offset as u64,
        });
    }

    Ok(index)
}

/// Maps an unexpected EOF to a corruption error naming the missing piece;
/// other I/O errors pass through.
pub(crate) fn truncated(err: io::Error, what: &str) -> SstError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        SstError::Corruption(format!("truncated {what}"))
    } else {
        SstError::Io(err)
    }
}

// ------------------------------------------------------------------------------------------------
// Fixed-width I/O helpers
// ------------------------------------------------------------------------------------------------

pub(crate) fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub(crate) fn read_u64<R: Read>(reader: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

pub(crate) fn read_i64<R: Read>(reader: &mut R) -> io::Result<i64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(i64::from_le_bytes(buf))
}

pub(crate) fn u32_le(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}

// ------------------------------------------------------------------------------------------------
// File id allocation
// ------------------------------------------------------------------------------------------------

/// Returns a nanosecond-resolution id, strictly increasing within the
/// process even when the clock stalls or steps backwards.
///
/// Used for `data_<unique>.sst` names and `.tmp.<unique>` suffixes.
pub(crate) fn next_file_id() -> u64 {
    static LAST: AtomicU64 = AtomicU64::new(0);

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);

    let mut last = LAST.load(Ordering::SeqCst);
    loop {
        let id = now.max(last + 1);
        match LAST.compare_exchange(last, id, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => return id,
            Err(current) => last = current,
        }
    }
}
