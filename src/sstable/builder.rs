//! SSTable writer — streams sorted records into a finished table file.
//!
//! # Input Requirements
//!
//! - [`SstWriter::add`] must be called with keys in **strictly ascending**
//!   order. Feeding unsorted keys is a programming error; the resulting
//!   file is not required to remain valid.
//!
//! # Atomicity
//!
//! 1. Everything is written to a sibling `<final>.tmp.<unique>` file.
//! 2. [`SstWriter::finish`] appends the sparse index and footer, flushes,
//!    and fsyncs.
//! 3. The temp file is renamed onto the final path atomically.
//!
//! The final path materializes only after the rename; readers never see a
//! partial table. On every failure path — including dropping an unfinished
//! writer — the temp file is removed.

use std::{
    ffi::OsString,
    fs::{self, File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};

use super::{INDEX_INTERVAL, IndexEntry, RECORD_HEADER_SIZE, SstError, next_file_id};

/// Builds one SSTable on disk from an ascending record stream.
pub struct SstWriter {
    /// Buffered handle on the temp file.
    file: BufWriter<File>,

    /// Temp path the data is staged at.
    tmp_path: PathBuf,

    /// Path the table is renamed to on success.
    final_path: PathBuf,

    /// Byte offset within the data block where the next record lands.
    offset: u64,

    /// Sparse index accumulated while records stream through.
    index: Vec<IndexEntry>,

    /// Offset of the most recently emitted index entry.
    last_index_offset: Option<u64>,

    /// Set once the rename succeeded; gates temp cleanup on drop.
    finished: bool,
}

impl SstWriter {
    /// Creates a writer targeting `final_path`, staging through a sibling
    /// `<final_path>.tmp.<unique>` file.
    pub fn open<P: AsRef<Path>>(final_path: P) -> Result<Self, SstError> {
        let final_path = final_path.as_ref().to_path_buf();

        let mut tmp_name = OsString::from(final_path.as_os_str());
        tmp_name.push(format!(".tmp.{}", next_file_id()));
        let tmp_path = PathBuf::from(tmp_name);

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;

        debug!(
            path = %final_path.display(),
            tmp = %tmp_path.display(),
            "sstable writer opened"
        );

        Ok(Self {
            file: BufWriter::new(file),
            tmp_path,
            final_path,
            offset: 0,
            index: Vec::new(),
            last_index_offset: None,
            finished: false,
        })
    }

    /// Appends one record. Keys must arrive in strictly ascending order.
    pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<(), SstError> {
        let key_len = u32::try_from(key.len()).map_err(|_| SstError::RecordTooLarge(key.len()))?;
        let val_len =
            u32::try_from(value.len()).map_err(|_| SstError::RecordTooLarge(value.len()))?;

        // First record, or at least INDEX_INTERVAL data bytes since the
        // last index entry. The key is copied so the entry outlives any
        // caller-owned buffer.
        let due = match self.last_index_offset {
            None => true,
            Some(last) => self.offset - last >= INDEX_INTERVAL,
        };
        if due {
            self.index.push(IndexEntry {
                key: key.to_vec(),
                offset: self.offset,
            });
            self.last_index_offset = Some(self.offset);
        }

        self.file.write_all(&key_len.to_le_bytes())?;
        self.file.write_all(&val_len.to_le_bytes())?;
        self.file.write_all(key)?;
        self.file.write_all(value)?;

        self.offset += RECORD_HEADER_SIZE + key.len() as u64 + value.len() as u64;
        Ok(())
    }

    /// Emits the sparse index and footer, fsyncs, and atomically renames
    /// the temp file onto the final path.
    ///
    /// On any error the temp file is removed and no final file appears.
    pub fn finish(mut self) -> Result<(), SstError> {
        let index_offset = self.offset;

        let count =
            u32::try_from(self.index.len()).map_err(|_| SstError::RecordTooLarge(self.index.len()))?;
        self.file.write_all(&count.to_le_bytes())?;
        for entry in &self.index {
            let key_len = u32::try_from(entry.key.len())
                .map_err(|_| SstError::RecordTooLarge(entry.key.len()))?;
            self.file.write_all(&key_len.to_le_bytes())?;
            self.file.write_all(&entry.key)?;
            self.file.write_all(&(entry.offset as i64).to_le_bytes())?;
        }
        self.file.write_all(&index_offset.to_le_bytes())?;

        self.file.flush()?;
        self.file.get_ref().sync_all()?;
        fs::rename(&self.tmp_path, &self.final_path)?;
        self.finished = true;

        info!(
            path = %self.final_path.display(),
            data_bytes = index_offset,
            index_entries = self.index.len(),
            "sstable finished"
        );
        Ok(())
    }

    /// Drains a memtable iterator into the table, then finishes it.
    pub fn flush_from<I>(mut self, entries: I) -> Result<(), SstError>
    where
        I: Iterator<Item = (Vec<u8>, Vec<u8>)>,
    {
        for (key, value) in entries {
            self.add(&key, &value)?;
        }
        self.finish()
    }
}

impl Drop for SstWriter {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = fs::remove_file(&self.tmp_path) {
                warn!(
                    tmp = %self.tmp_path.display(),
                    error = %e,
                    "failed to remove abandoned sstable temp file"
                );
            }
        }
    }
}
