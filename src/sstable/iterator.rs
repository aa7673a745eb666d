//! Forward iteration over an SSTable's data block.
//!
//! A [`TableIterator`] owns an independent file handle and decodes records
//! sequentially over `[0, index_offset)`, never touching the sparse index
//! or footer. Because each iterator has its own handle, any number of them
//! can run alongside point lookups on the same table.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use super::{RECORD_HEADER_SIZE, SstError, truncated, u32_le};

/// Sequential scanner over the data block of one SSTable.
///
/// Yields `(key, value)` pairs in ascending key order; each yielded buffer
/// is freshly allocated and independent of the iterator's internal state.
/// After the first error the iterator is fused and yields nothing further.
pub struct TableIterator {
    /// Private handle; decoding never perturbs other readers.
    reader: BufReader<File>,

    /// Exclusive upper bound of the data block (the index offset).
    limit: u64,

    /// Byte offset of the next record to decode.
    pos: u64,
}

impl TableIterator {
    /// Opens an iterator over `[0, limit)` of the given table file.
    pub(crate) fn open(path: &Path, limit: u64) -> Result<Self, SstError> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            limit,
            pos: 0,
        })
    }

    fn read_record(&mut self) -> Result<(Vec<u8>, Vec<u8>), SstError> {
        let mut header = [0u8; RECORD_HEADER_SIZE as usize];
        self.reader
            .read_exact(&mut header)
            .map_err(|e| truncated(e, "record header"))?;
        let key_len = u32_le(&header[0..4]) as usize;
        let val_len = u32_le(&header[4..8]) as usize;

        let mut key = vec![0u8; key_len];
        self.reader
            .read_exact(&mut key)
            .map_err(|e| truncated(e, "record key"))?;

        let mut value = vec![0u8; val_len];
        self.reader
            .read_exact(&mut value)
            .map_err(|e| truncated(e, "record value"))?;

        self.pos += RECORD_HEADER_SIZE + key_len as u64 + val_len as u64;
        Ok((key, value))
    }
}

impl Iterator for TableIterator {
    type Item = Result<(Vec<u8>, Vec<u8>), SstError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.limit {
            return None;
        }
        match self.read_record() {
            Ok(entry) => Some(Ok(entry)),
            Err(e) => {
                // Fuse: a damaged table must not be re-polled past the error.
                self.pos = self.limit;
                Some(Err(e))
            }
        }
    }
}
