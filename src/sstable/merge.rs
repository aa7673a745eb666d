//! Heap-based k-way merge with per-key deduplication.
//!
//! Inputs are table iterators ordered **newest to oldest**; the output is
//! a strictly ascending record stream in which each key appears exactly
//! once, carrying the value from the newest input that contained it.
//! Recency is encoded purely by iterator position — index 0 is newest —
//! never by file name or timestamp.

use std::{cmp::Ordering, collections::BinaryHeap};

use tracing::debug;

use super::{SstError, SstWriter, TableIterator};

/// One live heap item: a decoded record plus the input it came from.
///
/// Key and value are owned copies, decoupled from the iterator's buffers.
struct MergeItem {
    key: Vec<u8>,
    value: Vec<u8>,
    iter_idx: usize,
}

impl Ord for MergeItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap pops the maximum, so the comparison is reversed:
        // smallest key first, and on equal keys the newest input
        // (lowest iter_idx) first.
        match self.key.cmp(&other.key) {
            Ordering::Equal => self.iter_idx.cmp(&other.iter_idx),
            ord => ord,
        }
        .reverse()
    }
}

impl PartialOrd for MergeItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for MergeItem {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.iter_idx == other.iter_idx
    }
}

impl Eq for MergeItem {}

/// Merges `iters` (ordered newest to oldest) into `writer`, deduplicating
/// keys in favor of the newest input, and finishes the writer.
///
/// Any iterator error aborts the merge; the unfinished writer removes its
/// temp file on drop, so no partial output survives.
pub fn merge(mut iters: Vec<TableIterator>, mut writer: SstWriter) -> Result<(), SstError> {
    let mut heap = BinaryHeap::new();

    // Seed with the first record of each non-empty input.
    for (idx, iter) in iters.iter_mut().enumerate() {
        if let Some(entry) = iter.next() {
            let (key, value) = entry?;
            heap.push(MergeItem {
                key,
                value,
                iter_idx: idx,
            });
        }
    }

    let mut last_emitted: Option<Vec<u8>> = None;
    let mut emitted: usize = 0;

    while let Some(item) = heap.pop() {
        // A key equal to the last emitted one comes from an older input;
        // skip it.
        if last_emitted.as_deref() != Some(item.key.as_slice()) {
            writer.add(&item.key, &item.value)?;
            last_emitted = Some(item.key.clone());
            emitted += 1;
        }

        // Advance the input this item came from.
        if let Some(entry) = iters[item.iter_idx].next() {
            let (key, value) = entry?;
            heap.push(MergeItem {
                key,
                value,
                iter_idx: item.iter_idx,
            });
        }
    }

    debug!(inputs = iters.len(), emitted, "k-way merge complete");
    writer.finish()
}
