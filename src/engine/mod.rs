//! # LSM Storage Engine
//!
//! Coordinates the write path (WAL + memtable), the flush protocol, and
//! size-tiered compaction over an atomically swapped reader set.
//!
//! ## Design Overview
//!
//! Data lives in three layers, queried newest-first:
//!
//! 1. **Active memtable** — in-memory sorted map; every write lands in the
//!    WAL first, then here.
//! 2. **Immutable memtable** — present only while a flush is in progress;
//!    a frozen snapshot of a previously active memtable.
//! 3. **SSTables** — immutable sorted files, ordered oldest to newest;
//!    later tables shadow earlier ones for equal keys.
//!
//! ## Concurrency Model
//!
//! A single reader-writer lock protects the mutable engine state (memtable
//! slots, WAL handle, reader list). `put` and the flush rotation/publish
//! steps take it exclusively; `get` takes it shared. The long-running parts
//! of flush (building and verifying the new table) and compaction (the
//! k-way merge) run without the lock. One mutex serializes flushes, another
//! serializes compactions.
//!
//! A dedicated flush worker and a dedicated compaction worker are kicked
//! through bounded channels: the write path signals the flush worker when
//! the active memtable outgrows [`EngineConfig::write_buffer_size`], and a
//! completed background flush signals the compaction worker.
//!
//! ## On-disk layout (under the data directory)
//!
//! - `wal.log` — current WAL, always present while open.
//! - `wal.log.flushing` — rotated WAL, exists only during a flush.
//! - `data_<unique>.sst` — finished SSTables; `<unique>` is a monotonic
//!   nanosecond counter, and startup orders readers by it numerically.
//! - `*.tmp.<unique>` — in-progress writer output, deleted on startup.
//!
//! ## Guarantees
//!
//! - **Durability:** a `put` is framed, checksummed, and fsynced to the WAL
//!   before it is acknowledged.
//! - **Crash recovery:** on open, the WAL (and any leftover flushing WAL)
//!   is replayed into a fresh memtable and existing tables are re-attached
//!   in age order.
//! - **Flush atomicity:** a new table becomes visible only after it is
//!   fully written, fsynced, renamed, and verified by a complete re-read;
//!   on failure the frozen entries are re-appended to the current WAL so
//!   nothing acknowledged is lost.
//! - **Compaction atomicity:** the reader set is swapped in one exclusive
//!   critical section; input files are deleted only after the swap.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, RwLock, Weak},
    thread,
};

use crossbeam::channel::{Receiver, Sender, bounded};
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

use crate::compaction;
use crate::memtable::{FrozenMemtable, Memtable, MemtableError};
use crate::sstable::{self, SstError, SstReader, SstWriter, merge};
use crate::wal::{Wal, WalError};

#[cfg(test)]
mod tests;

/// File name of the current WAL.
pub const WAL_FILE: &str = "wal.log";

/// File name the WAL is rotated to for the duration of a flush.
pub const FLUSHING_WAL_FILE: &str = "wal.log.flushing";

const SST_PREFIX: &str = "data_";
const SST_SUFFIX: &str = ".sst";

// ------------------------------------------------------------------------------------------------
// Error Types
// ------------------------------------------------------------------------------------------------

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Error originating from the WAL subsystem.
    #[error("WAL error: {0}")]
    Wal(#[from] WalError),

    /// Error originating from the memtable subsystem.
    #[error("memtable error: {0}")]
    Memtable(#[from] MemtableError),

    /// Error originating from the SSTable subsystem.
    #[error("SSTable error: {0}")]
    Sst(#[from] SstError),

    /// Underlying filesystem I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Keys must be non-empty byte strings.
    #[error("key must not be empty")]
    EmptyKey,

    /// A flush did not complete; the frozen entries were re-appended to
    /// the current WAL, so no acknowledged write was lost.
    #[error("flush failed, data preserved in WAL: {0}")]
    FlushFailed(#[source] Box<EngineError>),

    /// Internal invariant violation (poisoned lock, unexpected state).
    #[error("internal error: {0}")]
    Internal(String),
}

// ------------------------------------------------------------------------------------------------
// Configuration and statistics
// ------------------------------------------------------------------------------------------------

/// Configuration for an [`Engine`] instance.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Approximate active-memtable size (bytes) above which the write path
    /// kicks the background flush worker.
    pub write_buffer_size: usize,

    /// Number of same-tier SSTables that triggers a compaction.
    pub compaction_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            write_buffer_size: 4 * 1024 * 1024,
            compaction_threshold: compaction::DEFAULT_COMPACTION_THRESHOLD,
        }
    }
}

/// Snapshot of engine statistics returned by [`Engine::stats`].
#[derive(Debug)]
pub struct EngineStats {
    /// Live entries in the active memtable.
    pub memtable_entries: usize,

    /// Whether an immutable memtable is awaiting flush.
    pub flush_pending: bool,

    /// Number of SSTables in the reader set.
    pub sstable_count: usize,

    /// Per-SSTable file sizes in bytes, oldest first.
    pub sst_sizes: Vec<u64>,

    /// Sum of all SSTable file sizes in bytes.
    pub total_sst_size_bytes: u64,
}

// ------------------------------------------------------------------------------------------------
// Shared state
// ------------------------------------------------------------------------------------------------

/// Mutable engine state, guarded by the engine lock.
struct EngineState {
    /// Active memtable that accepts writes. Always present.
    active: Memtable,

    /// Frozen memtable, present only while a flush is in progress.
    immutable: Option<Arc<FrozenMemtable>>,

    /// Current write-ahead log.
    wal: Wal,

    /// SSTable readers, oldest first; the last entry is the newest and
    /// shadows earlier ones for equal keys.
    readers: Vec<SstReader>,
}

/// Kick or stop signal for a worker thread.
enum WorkerMessage {
    Kick,
    Shutdown,
}

/// State shared between engine handles and the worker threads.
struct Shared {
    state: RwLock<EngineState>,

    /// Serializes flushes; only one runs at a time.
    flush_lock: Mutex<()>,

    /// Serializes compactions; only one runs at a time.
    compaction_lock: Mutex<()>,

    config: EngineConfig,
    data_dir: PathBuf,

    flush_tx: Sender<WorkerMessage>,
    compaction_tx: Sender<WorkerMessage>,

    /// Worker join handles, drained by [`Engine::close`].
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
}

/// The main LSM storage engine handle.
///
/// Thread-safe — clone it freely; all clones share the same state.
pub struct Engine {
    shared: Arc<Shared>,
}

impl Clone for Engine {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Engine API
// ------------------------------------------------------------------------------------------------

impl Engine {
    /// Opens (or creates) an engine rooted at the given directory.
    ///
    /// Startup recovery: stale `*.tmp.*` files are deleted, the WAL (and a
    /// flushing WAL left behind by an interrupted flush, if any) is
    /// replayed into a fresh memtable, and `data_<unique>.sst` files are
    /// opened oldest-first by their numeric suffix.
    pub fn open<P: AsRef<Path>>(path: P, config: EngineConfig) -> Result<Self, EngineError> {
        let data_dir = path.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir)?;
        remove_stale_temp_files(&data_dir)?;

        // 1. WAL replay into a fresh memtable.
        let wal = Wal::open(data_dir.join(WAL_FILE), 1)?;
        let active = Memtable::new();

        let flushing_path = data_dir.join(FLUSHING_WAL_FILE);
        let stranded = if flushing_path.exists() {
            warn!(
                path = %flushing_path.display(),
                "found flushing WAL from an interrupted flush; recovering it"
            );
            let flushing = Wal::open(&flushing_path, 1)?;
            flushing.recover()?
        } else {
            Default::default()
        };

        let restored = wal.recover()?;

        // Fold stranded entries back into the current WAL so it again
        // contains every acknowledged, un-flushed write. Keys the current
        // WAL already has are newer and must stay newest in file order.
        for (key, value) in &stranded {
            if !restored.contains_key(key) {
                wal.write(key, value)?;
            }
        }
        for (key, value) in stranded {
            active.put(key, value)?;
        }
        for (key, value) in restored {
            active.put(key, value)?;
        }
        if flushing_path.exists() {
            fs::remove_file(&flushing_path)?;
        }

        // 2. Attach existing SSTables, oldest first by numeric suffix.
        // Directory enumeration order is meaningless for recency.
        let mut tables: Vec<(u64, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&data_dir)? {
            let entry = entry?;
            let file_path = entry.path();
            if let Some(name) = file_path.file_name().and_then(|s| s.to_str())
                && let Some(id) = parse_sst_file_name(name)
            {
                tables.push((id, file_path));
            }
        }
        tables.sort_by_key(|(id, _)| *id);

        let mut readers = Vec::with_capacity(tables.len());
        for (_, table_path) in tables {
            match SstReader::open(&table_path) {
                Ok(reader) => readers.push(reader),
                Err(e) => warn!(
                    path = %table_path.display(),
                    error = %e,
                    "skipping unreadable sstable"
                ),
            }
        }

        let memtable_entries = active.len()?;
        info!(
            dir = %data_dir.display(),
            memtable_entries,
            sstables = readers.len(),
            "engine opened"
        );

        // 3. Spin up the flush and compaction workers.
        let (flush_tx, flush_rx) = bounded(1);
        let (compaction_tx, compaction_rx) = bounded(1);

        let shared = Arc::new(Shared {
            state: RwLock::new(EngineState {
                active,
                immutable: None,
                wal,
                readers,
            }),
            flush_lock: Mutex::new(()),
            compaction_lock: Mutex::new(()),
            config,
            data_dir,
            flush_tx,
            compaction_tx,
            workers: Mutex::new(Vec::new()),
        });

        let flush_worker = spawn_flush_worker(Arc::downgrade(&shared), flush_rx)?;
        let compaction_worker = spawn_compaction_worker(Arc::downgrade(&shared), compaction_rx)?;
        shared
            .workers
            .lock()
            .map_err(|_| EngineError::Internal("worker mutex poisoned".into()))?
            .extend([flush_worker, compaction_worker]);

        Ok(Self { shared })
    }

    /// Insert a key-value pair.
    ///
    /// The record is framed and fsynced to the WAL, then inserted into the
    /// active memtable; the write is durable before this returns. If the
    /// WAL append fails, the memtable is untouched.
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<(), EngineError> {
        if key.is_empty() {
            return Err(EngineError::EmptyKey);
        }

        let kick = {
            let state = self
                .shared
                .state
                .write()
                .map_err(|_| EngineError::Internal("rwlock poisoned".into()))?;

            state.wal.write(&key, &value)?;
            state.active.put(key, value)?;

            state.immutable.is_none()
                && state.active.approximate_size()? > self.shared.config.write_buffer_size
        };

        if kick {
            // Full channel means a kick is already pending.
            let _ = self.shared.flush_tx.try_send(WorkerMessage::Kick);
        }
        Ok(())
    }

    /// Look up a single key.
    ///
    /// Searches the active memtable, the immutable memtable (if a flush is
    /// in progress), then the SSTables from newest to oldest, returning the
    /// first hit. A reader that fails mid-read is logged and treated as
    /// not-found for that table.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, EngineError> {
        let state = self
            .shared
            .state
            .read()
            .map_err(|_| EngineError::Internal("rwlock poisoned".into()))?;

        if let Some(value) = state.active.get(key)? {
            return Ok(Some(value));
        }

        if let Some(immutable) = &state.immutable
            && let Some(value) = immutable.get(key)?
        {
            return Ok(Some(value));
        }

        for reader in state.readers.iter().rev() {
            match reader.get(key) {
                Ok(Some(value)) => return Ok(Some(value)),
                Ok(None) => {}
                Err(e) => warn!(
                    path = %reader.path().display(),
                    error = %e,
                    "sstable lookup failed; treating as not found"
                ),
            }
        }

        Ok(None)
    }

    /// Flush the active memtable to a new SSTable.
    ///
    /// Returns `Ok(true)` if a table was published, `Ok(false)` if there
    /// was nothing to flush. Concurrent callers wait their turn; only one
    /// flush runs at a time.
    pub fn flush(&self) -> Result<bool, EngineError> {
        flush_impl(&self.shared)
    }

    /// Run one round of size-tiered compaction.
    ///
    /// Returns `Ok(true)` if a tier was compacted, `Ok(false)` if no tier
    /// met the threshold.
    pub fn run_compaction(&self) -> Result<bool, EngineError> {
        compact_impl(&self.shared)
    }

    /// Returns a snapshot of engine statistics.
    pub fn stats(&self) -> Result<EngineStats, EngineError> {
        let state = self
            .shared
            .state
            .read()
            .map_err(|_| EngineError::Internal("rwlock poisoned".into()))?;

        let sst_sizes: Vec<u64> = state.readers.iter().map(|r| r.file_size()).collect();
        Ok(EngineStats {
            memtable_entries: state.active.len()?,
            flush_pending: state.immutable.is_some(),
            sstable_count: state.readers.len(),
            total_sst_size_bytes: sst_sizes.iter().sum(),
            sst_sizes,
        })
    }

    /// Gracefully shuts down the engine.
    ///
    /// Stops and joins the worker threads, then drains in-flight writes by
    /// taking the exclusive lock, syncs the WAL, and closes the readers.
    /// Memtable contents stay recoverable from `wal.log`. Idempotent.
    pub fn close(&self) -> Result<(), EngineError> {
        let handles: Vec<thread::JoinHandle<()>> = {
            let mut workers = self
                .shared
                .workers
                .lock()
                .map_err(|_| EngineError::Internal("worker mutex poisoned".into()))?;
            workers.drain(..).collect()
        };

        if !handles.is_empty() {
            let _ = self.shared.flush_tx.send(WorkerMessage::Shutdown);
            let _ = self.shared.compaction_tx.send(WorkerMessage::Shutdown);
            for handle in handles {
                let _ = handle.join();
            }
        }

        let mut state = self
            .shared
            .state
            .write()
            .map_err(|_| EngineError::Internal("rwlock poisoned".into()))?;
        state.wal.sync()?;
        state.readers.clear();

        info!(dir = %self.shared.data_dir.display(), "engine closed");
        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// Flush protocol
// ------------------------------------------------------------------------------------------------

/// Runs one flush: rotate under the exclusive lock, build and verify the
/// SSTable outside it, publish under the exclusive lock.
fn flush_impl(shared: &Shared) -> Result<bool, EngineError> {
    let _guard = shared
        .flush_lock
        .lock()
        .map_err(|_| EngineError::Internal("flush mutex poisoned".into()))?;

    // Step 1: rotate (or adopt a pending immutable) under the lock.
    let frozen = {
        let mut state = shared
            .state
            .write()
            .map_err(|_| EngineError::Internal("rwlock poisoned".into()))?;

        match &state.immutable {
            Some(pending) => Arc::clone(pending),
            None => {
                if state.active.is_empty()? {
                    trace!("flush: nothing to do");
                    return Ok(false);
                }
                rotate(&mut state, shared)?
            }
        }
    };

    // Step 2: build the SSTable outside the lock.
    let expected = frozen.len()?;
    let sst_path = shared.data_dir.join(format!(
        "{SST_PREFIX}{}{SST_SUFFIX}",
        sstable::next_file_id()
    ));
    debug!(path = %sst_path.display(), entries = expected, "flush: building sstable");

    if let Err(e) = build_sstable(&sst_path, &frozen) {
        return preserve_into_wal(shared, &frozen, e);
    }

    // Step 3: verify by a full re-read before anyone can see the table.
    let reader = match verify_sstable(&sst_path, expected) {
        Ok(reader) => reader,
        Err(e) => {
            if let Err(re) = fs::remove_file(&sst_path) {
                warn!(path = %sst_path.display(), error = %re, "failed to remove unverified sstable");
            }
            return preserve_into_wal(shared, &frozen, e);
        }
    };

    // Step 4: publish and discard the rotated WAL.
    {
        let mut state = shared
            .state
            .write()
            .map_err(|_| EngineError::Internal("rwlock poisoned".into()))?;
        state.readers.push(reader);
        state.immutable = None;
    }

    let flushing_path = shared.data_dir.join(FLUSHING_WAL_FILE);
    if let Err(e) = fs::remove_file(&flushing_path) {
        warn!(path = %flushing_path.display(), error = %e, "failed to remove flushing WAL");
    }

    info!(path = %sst_path.display(), entries = expected, "flush complete");
    Ok(true)
}

/// Rotates the active memtable into the immutable slot and swaps in a
/// fresh WAL. Caller holds the exclusive lock. On any failure the active
/// memtable and the WAL file name are restored and an error is returned.
fn rotate(state: &mut EngineState, shared: &Shared) -> Result<Arc<FrozenMemtable>, EngineError> {
    let wal_path = shared.data_dir.join(WAL_FILE);
    let flushing_path = shared.data_dir.join(FLUSHING_WAL_FILE);

    state.wal.sync()?;
    let next_seq = state.wal.next_seq();

    let old_active = std::mem::replace(&mut state.active, Memtable::new());

    if let Err(e) = fs::rename(&wal_path, &flushing_path) {
        state.active = old_active;
        return Err(e.into());
    }

    match Wal::open(&wal_path, next_seq) {
        Ok(new_wal) => {
            // The previous WAL handle closes (and syncs) when replaced.
            state.wal = new_wal;
            let frozen = Arc::new(old_active.frozen());
            state.immutable = Some(Arc::clone(&frozen));
            debug!(next_seq, "flush: rotated memtable and WAL");
            Ok(frozen)
        }
        Err(e) => {
            if let Err(re) = fs::rename(&flushing_path, &wal_path) {
                error!(error = %re, "failed to restore WAL after aborted rotation");
            }
            state.active = old_active;
            Err(e.into())
        }
    }
}

/// Drains a frozen memtable into a new SSTable at `path`.
fn build_sstable(path: &Path, frozen: &FrozenMemtable) -> Result<(), EngineError> {
    let writer = SstWriter::open(path)?;
    writer.flush_from(frozen.iter()?)?;
    Ok(())
}

/// Re-reads a freshly built SSTable end to end and checks its entry count
/// against the memtable it came from.
fn verify_sstable(path: &Path, expected: usize) -> Result<SstReader, EngineError> {
    let reader = SstReader::open(path)?;
    let mut count: usize = 0;
    for entry in reader.iter()? {
        entry?;
        count += 1;
    }
    if count != expected {
        return Err(EngineError::Internal(format!(
            "sstable verification failed: expected {expected} entries, found {count}"
        )));
    }
    Ok(reader)
}

/// Flush failure path: re-append every frozen entry into the current WAL
/// so durability is preserved, clear the immutable slot, and surface a
/// wrapped error.
fn preserve_into_wal(
    shared: &Shared,
    frozen: &FrozenMemtable,
    cause: EngineError,
) -> Result<bool, EngineError> {
    error!(error = %cause, "flush failed; preserving frozen memtable in current WAL");

    let mut state = shared
        .state
        .write()
        .map_err(|_| EngineError::Internal("rwlock poisoned".into()))?;

    for (key, value) in frozen.iter()? {
        if let Err(e) = state.wal.write(&key, &value) {
            error!(error = %e, "CRITICAL: failed to re-append entry to WAL");
        }
    }
    state.immutable = None;

    Err(EngineError::FlushFailed(Box::new(cause)))
}

// ------------------------------------------------------------------------------------------------
// Compaction
// ------------------------------------------------------------------------------------------------

/// Runs one compaction round: plan under the shared lock, merge outside
/// any lock, swap the reader set under the exclusive lock, then delete the
/// consumed files.
fn compact_impl(shared: &Shared) -> Result<bool, EngineError> {
    let _guard = shared
        .compaction_lock
        .lock()
        .map_err(|_| EngineError::Internal("compaction mutex poisoned".into()))?;

    // Select inputs under the shared lock. Input order within the set is
    // oldest position first; the newest input gets iterator index 0 so the
    // merge resolves equal keys to the newest value.
    let (tier, input_paths, iters) = {
        let state = shared
            .state
            .read()
            .map_err(|_| EngineError::Internal("rwlock poisoned".into()))?;

        let sizes: Vec<u64> = state.readers.iter().map(|r| r.file_size()).collect();
        let Some(plan) = compaction::plan(&sizes, shared.config.compaction_threshold) else {
            return Ok(false);
        };

        let mut iters = Vec::with_capacity(plan.inputs.len());
        for &idx in plan.inputs.iter().rev() {
            iters.push(state.readers[idx].iter()?);
        }
        let input_paths: Vec<PathBuf> = plan
            .inputs
            .iter()
            .map(|&idx| state.readers[idx].path().to_path_buf())
            .collect();
        (plan.tier, input_paths, iters)
    };

    info!(tier, inputs = input_paths.len(), "compaction: merging tier");

    // Merge into a fresh table outside the lock.
    let out_path = shared.data_dir.join(format!(
        "{SST_PREFIX}{}{SST_SUFFIX}",
        sstable::next_file_id()
    ));
    let writer = SstWriter::open(&out_path)?;
    merge(iters, writer)?;

    let new_reader = match SstReader::open(&out_path) {
        Ok(reader) => reader,
        Err(e) => {
            let _ = fs::remove_file(&out_path);
            return Err(e.into());
        }
    };

    // Swap the reader set in one exclusive critical section.
    let removed: Vec<SstReader> = {
        let mut state = shared
            .state
            .write()
            .map_err(|_| EngineError::Internal("rwlock poisoned".into()))?;

        let old = std::mem::take(&mut state.readers);
        let mut kept = Vec::with_capacity(old.len());
        let mut removed = Vec::new();
        for reader in old {
            if input_paths.iter().any(|p| p == reader.path()) {
                removed.push(reader);
            } else {
                kept.push(reader);
            }
        }
        kept.push(new_reader);
        state.readers = kept;
        removed
    };

    // Inputs are gone from the set; now their files can go too.
    for reader in removed {
        let path = reader.path().to_path_buf();
        drop(reader);
        if let Err(e) = fs::remove_file(&path) {
            warn!(path = %path.display(), error = %e, "failed to remove compacted sstable");
        }
    }

    info!(tier, output = %out_path.display(), "compaction complete");
    Ok(true)
}

// ------------------------------------------------------------------------------------------------
// Worker threads
// ------------------------------------------------------------------------------------------------

/// Spawns the flush worker. It holds only a weak reference to the engine,
/// so it exits when every handle is dropped or on shutdown.
fn spawn_flush_worker(
    shared: Weak<Shared>,
    rx: Receiver<WorkerMessage>,
) -> Result<thread::JoinHandle<()>, EngineError> {
    thread::Builder::new()
        .name("stratumdb-flush".into())
        .spawn(move || {
            while let Ok(WorkerMessage::Kick) = rx.recv() {
                let Some(shared) = shared.upgrade() else { break };
                match flush_impl(&shared) {
                    Ok(true) => {
                        // A new table may have filled a tier.
                        let _ = shared.compaction_tx.try_send(WorkerMessage::Kick);
                    }
                    Ok(false) => {}
                    Err(e) => error!(error = %e, "background flush failed"),
                }
            }
            debug!("flush worker exited");
        })
        .map_err(EngineError::Io)
}

/// Spawns the compaction worker. Each kick runs compaction rounds until no
/// tier meets the threshold.
fn spawn_compaction_worker(
    shared: Weak<Shared>,
    rx: Receiver<WorkerMessage>,
) -> Result<thread::JoinHandle<()>, EngineError> {
    thread::Builder::new()
        .name("stratumdb-compaction".into())
        .spawn(move || {
            while let Ok(WorkerMessage::Kick) = rx.recv() {
                let Some(shared) = shared.upgrade() else { break };
                loop {
                    match compact_impl(&shared) {
                        Ok(true) => {}
                        Ok(false) => break,
                        Err(e) => {
                            error!(error = %e, "background compaction failed");
                            break;
                        }
                    }
                }
            }
            debug!("compaction worker exited");
        })
        .map_err(EngineError::Io)
}

// ------------------------------------------------------------------------------------------------
// Startup helpers
// ------------------------------------------------------------------------------------------------

/// Parses `data_<id>.sst`, returning the numeric id.
fn parse_sst_file_name(name: &str) -> Option<u64> {
    name.strip_prefix(SST_PREFIX)?
        .strip_suffix(SST_SUFFIX)?
        .parse::<u64>()
        .ok()
}

/// Deletes leftover `*.tmp.<unique>` writer outputs.
fn remove_stale_temp_files(dir: &Path) -> Result<(), std::io::Error> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        if path.is_file() && name.contains(".tmp.") {
            warn!(path = %path.display(), "removing stale temporary file");
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}
