//! # StratumDB
//!
//! An embeddable, single-process key-value storage engine built on a
//! **Log-Structured Merge Tree (LSM-tree)**. Designed for fast, durable
//! writes and crash-safe operation.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                       Engine                           │
//! │  ┌────────────┐  ┌──────────────┐  ┌──────────────┐    │
//! │  │  Active     │  │  Immutable   │  │   SSTables   │    │
//! │  │  memtable   │  │  memtable    │  │  (on disk)   │    │
//! │  │  + WAL      │  │  + WAL       │  │              │    │
//! │  └─────┬───────┘  └──────┬───────┘  └──────┬───────┘    │
//! │        │   rotate        │   flush         │            │
//! │        └─────────►       └────────►        │            │
//! │                                            │            │
//! │  ┌─────────────────────────────────────────┘            │
//! │  │  Size-tiered compaction (k-way dedup merge)          │
//! │  └──────────────────────────────────────────────────────┤
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`engine`] | Core storage engine — open, put, get, flush, compact, close |
//! | [`memtable`] | In-memory ordered write buffer |
//! | [`wal`] | CRC-protected, fsync-on-write append log for crash recovery |
//! | [`sstable`] | Immutable, sorted, on-disk tables with a sparse index |
//! | [`compaction`] | Size-tiered compaction planning |
//!
//! ## Guarantees
//!
//! - **Durability** — every `put` is framed, checksummed, and fsynced to the
//!   WAL before it is acknowledged.
//! - **Crash recovery** — on open, the WAL is replayed with a torn tail
//!   truncated cleanly, and existing SSTables are re-attached in age order.
//! - **Recent-writes-win reads** — lookups consult the active memtable, the
//!   immutable memtable, then SSTables from newest to oldest.
//! - **Atomic file lifecycle** — SSTables materialize only via fsync +
//!   rename; a finished table is never mutated.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stratumdb::{Engine, EngineConfig};
//!
//! let engine = Engine::open("/tmp/my_db", EngineConfig::default()).unwrap();
//!
//! engine.put(b"hello".to_vec(), b"world".to_vec()).unwrap();
//! assert_eq!(engine.get(b"hello").unwrap(), Some(b"world".to_vec()));
//!
//! // Persist the memtable to an SSTable, then fold small tables together.
//! engine.flush().unwrap();
//! engine.run_compaction().unwrap();
//!
//! engine.close().unwrap();
//! ```

#![allow(dead_code)]

pub mod compaction;
pub mod engine;
pub mod memtable;
pub mod sstable;
pub mod wal;

pub use engine::{Engine, EngineConfig, EngineError, EngineStats};
