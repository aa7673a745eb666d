use crate::engine::{Engine, EngineConfig};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber controlled by `RUST_LOG` env var.
/// Safe to call multiple times — only the first call takes effect.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Standard config: write buffer large enough that tests control flushes
/// explicitly via `flush()`.
pub fn default_config() -> EngineConfig {
    init_tracing();
    EngineConfig::default()
}

/// Tiny write buffer so a handful of puts kicks the background flush
/// worker.
pub fn tiny_buffer_config() -> EngineConfig {
    init_tracing();
    EngineConfig {
        write_buffer_size: 256,
        ..EngineConfig::default()
    }
}

/// Open an engine with the default config.
pub fn open_engine(path: &Path) -> Engine {
    Engine::open(path, default_config()).expect("open")
}

/// Count the `data_*.sst` files currently on disk.
pub fn sst_files_on_disk(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .expect("read_dir")
        .filter(|e| {
            let name = e.as_ref().unwrap().file_name();
            let name = name.to_string_lossy();
            name.starts_with("data_") && name.ends_with(".sst")
        })
        .count()
}
