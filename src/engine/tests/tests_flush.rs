#[cfg(test)]
mod tests {
    use crate::engine::tests::helpers::{open_engine, sst_files_on_disk};
    use crate::engine::{FLUSHING_WAL_FILE, WAL_FILE};
    use tempfile::TempDir;

    #[test]
    fn test_flush_then_get_then_reopen() {
        let dir = TempDir::new().unwrap();
        let engine = open_engine(dir.path());

        engine.put(b"key1".to_vec(), b"value1".to_vec()).unwrap();
        assert!(engine.flush().unwrap());

        // Served from the SSTable now; the memtable is fresh.
        assert_eq!(engine.get(b"key1").unwrap(), Some(b"value1".to_vec()));
        assert_eq!(engine.stats().unwrap().memtable_entries, 0);
        assert_eq!(engine.stats().unwrap().sstable_count, 1);

        engine.close().unwrap();
        drop(engine);

        let engine = open_engine(dir.path());
        assert_eq!(engine.get(b"key1").unwrap(), Some(b"value1".to_vec()));
        engine.close().unwrap();
    }

    #[test]
    fn test_empty_flush_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let engine = open_engine(dir.path());

        assert!(!engine.flush().unwrap());
        assert_eq!(sst_files_on_disk(dir.path()), 0);

        engine.close().unwrap();
    }

    #[test]
    fn test_double_flush_second_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let engine = open_engine(dir.path());

        engine.put(b"k".to_vec(), b"v".to_vec()).unwrap();
        assert!(engine.flush().unwrap());
        assert!(!engine.flush().unwrap());
        assert_eq!(engine.stats().unwrap().sstable_count, 1);

        engine.close().unwrap();
    }

    #[test]
    fn test_flush_discards_the_rotated_wal() {
        let dir = TempDir::new().unwrap();
        let engine = open_engine(dir.path());

        engine.put(b"k".to_vec(), b"v".to_vec()).unwrap();
        engine.flush().unwrap();

        assert!(dir.path().join(WAL_FILE).exists());
        assert!(!dir.path().join(FLUSHING_WAL_FILE).exists());

        engine.close().unwrap();
    }

    #[test]
    fn test_writes_after_flush_land_in_the_new_memtable() {
        let dir = TempDir::new().unwrap();
        let engine = open_engine(dir.path());

        engine.put(b"old".to_vec(), b"1".to_vec()).unwrap();
        engine.flush().unwrap();
        engine.put(b"new".to_vec(), b"2".to_vec()).unwrap();

        assert_eq!(engine.get(b"old").unwrap(), Some(b"1".to_vec()));
        assert_eq!(engine.get(b"new").unwrap(), Some(b"2".to_vec()));

        let stats = engine.stats().unwrap();
        assert_eq!(stats.memtable_entries, 1);
        assert_eq!(stats.sstable_count, 1);

        engine.close().unwrap();
    }

    #[test]
    fn test_memtable_shadows_flushed_value() {
        let dir = TempDir::new().unwrap();
        let engine = open_engine(dir.path());

        engine.put(b"key".to_vec(), b"v1".to_vec()).unwrap();
        engine.flush().unwrap();
        engine.put(b"key".to_vec(), b"v2".to_vec()).unwrap();

        assert_eq!(engine.get(b"key").unwrap(), Some(b"v2".to_vec()));

        // And after a second flush, the newer table shadows the older one.
        engine.flush().unwrap();
        assert_eq!(engine.stats().unwrap().sstable_count, 2);
        assert_eq!(engine.get(b"key").unwrap(), Some(b"v2".to_vec()));

        engine.close().unwrap();
    }

    #[test]
    fn test_each_flush_produces_one_table() {
        let dir = TempDir::new().unwrap();
        let engine = open_engine(dir.path());

        for i in 0..3u32 {
            engine
                .put(format!("key{i}").into_bytes(), format!("val{i}").into_bytes())
                .unwrap();
            engine.flush().unwrap();
        }

        assert_eq!(engine.stats().unwrap().sstable_count, 3);
        assert_eq!(sst_files_on_disk(dir.path()), 3);
        for i in 0..3u32 {
            assert_eq!(
                engine.get(format!("key{i}").as_bytes()).unwrap(),
                Some(format!("val{i}").into_bytes())
            );
        }

        engine.close().unwrap();
    }
}
