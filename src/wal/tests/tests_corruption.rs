#[cfg(test)]
mod tests {
    use crate::wal::{RECORD_HEADER_SIZE, Wal};
    use std::fs::OpenOptions;
    use std::io::{Seek, SeekFrom, Write};
    use tempfile::TempDir;
    use tracing_subscriber::EnvFilter;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    /// On-disk size of one record.
    fn record_size(key: &[u8], value: &[u8]) -> u64 {
        (RECORD_HEADER_SIZE + key.len() + value.len()) as u64
    }

    #[test]
    fn test_tail_garbage_is_truncated() {
        init_tracing();

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("wal.log");

        let wal = Wal::open(&path, 1).unwrap();
        wal.write(b"valid_key", b"value").unwrap();
        drop(wal);

        // Append a partial/garbage header, as a crash mid-write would.
        let mut f = OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(&[0xFF, 0x00, 0x11]).unwrap();
        f.sync_all().unwrap();

        let wal = Wal::open(&path, 1).unwrap();
        let restored = wal.recover().unwrap();

        assert_eq!(restored.len(), 1);
        assert_eq!(restored.get(b"valid_key".as_slice()), Some(&b"value".to_vec()));
    }

    #[test]
    fn test_truncated_payload_is_dropped() {
        init_tracing();

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("wal.log");

        let wal = Wal::open(&path, 1).unwrap();
        wal.write(b"first", b"value1").unwrap();
        wal.write(b"second", b"value2").unwrap();
        drop(wal);

        // Cut into the second record's value.
        let keep = record_size(b"first", b"value1") + record_size(b"second", b"value2") - 3;
        let f = OpenOptions::new().write(true).open(&path).unwrap();
        f.set_len(keep).unwrap();
        f.sync_all().unwrap();

        let wal = Wal::open(&path, 1).unwrap();
        let restored = wal.recover().unwrap();

        assert_eq!(restored.len(), 1);
        assert_eq!(restored.get(b"first".as_slice()), Some(&b"value1".to_vec()));
    }

    #[test]
    fn test_checksum_mismatch_stops_replay() {
        init_tracing();

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("wal.log");

        let wal = Wal::open(&path, 1).unwrap();
        wal.write(b"aaaa", b"1111").unwrap();
        wal.write(b"bbbb", b"2222").unwrap();
        drop(wal);

        // Flip a byte inside the second record's value.
        let mut f = OpenOptions::new().write(true).open(&path).unwrap();
        f.seek(SeekFrom::End(-1)).unwrap();
        f.write_all(&[0x99]).unwrap();
        f.sync_all().unwrap();

        let wal = Wal::open(&path, 1).unwrap();
        let restored = wal.recover().unwrap();

        assert_eq!(restored.len(), 1);
        assert_eq!(restored.get(b"aaaa".as_slice()), Some(&b"1111".to_vec()));
    }

    #[test]
    fn test_mid_file_corruption_truncates_the_rest() {
        init_tracing();

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("wal.log");

        let wal = Wal::open(&path, 1).unwrap();
        wal.write(b"k1", b"v1").unwrap();
        wal.write(b"k2", b"v2").unwrap();
        wal.write(b"k3", b"v3").unwrap();
        drop(wal);

        // Damage the second record's key; replay keeps only the first.
        let offset = record_size(b"k1", b"v1") + RECORD_HEADER_SIZE as u64;
        let mut f = OpenOptions::new().write(true).open(&path).unwrap();
        f.seek(SeekFrom::Start(offset)).unwrap();
        f.write_all(&[0xEE]).unwrap();
        f.sync_all().unwrap();

        let wal = Wal::open(&path, 1).unwrap();
        let restored = wal.recover().unwrap();

        assert_eq!(restored.len(), 1);
        assert!(restored.contains_key(b"k1".as_slice()));
        assert!(!restored.contains_key(b"k3".as_slice()));
    }

    #[test]
    fn test_short_header_tail() {
        init_tracing();

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("wal.log");

        let wal = Wal::open(&path, 1).unwrap();
        wal.write(b"key", b"val").unwrap();
        drop(wal);

        // A header fragment shorter than the fixed header size.
        let mut f = OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(&[0x01; 7]).unwrap();
        f.sync_all().unwrap();

        let wal = Wal::open(&path, 1).unwrap();
        let restored = wal.recover().unwrap();
        assert_eq!(restored.len(), 1);
    }
}
