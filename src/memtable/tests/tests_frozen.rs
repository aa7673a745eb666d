#[cfg(test)]
mod tests {
    use crate::memtable::Memtable;

    #[test]
    fn test_frozen_preserves_contents() {
        let table = Memtable::new();
        table.put(b"a".to_vec(), b"1".to_vec()).unwrap();
        table.put(b"b".to_vec(), b"2".to_vec()).unwrap();

        let frozen = table.frozen();
        assert_eq!(frozen.len().unwrap(), 2);
        assert_eq!(frozen.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(frozen.get(b"missing").unwrap(), None);
    }

    #[test]
    fn test_frozen_iter_matches_key_order() {
        let table = Memtable::new();
        table.put(b"z".to_vec(), b"26".to_vec()).unwrap();
        table.put(b"a".to_vec(), b"1".to_vec()).unwrap();
        table.put(b"m".to_vec(), b"13".to_vec()).unwrap();

        let frozen = table.frozen();
        let entries: Vec<(Vec<u8>, Vec<u8>)> = frozen.iter().unwrap().collect();
        assert_eq!(
            entries,
            vec![
                (b"a".to_vec(), b"1".to_vec()),
                (b"m".to_vec(), b"13".to_vec()),
                (b"z".to_vec(), b"26".to_vec()),
            ]
        );
    }

    #[test]
    fn test_frozen_iter_is_restartable() {
        let table = Memtable::new();
        table.put(b"k".to_vec(), b"v".to_vec()).unwrap();

        let frozen = table.frozen();
        assert_eq!(frozen.iter().unwrap().count(), 1);
        assert_eq!(frozen.iter().unwrap().count(), 1);
    }

    #[test]
    fn test_empty_frozen() {
        let frozen = Memtable::new().frozen();
        assert!(frozen.is_empty().unwrap());
        assert_eq!(frozen.iter().unwrap().count(), 0);
    }
}
