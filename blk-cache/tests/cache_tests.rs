//! Integration tests for the aging block cache
//!
//! Target coverage areas:
//! - Reads against file-backed storage (in range, clamped, out of range)
//! - Eviction under pressure
//! - Flush write-back and idempotence
//! - Storage failures surfacing as partial reads

use std::io::{self, Cursor, SeekFrom};

use blk_cache::{
    AgingBlockCache, CacheConfig, CacheError, IoStorage, ReadStatus, Storage,
};

const FILE_SIZE: usize = 1024;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 256) as u8).collect()
}

fn pattern_file(len: usize) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    io::Write::write_all(&mut file, &pattern(len)).unwrap();
    file
}

fn small_config() -> CacheConfig {
    CacheConfig::default().with_block_size(32).with_slot_count(4)
}

/// Storage that fails every operation once `broken` is set
struct FlakyStorage {
    inner: IoStorage<Cursor<Vec<u8>>>,
    broken: bool,
}

impl Storage for FlakyStorage {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.broken {
            return Err(io::Error::other("device unplugged"));
        }
        self.inner.read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.broken {
            return Err(io::Error::other("device unplugged"));
        }
        self.inner.write(buf)
    }
}

#[test]
fn test_file_read_scenario() {
    init_logger();
    let file = pattern_file(FILE_SIZE);
    let storage = IoStorage::open(file.path(), false).unwrap();
    let mut cache = AgingBlockCache::new(small_config(), storage);

    let mut buf = [0u8; 50];
    let outcome = cache.read(100, &mut buf);
    assert!(outcome.is_complete());
    assert_eq!(outcome.bytes, 50);
    assert_eq!(&buf[..], &pattern(FILE_SIZE)[100..150]);

    let mut buf = [0u8; 10];
    let outcome = cache.read(2000, &mut buf);
    assert_eq!(outcome.bytes, 0);
    assert!(matches!(outcome.status, ReadStatus::EndOfStorage));
}

#[test]
fn test_file_read_whole_range() {
    init_logger();
    let file = pattern_file(FILE_SIZE);
    let storage = IoStorage::open(file.path(), false).unwrap();
    let mut cache = AgingBlockCache::new(small_config(), storage);

    let mut buf = vec![0u8; FILE_SIZE + 100];
    let outcome = cache.read(0, &mut buf);
    assert_eq!(outcome.bytes, FILE_SIZE);
    assert!(outcome.is_end_of_storage());
    assert_eq!(&buf[..FILE_SIZE], &pattern(FILE_SIZE)[..]);
    // a scan alternates between the two least recent slots; the final
    // load past the end evicts 960 and leaves its slot free
    assert_eq!(cache.resident_blocks(), vec![64, 96, 992]);
}

#[test]
fn test_caller_keeps_storage_handle() {
    let file = pattern_file(FILE_SIZE);
    let mut storage = IoStorage::open(file.path(), false).unwrap();

    {
        let mut cache = AgingBlockCache::new(small_config(), &mut storage);
        let mut buf = [0u8; 4];
        assert!(cache.read(512, &mut buf).is_complete());
        assert_eq!(buf, [0, 1, 2, 3]);
    }

    assert_eq!(storage.seek(SeekFrom::Current(0)).unwrap(), 544);
}

#[test]
fn test_eviction_under_pressure() {
    let storage = IoStorage::new(Cursor::new(pattern(FILE_SIZE)));
    let mut cache = AgingBlockCache::new(small_config(), storage);
    let mut buf = [0u8; 1];

    for block in 0..4u64 {
        let _ = cache.read(block * 32, &mut buf);
    }
    assert_eq!(cache.resident_blocks(), vec![0, 32, 64, 96]);

    let _ = cache.read(4 * 32, &mut buf);
    assert_eq!(cache.resident_blocks(), vec![32, 64, 96, 128]);
    assert!(!cache.is_resident(0));
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn test_hot_block_survives_eviction() {
    let storage = IoStorage::new(Cursor::new(pattern(FILE_SIZE)));
    let mut cache = AgingBlockCache::new(small_config(), storage);
    let mut buf = [0u8; 1];

    for _ in 0..10 {
        let _ = cache.read(0, &mut buf);
    }
    for block in 1..8u64 {
        let _ = cache.read(block * 32, &mut buf);
    }

    assert!(cache.is_resident(0));
    assert_eq!(cache.hit_count(), 9);
}

#[test]
fn test_flush_writes_identical_bytes() {
    init_logger();
    let file = pattern_file(FILE_SIZE);
    let storage = IoStorage::open(file.path(), true).unwrap();
    let mut cache = AgingBlockCache::new(small_config(), storage);

    let mut buf = [0u8; 64];
    let _ = cache.read(960, &mut buf);
    assert_eq!(cache.flush(), 2);
    assert_eq!(cache.flush(), 0);
    drop(cache);

    assert_eq!(std::fs::read(file.path()).unwrap(), pattern(FILE_SIZE));
}

#[test]
fn test_flush_on_read_only_file_keeps_blocks() {
    let file = pattern_file(FILE_SIZE);
    let storage = IoStorage::open(file.path(), false).unwrap();
    let mut cache = AgingBlockCache::new(small_config(), storage);

    let mut buf = [0u8; 8];
    let _ = cache.read(0, &mut buf);
    assert_eq!(cache.flush(), 0);
    assert_eq!(cache.resident_blocks(), vec![0]);
}

#[test]
fn test_storage_failure_is_reported() {
    let mut storage = FlakyStorage {
        inner: IoStorage::new(Cursor::new(pattern(FILE_SIZE))),
        broken: false,
    };
    let mut buf = [0u8; 16];

    {
        let mut cache = AgingBlockCache::new(small_config(), &mut storage);
        assert!(cache.read(0, &mut buf).is_complete());
    }

    storage.broken = true;
    let mut cache = AgingBlockCache::new(small_config(), &mut storage);
    let outcome = cache.read(8, &mut buf);
    assert_eq!(outcome.bytes, 0);
    match outcome.into_result() {
        Err(err @ CacheError::Read { offset: 0, .. }) => assert!(err.is_storage()),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(cache.flush(), 0);
}

#[test]
fn test_write_is_reserved() {
    let storage = IoStorage::new(Cursor::new(pattern(FILE_SIZE)));
    let mut cache = AgingBlockCache::new(small_config(), storage);

    assert!(matches!(
        cache.write(0, &[0xFF; 4]),
        Err(CacheError::Unsupported(_))
    ));

    let mut buf = [0u8; 4];
    let _ = cache.read(0, &mut buf);
    assert_eq!(buf, [0, 1, 2, 3]);
}

#[test]
fn test_config_from_toml_drives_cache() {
    let config = CacheConfig::from_toml_str("block_size = 16\nslot_count = 2\n").unwrap();
    let storage = IoStorage::new(Cursor::new(pattern(FILE_SIZE)));
    let mut cache = AgingBlockCache::new(config, storage);

    let mut buf = [0u8; 40];
    let _ = cache.read(10, &mut buf);
    assert_eq!(cache.block_size(), 16);
    assert_eq!(cache.slot_count(), 2);
    // blocks 0, 16, 32, 48 were loaded; each load evicted the older block
    assert_eq!(cache.resident_blocks(), vec![32, 48]);
}
