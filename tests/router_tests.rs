// Tests for the store router
// Store resolution for single, local and console-only runs

use std::fs;
use std::path::Path;

use hashkeep::cli::{Config, Mode};
use hashkeep::digest::Algorithm;
use hashkeep::router::StoreRouter;
use hashkeep::store::ChecksumStore;

fn base_config(store_file: &Path) -> Config {
    Config {
        mode: Mode::Update,
        algorithm: Algorithm::Sha1,
        paths: vec![".".to_string()],
        excludes: Vec::new(),
        recurse: false,
        only_new: false,
        only_existing: false,
        store_file: store_file.to_path_buf(),
        console_only: false,
        single_store: true,
        local: false,
        purge: false,
        hide: false,
        absolute_paths: false,
        quiet: true,
        echo_records: false,
    }
}

#[test]
fn test_single_store_collects_all_targets() {
    let dir = tempfile::tempdir().unwrap();
    let store_file = dir.path().join("sums.chk");
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();

    let config = base_config(&store_file);
    let mut router = StoreRouter::new(&config);

    router.update(&dir.path().join("a.txt"), Algorithm::Sha1, vec![0x01]);
    router.update(&sub.join("b.txt"), Algorithm::Sha1, vec![0x02]);
    router.close();
    assert!(!router.write_failed());

    let store = ChecksumStore::open(store_file);
    assert_eq!(store.len(), 2);
    assert!(store.lookup("a.txt").is_some());
    assert!(store.lookup("sub/b.txt").is_some());
}

#[test]
fn test_update_stores_relative_paths() {
    let dir = tempfile::tempdir().unwrap();
    let store_file = dir.path().join("sums.chk");

    let config = base_config(&store_file);
    let mut router = StoreRouter::new(&config);

    let record = router.update(&dir.path().join("sub").join("c.txt"), Algorithm::Sha256, vec![0xff]);
    assert_eq!(record.path, "sub/c.txt");
    assert_eq!(record.algorithm, "SHA256");
}

#[test]
fn test_absolute_paths_mode() {
    let dir = tempfile::tempdir().unwrap();
    let store_file = dir.path().join("sums.chk");
    let target = dir.path().join("a.txt");

    let mut config = base_config(&store_file);
    config.absolute_paths = true;
    let mut router = StoreRouter::new(&config);

    let record = router.update(&target, Algorithm::Sha1, vec![0x01]);
    assert_eq!(record.path, target.to_string_lossy());
}

#[test]
fn test_record_for_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store_file = dir.path().join("sums.chk");
    let target = dir.path().join("a.txt");

    let config = base_config(&store_file);
    let mut router = StoreRouter::new(&config);

    assert!(router.record_for(&target).is_none());
    router.update(&target, Algorithm::Sha1, vec![0x0a, 0x0b]);

    let record = router.record_for(&target).unwrap();
    assert_eq!(record.digest, vec![0x0a, 0x0b]);
}

#[test]
fn test_local_mode_keeps_one_store_per_folder() {
    let dir = tempfile::tempdir().unwrap();
    let dir_a = dir.path().join("a");
    let dir_b = dir.path().join("b");
    fs::create_dir(&dir_a).unwrap();
    fs::create_dir(&dir_b).unwrap();

    let mut config = base_config(&dir.path().join("hashkeep.chk"));
    config.single_store = false;
    config.local = true;
    let mut router = StoreRouter::new(&config);

    router.update(&dir_a.join("one.txt"), Algorithm::Sha1, vec![0x01]);
    router.update(&dir_b.join("two.txt"), Algorithm::Sha1, vec![0x02]);
    router.close();

    let store_a = ChecksumStore::open(dir_a.join("hashkeep.chk"));
    assert_eq!(store_a.len(), 1);
    assert!(store_a.lookup("one.txt").is_some());

    let store_b = ChecksumStore::open(dir_b.join("hashkeep.chk"));
    assert_eq!(store_b.len(), 1);
    assert!(store_b.lookup("two.txt").is_some());
}

#[test]
fn test_local_mode_reuses_open_store_within_folder() {
    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("a");
    fs::create_dir(&folder).unwrap();

    let mut config = base_config(&dir.path().join("hashkeep.chk"));
    config.single_store = false;
    config.local = true;
    let mut router = StoreRouter::new(&config);

    router.update(&folder.join("one.txt"), Algorithm::Sha1, vec![0x01]);
    // Nothing is flushed while the folder's store stays open
    assert!(!folder.join("hashkeep.chk").exists());
    // The second lookup hits the same open store and sees the first record
    assert!(router.record_for(&folder.join("one.txt")).is_some());
    router.update(&folder.join("two.txt"), Algorithm::Sha1, vec![0x02]);
    assert!(!folder.join("hashkeep.chk").exists());

    router.close();
    let store = ChecksumStore::open(folder.join("hashkeep.chk"));
    assert_eq!(store.len(), 2);
}

#[test]
fn test_store_read_failure_is_surfaced() {
    let dir = tempfile::tempdir().unwrap();
    let store_file = dir.path().join("sums.chk");
    fs::create_dir(&store_file).unwrap();

    let config = base_config(&store_file);
    let mut router = StoreRouter::new(&config);
    assert!(router.record_for(&dir.path().join("a.txt")).is_none());
    assert!(router.read_failed());
}

#[test]
fn test_single_store_wins_over_local() {
    let dir = tempfile::tempdir().unwrap();
    let store_file = dir.path().join("sums.chk");
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();

    // A store named with a folder component stays pinned even with -l
    let mut config = base_config(&store_file);
    config.local = true;
    let mut router = StoreRouter::new(&config);

    router.update(&sub.join("a.txt"), Algorithm::Sha1, vec![0x01]);
    router.close();

    assert!(store_file.exists());
    assert!(!sub.join("sums.chk").exists());
}

#[test]
fn test_console_only_never_writes() {
    let dir = tempfile::tempdir().unwrap();
    let store_file = dir.path().join("sums.chk");

    let mut config = base_config(&store_file);
    config.mode = Mode::Compute;
    config.console_only = true;
    let mut router = StoreRouter::new(&config);

    router.update(&dir.path().join("a.txt"), Algorithm::Sha1, vec![0x01]);
    router.close();

    assert!(!store_file.exists());
    assert!(!router.write_failed());
}

#[test]
fn test_purge_on_close_drops_stale_records() {
    let dir = tempfile::tempdir().unwrap();
    let store_file = dir.path().join("sums.chk");
    fs::write(&store_file, "SHA1:ab  2024-01-02T03:04:05  gone.txt\n").unwrap();

    let mut config = base_config(&store_file);
    config.purge = true;
    let mut router = StoreRouter::new(&config);

    router.update(&dir.path().join("kept.txt"), Algorithm::Sha1, vec![0x01]);
    router.close();

    let store = ChecksumStore::open(store_file);
    assert_eq!(store.len(), 1);
    assert!(store.lookup("kept.txt").is_some());
    assert!(store.lookup("gone.txt").is_none());
}

#[test]
fn test_store_file_name_is_lowercased() {
    let dir = tempfile::tempdir().unwrap();
    let config = base_config(&dir.path().join("MySums.CHK"));
    let router = StoreRouter::new(&config);
    assert_eq!(router.store_file_name(), "mysums.chk");
}
