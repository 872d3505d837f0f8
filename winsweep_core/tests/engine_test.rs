//! End-to-end engine behavior against a real filesystem.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use winsweep_core::{dir_size, file_size, DeletionEngine, SafetyValidator, SweepError, Whitelist};

/// Engine over a fixture whitelist file and an explicit protected list,
/// with a retry schedule fast enough for tests.
fn fixture_engine(root: &Path, protected: Vec<String>, patterns: &[&str]) -> DeletionEngine {
    let wl_path = root.join("whitelist.txt");
    fs::write(&wl_path, "").unwrap();
    let whitelist = Arc::new(Whitelist::load(&wl_path).unwrap());
    for pattern in patterns {
        whitelist.add(pattern).unwrap();
    }
    let validator = SafetyValidator::new(protected, whitelist);
    DeletionEngine::new(validator).with_backoff(2, Duration::from_millis(1))
}

#[test]
fn test_delete_file_returns_size() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("junk.tmp");
    fs::write(&file, "0123456789").unwrap();

    let engine = fixture_engine(tmp.path(), vec![], &[]);
    let freed = engine.safe_delete(&file, false).unwrap();

    assert_eq!(freed, 10);
    assert!(!file.exists());
}

#[test]
fn test_delete_directory_recursively() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("cache");
    fs::create_dir_all(dir.join("nested")).unwrap();
    fs::write(dir.join("a.bin"), "12345").unwrap();
    fs::write(dir.join("nested").join("b.bin"), "123").unwrap();

    let engine = fixture_engine(tmp.path(), vec![], &[]);
    let freed = engine.safe_delete(&dir, false).unwrap();

    assert_eq!(freed, 8);
    assert!(!dir.exists());
}

#[cfg(unix)]
#[test]
fn test_delete_symlink_removes_link_not_target() {
    let tmp = TempDir::new().unwrap();
    let target = tmp.path().join("real");
    fs::create_dir(&target).unwrap();
    fs::write(target.join("data.bin"), "1234").unwrap();
    let link = tmp.path().join("link");
    std::os::unix::fs::symlink(&target, &link).unwrap();

    let engine = fixture_engine(tmp.path(), vec![], &[]);
    engine.safe_delete(&link, false).unwrap();

    assert!(fs::symlink_metadata(&link).is_err());
    assert!(target.join("data.bin").exists());
}

#[test]
fn test_delete_nonexistent_path_is_noop() {
    let tmp = TempDir::new().unwrap();
    let engine = fixture_engine(tmp.path(), vec![], &[]);

    let freed = engine
        .safe_delete(&tmp.path().join("never-existed.log"), false)
        .unwrap();
    assert_eq!(freed, 0);
}

#[test]
fn test_dry_run_reports_size_without_deleting() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("cache");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("a.bin"), "12345").unwrap();
    fs::write(dir.join("b.bin"), "abc").unwrap();

    let engine = fixture_engine(tmp.path(), vec![], &[]);
    let would_free = engine.safe_delete(&dir, true).unwrap();

    assert_eq!(would_free, 8);
    assert!(dir.exists());
    assert!(dir.join("a.bin").exists());
    assert!(dir.join("b.bin").exists());
}

#[test]
fn test_size_helpers() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("data");
    fs::create_dir_all(dir.join("sub")).unwrap();
    fs::write(dir.join("a.bin"), "1234").unwrap();
    fs::write(dir.join("sub").join("b.bin"), "12").unwrap();

    assert_eq!(dir_size(&dir), 6);
    assert_eq!(dir_size(&tmp.path().join("missing")), 0);

    assert_eq!(file_size(&dir.join("a.bin")).unwrap(), 4);
    assert!(matches!(file_size(&dir), Err(SweepError::IsADirectory(_))));
    assert!(matches!(file_size(&dir.join("missing.bin")), Err(SweepError::Stat { .. })));
}

#[test]
fn test_protected_path_is_blocked_even_in_dry_run() {
    let tmp = TempDir::new().unwrap();
    let protected = tmp.path().join("protected");
    fs::create_dir(&protected).unwrap();
    fs::write(protected.join("keep.dat"), "data").unwrap();

    let engine = fixture_engine(
        tmp.path(),
        vec![protected.to_string_lossy().into_owned()],
        &[],
    );

    for dry_run in [true, false] {
        let err = engine.safe_delete(&protected, dry_run).unwrap_err();
        assert!(matches!(err, SweepError::NeverDelete(_)));
    }
    assert!(protected.join("keep.dat").exists());
}

#[test]
fn test_ancestor_of_protected_path_is_blocked() {
    let tmp = TempDir::new().unwrap();
    let outer = tmp.path().join("outer");
    let inner = outer.join("inner");
    fs::create_dir_all(&inner).unwrap();

    let engine = fixture_engine(tmp.path(), vec![inner.to_string_lossy().into_owned()], &[]);

    let err = engine.safe_delete(&outer, false).unwrap_err();
    assert!(matches!(err, SweepError::NeverDelete(_)));
    assert!(inner.exists());
}

#[test]
fn test_file_inside_protected_root_is_deletable() {
    let tmp = TempDir::new().unwrap();
    let protected = tmp.path().join("users");
    fs::create_dir(&protected).unwrap();
    let junk = protected.join("stale.tmp");
    fs::write(&junk, "x").unwrap();

    let engine = fixture_engine(
        tmp.path(),
        vec![protected.to_string_lossy().into_owned()],
        &[],
    );

    assert_eq!(engine.safe_delete(&junk, false).unwrap(), 1);
    assert!(!junk.exists());
    assert!(protected.exists());
}

#[test]
fn test_whitelisted_path_is_skipped() {
    let tmp = TempDir::new().unwrap();
    let keep = tmp.path().join("keep.log");
    fs::write(&keep, "precious").unwrap();

    let pattern = keep.to_string_lossy().into_owned();
    let engine = fixture_engine(tmp.path(), vec![], &[pattern.as_str()]);

    let err = engine.safe_delete(&keep, false).unwrap_err();
    assert!(err.is_whitelist_skip());
    assert!(keep.exists());
}

#[test]
fn test_reserved_device_name_is_refused() {
    let tmp = TempDir::new().unwrap();
    let engine = fixture_engine(tmp.path(), vec![], &[]);

    // The name alone triggers the rule; the path need not exist.
    let err = engine
        .safe_delete(&tmp.path().join("nul"), false)
        .unwrap_err();
    assert!(matches!(err, SweepError::ReservedName(_)));
}

#[test]
fn test_clean_dir_removes_matching_children_only() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("logs");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("a.log"), "12345").unwrap();
    fs::write(dir.join("REPORT.LOG"), "123").unwrap();
    fs::write(dir.join("keep.txt"), "stay").unwrap();

    let engine = fixture_engine(tmp.path(), vec![], &[]);
    let (bytes, items) = engine.safe_clean_dir(&dir, "*.log", false).unwrap();

    assert_eq!(items, 2);
    assert_eq!(bytes, 8);
    assert!(!dir.join("a.log").exists());
    assert!(!dir.join("REPORT.LOG").exists());
    assert!(dir.join("keep.txt").exists());
}

#[test]
fn test_clean_dir_one_blocked_entry_does_not_stop_batch() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("cache");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("one.tmp"), "11").unwrap();
    fs::write(dir.join("two.tmp"), "222").unwrap();
    let keep = dir.join("keep.tmp");
    fs::write(&keep, "kept").unwrap();

    let pattern = keep.to_string_lossy().into_owned();
    let engine = fixture_engine(tmp.path(), vec![], &[pattern.as_str()]);

    let (bytes, items) = engine.safe_clean_dir(&dir, "*.tmp", false).unwrap();

    assert_eq!(items, 2);
    assert_eq!(bytes, 5);
    assert!(keep.exists());
    assert!(!dir.join("one.tmp").exists());
    assert!(!dir.join("two.tmp").exists());
}

#[test]
fn test_clean_dir_hard_failure_does_not_stop_batch() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("cache");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("one.tmp"), "11").unwrap();
    fs::write(dir.join("two.tmp"), "222").unwrap();
    // A child named after a reserved device fails validation outright,
    // not as a whitelist skip. On Windows the write lands on the NUL
    // device and no entry appears; elsewhere the file is real and must
    // survive the batch.
    fs::write(dir.join("nul"), "stay").unwrap();

    let engine = fixture_engine(tmp.path(), vec![], &[]);
    let (bytes, items) = engine.safe_clean_dir(&dir, "*", false).unwrap();

    assert_eq!(items, 2);
    assert_eq!(bytes, 5);
    assert!(!dir.join("one.tmp").exists());
    assert!(!dir.join("two.tmp").exists());
    if cfg!(unix) {
        assert!(dir.join("nul").exists());
    }
}

#[test]
fn test_clean_dir_dry_run_counts_without_deleting() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("cache");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("one.tmp"), "11").unwrap();
    fs::write(dir.join("two.tmp"), "222").unwrap();

    let engine = fixture_engine(tmp.path(), vec![], &[]);
    let (bytes, items) = engine.safe_clean_dir(&dir, "*.tmp", true).unwrap();

    assert_eq!((bytes, items), (5, 2));
    assert!(dir.join("one.tmp").exists());
    assert!(dir.join("two.tmp").exists());
}

#[test]
fn test_clean_dir_missing_directory_is_noop() {
    let tmp = TempDir::new().unwrap();
    let engine = fixture_engine(tmp.path(), vec![], &[]);

    let (bytes, items) = engine
        .safe_clean_dir(&tmp.path().join("gone"), "*", false)
        .unwrap();
    assert_eq!((bytes, items), (0, 0));
}

#[test]
fn test_clean_dir_rejects_non_directory() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("file.txt");
    fs::write(&file, "x").unwrap();

    let engine = fixture_engine(tmp.path(), vec![], &[]);
    let err = engine.safe_clean_dir(&file, "*", false).unwrap_err();
    assert!(matches!(err, SweepError::NotADirectory(_)));
}

#[test]
fn test_clean_dir_rejects_bad_glob() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("d");
    fs::create_dir(&dir).unwrap();

    let engine = fixture_engine(tmp.path(), vec![], &[]);
    let err = engine.safe_clean_dir(&dir, "[unclosed", false).unwrap_err();
    assert!(matches!(err, SweepError::BadGlob { .. }));
}

#[test]
fn test_whitelist_created_with_defaults_on_first_load() {
    let tmp = TempDir::new().unwrap();
    let wl_path = tmp.path().join("config").join("whitelist.txt");

    let wl = Whitelist::load(&wl_path).unwrap();

    assert!(wl_path.exists());
    assert!(!wl.list().is_empty());
    let content = fs::read_to_string(&wl_path).unwrap();
    assert!(content.starts_with("# winsweep whitelist"));
    assert!(content.contains(r"%USERPROFILE%\.cargo\bin\*"));
}

#[test]
fn test_whitelist_round_trips_order_and_case() {
    let tmp = TempDir::new().unwrap();
    let wl_path = tmp.path().join("whitelist.txt");
    fs::write(&wl_path, "").unwrap();

    let wl = Whitelist::load(&wl_path).unwrap();
    wl.add(r"D:\Games\Steam\*").unwrap();
    wl.add(r"C:\Users\Dave\Projects").unwrap();
    wl.save().unwrap();

    let reloaded = Whitelist::load(&wl_path).unwrap();
    assert_eq!(
        reloaded.list(),
        vec![
            r"D:\Games\Steam\*".to_string(),
            r"C:\Users\Dave\Projects".to_string(),
        ]
    );
}

#[test]
fn test_whitelist_comments_and_blanks_ignored_on_load() {
    let tmp = TempDir::new().unwrap();
    let wl_path = tmp.path().join("whitelist.txt");
    fs::write(
        &wl_path,
        "# header\n\n  \nC:\\Users\\dave\\keep\\*\n# trailing comment\n",
    )
    .unwrap();

    let wl = Whitelist::load(&wl_path).unwrap();
    assert_eq!(wl.list(), vec![r"C:\Users\dave\keep\*".to_string()]);
}
