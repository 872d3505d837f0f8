//! Resilient deletion with retry, backoff, and size accounting.
//!
//! Antivirus scanners, indexers, and the programs being cleaned up all
//! hold short-lived locks on exactly the files a cleaner wants to
//! remove. The engine retries sharing and lock violations with doubling
//! backoff, clears the read-only attribute once on access-denied files,
//! and gives up on everything else. The schedule lives in [`RetryPolicy`]
//! so the transitions can be tested without a filesystem.

use std::fs;
use std::io;
use std::path::Path;
use std::thread;
use std::time::Duration;

use globset::GlobBuilder;
use log::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, SweepError};
use crate::safety::SafetyValidator;

/// Removal attempts per path before giving up.
const MAX_ATTEMPTS: u32 = 3;

/// Delay before the first retry; doubles on each subsequent one.
const BASE_BACKOFF: Duration = Duration::from_millis(500);

/// Classification of a failed removal attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Another process holds the file open; retrying may succeed.
    TransientLock,
    /// Access denied. For files this is usually the read-only attribute.
    AccessDenied,
    /// Retrying cannot help.
    Fatal,
}

/// What the engine does after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStep {
    /// Sleep for the delay, then try again.
    Backoff(Duration),
    /// Clear the read-only attribute, sleep, then try again.
    Remediate(Duration),
    /// Stop; the last error stands.
    Abort,
}

/// Bounded retry schedule for a single path.
#[derive(Debug)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_backoff: Duration,
    attempts: u32,
    remediated: bool,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_backoff,
            attempts: 0,
            remediated: false,
        }
    }

    /// Records the start of the next attempt and returns its 1-based
    /// number.
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }

    /// Attempts begun so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Decides the next step after the current attempt failed.
    ///
    /// Transient locks retry until attempts run out. Access denied on a
    /// file earns one remediation; on a directory, or a second time, it
    /// is final. Everything else aborts immediately.
    pub fn after_failure(&mut self, kind: FailureKind, is_dir: bool) -> RetryStep {
        if self.attempts >= self.max_attempts {
            return RetryStep::Abort;
        }
        match kind {
            FailureKind::TransientLock => RetryStep::Backoff(self.next_delay()),
            FailureKind::AccessDenied if !is_dir && !self.remediated => {
                self.remediated = true;
                RetryStep::Remediate(self.next_delay())
            }
            FailureKind::AccessDenied | FailureKind::Fatal => RetryStep::Abort,
        }
    }

    fn next_delay(&self) -> Duration {
        // Clamped on both sides: attempts is still zero when no
        // begin_attempt preceded the failure, and an oversized
        // max_attempts must not overflow the shift.
        let shift = self.attempts.saturating_sub(1).min(16);
        self.base_backoff * (1u32 << shift)
    }
}

/// Maps an I/O failure from a removal call onto a [`FailureKind`].
pub fn classify_remove_error(err: &io::Error) -> FailureKind {
    #[cfg(windows)]
    {
        use windows_sys::Win32::Foundation::{
            ERROR_ACCESS_DENIED, ERROR_LOCK_VIOLATION, ERROR_SHARING_VIOLATION,
        };
        match err.raw_os_error() {
            Some(code) if code == ERROR_SHARING_VIOLATION as i32 => {
                return FailureKind::TransientLock
            }
            Some(code) if code == ERROR_LOCK_VIOLATION as i32 => {
                return FailureKind::TransientLock
            }
            Some(code) if code == ERROR_ACCESS_DENIED as i32 => return FailureKind::AccessDenied,
            _ => {}
        }
    }

    if err.kind() == io::ErrorKind::PermissionDenied {
        FailureKind::AccessDenied
    } else {
        FailureKind::Fatal
    }
}

/// Deletes files and directories that pass the safety gate.
pub struct DeletionEngine {
    validator: SafetyValidator,
    max_attempts: u32,
    base_backoff: Duration,
}

impl DeletionEngine {
    pub fn new(validator: SafetyValidator) -> Self {
        Self {
            validator,
            max_attempts: MAX_ATTEMPTS,
            base_backoff: BASE_BACKOFF,
        }
    }

    /// Overrides the retry schedule. Callers that cannot afford
    /// half-second sleeps, tests above all, shrink it here.
    pub fn with_backoff(mut self, max_attempts: u32, base_backoff: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.base_backoff = base_backoff;
        self
    }

    /// Removes a file or directory and returns the bytes freed.
    ///
    /// The path is validated first; a nonexistent path is a successful
    /// no-op returning 0, so re-running a cleanup is idempotent. A
    /// symlink or junction is removed as the link itself; its target is
    /// never sized or entered. In `dry_run` mode the size is computed
    /// and returned with the filesystem untouched. Directory sizes are
    /// best effort: unreadable entries count as zero and never block
    /// the removal itself.
    pub fn safe_delete(&self, path: &Path, dry_run: bool) -> Result<u64> {
        self.validator.validate(path)?;

        let meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(source) => {
                return Err(SweepError::Stat {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let file_type = meta.file_type();
        let is_dir = file_type.is_dir();
        let size = if is_dir { dir_size(path) } else { meta.len() };

        if dry_run {
            return Ok(size);
        }

        let mut policy = RetryPolicy::new(self.max_attempts, self.base_backoff);
        loop {
            policy.begin_attempt();
            let attempt_result = remove_entry(path, file_type);
            let err = match attempt_result {
                Ok(()) => {
                    debug!("removed {} ({} bytes)", path.display(), size);
                    return Ok(size);
                }
                Err(err) => err,
            };

            match policy.after_failure(classify_remove_error(&err), is_dir) {
                RetryStep::Backoff(delay) => {
                    debug!(
                        "attempt {} on {} hit a lock ({}), retrying in {:?}",
                        policy.attempts(),
                        path.display(),
                        err,
                        delay
                    );
                    thread::sleep(delay);
                }
                RetryStep::Remediate(delay) => {
                    debug!(
                        "access denied on {}, clearing read-only attribute",
                        path.display()
                    );
                    clear_readonly(path);
                    thread::sleep(delay);
                }
                RetryStep::Abort => {
                    return Err(SweepError::DeleteFailed {
                        path: path.to_path_buf(),
                        attempts: policy.attempts(),
                        source: err,
                    });
                }
            }
        }
    }

    /// Removes the immediate children of `dir` matching `pattern` and
    /// returns (bytes freed, items removed).
    ///
    /// A nonexistent directory is a no-op. Per-item failures are logged
    /// and skipped so one locked or protected entry cannot stop the
    /// rest of the batch. In `dry_run` mode the totals count what would
    /// have been removed.
    pub fn safe_clean_dir(&self, dir: &Path, pattern: &str, dry_run: bool) -> Result<(u64, usize)> {
        self.validator.validate(dir)?;

        let meta = match fs::metadata(dir) {
            Ok(meta) => meta,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok((0, 0)),
            Err(source) => {
                return Err(SweepError::Stat {
                    path: dir.to_path_buf(),
                    source,
                })
            }
        };
        if !meta.is_dir() {
            return Err(SweepError::NotADirectory(dir.to_path_buf()));
        }

        let matcher = GlobBuilder::new(pattern)
            .literal_separator(true)
            .case_insensitive(true)
            .build()
            .map_err(|source| SweepError::BadGlob {
                pattern: pattern.to_string(),
                source,
            })?
            .compile_matcher();

        let entries = fs::read_dir(dir).map_err(|source| SweepError::Stat {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut total_bytes = 0u64;
        let mut total_items = 0usize;
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    debug!("unreadable entry under {}: {}", dir.display(), err);
                    continue;
                }
            };
            if !matcher.is_match(Path::new(&entry.file_name())) {
                continue;
            }

            let candidate = entry.path();
            match self.safe_delete(&candidate, dry_run) {
                Ok(freed) => {
                    total_bytes += freed;
                    total_items += 1;
                }
                Err(err) if err.is_whitelist_skip() => {
                    debug!("{err}");
                }
                // Log and continue; one stubborn entry must not stop
                // the batch.
                Err(err) => {
                    warn!("skipping {}: {err}", candidate.display());
                }
            }
        }

        Ok((total_bytes, total_items))
    }
}

/// Total size in bytes of every file beneath `path`.
///
/// Unreadable entries are skipped rather than failing the walk; an
/// unreadable or missing root contributes zero.
pub fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|meta| meta.len())
        .sum()
}

/// Size of a single file.
pub fn file_size(path: &Path) -> Result<u64> {
    let meta = fs::metadata(path).map_err(|source| SweepError::Stat {
        path: path.to_path_buf(),
        source,
    })?;
    if meta.is_dir() {
        return Err(SweepError::IsADirectory(path.to_path_buf()));
    }
    Ok(meta.len())
}

/// Human-readable byte count: `1.50 MB`, `2.00 GB`, `512 B`.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    match bytes {
        b if b >= TB => format!("{:.2} TB", b as f64 / TB as f64),
        b if b >= GB => format!("{:.2} GB", b as f64 / GB as f64),
        b if b >= MB => format!("{:.2} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.2} KB", b as f64 / KB as f64),
        _ => format!("{bytes} B"),
    }
}

/// Removes a single entry without following links.
///
/// Windows cannot unlink a directory symlink or junction with
/// `remove_file`; those go through `remove_dir`, which drops the link
/// and leaves the target alone.
fn remove_entry(path: &Path, file_type: fs::FileType) -> io::Result<()> {
    if file_type.is_dir() {
        return fs::remove_dir_all(path);
    }
    if is_dir_link(file_type) {
        return fs::remove_dir(path);
    }
    fs::remove_file(path)
}

#[cfg(windows)]
fn is_dir_link(file_type: fs::FileType) -> bool {
    use std::os::windows::fs::FileTypeExt;
    file_type.is_symlink_dir()
}

#[cfg(not(windows))]
fn is_dir_link(_file_type: fs::FileType) -> bool {
    false
}

#[cfg(windows)]
fn clear_readonly(path: &Path) {
    if let Ok(meta) = fs::metadata(path) {
        let mut perms = meta.permissions();
        if perms.readonly() {
            perms.set_readonly(false);
            let _ = fs::set_permissions(path, perms);
        }
    }
}

#[cfg(not(windows))]
fn clear_readonly(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o666));
}
