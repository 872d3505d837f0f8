//! User-managed whitelist of paths excluded from cleanup.
//!
//! Patterns persist in a plain text file, one per line, with `#` comment
//! lines and environment-variable references stored unexpanded. Matching
//! is case-insensitive and recognizes three forms per pattern: exact
//! path, single-segment glob, and directory prefix.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::GlobBuilder;
use log::{debug, info};
use parking_lot::RwLock;

use crate::envutil::expand_env;
use crate::error::{Result, SweepError};
use crate::path::{
    comparable, has_glob_chars, is_bare_root, is_same_or_under, normalize, segment_count,
};

/// Initial entries protecting common developer tooling from a careless
/// first cleanup run.
const DEFAULT_PATTERNS: [&str; 3] = [
    r"%USERPROFILE%\.cargo\bin\*",
    r"%LOCALAPPDATA%\JetBrains\*",
    r"%APPDATA%\Code\User\*",
];

/// Ordered set of glob patterns naming paths the engine must skip.
///
/// Interior `RwLock` keeps lookups concurrent while `add`/`remove` take
/// the lock exclusively. The backing file is only touched by [`load`]
/// and [`save`].
///
/// [`load`]: Whitelist::load
/// [`save`]: Whitelist::save
pub struct Whitelist {
    patterns: RwLock<Vec<String>>,
    file: PathBuf,
}

impl Whitelist {
    /// Reads patterns from `path`, or seeds and persists the default set
    /// when the file does not exist yet.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = path.as_ref().to_path_buf();

        match fs::read_to_string(&file) {
            Ok(data) => {
                let patterns: Vec<String> = data
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty() && !line.starts_with('#'))
                    .map(str::to_owned)
                    .collect();
                debug!(
                    "loaded {} whitelist patterns from {}",
                    patterns.len(),
                    file.display()
                );
                Ok(Self {
                    patterns: RwLock::new(patterns),
                    file,
                })
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let whitelist = Self {
                    patterns: RwLock::new(DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect()),
                    file,
                };
                whitelist.save()?;
                info!("created default whitelist at {}", whitelist.file.display());
                Ok(whitelist)
            }
            Err(source) => Err(SweepError::WhitelistRead { path: file, source }),
        }
    }

    /// Writes all patterns back to the backing file, creating parent
    /// directories as needed. The whole file is rewritten.
    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.file.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).map_err(|source| SweepError::WhitelistWrite {
                    path: self.file.clone(),
                    source,
                })?;
            }
        }

        let mut out = String::new();
        out.push_str("# winsweep whitelist: one glob pattern per line\n");
        out.push_str("# Lines starting with # are comments\n");
        out.push_str("# Environment variables (e.g. %USERPROFILE%) are expanded at match time\n\n");
        for pattern in self.patterns.read().iter() {
            out.push_str(pattern);
            out.push('\n');
        }

        fs::write(&self.file, out).map_err(|source| SweepError::WhitelistWrite {
            path: self.file.clone(),
            source,
        })
    }

    /// Appends a pattern after validating it.
    ///
    /// Rejections, in order: empty input, patterns broad enough to cover
    /// a whole drive, patterns with fewer than two segments beyond the
    /// root, and case-insensitive duplicates.
    pub fn add(&self, pattern: &str) -> Result<()> {
        let pattern = pattern.trim();
        validate_pattern(pattern)?;

        let mut patterns = self.patterns.write();
        let lowered = pattern.to_lowercase();
        if patterns.iter().any(|existing| existing.to_lowercase() == lowered) {
            return Err(SweepError::DuplicatePattern(pattern.to_string()));
        }
        patterns.push(pattern.to_string());
        Ok(())
    }

    /// Removes the first pattern equal to `pattern`, ignoring case.
    pub fn remove(&self, pattern: &str) -> Result<()> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(SweepError::EmptyPattern);
        }

        let mut patterns = self.patterns.write();
        let lowered = pattern.to_lowercase();
        match patterns.iter().position(|existing| existing.to_lowercase() == lowered) {
            Some(idx) => {
                patterns.remove(idx);
                Ok(())
            }
            None => Err(SweepError::PatternNotFound(pattern.to_string())),
        }
    }

    /// True when `path` matches any stored pattern.
    ///
    /// Each pattern is env-expanded and normalized, then tried as an
    /// exact path, as a glob whose `*` stays within one segment, and,
    /// when it has no glob characters, as a directory prefix covering
    /// everything beneath it. First hit wins.
    pub fn is_whitelisted(&self, path: &str) -> bool {
        let query = comparable(path);

        for pattern in self.patterns.read().iter() {
            let expanded = normalize(&expand_env(pattern));
            let expanded_cmp = expanded.to_lowercase();

            if expanded_cmp == query {
                return true;
            }

            match GlobBuilder::new(&expanded)
                .literal_separator(true)
                .case_insensitive(true)
                .build()
            {
                Ok(glob) => {
                    if glob.compile_matcher().is_match(query.as_str()) {
                        return true;
                    }
                }
                Err(err) => {
                    debug!("whitelist pattern {pattern} does not compile as a glob: {err}")
                }
            }

            if !has_glob_chars(&expanded) && is_same_or_under(&query, &expanded_cmp) {
                return true;
            }
        }

        false
    }

    /// Snapshot of the patterns in insertion order.
    pub fn list(&self) -> Vec<String> {
        self.patterns.read().clone()
    }

    /// Location of the backing file.
    pub fn file_path(&self) -> &Path {
        &self.file
    }
}

#[cfg(test)]
impl Whitelist {
    /// In-memory whitelist with no backing file, for rule tests.
    pub(crate) fn in_memory(patterns: &[&str]) -> Self {
        Self {
            patterns: RwLock::new(patterns.iter().map(|p| p.to_string()).collect()),
            file: PathBuf::from("unused"),
        }
    }
}

/// Rejects patterns that would hollow out the safety net.
fn validate_pattern(pattern: &str) -> Result<()> {
    if pattern.is_empty() {
        return Err(SweepError::EmptyPattern);
    }

    let normalized = normalize(pattern);

    // A drive root, bare wildcard, or root-plus-wildcard whitelists the
    // world; matching everything means deleting nothing.
    let stem = normalized.trim_end_matches('*').trim_end_matches('/');
    if normalized.chars().all(|c| c == '*') || is_bare_root(stem) {
        return Err(SweepError::PatternTooBroad(pattern.to_string()));
    }

    if segment_count(&normalized) < 2 {
        return Err(SweepError::PatternTooShallow(pattern.to_string()));
    }

    Ok(())
}
