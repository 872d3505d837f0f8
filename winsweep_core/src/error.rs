//! Error types shared by the whitelist, validator, and deletion engine.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SweepError>;

/// Everything that can go wrong while managing the whitelist or
/// deleting files.
#[derive(Debug, Error)]
pub enum SweepError {
    /// Whitelist pattern was empty after trimming.
    #[error("pattern cannot be empty")]
    EmptyPattern,

    /// Pattern would match a drive root or everything on disk.
    #[error("pattern is too broad to be safe: {0}")]
    PatternTooBroad(String),

    /// Pattern has fewer than two path segments beyond the root.
    #[error("pattern is too shallow, need at least two path segments: {0}")]
    PatternTooShallow(String),

    #[error("pattern already exists: {0}")]
    DuplicatePattern(String),

    #[error("pattern not found: {0}")]
    PatternNotFound(String),

    /// Path is, or contains, a protected system root.
    #[error("refusing to touch protected system path: {}", .0.display())]
    NeverDelete(PathBuf),

    /// Final path component names a Windows reserved device.
    #[error("path names a reserved device: {}", .0.display())]
    ReservedName(PathBuf),

    /// Path matched a whitelist pattern. A skip, not a fault.
    #[error("path is whitelisted: {}", .0.display())]
    Whitelisted(PathBuf),

    #[error("cannot stat {}: {source}", .path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("path is a directory, use dir_size: {}", .0.display())]
    IsADirectory(PathBuf),

    #[error("invalid glob pattern {pattern}: {source}")]
    BadGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("failed to delete {} after {attempts} attempt(s): {source}", .path.display())]
    DeleteFailed {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: io::Error,
    },

    #[error("cannot read whitelist file {}: {source}", .path.display())]
    WhitelistRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write whitelist file {}: {source}", .path.display())]
    WhitelistWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Operation needs an elevated process token.
    #[error("administrator privileges are required to {operation}; restart from an elevated prompt")]
    ElevationRequired { operation: String },
}

impl SweepError {
    /// True when the path was skipped because the user whitelisted it,
    /// as opposed to being blocked by a safety rule.
    pub fn is_whitelist_skip(&self) -> bool {
        matches!(self, SweepError::Whitelisted(_))
    }

    /// True when no retry or configuration change can make the path
    /// deletable.
    pub fn is_safety_rejection(&self) -> bool {
        matches!(
            self,
            SweepError::NeverDelete(_) | SweepError::ReservedName(_)
        )
    }
}
