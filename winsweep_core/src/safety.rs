//! Pre-deletion safety gate.
//!
//! Every path the engine touches goes through [`SafetyValidator::validate`]
//! first. Three rules apply, cheapest first: reserved device names are
//! refused, protected system roots (and their ancestors) are refused,
//! and whitelisted paths are skipped with a distinct error so callers
//! can report them as skips rather than failures.

use std::path::Path;
use std::sync::Arc;

use log::debug;

use crate::error::{Result, SweepError};
use crate::path::{comparable, is_reserved_device, is_same_or_under};
use crate::whitelist::Whitelist;

/// Decides whether a path may be deleted.
///
/// The protected roots are injected at construction rather than read
/// from a global, so tests can substitute a fixture list and exercise
/// the rules against temp directories.
pub struct SafetyValidator {
    protected: Vec<String>,
    whitelist: Arc<Whitelist>,
}

impl SafetyValidator {
    /// Builds a validator over the given never-delete roots.
    pub fn new<I, S>(never_delete: I, whitelist: Arc<Whitelist>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let protected = never_delete
            .into_iter()
            .map(|p| comparable(p.as_ref()))
            .collect();
        Self {
            protected,
            whitelist,
        }
    }

    /// Builds a validator over the built-in system roots.
    pub fn with_system_defaults(whitelist: Arc<Whitelist>) -> Self {
        Self::new(crate::config::never_delete_paths().iter().copied(), whitelist)
    }

    /// Returns Ok when deleting `path` is permitted.
    ///
    /// A rejection is either fatal ([`SweepError::ReservedName`],
    /// [`SweepError::NeverDelete`]) or an informational skip
    /// ([`SweepError::Whitelisted`]).
    pub fn validate(&self, path: &Path) -> Result<()> {
        let raw = path.to_string_lossy();

        if is_reserved_device(&raw) {
            return Err(SweepError::ReservedName(path.to_path_buf()));
        }

        let query = comparable(&raw);
        for entry in &self.protected {
            // Equal to a protected root, or an ancestor of one. Removing
            // an ancestor removes the protected path with it. Descendants
            // stay deletable; the whitelist exists to protect those.
            if is_same_or_under(entry, &query) {
                return Err(SweepError::NeverDelete(path.to_path_buf()));
            }
        }

        if self.whitelist.is_whitelisted(&raw) {
            debug!("whitelisted, skipping: {}", path.display());
            return Err(SweepError::Whitelisted(path.to_path_buf()));
        }

        Ok(())
    }
}
