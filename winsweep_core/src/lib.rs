//! Winsweep core: safety-gated file deletion for Windows disk cleanup.
//!
//! Every removal runs through the same gate. Reserved device names and
//! protected system roots are refused outright, user-whitelisted paths
//! are skipped, and whatever remains is deleted with bounded retry and
//! backoff to ride out the locks a live system puts on its own junk.

pub mod admin;
pub mod config;
pub mod envutil;
pub mod error;
pub mod fileops;
pub mod path;
pub mod safety;
pub mod whitelist;

pub use config::{Category, CleanTarget, RiskLevel};
pub use error::{Result, SweepError};
pub use fileops::{dir_size, file_size, format_size, DeletionEngine};
pub use safety::SafetyValidator;
pub use whitelist::Whitelist;
