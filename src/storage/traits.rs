//! Storage traits and error types
//!
//! This module defines the trait interface for the tracked-set store and
//! associated error types.

use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for tracked-set backends
///
/// The store exclusively owns the persisted tracked websites and tracked
/// emails. Every commit updates the in-memory set and rewrites the persisted
/// form before returning, so a crash after any commit leaves storage
/// consistent with all prior commits.
pub trait Storage: Send {
    /// Snapshot of the tracked website URLs (canonical form)
    fn tracked_websites(&self) -> &BTreeSet<String>;

    /// Snapshot of the tracked email addresses
    fn tracked_emails(&self) -> &BTreeSet<String>;

    /// Returns true if the canonical form of `url` is already tracked
    fn is_website_tracked(&self, url: &str) -> bool;

    /// Adds a website (canonicalized before insertion) and persists
    ///
    /// # Returns
    ///
    /// `true` if the website was not tracked before
    fn commit_website(&mut self, url: &str) -> StorageResult<bool>;

    /// Adds emails and persists
    ///
    /// # Returns
    ///
    /// The number of emails that were not tracked before
    fn commit_emails(&mut self, emails: &BTreeSet<String>) -> StorageResult<usize>;

    /// Rewrites both persisted sets from memory
    fn flush(&mut self) -> StorageResult<()>;
}
