//! Storage module for persisting tracked websites and emails
//!
//! This module handles:
//! - Loading the two tracked sets at run start
//! - Crash-safe rewrites of the persisted sets after every commit
//! - Serializing all commits through a single shared handle

mod flatfile;
mod traits;

pub use flatfile::{load_tracked_set, save_tracked_set, serialize_set, FlatFileStorage};
pub use traits::{Storage, StorageError, StorageResult};

use crate::config::OutputConfig;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Store handle shared by all crawl tasks; the mutex is the single writer path
pub type SharedStorage = Arc<Mutex<Box<dyn Storage>>>;

/// Number of attempts made for a single commit before giving up
pub const COMMIT_ATTEMPTS: u32 = 3;

/// Opens the flat-file store described by the output configuration
pub fn open_storage(config: &OutputConfig) -> StorageResult<FlatFileStorage> {
    FlatFileStorage::open(
        Path::new(&config.websites_path),
        Path::new(&config.emails_path),
    )
}

/// Wraps a store for sharing between tasks
pub fn share(storage: impl Storage + 'static) -> SharedStorage {
    Arc::new(Mutex::new(Box::new(storage)))
}

/// Runs a commit against the shared store, retrying with a linear backoff
///
/// The lock is held for a single attempt only, so other tasks can commit
/// between retries.
pub async fn commit_with_retry<T, F>(storage: &SharedStorage, mut commit: F) -> StorageResult<T>
where
    F: FnMut(&mut dyn Storage) -> StorageResult<T>,
{
    let mut attempt = 1;
    loop {
        let result = {
            let mut guard = storage.lock().await;
            commit(&mut **guard)
        };

        match result {
            Ok(value) => return Ok(value),
            Err(e) if attempt < COMMIT_ATTEMPTS => {
                tracing::warn!(
                    "Commit attempt {}/{} failed: {}",
                    attempt,
                    COMMIT_ATTEMPTS,
                    e
                );
                tokio::time::sleep(Duration::from_millis(200 * u64::from(attempt))).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    /// Store whose writes fail a fixed number of times before succeeding
    struct FlakyStorage {
        failures_left: u32,
        websites: BTreeSet<String>,
        emails: BTreeSet<String>,
    }

    impl Storage for FlakyStorage {
        fn tracked_websites(&self) -> &BTreeSet<String> {
            &self.websites
        }

        fn tracked_emails(&self) -> &BTreeSet<String> {
            &self.emails
        }

        fn is_website_tracked(&self, url: &str) -> bool {
            self.websites.contains(url)
        }

        fn commit_website(&mut self, url: &str) -> StorageResult<bool> {
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(StorageError::Write {
                    path: "websites.txt".into(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                });
            }
            Ok(self.websites.insert(url.to_string()))
        }

        fn commit_emails(&mut self, emails: &BTreeSet<String>) -> StorageResult<usize> {
            let before = self.emails.len();
            self.emails.extend(emails.iter().cloned());
            Ok(self.emails.len() - before)
        }

        fn flush(&mut self) -> StorageResult<()> {
            Ok(())
        }
    }

    fn flaky(failures: u32) -> SharedStorage {
        share(FlakyStorage {
            failures_left: failures,
            websites: BTreeSet::new(),
            emails: BTreeSet::new(),
        })
    }

    #[tokio::test]
    async fn test_commit_retries_transient_failure() {
        let storage = flaky(2);
        let added = commit_with_retry(&storage, |s| s.commit_website("https://cafe.de/"))
            .await
            .unwrap();
        assert!(added);
        assert!(storage.lock().await.is_website_tracked("https://cafe.de/"));
    }

    #[tokio::test]
    async fn test_commit_surfaces_persistent_failure() {
        let storage = flaky(COMMIT_ATTEMPTS);
        let result = commit_with_retry(&storage, |s| s.commit_website("https://cafe.de/")).await;
        assert!(matches!(result, Err(StorageError::Write { .. })));
    }
}
