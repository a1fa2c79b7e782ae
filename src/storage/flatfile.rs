//! Flat-file storage implementation
//!
//! Each tracked set lives in its own text file: one entry per line, sorted
//! ascending, no header. Files are rewritten whole on every change through a
//! temporary sibling file and a rename, so readers never observe a partially
//! written set.

use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::url::canonical_url;
use std::collections::BTreeSet;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Tracked websites and emails backed by two sorted text files
#[derive(Debug)]
pub struct FlatFileStorage {
    websites_path: PathBuf,
    emails_path: PathBuf,
    websites: BTreeSet<String>,
    emails: BTreeSet<String>,
}

impl FlatFileStorage {
    /// Loads both tracked sets
    ///
    /// Missing files yield empty sets; they are created on the first commit.
    pub fn open(websites_path: &Path, emails_path: &Path) -> StorageResult<Self> {
        let websites: BTreeSet<String> = load_tracked_set(websites_path)?
            .into_iter()
            .map(|url| canonical_url(&url))
            .collect();
        let emails = load_tracked_set(emails_path)?;

        tracing::debug!(
            "Loaded tracked sets: {} websites from {}, {} emails from {}",
            websites.len(),
            websites_path.display(),
            emails.len(),
            emails_path.display()
        );

        Ok(Self {
            websites_path: websites_path.to_path_buf(),
            emails_path: emails_path.to_path_buf(),
            websites,
            emails,
        })
    }

    pub fn websites_path(&self) -> &Path {
        &self.websites_path
    }

    pub fn emails_path(&self) -> &Path {
        &self.emails_path
    }
}

impl Storage for FlatFileStorage {
    fn tracked_websites(&self) -> &BTreeSet<String> {
        &self.websites
    }

    fn tracked_emails(&self) -> &BTreeSet<String> {
        &self.emails
    }

    fn is_website_tracked(&self, url: &str) -> bool {
        self.websites.contains(&canonical_url(url))
    }

    fn commit_website(&mut self, url: &str) -> StorageResult<bool> {
        let canonical = canonical_url(url);
        if canonical.is_empty() || self.websites.contains(&canonical) {
            return Ok(false);
        }

        self.websites.insert(canonical.clone());
        if let Err(e) = save_tracked_set(&self.websites_path, &self.websites) {
            // Keep memory and disk in step so a retry rewrites the same set
            self.websites.remove(&canonical);
            return Err(e);
        }
        Ok(true)
    }

    fn commit_emails(&mut self, emails: &BTreeSet<String>) -> StorageResult<usize> {
        let fresh: Vec<String> = emails
            .iter()
            .filter(|email| !email.is_empty() && !self.emails.contains(*email))
            .cloned()
            .collect();

        if fresh.is_empty() {
            return Ok(0);
        }

        self.emails.extend(fresh.iter().cloned());
        if let Err(e) = save_tracked_set(&self.emails_path, &self.emails) {
            for email in &fresh {
                self.emails.remove(email);
            }
            return Err(e);
        }
        Ok(fresh.len())
    }

    fn flush(&mut self) -> StorageResult<()> {
        save_tracked_set(&self.websites_path, &self.websites)?;
        save_tracked_set(&self.emails_path, &self.emails)?;
        Ok(())
    }
}

/// Reads a line-per-entry set, trimming whitespace and skipping blank lines
///
/// A missing file is an empty set, not an error.
pub fn load_tracked_set(path: &Path) -> StorageResult<BTreeSet<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeSet::new()),
        Err(source) => Err(StorageError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Serializes a set as sorted, newline-terminated lines
pub fn serialize_set(set: &BTreeSet<String>) -> String {
    let mut out = String::with_capacity(set.iter().map(|s| s.len() + 1).sum());
    for item in set {
        out.push_str(item);
        out.push('\n');
    }
    out
}

/// Atomically replaces `path` with the serialized set
pub fn save_tracked_set(path: &Path, set: &BTreeSet<String>) -> StorageResult<()> {
    let write_err = |source: std::io::Error| StorageError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    {
        let mut file = fs::File::create(&tmp_path).map_err(write_err)?;
        file.write_all(serialize_set(set).as_bytes())
            .map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
    }

    fs::rename(&tmp_path, path).map_err(write_err)?;
    Ok(())
}
