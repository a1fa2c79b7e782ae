//! Run statistics and tracked-set statistics
//!
//! This module provides the counters collected while a harvest runs and
//! the summary of the persisted tracked sets shown by `--stats`.

use crate::crawler::SiteReport;
use crate::state::SiteOutcome;
use crate::storage::Storage;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

/// Counters for a single harvest run
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Wall-clock start of the run
    pub started_at: DateTime<Utc>,

    /// Listings pulled from the listing source
    pub listings_seen: u64,

    /// Listings that carried no website link
    pub without_website: u64,

    /// Listings whose details could not be read
    pub listing_errors: u64,

    /// Sites finished, by outcome
    pub outcomes: HashMap<SiteOutcome, u64>,

    /// Pages fetched across all sites
    pub pages_fetched: u64,

    /// Emails that were not tracked before this run
    pub new_emails: u64,

    /// Tracked set sizes at the end of the run
    pub tracked_websites: usize,
    pub tracked_emails: usize,

    started: Instant,
}

impl Default for CrawlStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlStatistics {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            listings_seen: 0,
            without_website: 0,
            listing_errors: 0,
            outcomes: HashMap::new(),
            pages_fetched: 0,
            new_emails: 0,
            tracked_websites: 0,
            tracked_emails: 0,
            started: Instant::now(),
        }
    }

    /// Counts an outcome that was decided without a site crawl
    pub fn record_outcome(&mut self, outcome: SiteOutcome) {
        *self.outcomes.entry(outcome).or_insert(0) += 1;
    }

    /// Counts a finished site crawl
    pub fn record(&mut self, report: &SiteReport) {
        self.record_outcome(report.outcome);
        self.pages_fetched += report.pages_fetched as u64;
        self.new_emails += report.new_emails as u64;
    }

    pub fn count(&self, outcome: SiteOutcome) -> u64 {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }

    /// Sites that reached an outcome, skips included
    pub fn sites_done(&self) -> u64 {
        self.outcomes.values().sum()
    }

    /// Sites that yielded at least one email
    pub fn sites_with_emails(&self) -> u64 {
        SiteOutcome::all_outcomes()
            .into_iter()
            .filter(SiteOutcome::is_success)
            .map(|o| self.count(o))
            .sum()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Copies the tracked set sizes from the store
    pub fn capture_store(&mut self, storage: &dyn Storage) {
        self.tracked_websites = storage.tracked_websites().len();
        self.tracked_emails = storage.tracked_emails().len();
    }
}

/// Prints run statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Started: {}", stats.started_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Elapsed: {:.1}s", stats.elapsed().as_secs_f64());
    println!("  Listings seen: {}", stats.listings_seen);
    println!("  Listings without website: {}", stats.without_website);
    println!("  Listing errors: {}", stats.listing_errors);
    println!("  Pages fetched: {}", stats.pages_fetched);
    println!();

    println!("Sites by Outcome:");
    let total = stats.sites_done();
    for outcome in SiteOutcome::all_outcomes() {
        let count = stats.count(outcome);
        if count == 0 {
            continue;
        }
        let percentage = (count as f64 / total as f64) * 100.0;
        println!("  {}: {} ({:.1}%)", outcome, count, percentage);
    }
    println!();

    println!("Emails:");
    println!("  New this run: {}", stats.new_emails);
    println!("  Tracked websites: {}", stats.tracked_websites);
    println!("  Tracked emails: {}", stats.tracked_emails);
}

/// Summary of the persisted tracked sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedStatistics {
    pub tracked_websites: usize,
    pub tracked_emails: usize,

    /// Distinct domains across all tracked emails, lower-cased
    pub email_domains: usize,
}

/// Summarizes the tracked sets held by a store
pub fn load_statistics(storage: &dyn Storage) -> TrackedStatistics {
    let email_domains: BTreeSet<String> = storage
        .tracked_emails()
        .iter()
        .filter_map(|email| email.rsplit_once('@'))
        .map(|(_, domain)| domain.to_lowercase())
        .collect();

    TrackedStatistics {
        tracked_websites: storage.tracked_websites().len(),
        tracked_emails: storage.tracked_emails().len(),
        email_domains: email_domains.len(),
    }
}

pub fn print_tracked_statistics(stats: &TrackedStatistics) {
    println!("=== Tracked Sets ===\n");
    println!("  Tracked websites: {}", stats.tracked_websites);
    println!("  Tracked emails: {}", stats.tracked_emails);
    println!("  Distinct email domains: {}", stats.email_domains);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FlatFileStorage;
    use tempfile::TempDir;

    fn report(outcome: SiteOutcome, new_emails: usize, pages_fetched: usize) -> SiteReport {
        SiteReport {
            website: Some("https://cafe.de/".to_string()),
            outcome,
            emails: BTreeSet::new(),
            new_emails,
            pages_fetched,
        }
    }

    #[test]
    fn test_record_reports() {
        let mut stats = CrawlStatistics::new();
        stats.record(&report(SiteOutcome::EmailsFoundHomepage, 2, 1));
        stats.record(&report(SiteOutcome::EmailsFoundRelevant, 1, 3));
        stats.record(&report(SiteOutcome::NoEmails, 0, 4));
        stats.record_outcome(SiteOutcome::SkippedDuplicate);

        assert_eq!(stats.sites_done(), 4);
        assert_eq!(stats.sites_with_emails(), 2);
        assert_eq!(stats.new_emails, 3);
        assert_eq!(stats.pages_fetched, 8);
        assert_eq!(stats.count(SiteOutcome::SkippedDuplicate), 1);
        assert_eq!(stats.count(SiteOutcome::Cancelled), 0);
    }

    #[test]
    fn test_load_statistics_counts_email_domains() {
        let dir = TempDir::new().unwrap();
        let mut storage = FlatFileStorage::open(
            &dir.path().join("websites.txt"),
            &dir.path().join("emails.txt"),
        )
        .unwrap();

        let emails: BTreeSet<String> = ["info@cafe.de", "jobs@Cafe.de", "office@baeckerei.de"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        storage.commit_emails(&emails).unwrap();
        storage.commit_website("https://cafe.de/").unwrap();

        let stats = load_statistics(&storage);
        assert_eq!(
            stats,
            TrackedStatistics {
                tracked_websites: 1,
                tracked_emails: 3,
                email_domains: 2,
            }
        );
    }

    #[test]
    fn test_capture_store() {
        let dir = TempDir::new().unwrap();
        let mut storage = FlatFileStorage::open(
            &dir.path().join("websites.txt"),
            &dir.path().join("emails.txt"),
        )
        .unwrap();
        storage.commit_website("https://a.de/").unwrap();

        let mut stats = CrawlStatistics::new();
        stats.capture_store(&storage);
        assert_eq!(stats.tracked_websites, 1);
        assert_eq!(stats.tracked_emails, 0);
    }
}
